//! Integration tests for the harvester
//!
//! These tests use wiremock to serve board listings and article pages and
//! run the traversal modes end-to-end against a temporary SQLite database.

use ptt_harvest::config::{parse_config, Config};
use ptt_harvest::crawler::{BoardRange, Coordinator, TraversalMode};
use ptt_harvest::state::TraversalState;
use ptt_harvest::storage::{RunStatus, SqliteStorage, Storage};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
base-url = "{}"
page-delay = 0
poll-interval = 1
request-timeout = 5

[storage]
database-path = "{}"

[[board]]
name = "NBA"
start-page = 10
end-page = 7

[[board]]
name = "Stock"
start-page = 1
end-page = 1
"#,
        base_url, db_path
    ))
    .expect("valid test config")
}

fn coordinator(server: &MockServer, dir: &TempDir) -> Coordinator<SqliteStorage> {
    let db_path = dir.path().join("harvest.db");
    let config = create_test_config(&server.uri(), db_path.to_str().unwrap());
    Coordinator::new(config, "test-hash").expect("Failed to create coordinator")
}

/// Builds a listing page with one row per `(title, href)`; `None` is a deleted post
fn listing_html(rows: &[Option<(&str, &str)>]) -> String {
    let mut html = String::from(r#"<html><body><div class="r-list-container">"#);
    for row in rows {
        match row {
            Some((title, href)) => html.push_str(&format!(
                r#"<div class="r-ent"><div class="title"><a href="{}">{}</a></div></div>"#,
                href, title
            )),
            None => html.push_str(r#"<div class="r-ent"><div class="title">(本文已被刪除)</div></div>"#),
        }
    }
    html.push_str("</div></body></html>");
    html
}

/// Builds an article page with a time header, a body and push comments
fn article_html(time: &str, body: &str, pushes: &[(&str, &str, &str)]) -> String {
    let mut html = format!(
        r#"<html><body><div id="main-content">
<div class="article-metaline"><span class="article-meta-tag">作者</span><span class="article-meta-value">author</span></div>
<div class="article-metaline"><span class="article-meta-tag">時間</span><span class="article-meta-value">{}</span></div>
{}
"#,
        time, body
    );
    for (tag, user, content) in pushes {
        html.push_str(&format!(
            r#"<div class="push"><span class="push-tag">{} </span><span class="push-userid">{}</span><span class="push-content">: {}</span><span class="push-ipdatetime"> 03/09 21:20</span></div>"#,
            tag, user, content
        ));
    }
    html.push_str("</div></body></html>");
    html
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Mounts listing page 1 of NBA with two live posts and one deleted post
async fn mount_single_page_board(server: &MockServer) {
    mount_html(
        server,
        "/bbs/NBA/index1.html",
        listing_html(&[
            Some(("[新聞] first", "/bbs/NBA/M.1.A.001.html")),
            None,
            Some(("[討論] second", "/bbs/NBA/M.2.A.002.html")),
        ]),
    )
    .await;
    mount_html(
        server,
        "/bbs/NBA/M.1.A.001.html",
        article_html(
            "Sat Mar  9 21:15:02 2024",
            "first body",
            &[("推", "bob", "nice"), ("噓", "carol", "meh")],
        ),
    )
    .await;
    mount_html(
        server,
        "/bbs/NBA/M.2.A.002.html",
        article_html("Sun Mar 10 08:00:00 2024", "second body", &[("→", "dave", "ok")]),
    )
    .await;
}

#[tokio::test]
async fn test_range_visits_pages_in_order() {
    let server = MockServer::start().await;
    for page in 7..=10 {
        mount_html(
            &server,
            &format!("/bbs/NBA/index{}.html", page),
            listing_html(&[]),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);
    let report = coordinator.run_bounded("NBA", 10, 7).await.unwrap();

    assert_eq!(report.pages_visited(), vec![10, 9, 8, 7]);
    assert!(!report.aborted);
    assert_eq!(coordinator.state(), TraversalState::Done);

    let requested: Vec<String> = server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        requested,
        vec![
            "/bbs/NBA/index10.html",
            "/bbs/NBA/index9.html",
            "/bbs/NBA/index8.html",
            "/bbs/NBA/index7.html",
        ]
    );
}

#[tokio::test]
async fn test_full_cycle_stores_articles_and_comments() {
    let server = MockServer::start().await;
    mount_single_page_board(&server).await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);
    let report = coordinator.run_bounded("NBA", 1, 1).await.unwrap();

    let page = &report.pages[0];
    assert_eq!(page.stubs, 2);
    assert_eq!(page.stored, 2);
    assert_eq!(page.comments_saved, 3);

    let storage = coordinator.gateway().storage();
    let first_link = format!("{}/bbs/NBA/M.1.A.001.html", server.uri());
    let first = storage
        .get_article_by_link(&first_link)
        .unwrap()
        .expect("first article stored");
    assert_eq!(first.board, "NBA");
    assert_eq!(first.title, "[新聞] first");
    assert_eq!(first.content.lines().next(), Some("first body"));
    assert_eq!(
        first.timestamp.unwrap().to_string(),
        "2024-03-09 21:15:02"
    );

    let comments = storage.get_comments(first.id).unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].tag, "推");
    assert_eq!(comments[0].user_id, "bob");
    assert_eq!(comments[0].content, "nice");
    assert_eq!(comments[0].raw_time, "03/09 21:20");
    assert_eq!(comments[1].user_id, "carol");

    // listing order is storage order
    let second_link = format!("{}/bbs/NBA/M.2.A.002.html", server.uri());
    let second = storage.get_article_by_link(&second_link).unwrap().unwrap();
    assert!(second.id > first.id);
}

#[tokio::test]
async fn test_recrawl_is_idempotent() {
    let server = MockServer::start().await;
    mount_single_page_board(&server).await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);

    coordinator.run_bounded("NBA", 1, 1).await.unwrap();
    let report = coordinator.run_bounded("NBA", 1, 1).await.unwrap();

    assert_eq!(report.pages[0].stored, 0);
    assert_eq!(report.pages[0].duplicates, 2);

    let storage = coordinator.gateway().storage();
    assert_eq!(storage.count_articles().unwrap(), 2);
    assert_eq!(storage.count_comments().unwrap(), 3);
}

#[tokio::test]
async fn test_requests_carry_user_agent_and_age_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bbs/NBA/index1.html"))
        .and(header("user-agent", "Mozilla/5.0"))
        .and(header("cookie", "over18=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);
    let report = coordinator.run_bounded("NBA", 1, 1).await.unwrap();

    assert!(!report.aborted);
    assert_eq!(report.pages_visited(), vec![1]);
}

#[tokio::test]
async fn test_failed_article_fetch_is_skipped() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/bbs/NBA/index1.html",
        listing_html(&[
            Some(("broken", "/bbs/NBA/M.9.A.500.html")),
            Some(("fine", "/bbs/NBA/M.1.A.001.html")),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bbs/NBA/M.9.A.500.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/bbs/NBA/M.1.A.001.html",
        article_html("Sat Mar  9 21:15:02 2024", "body", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);
    let report = coordinator.run_bounded("NBA", 1, 1).await.unwrap();

    assert_eq!(report.pages[0].fetch_failures, 1);
    assert_eq!(report.pages[0].stored, 1);
    assert_eq!(coordinator.gateway().storage().count_articles().unwrap(), 1);
}

#[tokio::test]
async fn test_listing_failure_aborts_board_but_batch_continues() {
    let server = MockServer::start().await;
    // NBA: page 10 works, page 9 is missing, so pages 8 and 7 are never visited
    mount_html(&server, "/bbs/NBA/index10.html", listing_html(&[])).await;
    Mock::given(method("GET"))
        .and(path("/bbs/NBA/index9.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/bbs/Stock/index1.html",
        listing_html(&[Some(("[標的] 2330", "/bbs/Stock/M.3.A.003.html"))]),
    )
    .await;
    mount_html(
        &server,
        "/bbs/Stock/M.3.A.003.html",
        article_html("Mon Mar 11 09:00:00 2024", "stock body", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);
    let mode = TraversalMode::MultiBoard(vec![
        BoardRange {
            board: "NBA".to_string(),
            start_page: 10,
            end_page: 7,
        },
        BoardRange {
            board: "Stock".to_string(),
            start_page: 1,
            end_page: 1,
        },
    ]);

    let reports = coordinator.run(&mode).await.unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports[0].aborted);
    assert_eq!(reports[0].pages_visited(), vec![10]);
    assert!(!reports[1].aborted);
    assert_eq!(reports[1].articles_stored(), 1);

    let run = coordinator
        .gateway()
        .storage()
        .get_latest_run()
        .unwrap()
        .unwrap();
    assert_eq!(run.mode, "batch");
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_latest_mode_crawls_newest_page() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/bbs/NBA/index.html",
        r#"<div class="btn-group btn-group-paging">
             <a class="btn wide" href="/bbs/NBA/index1.html">最舊</a>
             <a class="btn wide" href="/bbs/NBA/index41.html">‹ 上頁</a>
           </div>"#
            .to_string(),
    )
    .await;
    mount_html(
        &server,
        "/bbs/NBA/index42.html",
        listing_html(&[Some(("[新聞] newest", "/bbs/NBA/M.4.A.004.html"))]),
    )
    .await;
    mount_html(
        &server,
        "/bbs/NBA/M.4.A.004.html",
        article_html("Tue Mar 12 10:00:00 2024", "newest body", &[("推", "eve", "first")]),
    )
    .await;
    // Stock has no locatable page and is skipped every cycle
    Mock::given(method("GET"))
        .and(path("/bbs/Stock/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);
    let mode = TraversalMode::LatestPage {
        boards: vec!["NBA".to_string(), "Stock".to_string()],
        poll_interval: Duration::from_millis(10),
        max_cycles: Some(2),
    };

    let reports = coordinator.run(&mode).await.unwrap();

    // two cycles over two boards
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0].pages_visited(), vec![42]);
    assert_eq!(reports[0].articles_stored(), 1);
    assert!(reports[1].aborted);
    // second cycle finds the same article already stored
    assert_eq!(reports[2].pages[0].duplicates, 1);

    let storage = coordinator.gateway().storage();
    assert_eq!(storage.count_articles().unwrap(), 1);
    assert_eq!(storage.count_comments().unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_article_removes_its_comments() {
    let server = MockServer::start().await;
    mount_single_page_board(&server).await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = coordinator(&server, &dir);
    coordinator.run_bounded("NBA", 1, 1).await.unwrap();

    let mut storage = coordinator.into_storage();
    let link = format!("{}/bbs/NBA/M.1.A.001.html", server.uri());
    let article = storage.get_article_by_link(&link).unwrap().unwrap();

    assert!(storage.delete_article(article.id).unwrap());
    assert!(storage.get_comments(article.id).unwrap().is_empty());
    assert_eq!(storage.count_articles().unwrap(), 1);
    assert_eq!(storage.count_comments().unwrap(), 1);
}
