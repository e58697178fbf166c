//! Listing page parser
//!
//! Extracts article stubs from a board listing page. Rows whose title has no
//! link or no text (deleted or hidden posts) are skipped.

use crate::url::resolve_link;
use scraper::{Html, Selector};
use url::Url;

/// A title and detail-page link taken from a listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleStub {
    pub title: String,
    pub link: String,
}

/// Parses a listing page and returns its article stubs in page order
///
/// # Arguments
///
/// * `html` - The listing page HTML
/// * `base_url` - The listing page URL, used to resolve relative hrefs
///
/// # Example
///
/// ```
/// use ptt_harvest::crawler::parse_listing;
/// use url::Url;
///
/// let html = r#"<div class="r-ent"><div class="title"><a href="/bbs/NBA/M.1.A.html">[新聞] x</a></div></div>"#;
/// let base = Url::parse("https://www.ptt.cc/bbs/NBA/index1.html").unwrap();
/// let stubs = parse_listing(html, &base);
/// assert_eq!(stubs[0].link, "https://www.ptt.cc/bbs/NBA/M.1.A.html");
/// ```
pub fn parse_listing(html: &str, base_url: &Url) -> Vec<ArticleStub> {
    let document = Html::parse_document(html);

    let (Ok(row_selector), Ok(title_selector)) =
        (Selector::parse(".r-ent"), Selector::parse(".title a"))
    else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .filter_map(|row| {
            let anchor = row.select(&title_selector).next()?;
            let href = anchor.value().attr("href")?;
            let link = resolve_link(href, base_url)?;
            let title = anchor.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                return None;
            }
            Some(ArticleStub { title, link })
        })
        .collect()
}
