//! Traversal coordinator - main crawl orchestration logic
//!
//! This module contains the crawl-to-persist cycle shared by every traversal
//! mode:
//! - Locating the newest page of a board (latest-page mode)
//! - Fetching a listing page and extracting its article stubs
//! - Fetching each article and handing it to the persistence gateway
//! - Pausing between pages and between polling cycles
//!
//! Everything runs sequentially in one flow of control. Articles are
//! persisted in listing order and pages are visited in strict index order.

use crate::config::Config;
use crate::crawler::article::fetch_article;
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::listing::parse_listing;
use crate::crawler::locator::latest_page;
use crate::crawler::mode::{page_sequence, BoardRange, TraversalMode};
use crate::crawler::throttle::RateLimiter;
use crate::crawler::time::TimeSource;
use crate::state::TraversalState;
use crate::storage::{
    NewArticle, PersistenceGateway, RunStatus, SkipReason, SqliteStorage, Storage, StoreOutcome,
};
use crate::url::board_page_url;
use crate::{ConfigError, HarvestError};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// What happened on one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    pub board: String,
    pub page: u32,
    /// Article stubs found on the listing
    pub stubs: usize,
    pub stored: usize,
    pub duplicates: usize,
    /// Articles whose page could not be fetched
    pub fetch_failures: usize,
    /// Articles whose insert failed for a reason other than a duplicate link
    pub store_failures: usize,
    pub comments_saved: usize,
}

/// What happened on one board during a traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardReport {
    pub board: String,
    pub pages: Vec<PageReport>,
    /// The board was abandoned early (listing failure or no locatable page)
    pub aborted: bool,
}

impl BoardReport {
    fn new(board: &str) -> Self {
        Self {
            board: board.to_string(),
            ..Self::default()
        }
    }

    /// Page indices in the order they were visited
    pub fn pages_visited(&self) -> Vec<u32> {
        self.pages.iter().map(|p| p.page).collect()
    }

    pub fn articles_stored(&self) -> usize {
        self.pages.iter().map(|p| p.stored).sum()
    }
}

/// Main traversal controller
pub struct Coordinator<S: Storage> {
    config: Config,
    config_hash: String,
    client: Client,
    gateway: PersistenceGateway<S>,
    limiter: RateLimiter,
    state: TraversalState,
}

impl Coordinator<SqliteStorage> {
    /// Creates a coordinator backed by the configured SQLite database
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `config_hash` - Hash of the configuration file, stored with each run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Failed to open storage or build the HTTP client
    pub fn new(config: Config, config_hash: impl Into<String>) -> Result<Self, HarvestError> {
        let storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
        Self::with_storage(config, config_hash, storage)
    }
}

impl<S: Storage> Coordinator<S> {
    /// Creates a coordinator over an already opened storage backend
    pub fn with_storage(
        config: Config,
        config_hash: impl Into<String>,
        storage: S,
    ) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.crawler)?;
        let limiter = RateLimiter::new(config.crawler.page_delay());

        Ok(Self {
            config,
            config_hash: config_hash.into(),
            client,
            gateway: PersistenceGateway::new(storage),
            limiter,
            state: TraversalState::Idle,
        })
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn into_storage(self) -> S {
        self.gateway.into_storage()
    }

    /// Runs a traversal in the given mode and records it as a run
    ///
    /// Range and batch modes return once every page has been visited.
    /// Latest-page mode returns only after `max_cycles` cycles, or with an
    /// error on a fatal fault.
    pub async fn run(&mut self, mode: &TraversalMode) -> Result<Vec<BoardReport>, HarvestError> {
        let run_id = match self
            .gateway
            .storage_mut()
            .create_run(mode.name(), &self.config_hash)
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Could not record run start: {}", e);
                None
            }
        };

        tracing::info!("Starting {} traversal", mode.name());

        let result = match mode {
            TraversalMode::BoundedRange(range) => self
                .run_bounded(&range.board, range.start_page, range.end_page)
                .await
                .map(|report| vec![report]),
            TraversalMode::LatestPage {
                boards,
                poll_interval,
                max_cycles,
            } => self.run_latest(boards, *poll_interval, *max_cycles).await,
            TraversalMode::MultiBoard(ranges) => self.run_multi_board(ranges).await,
        };

        if let Some(run_id) = run_id {
            let status = if result.is_ok() {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            };
            if let Err(e) = self.gateway.storage_mut().finish_run(run_id, status) {
                tracing::warn!("Could not record run {} end: {}", run_id, e);
            }
        }

        result
    }

    /// Visits every page of a board from `start_page` through `end_page`
    ///
    /// A listing page that cannot be fetched ends the board; the report is
    /// marked `aborted` and no error is returned.
    pub async fn run_bounded(
        &mut self,
        board: &str,
        start_page: u32,
        end_page: u32,
    ) -> Result<BoardReport, HarvestError> {
        self.begin()?;

        let total_pages = start_page.abs_diff(end_page) + 1;
        let mut report = BoardReport::new(board);

        tracing::info!(
            "Start crawling board={}, from index{} to index{}",
            board,
            start_page,
            end_page
        );

        for (n, page) in page_sequence(start_page, end_page).enumerate() {
            let processed = n as u32 + 1;
            tracing::info!(
                "[{}] Processing page {}, progress: {}/{} ({:.1}%)",
                board,
                page,
                processed,
                total_pages,
                processed as f64 / total_pages as f64 * 100.0
            );

            match self.crawl_page(board, page).await {
                Ok(page_report) => report.pages.push(page_report),
                Err(e) if e.is_skippable() => {
                    tracing::error!("[{}] Aborting board at page {}: {}", board, page, e);
                    report.aborted = true;
                    break;
                }
                Err(e) => return Err(e),
            }

            self.transition(TraversalState::Sleeping)?;
            self.limiter.wait().await;
        }

        self.transition(TraversalState::Done)?;

        tracing::info!(
            "Crawling {} finished: {} pages, {} articles stored",
            board,
            report.pages.len(),
            report.articles_stored()
        );

        Ok(report)
    }

    /// Runs `run_bounded` for each board in order
    ///
    /// One board being aborted never stops the boards after it.
    pub async fn run_multi_board(
        &mut self,
        ranges: &[BoardRange],
    ) -> Result<Vec<BoardReport>, HarvestError> {
        let mut reports = Vec::with_capacity(ranges.len());
        for range in ranges {
            let report = self
                .run_bounded(&range.board, range.start_page, range.end_page)
                .await?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Crawls the newest page of every board once
    ///
    /// Boards whose newest page cannot be located are skipped for this cycle
    /// and reported as aborted.
    pub async fn run_latest_cycle(
        &mut self,
        boards: &[String],
    ) -> Result<Vec<BoardReport>, HarvestError> {
        self.begin()?;

        let mut reports = Vec::with_capacity(boards.len());
        for board in boards {
            self.transition(TraversalState::LocatingPage)?;
            let mut report = BoardReport::new(board);

            let Some(page) = latest_page(&self.client, &self.config.crawler.base_url, board).await
            else {
                tracing::error!("[{}] Could not determine latest page, skipping", board);
                report.aborted = true;
                reports.push(report);
                continue;
            };

            tracing::info!("[{}] Crawling latest page: {}", board, page);
            match self.crawl_page(board, page).await {
                Ok(page_report) => report.pages.push(page_report),
                Err(e) if e.is_skippable() => {
                    tracing::error!("[{}] Latest page {} failed: {}", board, page, e);
                    report.aborted = true;
                }
                Err(e) => return Err(e),
            }
            reports.push(report);
        }

        Ok(reports)
    }

    /// Polls the newest page of every board, sleeping between cycles
    ///
    /// With `max_cycles` unset this only returns on a fatal fault.
    pub async fn run_latest(
        &mut self,
        boards: &[String],
        poll_interval: Duration,
        max_cycles: Option<u64>,
    ) -> Result<Vec<BoardReport>, HarvestError> {
        if boards.is_empty() {
            return Err(ConfigError::Validation("latest mode needs at least one board".to_string()).into());
        }

        let mut reports = Vec::new();
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;
            reports.extend(self.run_latest_cycle(boards).await?);

            if max_cycles.is_some_and(|max| cycle >= max) {
                self.transition(TraversalState::Done)?;
                return Ok(reports);
            }

            self.transition(TraversalState::Sleeping)?;
            tracing::info!("Sleeping for {:?} before next crawl...", poll_interval);
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Crawls one listing page: every stub is fetched and then stored before
    /// the next one is touched
    ///
    /// # Errors
    ///
    /// A `Transport` fault if the listing itself cannot be fetched. Failures
    /// of individual articles are counted in the report instead.
    pub async fn crawl_page(&mut self, board: &str, page: u32) -> Result<PageReport, HarvestError> {
        self.transition(TraversalState::FetchingListing)?;

        let listing_url = board_page_url(&self.config.crawler.base_url, board, page);
        let mut report = PageReport {
            board: board.to_string(),
            page,
            ..PageReport::default()
        };

        let html = match fetch_page(&self.client, &listing_url).await {
            Ok(html) => html,
            Err(e) => {
                self.transition(TraversalState::Advancing)?;
                return Err(e);
            }
        };

        let base = Url::parse(&listing_url)?;
        let stubs = parse_listing(&html, &base);
        report.stubs = stubs.len();
        tracing::debug!("[{}] Page {} lists {} articles", board, page, stubs.len());

        for stub in stubs {
            self.transition(TraversalState::FetchingArticle)?;

            let fetched = match fetch_article(&self.client, &stub.link).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    tracing::error!("Fetching content failed: {}", e);
                    report.fetch_failures += 1;
                    continue;
                }
            };

            if fetched.time.source == TimeSource::Fallback {
                tracing::debug!("No usable publication time for {}, stored as now", stub.link);
            }

            self.transition(TraversalState::Persisting)?;
            let article = NewArticle {
                timestamp: fetched.time.timestamp,
                board: board.to_string(),
                title: stub.title,
                content: fetched.content,
                link: stub.link,
            };

            match self.gateway.store(&article, &fetched.comments) {
                StoreOutcome::Stored { comments_saved, .. } => {
                    report.stored += 1;
                    report.comments_saved += comments_saved;
                }
                StoreOutcome::Skipped(SkipReason::Duplicate) => report.duplicates += 1,
                StoreOutcome::Skipped(SkipReason::Failed) => report.store_failures += 1,
            }
        }

        self.transition(TraversalState::Advancing)?;

        tracing::info!(
            "[{}] Finished crawling page {}: {} stored, {} duplicates, {} failed",
            board,
            page,
            report.stored,
            report.duplicates,
            report.fetch_failures + report.store_failures
        );

        Ok(report)
    }

    /// Returns to `Idle` if the previous traversal finished
    fn begin(&mut self) -> Result<(), HarvestError> {
        if self.state == TraversalState::Done {
            self.transition(TraversalState::Idle)?;
        }
        Ok(())
    }

    fn transition(&mut self, next: TraversalState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Traversal state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn create_test_config() -> Config {
        parse_config(
            r#"
[crawler]
base-url = "http://127.0.0.1:9"
page-delay = 0
request-timeout = 1

[storage]
database-path = ":memory:"

[[board]]
name = "NBA"
start-page = 3
end-page = 1
"#,
        )
        .unwrap()
    }

    fn coordinator() -> Coordinator<SqliteStorage> {
        Coordinator::with_storage(
            create_test_config(),
            "hash",
            SqliteStorage::new_in_memory().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_coordinator_starts_idle() {
        assert_eq!(coordinator().state(), TraversalState::Idle);
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut coordinator = coordinator();
        let err = coordinator
            .transition(TraversalState::Persisting)
            .unwrap_err();
        assert!(matches!(
            err,
            HarvestError::InvalidTransition {
                from: TraversalState::Idle,
                to: TraversalState::Persisting,
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_listing_aborts_board() {
        let mut coordinator = coordinator();
        let report = coordinator.run_bounded("NBA", 3, 1).await.unwrap();

        assert!(report.aborted);
        assert!(report.pages.is_empty());
        assert_eq!(coordinator.state(), TraversalState::Done);
    }

    #[tokio::test]
    async fn test_run_records_completed_run() {
        let mut coordinator = coordinator();
        let mode = TraversalMode::BoundedRange(BoardRange {
            board: "NBA".to_string(),
            start_page: 1,
            end_page: 1,
        });

        let reports = coordinator.run(&mode).await.unwrap();
        assert_eq!(reports.len(), 1);

        let run = coordinator
            .gateway()
            .storage()
            .get_latest_run()
            .unwrap()
            .unwrap();
        assert_eq!(run.mode, "range");
        assert_eq!(run.config_hash, "hash");
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_latest_mode_requires_boards() {
        let mut coordinator = coordinator();
        let result = coordinator
            .run_latest(&[], Duration::from_millis(1), Some(1))
            .await;
        assert!(matches!(result, Err(HarvestError::Config(_))));
    }

    #[tokio::test]
    async fn test_unlocatable_board_is_skipped() {
        let mut coordinator = coordinator();
        let boards = vec!["NBA".to_string(), "Stock".to_string()];
        let reports = coordinator
            .run_latest(&boards, Duration::from_millis(1), Some(1))
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.aborted && r.pages.is_empty()));
        assert_eq!(coordinator.state(), TraversalState::Done);
    }
}
