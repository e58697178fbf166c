//! Crawler module for board traversal and article harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed user agent and age-gate cookie
//! - Listing, article and publication-time parsing
//! - Newest-page discovery
//! - Fixed-delay throttling
//! - Traversal coordination across the three modes

mod article;
mod coordinator;
mod fetcher;
mod listing;
mod locator;
mod mode;
mod throttle;
mod time;

pub use article::{fetch_article, parse_article, FetchedArticle};
pub use coordinator::{BoardReport, Coordinator, PageReport};
pub use fetcher::{build_http_client, fetch_page};
pub use listing::{parse_listing, ArticleStub};
pub use locator::{latest_page, latest_page_from_html, PREVIOUS_PAGE_LABEL};
pub use mode::{page_sequence, BoardRange, TraversalMode};
pub use throttle::RateLimiter;
pub use time::{parse_board_time, resolve_time, ResolvedTime, TimeSource, BOARD_TIME_FORMAT};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete traversal against the configured SQLite database
///
/// This is the main entry point for harvesting. It will:
/// 1. Open (or create) the database and its schema
/// 2. Build the HTTP client
/// 3. Walk the boards as `mode` dictates, storing every new article
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the configuration file
/// * `mode` - How to walk the boards
///
/// # Returns
///
/// * `Ok(Vec<BoardReport>)` - Traversal finished
/// * `Err(HarvestError)` - A fatal fault ended the traversal
pub async fn harvest(
    config: Config,
    config_hash: &str,
    mode: &TraversalMode,
) -> Result<Vec<BoardReport>, HarvestError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run(mode).await
}
