//! Traversal modes
//!
//! All modes share one crawl-to-persist cycle; they differ in how the next
//! page index is chosen and when the traversal ends.

use crate::config::Config;
use crate::ConfigError;
use std::time::Duration;

/// A board together with the inclusive page range to visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRange {
    pub board: String,
    pub start_page: u32,
    pub end_page: u32,
}

/// How the traversal controller walks the boards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalMode {
    /// One board, every page from `start_page` through `end_page`
    BoundedRange(BoardRange),

    /// The newest page of every board, repeated after `poll_interval`
    LatestPage {
        boards: Vec<String>,
        poll_interval: Duration,
        /// Stop after this many cycles; `None` polls forever
        max_cycles: Option<u64>,
    },

    /// `BoundedRange` once per board, in order
    MultiBoard(Vec<BoardRange>),
}

impl TraversalMode {
    /// Returns a short name, stored with each run
    pub fn name(&self) -> &'static str {
        match self {
            Self::BoundedRange(_) => "range",
            Self::LatestPage { .. } => "latest",
            Self::MultiBoard(_) => "batch",
        }
    }

    /// Builds latest-page mode over every configured board
    pub fn latest_from_config(config: &Config, max_cycles: Option<u64>) -> Self {
        Self::LatestPage {
            boards: config.boards.iter().map(|b| b.name.clone()).collect(),
            poll_interval: config.crawler.poll_interval(),
            max_cycles,
        }
    }

    /// Builds multi-board mode from the configured board ranges
    ///
    /// # Errors
    ///
    /// `ConfigError::Validation` if any board has no page range.
    pub fn batch_from_config(config: &Config) -> Result<Self, ConfigError> {
        let ranges = config
            .boards
            .iter()
            .map(|entry| {
                let (start_page, end_page) = entry.range().ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "Board '{}' needs start-page and end-page for batch mode",
                        entry.name
                    ))
                })?;
                Ok(BoardRange {
                    board: entry.name.clone(),
                    start_page,
                    end_page,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self::MultiBoard(ranges))
    }
}

/// Yields page indices from `start` to `end` inclusive, stepping by -1 or +1
///
/// # Example
///
/// ```
/// use ptt_harvest::crawler::page_sequence;
///
/// assert_eq!(page_sequence(10, 7).collect::<Vec<_>>(), vec![10, 9, 8, 7]);
/// assert_eq!(page_sequence(3, 5).collect::<Vec<_>>(), vec![3, 4, 5]);
/// ```
pub fn page_sequence(start: u32, end: u32) -> impl Iterator<Item = u32> {
    let descending = start > end;
    std::iter::successors(Some(start), move |&page| {
        if page == end {
            None
        } else if descending {
            Some(page - 1)
        } else {
            Some(page + 1)
        }
    })
}
