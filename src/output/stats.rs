//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::HarvestError;
use std::collections::BTreeMap;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    pub total_articles: u64,

    pub total_comments: u64,

    /// Article count per board, sorted by board name
    pub articles_by_board: BTreeMap<String, u64>,

    /// The most recent traversal run, if any
    pub latest_run: Option<RunRecord>,
}

impl HarvestStatistics {
    /// Average number of comments per article
    pub fn comments_per_article(&self) -> f64 {
        if self.total_articles == 0 {
            0.0
        } else {
            self.total_comments as f64 / self.total_articles as f64
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, HarvestError> {
    Ok(HarvestStatistics {
        total_articles: storage.count_articles()?,
        total_comments: storage.count_comments()?,
        articles_by_board: storage.count_articles_by_board()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Articles: {}", stats.total_articles);
    println!("  Comments: {}", stats.total_comments);
    println!("  Comments per article: {:.1}", stats.comments_per_article());
    println!();

    if !stats.articles_by_board.is_empty() {
        println!("Articles by Board:");
        for (board, count) in &stats.articles_by_board {
            let percentage = (*count as f64 / stats.total_articles as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", board, count, percentage);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  #{} ({}), {}", run.id, run.mode, run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
        }
        None => println!("No runs recorded yet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewArticle, NewComment, SqliteStorage};
    use chrono::NaiveDate;

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let timestamp = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        for (board, link) in [("NBA", "https://x/1"), ("NBA", "https://x/2"), ("Stock", "https://x/3")] {
            let id = storage
                .insert_article(&NewArticle {
                    timestamp,
                    board: board.to_string(),
                    title: "t".to_string(),
                    content: "c".to_string(),
                    link: link.to_string(),
                })
                .unwrap();
            storage
                .insert_comments(id, &[NewComment::default(), NewComment::default()])
                .unwrap();
        }
        storage.create_run("batch", "hash").unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_articles, 3);
        assert_eq!(stats.total_comments, 6);
        assert_eq!(stats.articles_by_board.get("NBA"), Some(&2));
        assert_eq!(stats.comments_per_article(), 2.0);
        assert_eq!(stats.latest_run.unwrap().mode, "batch");
    }

    #[test]
    fn test_empty_statistics() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_articles, 0);
        assert_eq!(stats.comments_per_article(), 0.0);
        assert!(stats.latest_run.is_none());
    }
}
