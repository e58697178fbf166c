//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ArticleRecord, CommentRecord, NewArticle, NewComment, RunRecord, RunStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The article link is already stored
    #[error("Duplicate article link: {link}")]
    Duplicate { link: String },

    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Returns true if this error is the expected link conflict
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Each write is its own unit of work: implementations must either commit it
/// completely or leave the store untouched.
pub trait Storage {
    // ===== Articles =====

    /// Inserts an article and returns its generated ID
    ///
    /// Returns `StorageError::Duplicate` if an article with the same link is
    /// already stored; nothing is written in that case.
    fn insert_article(&mut self, article: &NewArticle) -> StorageResult<i64>;

    /// Gets an article by ID
    fn get_article(&self, article_id: i64) -> StorageResult<ArticleRecord>;

    /// Gets an article by its link
    fn get_article_by_link(&self, link: &str) -> StorageResult<Option<ArticleRecord>>;

    /// Deletes an article together with all of its comments
    ///
    /// Returns false if no such article existed.
    fn delete_article(&mut self, article_id: i64) -> StorageResult<bool>;

    // ===== Comments =====

    /// Inserts a batch of comments for one article, all or nothing
    ///
    /// Returns the number of comments written.
    fn insert_comments(&mut self, article_id: i64, comments: &[NewComment])
        -> StorageResult<usize>;

    /// Gets the comments of an article in insertion order
    fn get_comments(&self, article_id: i64) -> StorageResult<Vec<CommentRecord>>;

    // ===== Runs =====

    /// Records the start of a traversal run
    fn create_run(&mut self, mode: &str, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as finished with the given status
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Statistics =====

    /// Gets total article count
    fn count_articles(&self) -> StorageResult<u64>;

    /// Gets total comment count
    fn count_comments(&self) -> StorageResult<u64>;

    /// Gets article count per board, sorted by board name
    fn count_articles_by_board(&self) -> StorageResult<BTreeMap<String, u64>>;
}
