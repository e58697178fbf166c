//! Storage module for persisting harvested articles
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Deduplicated article insertion keyed on the article link
//! - Comment batches tied to their article with cascading deletes
//! - Run tracking for each traversal

mod gateway;
mod schema;
mod sqlite;
mod traits;

pub use gateway::{PersistenceGateway, SkipReason, StoreOutcome};
pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::HarvestError;
use chrono::NaiveDateTime;
use std::path::Path;

/// Format used for article timestamps in the database
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// An article ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub timestamp: NaiveDateTime,
    pub board: String,
    pub title: String,
    pub content: String,
    pub link: String,
}

/// A push comment ready to be written
///
/// Every field is free text as displayed on the page; missing fields are
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewComment {
    /// Reaction marker (推 / 噓 / →)
    pub tag: String,
    pub user_id: String,
    pub content: String,
    /// Display timestamp, kept unparsed
    pub raw_time: String,
}

/// Represents an article in the database
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: i64,
    pub timestamp: Option<NaiveDateTime>,
    pub board: String,
    pub title: String,
    pub content: String,
    pub link: String,
}

/// Represents a comment in the database
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: i64,
    pub article_id: i64,
    pub tag: String,
    pub user_id: String,
    pub content: String,
    pub raw_time: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub mode: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
