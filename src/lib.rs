//! ptt-harvest: an incremental bulletin-board harvester
//!
//! This crate crawls paginated board listings, fetches each article with its
//! threaded push comments, and persists them into SQLite with link-based
//! deduplication and cascading article/comment integrity.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timeout, refused connection or non-2xx status
    #[error("Transport fault for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// An element the parsers depend on was not present
    #[error("Expected element missing: {0}")]
    ParseAbsence(String),

    #[error("Persistence fault: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TraversalState,
        to: state::TraversalState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`HarvestError`]
///
/// The traversal controller decides between skipping the current unit and
/// aborting by kind rather than by call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Transport,
    ParseAbsence,
    DuplicateKey,
    Persistence,
    Fatal,
}

impl HarvestError {
    /// Returns the fault kind of this error
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Transport { .. } | Self::Http(_) => FaultKind::Transport,
            Self::ParseAbsence(_) | Self::UrlParse(_) => FaultKind::ParseAbsence,
            Self::Persistence(e) if e.is_duplicate() => FaultKind::DuplicateKey,
            Self::Persistence(_) | Self::Database(_) => FaultKind::Persistence,
            Self::Config(_) | Self::InvalidTransition { .. } | Self::Io(_) => FaultKind::Fatal,
        }
    }

    /// Returns true if the crawl may continue with the next unit of work
    pub fn is_skippable(&self) -> bool {
        self.kind() != FaultKind::Fatal
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, TraversalMode};
pub use state::TraversalState;
pub use storage::{PersistenceGateway, SqliteStorage, StoreOutcome};
