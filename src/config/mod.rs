//! Configuration module for ptt-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ptt_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Boards configured: {}", config.boards.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BoardEntry, Config, CrawlerConfig, LoggingConfig, StorageConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate_board_name;
