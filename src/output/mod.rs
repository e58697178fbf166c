//! Output module for reporting on harvested data
//!
//! This module handles:
//! - Loading totals and per-board counts from storage
//! - Printing them for the `stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
