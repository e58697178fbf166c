//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `TraversalState`: the phase the traversal controller is in, with the
//!   legal transitions between phases

mod traversal_state;

pub use traversal_state::TraversalState;
