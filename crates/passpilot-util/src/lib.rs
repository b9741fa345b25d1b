//! Shared utilities for PassPilot
//!
//! This crate provides:
//! - ID types (PassId, SchoolId, UserId, TaskId)
//! - Clocks (injectable `now()`, mock time for development)
//! - Error types
//! - Keyed repeat limiting for notifications
//! - Default paths for config and export directories

mod error;
mod ids;
mod paths;
mod rate_limit;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
