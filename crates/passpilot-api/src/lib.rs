//! Record types shared across PassPilot
//!
//! This crate defines:
//! - Pass and school records as returned by the REST API
//! - The authenticated session (current user and scope)
//! - Notifications and trial banners produced by the core
//! - The event envelope written by the service
//! - Versioning

mod events;
mod timestamp;
mod types;

pub use events::*;
pub use types::*;

pub mod serde_helpers {
    //! Lenient field codecs for records coming off the wire
    pub use crate::timestamp::{lenient_minutes, lenient_string, lenient_timestamp};
}

/// Current event API version
pub const API_VERSION: u32 = 1;
