//! REST API collaborator for PassPilot
//!
//! This crate defines the interface between the monitoring core and the
//! PassPilot REST API. The core only ever sees [`PassSource`]; the HTTP
//! implementation and the in-memory mock live behind it.

mod http;
mod mock;
mod traits;

pub use http::*;
pub use mock::*;
pub use traits::*;
