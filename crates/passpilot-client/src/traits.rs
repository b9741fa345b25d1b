//! Pass source traits

use async_trait::async_trait;
use passpilot_api::{Pass, School};
use passpilot_util::SchoolId;
use thiserror::Error;

/// Errors from pass source operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Not authorized to access {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid base URL '{0}'")]
    InvalidUrl(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only access to pass and school records for one organizational scope
#[async_trait]
pub trait PassSource: Send + Sync {
    /// Passes that are currently open for the school
    async fn fetch_active_passes(&self, scope: &SchoolId) -> SourceResult<Vec<Pass>>;

    /// The school record, including plan and trial state
    async fn fetch_school(&self, scope: &SchoolId) -> SourceResult<School>;

    /// All passes for the school, open and closed (used for exports)
    async fn fetch_passes(&self, scope: &SchoolId) -> SourceResult<Vec<Pass>>;
}
