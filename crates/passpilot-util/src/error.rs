//! Error types for PassPilot

use thiserror::Error;

use crate::SchoolId;

/// Core error type for PassPilot operations
#[derive(Debug, Error)]
pub enum PassPilotError {
    #[error("School not found: {0}")]
    SchoolNotFound(SchoolId),

    #[error("No authenticated scope")]
    NoScope,

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Export error: {0}")]
    ExportError(String),
}

impl PassPilotError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamError(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::ExportError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PassPilotError>;
