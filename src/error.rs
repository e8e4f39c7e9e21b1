//! Error types for the execution analysis engine

use thiserror::Error;

use crate::schema::LogValidationError;

/// Errors that can occur while ingesting, analyzing or rendering a week
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Execution score undefined: {0}")]
    DivisionUndefined(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse activity log: {0}")]
    ParseError(String),

    #[error("Invalid daily log: {0}")]
    InvalidLog(#[from] LogValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rendering error: {0}")]
    RenderError(String),
}

impl AuditError {
    pub(crate) fn invalid_record(index: usize, reason: impl Into<String>) -> Self {
        AuditError::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }
}
