use serde_json::Value;
use thiserror::Error;

/// Crate-wide error taxonomy. One variant per failure category raised by the
/// pipeline's components; call sites that don't need to match on a specific
/// kind can propagate through the `Anyhow` passthrough instead.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("database error: {0}")]
    Database(String),

    #[error("connector error: {0}")]
    Connector(String),

    #[error("hash error: {0}")]
    Hash(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("module validation error: {0}")]
    ModuleValidation(String),

    #[error("config error: {0}")]
    Config(String),

    /// A quarantine retry attempt that failed in a way the handler judges
    /// worth trying again later, carrying structured detail for the
    /// FailedExtraction row rather than a synthetic `{error_type, message}`.
    #[error("retryable error: {message}")]
    Retryable {
        message: String,
        error_details: Value,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CatalogueError {
    pub fn retryable(message: impl Into<String>, error_details: Value) -> Self {
        Self::Retryable {
            message: message.into(),
            error_details,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogueError>;
