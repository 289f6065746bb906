use thiserror::Error;

/// Failure modes for the LLM client, kept separate from
/// [`catalogue_common::error::CatalogueError`] since only LLM-backed
/// extractors construct one; a deterministic extractor never sees this type.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm config error: {0}")]
    Config(String),

    #[error("llm network error: {0}")]
    Network(String),

    #[error("llm api error: {0}")]
    Api(String),

    #[error("llm response parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        LlmError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
