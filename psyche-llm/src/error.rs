//! Generation error types.

use thiserror::Error;

/// Everything that can go wrong talking to the generative-text service.
///
/// None of these reach a turn's caller: the decision stage turns every one of
/// them into the deterministic fallback.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("Generation request failed: {0}")]
    RequestFailed(String),

    /// The response body or text could not be parsed.
    #[error("Failed to parse generation response: {0}")]
    ParseError(String),

    /// Parsed, but missing required fields.
    #[error("Generation output schema validation failed: {0}")]
    SchemaValidation(String),

    /// Request timed out.
    #[error("Generation request timed out after {0}ms")]
    Timeout(u64),

    /// Provider is unavailable or not configured.
    #[error("Generation provider unavailable: {0}")]
    Unavailable(String),

    /// All retry attempts exhausted.
    #[error("All generation attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// The last failure seen.
        last_error: String,
    },

    /// Configuration error.
    #[error("Generation configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, LlmError>;
