//! Error types for the psyche core library.

use thiserror::Error;

/// Top-level error type for all psyche-core operations.
#[derive(Error, Debug)]
pub enum PsycheError {
    /// Malformed or missing input, rejected before any state is touched.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Trait, context or weight dimensions disagree with the configured sizes.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which vector or matrix was wrong.
        what: &'static str,
        /// Configured length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// No archetype with this id exists in the table.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// An archetype blend was requested with zero total weight.
    #[error("Archetype blend has zero total weight")]
    EmptyBlend,

    /// A trait name is not part of the catalog.
    #[error("Unknown trait: {0}")]
    UnknownTrait(String),

    /// An action style is not part of the configured style list.
    #[error("Unknown action style: {0}")]
    UnknownActionStyle(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PsycheError {
    fn from(err: serde_json::Error) -> Self {
        PsycheError::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PsycheError>;

/// Fail with [`PsycheError::DimensionMismatch`] unless `actual == expected`.
///
/// # Errors
/// Returns `DimensionMismatch` naming `what` when the lengths differ.
pub fn ensure_dim(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PsycheError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
