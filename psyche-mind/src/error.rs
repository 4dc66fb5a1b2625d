//! Orchestrator error types.

use psyche_core::PsycheError;
use psyche_core::types::AgentId;
use thiserror::Error;

/// Errors surfaced to callers of the turn pipeline and registry.
///
/// Generation failures never appear here; they become degraded turns.
#[derive(Debug, Error)]
pub enum MindError {
    /// Malformed request; the turn never started.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Engine or state error from the core.
    #[error(transparent)]
    Core(#[from] PsycheError),

    /// No agent registered under this id.
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    /// An agent with this id is already registered.
    #[error("Agent already registered: {0}")]
    AgentExists(AgentId),

    /// The turn limiter was shut down.
    #[error("Turn concurrency limiter is closed")]
    ConcurrencyClosed,

    /// Runtime configuration error (generator setup, limits).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MindError>;
