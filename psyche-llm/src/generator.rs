//! The generation seam.
//!
//! [`TextGenerator`] is the only asynchronous dependency of a turn. The HTTP
//! [`LlmClient`](crate::LlmClient) implements it; tests and simulations plug
//! in their own.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GenerationRequest, GenerationResponse};

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a response. Callers treat any error as a reason to fall back.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Short name for logs.
    fn name(&self) -> &str;

    /// Whether a call could possibly succeed. When false the caller skips
    /// straight to its fallback.
    fn is_available(&self) -> bool {
        true
    }
}
