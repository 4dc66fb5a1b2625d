//! # psyche-llm — Generative-Text Collaborator
//!
//! The one external call of a psyche turn goes through this crate:
//!   - **[`TextGenerator`]**: the async seam the decision stage awaits
//!   - **[`LlmClient`]**: HTTP backend for Ollama or any OpenAI-compatible API
//!   - **Prompts**: the decision template plus a GBNF grammar
//!   - **Parsing**: JSON or line-format structured replies
//!
//! Every failure here is recoverable: the caller substitutes a deterministic
//! fallback and marks the turn as degraded.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod response;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use generator::TextGenerator;
pub use response::parse_structured_response;
pub use types::{GenerationRequest, GenerationResponse, StructuredOutput};
