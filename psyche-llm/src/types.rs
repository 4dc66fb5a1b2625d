//! Request and response types.

use serde::{Deserialize, Serialize};

/// One generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// System prompt: persona, style guidance, output rules.
    pub system: String,
    /// User prompt: the turn's situation and message.
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional GBNF grammar for structured output.
    pub grammar: Option<String>,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl GenerationRequest {
    /// A request with the default limits (256 tokens, T = 0.7, 5 s).
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 256,
            temperature: 0.7,
            grammar: None,
            timeout_ms: 5000,
        }
    }

    /// Set a GBNF grammar for structured output.
    #[must_use]
    pub fn with_grammar(mut self, grammar: impl Into<String>) -> Self {
        self.grammar = Some(grammar.into());
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the token cap and sampling temperature.
    #[must_use]
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// Raw text back from a provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationResponse {
    /// The generated text.
    pub text: String,
    /// Tokens generated, when the provider reports it.
    pub tokens_generated: u32,
    /// Wall-clock latency of the successful attempt.
    pub latency_ms: u64,
    /// Model that answered.
    pub model: String,
}

/// The structured reply the decision stage asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredOutput {
    /// In-character output: actions and sounds.
    pub stylized_output: String,
    /// Plain-language rendering, when the model offered one.
    #[serde(default)]
    pub human_translation: Option<String>,
}
