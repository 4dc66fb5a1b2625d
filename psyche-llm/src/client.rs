//! HTTP client for Ollama and OpenAI-compatible backends.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{LlmError, Result};
use crate::generator::TextGenerator;
use crate::types::{GenerationRequest, GenerationResponse};

/// Pause before retry `n` is `n * RETRY_BACKOFF_MS`.
const RETRY_BACKOFF_MS: u64 = 100;

/// Provider backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    /// Ollama's `/api/generate`.
    Ollama {
        /// e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// Any `/v1/chat/completions` endpoint.
    OpenAiCompatible {
        /// API root without the `/v1` suffix.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No backend: every call fails, so every turn takes the fallback.
    None,
}

impl LlmProvider {
    /// Build a provider from its configured name.
    ///
    /// # Errors
    /// Returns `LlmError::ConfigError` for an unknown provider name or an
    /// OpenAI-compatible provider without an API key.
    pub fn from_name(name: &str, base_url: &str, api_key: Option<String>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        match name.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama { base_url }),
            "openai" | "openai_compatible" => {
                let api_key = api_key.ok_or_else(|| {
                    LlmError::ConfigError("openai provider requires an API key".into())
                })?;
                Ok(Self::OpenAiCompatible { base_url, api_key })
            }
            "none" | "" => Ok(Self::None),
            other => Err(LlmError::ConfigError(format!("unknown provider '{other}'"))),
        }
    }
}

/// Routes requests to the configured backend, with retries.
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// A client with no backend.
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Configured provider.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    fn ollama_body(&self, request: &GenerationRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "system": request.system,
            "prompt": request.user,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });
        if let Some(grammar) = &request.grammar {
            body["options"]["grammar"] = json!(grammar);
        } else {
            body["format"] = json!("json");
        }
        body
    }

    fn openai_body(&self, request: &GenerationRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "response_format": { "type": "json_object" },
        })
    }

    /// POST `body` until it succeeds or the retries run out, then pull the
    /// text and token count out with `extract`.
    async fn post_with_retries(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &Value,
        timeout_ms: u64,
        extract: fn(&Value) -> (Option<&str>, u64),
    ) -> Result<GenerationResponse> {
        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    attempt = attempt + 1,
                    of = self.max_retries + 1,
                    "Retrying generation call"
                );
                let backoff = Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let mut builder = self
                .http
                .post(url)
                .json(body)
                .timeout(Duration::from_millis(timeout_ms));
            if let Some(token) = bearer {
                builder = builder.bearer_auth(token);
            }
            let result = builder.send().await;
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let json: Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;
                    let (text, tokens) = extract(&json);
                    let text = text.ok_or_else(|| {
                        LlmError::SchemaValidation("provider reply carries no text".into())
                    })?;
                    return Ok(GenerationResponse {
                        text: text.to_string(),
                        tokens_generated: u32::try_from(tokens).unwrap_or(u32::MAX),
                        latency_ms,
                        model: self.model.clone(),
                    });
                }
                Ok(resp) => {
                    last_error = format!("HTTP {}", resp.status());
                    warn!(url, error = %last_error, "Generation provider returned an error");
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!(url, timeout_ms, "Generation request timed out");
                    } else {
                        warn!(url, error = %last_error, "Generation request failed");
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

fn ollama_text(json: &Value) -> (Option<&str>, u64) {
    (json["response"].as_str(), json["eval_count"].as_u64().unwrap_or(0))
}

fn openai_text(json: &Value) -> (Option<&str>, u64) {
    (
        json["choices"][0]["message"]["content"].as_str(),
        json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
    )
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable(
                "no generation provider configured".into(),
            )),
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/generate");
                let body = self.ollama_body(request);
                self.post_with_retries(&url, None, &body, request.timeout_ms, ollama_text)
                    .await
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                self.post_with_retries(
                    &url,
                    Some(api_key),
                    &self.openai_body(request),
                    request.timeout_ms,
                    openai_text,
                )
                .await
            }
        }
    }

    fn name(&self) -> &str {
        match self.provider {
            LlmProvider::Ollama { .. } => "ollama",
            LlmProvider::OpenAiCompatible { .. } => "openai",
            LlmProvider::None => "none",
        }
    }

    fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }
}
