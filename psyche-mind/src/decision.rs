//! Decision composition: the one awaited call of a turn.
//!
//! The generator runs under a global concurrency permit and a deadline. Any
//! failure, timeout or unparseable reply is replaced by a deterministic
//! fallback built from the agent profile and the chosen style, and the
//! result is flagged as degraded.

use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

use psyche_core::translation::{AgentProfile, apply_state_modifiers};
use psyche_core::types::Stats;
use psyche_core::utility::StyleDef;
use psyche_llm::{GenerationRequest, StructuredOutput, TextGenerator, parse_structured_response};

use crate::error::{MindError, Result};

/// What the decision stage settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Generated or fallback output.
    pub output: StructuredOutput,
    /// Whether the fallback was used.
    pub degraded: bool,
    /// Reason for the fallback.
    pub failure: Option<String>,
    /// Time spent waiting for capacity and generation.
    pub elapsed_ms: u64,
}

/// Energy assumed when an agent has no `energy` stat.
pub const DEFAULT_ENERGY: f64 = 50.0;

/// Deterministic output for when generation is unavailable: the profile's
/// vocalisation for this emotion and energy, then the style's fallback line,
/// adjusted for the agent's stats.
#[must_use]
pub fn fallback_output(
    profile: Option<&AgentProfile>,
    style: Option<&StyleDef>,
    emotion: &str,
    stats: &Stats,
) -> StructuredOutput {
    let energy = stats.get("energy").unwrap_or(DEFAULT_ENERGY);
    let sound = profile.map_or("*quiet sound*", |p| p.vocalization(emotion, energy));
    let line = style.map_or("", |s| s.fallback_output.trim());
    let combined = if line.is_empty() {
        sound.to_string()
    } else {
        format!("{sound} {line}")
    };
    let stylized_output = apply_state_modifiers(&combined, stats);
    let human_translation = style
        .map(|s| s.fallback_translation.trim().to_string())
        .filter(|t| !t.is_empty());
    StructuredOutput {
        stylized_output,
        human_translation,
    }
}

/// Run the generator under `permits` and `deadline`, falling back on any
/// failure.
///
/// # Errors
/// Only `MindError::ConcurrencyClosed`, when the permit pool was closed.
pub async fn compose(
    generator: &dyn TextGenerator,
    permits: &Semaphore,
    request: &GenerationRequest,
    deadline: Duration,
    fallback: StructuredOutput,
) -> Result<Decision> {
    let start = Instant::now();
    let degraded = |reason: String| {
        warn!(generator = generator.name(), reason = %reason, "Generation failed, using fallback");
        Decision {
            output: fallback.clone(),
            degraded: true,
            failure: Some(reason),
            elapsed_ms: elapsed_ms(start),
        }
    };

    if !generator.is_available() {
        return Ok(degraded(format!("generator '{}' is unavailable", generator.name())));
    }

    let call = async {
        let _permit = permits.acquire().await.map_err(|_| MindError::ConcurrencyClosed)?;
        Ok::<_, MindError>(generator.generate(request).await)
    };

    let decision = match tokio::time::timeout(deadline, call).await {
        Err(_) => degraded(format!("generation timed out after {}ms", deadline.as_millis())),
        Ok(Err(e)) => return Err(e),
        Ok(Ok(Err(e))) => degraded(e.to_string()),
        Ok(Ok(Ok(response))) => match parse_structured_response(&response.text) {
            Ok(output) => {
                debug!(
                    model = %response.model,
                    tokens = response.tokens_generated,
                    latency_ms = response.latency_ms,
                    "Generation succeeded"
                );
                Decision {
                    output,
                    degraded: false,
                    failure: None,
                    elapsed_ms: elapsed_ms(start),
                }
            }
            Err(e) => degraded(e.to_string()),
        },
    };
    Ok(decision)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use psyche_llm::{GenerationResponse, LlmClient, LlmError};

    struct Fixed(&'static str);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> psyche_llm::error::Result<GenerationResponse> {
            Ok(GenerationResponse {
                text: self.0.to_string(),
                tokens_generated: 4,
                latency_ms: 1,
                model: "fixed".into(),
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> psyche_llm::error::Result<GenerationResponse> {
            Err(LlmError::RequestFailed("boom".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn fallback() -> StructuredOutput {
        StructuredOutput {
            stylized_output: "*soft huff*".into(),
            human_translation: Some("I'm here.".into()),
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("s", "u")
    }

    #[tokio::test]
    async fn parsed_reply_is_not_degraded() {
        let permits = Semaphore::new(1);
        let generator = Fixed(r#"{"stylized_output": "*wag*", "human_translation": "hi"}"#);
        let d = compose(&generator, &permits, &request(), Duration::from_secs(1), fallback())
            .await
            .unwrap();
        assert!(!d.degraded);
        assert_eq!(d.output.stylized_output, "*wag*");
    }

    #[tokio::test]
    async fn garbage_reply_falls_back() {
        let permits = Semaphore::new(1);
        let garbage = Fixed("woof woof");
        let d = compose(&garbage, &permits, &request(), Duration::from_secs(1), fallback())
            .await
            .unwrap();
        assert!(d.degraded);
        assert_eq!(d.output, fallback());
    }

    #[tokio::test]
    async fn provider_error_falls_back() {
        let permits = Semaphore::new(1);
        let d = compose(&Failing, &permits, &request(), Duration::from_secs(1), fallback())
            .await
            .unwrap();
        assert!(d.degraded);
        assert!(d.failure.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn unavailable_generator_skips_the_call() {
        let permits = Semaphore::new(1);
        let none = LlmClient::none();
        let d = compose(&none, &permits, &request(), Duration::from_secs(1), fallback())
            .await
            .unwrap();
        assert!(d.degraded);
    }

    #[tokio::test]
    async fn closed_limiter_is_an_error() {
        let permits = Semaphore::new(1);
        permits.close();
        let err = compose(&Fixed("{}"), &permits, &request(), Duration::from_secs(1), fallback())
            .await
            .unwrap_err();
        assert!(matches!(err, MindError::ConcurrencyClosed));
    }

    #[test]
    fn fallback_combines_vocalization_and_style_line() {
        let profile = psyche_core::presets::agent_profiles().remove("mammal").unwrap();
        let styles = psyche_core::presets::action_styles();
        let playful = styles.iter().find(|s| s.name == "playful").unwrap();
        let lively = Stats::from([("energy", 90.0), ("happiness", 80.0), ("hunger", 60.0)]);
        let out = fallback_output(Some(&profile), Some(playful), "happy", &lively);
        assert!(out.stylized_output.starts_with("*joyful yip*"));
        assert!(out.stylized_output.len() > "*joyful yip*".len());
        assert_eq!(out.human_translation.as_deref(), Some(playful.fallback_translation.as_str()));

        let bare = fallback_output(None, None, "happy", &Stats::new());
        assert_eq!(bare.stylized_output, "*quiet sound*");
        assert!(bare.human_translation.is_none());
    }

    #[test]
    fn fallback_reflects_a_hungry_unhappy_agent() {
        let profile = psyche_core::presets::agent_profiles().remove("mammal").unwrap();
        let worn = Stats::from([("energy", 10.0), ("happiness", 20.0), ("hunger", 15.0)]);
        let out = fallback_output(Some(&profile), None, "happy", &worn);
        assert_eq!(
            out.stylized_output,
            "*stomach rumbles quietly* *subdued demeanor* *content sound*"
        );
    }
}
