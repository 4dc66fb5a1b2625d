//! End-to-end turns through the runtime with in-process generators.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use psyche_core::PsycheConfig;
use psyche_core::config::PolicyKind;
use psyche_core::context::Familiarity;
use psyche_core::engine::TraitSource;
use psyche_core::evolution::EvolutionTrigger;
use psyche_core::traits::TraitVector;
use psyche_core::types::Stats;
use psyche_llm::error::Result as LlmResult;
use psyche_llm::{GenerationRequest, GenerationResponse, LlmClient, LlmError, TextGenerator};
use psyche_mind::{AgentSpec, MindError, Runtime, TurnRequest};

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Replies with a fixed JSON body and counts calls.
struct Scripted {
    reply: String,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(stylized: &str, translation: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: serde_json::json!({
                "stylized_output": stylized,
                "human_translation": translation,
            })
            .to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, _request: &GenerationRequest) -> LlmResult<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerationResponse {
            text: self.reply.clone(),
            tokens_generated: 12,
            latency_ms: 3,
            model: "scripted".into(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Never answers.
struct Hanging;

#[async_trait]
impl TextGenerator for Hanging {
    async fn generate(&self, _request: &GenerationRequest) -> LlmResult<GenerationResponse> {
        std::future::pending::<()>().await;
        Err(LlmError::Unavailable("unreachable".into()))
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

/// Sleeps, tracking how many calls overlap.
struct Slow {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl TextGenerator for Slow {
    async fn generate(&self, _request: &GenerationRequest) -> LlmResult<GenerationResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(GenerationResponse {
            text: r#"{"stylized_output": "*hum*", "human_translation": null}"#.into(),
            tokens_generated: 2,
            latency_ms: 50,
            model: "slow".into(),
        })
    }

    fn name(&self) -> &str {
        "slow"
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config() -> PsycheConfig {
    let mut config = PsycheConfig::default();
    config.utility.seed = Some(5);
    config.utility.policy = PolicyKind::Deterministic;
    config
}

fn spec(agent_type: &str) -> AgentSpec {
    AgentSpec {
        name: "Pip".into(),
        agent_type: agent_type.into(),
        traits: TraitSource::Archetype("rogers".into()),
    }
}

fn play() -> TurnRequest {
    TurnRequest::new("Want to play fetch?", "play", "excited").with_memory("friend", "")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generated_turn_carries_output_and_debug_info() {
    let generator = Scripted::new("*tail wag* *yip*", "Yes, let's play!");
    let runtime = Runtime::new(config(), generator.clone()).unwrap();
    let id = runtime.create_agent(&spec("mammal")).unwrap();

    let out = runtime.turn(id, &play()).await.unwrap();
    assert_eq!(out.stylized_output, "*tail wag* *yip*");
    assert_eq!(out.human_translation.as_deref(), Some("Yes, let's play!"));
    assert!(out.can_translate);
    assert!(out.translation_hint.is_none());
    assert!(!out.debug_info.degraded);
    assert_eq!(out.debug_info.familiarity, Familiarity::Novel);
    assert_eq!(out.debug_info.utility_scores.len(), 10);
    let total: f64 = out.debug_info.probabilities.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    let json = serde_json::to_value(&out).unwrap();
    assert!(json["debug_info"]["action_style"].is_string());
}

#[tokio::test]
async fn feedback_is_committed_between_turns() {
    let runtime = Runtime::new(config(), Scripted::new("*yip*", "hi")).unwrap();
    let id = runtime.create_agent(&spec("mammal")).unwrap();

    runtime.turn(id, &play()).await.unwrap();
    let second = runtime.turn(id, &play()).await.unwrap();
    assert_eq!(second.debug_info.familiarity, Familiarity::Similar);

    let state = runtime.snapshot(id).await.unwrap();
    assert!(state.last_interaction.is_some());
    assert_eq!(state.emotional_state, second.emotional_state);
    assert!(!state.learning.patterns.is_empty());
    let summary = runtime.learning_summary(id).await.unwrap();
    assert!(summary.total_reinforcements >= 4);
}

#[tokio::test(start_paused = true)]
async fn hanging_generator_degrades_to_fallback() {
    let runtime = Runtime::new(config(), Arc::new(Hanging)).unwrap();
    let id = runtime.create_agent(&spec("mammal")).unwrap();

    let out = runtime.turn(id, &play()).await.unwrap();
    assert!(out.debug_info.degraded);
    assert!(out.debug_info.failure.as_deref().unwrap_or_default().contains("timed out"));
    assert!(!out.stylized_output.is_empty());
    // Fallback translation still passes through the open gate.
    assert!(out.human_translation.is_some());
}

#[tokio::test]
async fn unconfigured_provider_always_falls_back() {
    let runtime = Runtime::new(config(), Arc::new(LlmClient::none())).unwrap();
    let id = runtime.create_agent(&spec("reptile")).unwrap();
    let out = runtime.turn(id, &play()).await.unwrap();
    assert!(out.debug_info.degraded);
    assert!(out.stylized_output.starts_with('*'));
}

#[tokio::test]
async fn closed_gate_withholds_translation_and_explains() {
    let runtime = Runtime::new(config(), Scripted::new("*glow*", "Greetings.")).unwrap();
    let id = runtime.create_agent(&spec("mythical")).unwrap();

    let mut drain = Stats::new();
    drain.set("magical_power", -80.0);
    let stats = runtime.update_stats(id, &drain).await.unwrap();
    assert_eq!(stats.get("magical_power"), Some(10.0));

    let out = runtime.turn(id, &play()).await.unwrap();
    assert_eq!(out.stylized_output, "*glow*");
    assert!(!out.can_translate);
    assert!(out.human_translation.is_none());
    assert!(out.translation_hint.unwrap().contains("magical_power"));
}

#[tokio::test]
async fn malformed_request_leaves_agent_untouched() {
    let generator = Scripted::new("*yip*", "hi");
    let runtime = Runtime::new(config(), generator.clone()).unwrap();
    let id = runtime.create_agent(&spec("mammal")).unwrap();
    let before = runtime.snapshot(id).await.unwrap();

    let err = runtime
        .turn(id, &TurnRequest::new("hello", "", "calm"))
        .await
        .unwrap_err();
    assert!(matches!(err, MindError::Validation(_)));
    assert_eq!(runtime.snapshot(id).await.unwrap(), before);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_agent_is_reported() {
    let runtime = Runtime::new(config(), Arc::new(LlmClient::none())).unwrap();
    let err = runtime
        .turn(psyche_core::types::AgentId::new(), &play())
        .await
        .unwrap_err();
    assert!(matches!(err, MindError::AgentNotFound(_)));
}

#[tokio::test]
async fn zero_concurrency_is_a_config_error() {
    let mut config = config();
    config.performance.max_concurrent_turns = 0;
    let err = Runtime::new(config, Arc::new(LlmClient::none())).unwrap_err();
    assert!(matches!(err, MindError::Config(_)));
}

#[tokio::test]
async fn shutdown_rejects_new_turns() {
    let runtime = Runtime::new(config(), Scripted::new("*yip*", "hi")).unwrap();
    let id = runtime.create_agent(&spec("mammal")).unwrap();
    runtime.shutdown();
    let err = runtime.turn(id, &play()).await.unwrap_err();
    assert!(matches!(err, MindError::ConcurrencyClosed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn generation_respects_global_limit() {
    let mut config = config();
    config.performance.max_concurrent_turns = 2;
    let generator = Arc::new(Slow {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let runtime = Arc::new(Runtime::new(config, generator.clone()).unwrap());

    let mut handles = Vec::new();
    for _ in 0..6 {
        let id = runtime.create_agent(&spec("mammal")).unwrap();
        let rt = Arc::clone(&runtime);
        handles.push(tokio::spawn(async move { rt.turn(id, &play()).await }));
    }
    for h in handles {
        assert!(!h.await.unwrap().unwrap().debug_info.degraded);
    }
    assert!(generator.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_agent_turns_are_serialized() {
    let runtime = Arc::new(Runtime::new(config(), Scripted::new("*yip*", "hi")).unwrap());
    let id = runtime.create_agent(&spec("mammal")).unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let rt = Arc::clone(&runtime);
        handles.push(tokio::spawn(async move { rt.turn(id, &play()).await }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    // Every turn reinforced the same situation; none was lost to a race.
    let state = runtime.snapshot(id).await.unwrap();
    let pattern = state
        .learning
        .patterns
        .iter()
        .find(|p| p.fingerprint.get("tone") == Some("excited"))
        .unwrap();
    assert_eq!(pattern.reinforcement_count, 8);
}

#[tokio::test]
async fn state_operations_round_trip_through_disk() {
    let runtime = Runtime::new(config(), Scripted::new("*yip*", "hi")).unwrap();
    let id = runtime.create_agent(&spec("mammal")).unwrap();
    runtime.turn(id, &play()).await.unwrap();
    assert!(runtime.record_event(id, EvolutionTrigger::Achievement, 0.9).await.unwrap());

    let report = runtime.development_report(id).await.unwrap();
    assert!(report.total_change > 0.0);
    let tendencies = runtime.tendencies(id).await.unwrap();
    assert_eq!(tendencies.preferred.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pip.json");
    runtime.save_agent(id, &path).await.unwrap();
    let saved = runtime.remove(id).await.unwrap();
    assert!(runtime.is_empty());

    let restored = runtime.load_agent(&path).unwrap();
    assert_eq!(restored, id);
    let back = runtime.snapshot(id).await.unwrap();
    assert_eq!(back.name, saved.name);
    assert_eq!(back.evolution.shifts.len(), saved.evolution.shifts.len());
    assert_eq!(back.learning.patterns.len(), saved.learning.patterns.len());
    assert!(matches!(runtime.load_agent(&path), Err(MindError::AgentExists(_))));

    runtime.set_evolution_enabled(id, false).await.unwrap();
    assert!(!runtime.record_event(id, EvolutionTrigger::Failure, -0.5).await.unwrap());
    runtime.reset_evolution(id, true).await.unwrap();
    runtime.set_learning_enabled(id, false).await.unwrap();
    runtime.reset_learning(id, false).await.unwrap();
    let state = runtime.snapshot(id).await.unwrap();
    assert!(state.evolution.shifts.is_empty());
    assert!(state.learning.patterns.is_empty());
    assert!(!state.learning.enabled);
}

async fn two_jittered_agents() -> (TraitVector, TraitVector) {
    let jittered = AgentSpec {
        name: "Pip".into(),
        agent_type: "mammal".into(),
        traits: TraitSource::Descriptors {
            words: vec!["playful".into()],
            jitter: 0.2,
        },
    };
    let runtime = Runtime::new(config(), Arc::new(LlmClient::none())).unwrap();
    let a = runtime.create_agent(&jittered).unwrap();
    let b = runtime.create_agent(&jittered).unwrap();
    (
        runtime.snapshot(a).await.unwrap().base_traits,
        runtime.snapshot(b).await.unwrap().base_traits,
    )
}

#[tokio::test]
async fn seeded_runs_give_each_agent_its_own_jitter() {
    let (first, second) = two_jittered_agents().await;
    assert_ne!(first, second);
    // Same seed, same sequence of agents.
    assert_eq!(two_jittered_agents().await, (first, second));
}
