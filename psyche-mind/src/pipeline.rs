//! The turn pipeline.
//!
//! Stages run in a fixed order against a snapshot of the agent:
//! perception, emotion, memory, personality, decision, translation. The only
//! await point is the decision stage. Feedback is not applied here; the
//! caller folds [`TurnResult::outcome`] into its own copy of the agent.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use tokio::sync::Semaphore;
use tracing::{Instrument, info, info_span};

use psyche_core::Engine;
use psyche_core::agent::AgentState;
use psyche_core::engine::TurnSignals;
use psyche_llm::TextGenerator;
use psyche_llm::prompt::DecisionPrompt;

use crate::decision::{DEFAULT_ENERGY, compose, fallback_output};
use crate::error::Result;
use crate::feedback::TurnOutcome;
use crate::output::{DebugInfo, TurnOutput};
use crate::stages::{TurnRequest, feel, perceive, remember, translation_gate};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// What the caller sees.
    pub output: TurnOutput,
    /// What the adaptive layers learn from.
    pub outcome: TurnOutcome,
}

/// Run one turn for `agent`.
///
/// # Errors
/// `Validation` for malformed perception, `Core` for a structurally broken
/// agent and `ConcurrencyClosed` if the limiter was shut down. Generation
/// problems never fail the turn.
#[allow(clippy::too_many_arguments)]
pub async fn run_turn(
    engine: &Engine,
    generator: &dyn TextGenerator,
    permits: &Semaphore,
    agent: &AgentState,
    request: &TurnRequest,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Result<TurnResult> {
    let span = info_span!("turn", agent = %agent.id, agent_type = %agent.agent_type);
    run_stages(engine, generator, permits, agent, request, rng, now)
        .instrument(span)
        .await
}

#[allow(clippy::too_many_arguments)]
async fn run_stages(
    engine: &Engine,
    generator: &dyn TextGenerator,
    permits: &Semaphore,
    agent: &AgentState,
    request: &TurnRequest,
    rng: &mut StdRng,
    now: DateTime<Utc>,
) -> Result<TurnResult> {
    let perceived = perceive(&request.perception)?;
    let appraisal = feel(engine, &perceived, &agent.emotional_state);
    let memory = remember(engine, &agent.learning, &perceived, &request.memory);

    let personality = engine.personality_stage(
        agent,
        &TurnSignals {
            intent: &perceived.intent,
            tone: &perceived.tone,
            relationship: &memory.relationship,
            familiarity: memory.familiarity,
            emotion: &appraisal.state,
        },
        now,
        rng,
    )?;
    let style = personality.selection.style.as_str();
    let guidance = engine.utility().guidance(style);
    let profile = engine.profile(&agent.agent_type);
    let energy = agent.stats.get("energy").unwrap_or(DEFAULT_ENERGY);

    let prompt = DecisionPrompt {
        agent_name: agent.name.clone(),
        agent_type: agent.agent_type.clone(),
        top_traits: personality.top_traits.clone(),
        emotion: appraisal.state.label.clone(),
        intensity: appraisal.state.intensity,
        action_style: style.to_string(),
        style_description: guidance.map(|g| g.description.clone()).unwrap_or_default(),
        behavior_tags: guidance.map(|g| g.behavior_tags.clone()).unwrap_or_default(),
        vocalizations: profile
            .and_then(|p| p.vocalizations.get(&appraisal.state.label))
            .cloned()
            .unwrap_or_default(),
        energy,
        message: perceived.message.clone(),
        intent: perceived.intent.clone(),
        tone: perceived.tone.clone(),
        relationship: memory.relationship.clone(),
        history: memory.history.clone(),
    };
    let llm = &engine.config().llm;
    let generation = prompt.to_request(llm.max_tokens, llm.temperature, llm.request_timeout_ms);
    let fallback = fallback_output(profile, guidance, &appraisal.state.label, &agent.stats);
    let fallback_translation = fallback.human_translation.clone();
    let decision = compose(generator, permits, &generation, llm.stage_timeout(), fallback).await?;

    let verdict = translation_gate(engine, &agent.agent_type, &agent.stats);
    let human_translation = if verdict.can_translate {
        decision.output.human_translation.clone().or(fallback_translation)
    } else {
        None
    };

    info!(
        style,
        emotion = %appraisal.state,
        degraded = decision.degraded,
        can_translate = verdict.can_translate,
        generation_ms = decision.elapsed_ms,
        "Turn complete"
    );

    let labels = personality.scores.styles();
    let output = TurnOutput {
        stylized_output: decision.output.stylized_output,
        human_translation,
        can_translate: verdict.can_translate,
        translation_hint: verdict.hint(),
        emotional_state: appraisal.state.clone(),
        debug_info: DebugInfo {
            action_style: style.to_string(),
            utility_scores: personality.scores.to_map(),
            raw_utility_scores: personality.raw_scores.to_map(),
            probabilities: labels
                .iter()
                .map(|l| l.to_string())
                .zip(personality.selection.probabilities.iter().copied())
                .collect(),
            top_traits: personality.top_traits,
            familiarity: memory.familiarity,
            degraded: decision.degraded,
            failure: decision.failure,
            generation_ms: decision.elapsed_ms,
        },
    };
    let outcome = TurnOutcome {
        trigger_hint: request.trigger_hint,
        impact: appraisal.impact,
        intent: perceived.intent,
        tone: perceived.tone,
        action_style: style.to_string(),
        emotion: appraisal.state,
    };
    Ok(TurnResult { output, outcome })
}
