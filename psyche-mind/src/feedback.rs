//! Post-turn feedback: emotion carry-over, evolution and learning.
//!
//! Applied to the agent's working copy once the response exists, so the
//! next turn on the same agent sees the update.

use chrono::{DateTime, Utc};
use tracing::debug;

use psyche_core::Engine;
use psyche_core::agent::AgentState;
use psyche_core::engine::situation_fingerprint;
use psyche_core::evolution::{EvolutionTrigger, InteractionEvent, determine_trigger};
use psyche_core::learning::{Fingerprint, LearningCategory, LearningUpdate, Observation};
use psyche_core::types::EmotionalState;

/// What a finished turn tells the adaptive layers.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Caller-supplied trigger, if any.
    pub trigger_hint: Option<EvolutionTrigger>,
    /// Signed emotional impact in `[-1, 1]`.
    pub impact: f64,
    /// Normalized intent.
    pub intent: String,
    /// Normalized tone.
    pub tone: String,
    /// Style the agent acted with.
    pub action_style: String,
    /// Emotion after the turn.
    pub emotion: EmotionalState,
}

/// What feedback changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackReport {
    /// Trigger of the shift created, if any.
    pub shift: Option<EvolutionTrigger>,
    /// Learning updates, in observation order.
    pub learning: Vec<LearningUpdate>,
}

/// Fold a finished turn into `agent`.
pub fn apply_feedback(
    engine: &Engine,
    agent: &mut AgentState,
    outcome: &TurnOutcome,
    now: DateTime<Utc>,
) -> FeedbackReport {
    agent.emotional_state = outcome.emotion.clone();
    agent.last_interaction = Some(now);

    engine.evolution().prune(&mut agent.evolution, now);
    let trigger = determine_trigger(outcome.trigger_hint, outcome.impact);
    let event = InteractionEvent::new(trigger, outcome.impact, now);
    let shift = engine
        .evolution()
        .record(&mut agent.evolution, &event)
        .map(|s| s.trigger_type);

    // Impact in [-1, 1] becomes a learning signal in [0, 1].
    let signal = (outcome.impact + 1.0) / 2.0;
    let observations = [
        Observation {
            category: LearningCategory::UserPreference,
            signal,
            fingerprint: situation_fingerprint(&outcome.intent, &outcome.tone),
            description: format!("{} while {}", outcome.intent, outcome.tone),
        },
        Observation {
            category: LearningCategory::BehavioralPattern,
            signal,
            fingerprint: Fingerprint::from_pairs([
                ("action_style", outcome.action_style.as_str()),
                ("intent", outcome.intent.as_str()),
            ]),
            description: format!("{} response to {}", outcome.action_style, outcome.intent),
        },
    ];
    let learning: Vec<LearningUpdate> = observations
        .iter()
        .filter_map(|o| engine.learning().observe(&mut agent.learning, o, now))
        .collect();

    debug!(
        agent = %agent.id,
        %trigger,
        shifted = shift.is_some(),
        learning_updates = learning.len(),
        "Feedback applied"
    );
    FeedbackReport { shift, learning }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psyche_core::PsycheConfig;
    use psyche_core::engine::TraitSource;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup() -> (Engine, AgentState) {
        let engine = Engine::new(PsycheConfig::default()).unwrap();
        let agent = engine
            .new_agent(
                "Pip",
                "mammal",
                &TraitSource::Neutral,
                &mut StdRng::seed_from_u64(3),
                Utc::now(),
            )
            .unwrap();
        (engine, agent)
    }

    fn outcome(impact: f64) -> TurnOutcome {
        TurnOutcome {
            trigger_hint: None,
            impact,
            intent: "play".into(),
            tone: "excited".into(),
            action_style: "playful".into(),
            emotion: EmotionalState::new("happy", 0.8),
        }
    }

    #[test]
    fn positive_turn_shifts_and_learns() {
        let (engine, mut agent) = setup();
        let report = apply_feedback(&engine, &mut agent, &outcome(0.5), Utc::now());
        assert_eq!(report.shift, Some(EvolutionTrigger::PositiveInteraction));
        assert_eq!(report.learning.len(), 2);
        assert!(report.learning.iter().all(|u| matches!(u, LearningUpdate::Created { .. })));
        assert_eq!(agent.emotional_state.label, "happy");
        assert!(agent.last_interaction.is_some());
        assert_eq!(agent.learning.patterns.len(), 2);
    }

    #[test]
    fn hint_overrides_impact() {
        let (engine, mut agent) = setup();
        let mut o = outcome(0.5);
        o.trigger_hint = Some(EvolutionTrigger::Failure);
        let report = apply_feedback(&engine, &mut agent, &o, Utc::now());
        assert_eq!(report.shift, Some(EvolutionTrigger::Failure));
        assert!(agent.evolution.shifts[0].delta.iter().any(|d| *d != 0.0));
    }

    #[test]
    fn disabled_layers_only_update_emotion() {
        let (engine, mut agent) = setup();
        agent.evolution.enabled = false;
        agent.learning.enabled = false;
        let report = apply_feedback(&engine, &mut agent, &outcome(-0.6), Utc::now());
        assert!(report.shift.is_none());
        assert!(report.learning.is_empty());
        assert!(agent.evolution.shifts.is_empty());
        assert_eq!(agent.emotional_state.label, "happy");
    }
}
