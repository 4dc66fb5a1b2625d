//! Pure stage functions: perception, emotion, memory and translation.
//!
//! Each stage reads the outputs of the stages before it plus the agent's
//! state and returns a new value. None of them mutates anything; the
//! registry commits state only after the whole turn has finished.

use serde::{Deserialize, Serialize};
use tracing::debug;

use psyche_core::Engine;
use psyche_core::context::Familiarity;
use psyche_core::emotion::AppraisalOutcome;
use psyche_core::evolution::EvolutionTrigger;
use psyche_core::learning::PatternStore;
use psyche_core::translation::{self, TranslationConditions, TranslationVerdict};
use psyche_core::types::{EmotionalState, Stats};

use crate::error::{MindError, Result};

/// Relationship label used when memory supplies none.
pub const DEFAULT_RELATIONSHIP: &str = "neutral";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Perception input from the NLU collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    /// What was said.
    #[serde(default)]
    pub message_text: String,
    /// Detected intent label.
    pub detected_intent: String,
    /// Detected tone label.
    pub detected_tone: String,
}

/// Memory input from the retrieval collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecall {
    /// Relationship-quality label.
    #[serde(default = "default_relationship")]
    pub relationship_quality: String,
    /// Free-form summary of relevant history.
    #[serde(default)]
    pub relevant_history_summary: String,
}

impl Default for MemoryRecall {
    fn default() -> Self {
        Self {
            relationship_quality: default_relationship(),
            relevant_history_summary: String::new(),
        }
    }
}

fn default_relationship() -> String {
    DEFAULT_RELATIONSHIP.to_string()
}

/// One turn's worth of input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Perception output.
    pub perception: Perception,
    /// Memory output.
    #[serde(default)]
    pub memory: MemoryRecall,
    /// Explicit evolution trigger for this interaction, if the caller knows it.
    #[serde(default)]
    pub trigger_hint: Option<EvolutionTrigger>,
}

impl TurnRequest {
    /// A request with default memory and no trigger hint.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        intent: impl Into<String>,
        tone: impl Into<String>,
    ) -> Self {
        Self {
            perception: Perception {
                message_text: message.into(),
                detected_intent: intent.into(),
                detected_tone: tone.into(),
            },
            memory: MemoryRecall::default(),
            trigger_hint: None,
        }
    }

    /// Set the memory input.
    #[must_use]
    pub fn with_memory(
        mut self,
        relationship: impl Into<String>,
        history: impl Into<String>,
    ) -> Self {
        self.memory = MemoryRecall {
            relationship_quality: relationship.into(),
            relevant_history_summary: history.into(),
        };
        self
    }

    /// Set the evolution trigger hint.
    #[must_use]
    pub fn with_trigger(mut self, trigger: EvolutionTrigger) -> Self {
        self.trigger_hint = Some(trigger);
        self
    }
}

// ---------------------------------------------------------------------------
// Perception
// ---------------------------------------------------------------------------

/// Normalized perception labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Perceived {
    /// Message text, trimmed.
    pub message: String,
    /// Lower-case intent.
    pub intent: String,
    /// Lower-case tone.
    pub tone: String,
}

/// Validate and normalize perception input.
///
/// # Errors
/// `MindError::Validation` when the intent or tone label is blank.
pub fn perceive(perception: &Perception) -> Result<Perceived> {
    let label = |field: &str, value: &str| {
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            Err(MindError::Validation(format!("perception field '{field}' is required")))
        } else {
            Ok(value)
        }
    };
    Ok(Perceived {
        message: perception.message_text.trim().to_string(),
        intent: label("detected_intent", &perception.detected_intent)?,
        tone: label("detected_tone", &perception.detected_tone)?,
    })
}

// ---------------------------------------------------------------------------
// Emotion
// ---------------------------------------------------------------------------

/// Appraise the perceived tone and intent against the previous emotion.
#[must_use]
pub fn feel(engine: &Engine, perceived: &Perceived, previous: &EmotionalState) -> AppraisalOutcome {
    let outcome = engine.appraise(&perceived.tone, &perceived.intent, previous);
    debug!(emotion = %outcome.state, impact = outcome.impact, "Emotion stage");
    outcome
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// What the memory stage hands to the personality stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remembered {
    /// Relationship-quality label, lower-case.
    pub relationship: String,
    /// History summary.
    pub history: String,
    /// How familiar this situation is.
    pub familiarity: Familiarity,
}

/// Combine recalled memory with familiarity from learned patterns.
#[must_use]
pub fn remember(
    engine: &Engine,
    store: &PatternStore,
    perceived: &Perceived,
    recall: &MemoryRecall,
) -> Remembered {
    let relationship = recall.relationship_quality.trim().to_lowercase();
    let familiarity = engine.familiarity(store, &perceived.intent, &perceived.tone);
    debug!(%familiarity, relationship = %relationship, "Memory stage");
    Remembered {
        relationship: if relationship.is_empty() {
            DEFAULT_RELATIONSHIP.to_string()
        } else {
            relationship
        },
        history: recall.relevant_history_summary.trim().to_string(),
        familiarity,
    }
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

/// Evaluate the agent type's translation gate. An agent type without a
/// profile has no conditions, so translation is allowed.
#[must_use]
pub fn translation_gate(engine: &Engine, agent_type: &str, stats: &Stats) -> TranslationVerdict {
    let empty = TranslationConditions::new();
    let conditions = engine
        .profile(agent_type)
        .map_or(&empty, |p| &p.translation_conditions);
    translation::evaluate(conditions, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use psyche_core::PsycheConfig;

    #[test]
    fn perception_labels_are_normalized() {
        let p = perceive(&TurnRequest::new("  hi  ", " Play ", "EXCITED").perception).unwrap();
        assert_eq!(p.message, "hi");
        assert_eq!(p.intent, "play");
        assert_eq!(p.tone, "excited");
    }

    #[test]
    fn blank_labels_are_rejected() {
        let err = perceive(&TurnRequest::new("hi", "  ", "calm").perception).unwrap_err();
        assert!(matches!(err, MindError::Validation(ref m) if m.contains("detected_intent")));
    }

    #[test]
    fn memory_defaults_relationship() {
        let engine = Engine::new(PsycheConfig::default()).unwrap();
        let perceived = perceive(&TurnRequest::new("", "chat", "neutral").perception).unwrap();
        let recall = MemoryRecall {
            relationship_quality: " ".into(),
            relevant_history_summary: String::new(),
        };
        let m = remember(&engine, &PatternStore::default(), &perceived, &recall);
        assert_eq!(m.relationship, DEFAULT_RELATIONSHIP);
        assert_eq!(m.familiarity, Familiarity::Novel);
    }

    #[test]
    fn unknown_agent_type_translates_freely() {
        let engine = Engine::new(PsycheConfig::default()).unwrap();
        assert!(translation_gate(&engine, "robot", &Stats::new()).can_translate);
        assert!(!translation_gate(&engine, "mythical", &Stats::new()).can_translate);
    }
}
