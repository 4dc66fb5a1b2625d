//! The turn result returned to callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use psyche_core::context::Familiarity;
use psyche_core::types::EmotionalState;

/// Diagnostics attached to every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Selected action style.
    pub action_style: String,
    /// Utilities used for selection (learned bias applied).
    pub utility_scores: BTreeMap<String, f64>,
    /// Utilities straight from the model.
    pub raw_utility_scores: BTreeMap<String, f64>,
    /// Selection probability per style.
    pub probabilities: BTreeMap<String, f64>,
    /// Dominant effective traits, strongest first.
    pub top_traits: Vec<(String, f64)>,
    /// Familiarity derived in the memory stage.
    pub familiarity: Familiarity,
    /// True when the fallback replaced the generated output.
    pub degraded: bool,
    /// Why the fallback was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Time spent in the generation call.
    pub generation_ms: u64,
}

/// A completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutput {
    /// In-character output.
    pub stylized_output: String,
    /// Plain-language rendering; only present when the gate allows it.
    pub human_translation: Option<String>,
    /// Translation gate verdict.
    pub can_translate: bool,
    /// Which stat conditions blocked translation.
    pub translation_hint: Option<String>,
    /// Emotion after this turn.
    pub emotional_state: EmotionalState,
    /// Diagnostics.
    pub debug_info: DebugInfo,
}
