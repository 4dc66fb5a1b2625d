//! Emotional influence and rule-based emotion appraisal.
//!
//! The influence engine turns the agent's current emotion into a transient
//! trait overlay: `effective = clamp(base + direction(label) * intensity * scale)`.
//! The overlay is recomputed every turn and never written back to the base
//! vector.
//!
//! Appraisal maps perceived tone/intent labels to the emotion the agent
//! feels this turn, with a signed impact that later becomes the valence of
//! the turn's evolution event.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{PsycheError, Result};
use crate::traits::{TraitCatalog, TraitVector};
use crate::types::EmotionalState;

/// How the emotion direction vector is scaled before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionScaling {
    /// Use the configured direction as-is.
    #[default]
    Raw,
    /// Rescale each direction to unit L2 length first.
    UnitNorm,
}

/// `emotion label -> trait name -> direction`.
pub type EmotionDirections = BTreeMap<String, BTreeMap<String, f64>>;

/// Computes the per-turn emotional overlay on a trait vector.
#[derive(Debug, Clone)]
pub struct EmotionEngine {
    directions: HashMap<String, Vec<f64>>,
    dim: usize,
    scale: f64,
    threshold: f64,
}

impl EmotionEngine {
    /// Compile direction tables against the catalog.
    ///
    /// # Errors
    /// Returns `PsycheError::UnknownTrait` for trait names outside the catalog
    /// and `PsycheError::Config` for a negative scale.
    pub fn new(
        catalog: &TraitCatalog,
        table: &EmotionDirections,
        scaling: EmotionScaling,
        scale: f64,
        threshold: f64,
    ) -> Result<Self> {
        if scale < 0.0 || !scale.is_finite() {
            return Err(PsycheError::Config(format!(
                "emotion max_influence must be a non-negative number, got {scale}"
            )));
        }
        let mut directions = HashMap::with_capacity(table.len());
        for (label, sparse) in table {
            let mut dense = catalog.dense(sparse.iter().map(|(k, v)| (k.as_str(), *v)))?;
            if scaling == EmotionScaling::UnitNorm {
                let norm = dense.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    dense.iter_mut().for_each(|v| *v /= norm);
                }
            }
            directions.insert(label.to_lowercase(), dense);
        }
        Ok(Self {
            directions,
            dim: catalog.len(),
            scale,
            threshold,
        })
    }

    /// The delta this emotion contributes; all zeros for unknown labels or
    /// intensities below the threshold.
    #[must_use]
    pub fn delta(&self, state: &EmotionalState) -> Vec<f64> {
        if state.intensity < self.threshold {
            return vec![0.0; self.dim];
        }
        match self.directions.get(state.label.to_lowercase().as_str()) {
            Some(direction) => direction
                .iter()
                .map(|d| d * state.intensity * self.scale)
                .collect(),
            None => vec![0.0; self.dim],
        }
    }

    /// `clamp(base + delta(state))`. Returns a new vector; `base` is untouched.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if `base` does not match the
    /// catalog length.
    pub fn apply(&self, base: &TraitVector, state: &EmotionalState) -> Result<TraitVector> {
        base.check_dim(self.dim)?;
        base.offset(&self.delta(state))
    }
}

// ---------------------------------------------------------------------------
// Appraisal
// ---------------------------------------------------------------------------

/// An emotion label with a signed impact in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    /// Emotion felt.
    pub emotion: String,
    /// Signed impact; its magnitude becomes the intensity.
    pub impact: f64,
}

/// Tone and intent tables used by the emotion stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppraisalTables {
    /// Checked first.
    #[serde(default)]
    pub tone: BTreeMap<String, Appraisal>,
    /// Checked when the tone is unknown.
    #[serde(default)]
    pub intent: BTreeMap<String, Appraisal>,
}

/// The outcome of appraising one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalOutcome {
    /// The new emotional state.
    pub state: EmotionalState,
    /// Signed impact in `[-1, 1]`.
    pub impact: f64,
}

/// Appraise perceived tone/intent against the previous emotional state.
///
/// Tone is looked up first, then intent; an unknown pair yields a neutral
/// emotion with zero impact. When the label repeats, the previous intensity
/// carries over scaled by `carryover` if that is stronger than the new one.
#[must_use]
pub fn appraise(
    tables: &AppraisalTables,
    tone: &str,
    intent: &str,
    previous: &EmotionalState,
    carryover: f64,
) -> AppraisalOutcome {
    let lookup = |table: &BTreeMap<String, Appraisal>, key: &str| {
        let key = key.trim().to_lowercase();
        table.get(&key).cloned()
    };
    let appraisal = lookup(&tables.tone, tone)
        .or_else(|| lookup(&tables.intent, intent))
        .unwrap_or_else(|| Appraisal {
            emotion: "neutral".into(),
            impact: 0.0,
        });

    let impact = if appraisal.impact.is_nan() {
        0.0
    } else {
        appraisal.impact.clamp(-1.0, 1.0)
    };
    let mut intensity = impact.abs();
    if appraisal.emotion == previous.label {
        intensity = intensity.max(previous.intensity * carryover.clamp(0.0, 1.0));
    }

    AppraisalOutcome {
        state: EmotionalState::new(appraisal.emotion, intensity),
        impact,
    }
}
