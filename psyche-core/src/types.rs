//! Core type definitions shared across the psyche engine.
//!
//! All types are serializable so they can live inside a persisted agent
//! snapshot or travel in a turn result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a simulated agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create a new random agent ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Fold the id into 64 bits, used to derive per-agent RNG seeds.
    #[must_use]
    pub fn seed_bits(&self) -> u64 {
        let wide = self.0.as_u128();
        (wide >> 64) as u64 ^ wide as u64
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a learned pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternId(pub Uuid);

impl PatternId {
    /// Create a new random pattern ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PatternId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Action Style
// ---------------------------------------------------------------------------

/// A labelled behavioral mode chosen once per turn (playful, cautious, ...).
///
/// The label set is configured; this type only carries the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionStyle(pub String);

impl ActionStyle {
    /// Create a style from its label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The style label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Emotional State
// ---------------------------------------------------------------------------

/// The agent's current emotion: a label plus an intensity in `[0, 1]`.
///
/// Updated every turn by the emotion stage. Not a trait; it only drives the
/// transient overlay computed by [`crate::emotion::EmotionEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    /// Emotion label (happy, anxious, neutral, ...).
    pub label: String,
    /// Intensity, clamped to `[0, 1]`.
    pub intensity: f64,
}

impl EmotionalState {
    /// Create a new state. Intensity is clamped to `[0, 1]`; NaN becomes 0.
    #[must_use]
    pub fn new(label: impl Into<String>, intensity: f64) -> Self {
        let intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };
        Self {
            label: label.into(),
            intensity,
        }
    }

    /// The neutral, zero-intensity state.
    #[must_use]
    pub fn neutral() -> Self {
        Self::new("neutral", 0.0)
    }
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self::neutral()
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label, self.intensity)
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Named numeric resources of an agent (happiness, energy, ...).
///
/// Mutated by external activities; the core only reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stats(pub BTreeMap<String, f64>);

impl Stats {
    /// Empty stat set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Value of a stat, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Set a stat value.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Apply additive deltas, clamping each resulting value to `[min, max]`.
    pub fn apply_deltas(&mut self, deltas: &Stats, min: f64, max: f64) {
        for (name, delta) in &deltas.0 {
            let entry = self.0.entry(name.clone()).or_insert(0.0);
            *entry = (*entry + delta).clamp(min, max);
        }
    }

    /// Reject non-finite values.
    ///
    /// # Errors
    /// Returns `PsycheError::Validation` naming the first bad stat.
    pub fn validate(&self) -> crate::error::Result<()> {
        match self.0.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => Err(crate::PsycheError::Validation(format!(
                "stat '{name}' is not a finite number ({value})"
            ))),
            None => Ok(()),
        }
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<const K: usize> From<[(&str, f64); K]> for Stats {
    fn from(pairs: [(&str, f64); K]) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}
