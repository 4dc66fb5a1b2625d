//! Persisted per-agent state.
//!
//! An [`AgentState`] is everything the engine mutates for one agent: the base
//! trait vector, stats, evolution shifts, learned patterns and the current
//! emotional state. It serializes to a single JSON document.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PsycheError, Result, ensure_dim};
use crate::evolution::EvolutionState;
use crate::learning::PatternStore;
use crate::traits::TraitVector;
use crate::types::{AgentId, EmotionalState, Stats};

/// Mutable state owned by exactly one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Stable identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Agent profile key (`mammal`, `reptile`, ...).
    pub agent_type: String,
    /// Archetype the traits were derived from, if any.
    #[serde(default)]
    pub archetype: Option<String>,
    /// Base trait vector. Only evolution resets fold changes into it.
    pub base_traits: TraitVector,
    /// Trait vector at creation, for development reports.
    pub initial_traits: TraitVector,
    /// Named resources.
    #[serde(default)]
    pub stats: Stats,
    /// Evolution toggle and active shifts.
    #[serde(default)]
    pub evolution: EvolutionState,
    /// Learning toggle and pattern store.
    #[serde(default)]
    pub learning: PatternStore,
    /// Emotion from the last turn.
    #[serde(default)]
    pub emotional_state: EmotionalState,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last completed turn.
    #[serde(default)]
    pub last_interaction: Option<DateTime<Utc>>,
}

impl AgentState {
    /// A fresh agent with neutral emotion and no history.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        agent_type: impl Into<String>,
        archetype: Option<String>,
        traits: TraitVector,
        stats: Stats,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            agent_type: agent_type.into(),
            archetype,
            initial_traits: traits.clone(),
            base_traits: traits,
            stats,
            evolution: EvolutionState::default(),
            learning: PatternStore::default(),
            emotional_state: EmotionalState::neutral(),
            created_at: now,
            last_interaction: None,
        }
    }

    /// Check structural invariants against the configured trait dimension.
    ///
    /// # Errors
    /// `DimensionMismatch` for wrongly sized vectors or shift deltas and
    /// `Validation` for empty names, non-finite stats or out-of-range
    /// pattern values.
    pub fn validate(&self, trait_dim: usize) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PsycheError::Validation("agent name must not be empty".into()));
        }
        self.base_traits.check_dim(trait_dim)?;
        self.initial_traits.check_dim(trait_dim)?;
        self.stats.validate()?;
        for shift in &self.evolution.shifts {
            ensure_dim("evolution shift", trait_dim, shift.delta.len())?;
            if shift.delta.iter().any(|d| !d.is_finite()) {
                return Err(PsycheError::Validation(format!(
                    "{} shift contains a non-finite delta",
                    shift.trigger_type
                )));
            }
        }
        for p in &self.learning.patterns {
            if !(0.0..=1.0).contains(&p.confidence) || !(0.0..=1.0).contains(&p.success_rate) {
                return Err(PsycheError::Validation(format!(
                    "pattern {} has confidence or success rate outside [0, 1]",
                    p.id
                )));
            }
        }
        Ok(())
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    /// Returns `PsycheError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a JSON snapshot.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, plus anything
    /// [`validate`](Self::validate) reports.
    pub fn from_json(json: &str, trait_dim: usize) -> Result<Self> {
        let state: Self = serde_json::from_str(json)?;
        state.validate(trait_dim)?;
        Ok(state)
    }

    /// Write a JSON snapshot to `path`.
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!(agent = %self.id, path = %path.display(), "saved agent state");
        Ok(())
    }

    /// Load and validate a snapshot from `path`.
    ///
    /// # Errors
    /// Returns an error if reading, parsing or validation fails.
    pub fn load(path: &Path, trait_dim: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let state = Self::from_json(&content, trait_dim)?;
        debug!(agent = %state.id, path = %path.display(), "loaded agent state");
        Ok(state)
    }
}
