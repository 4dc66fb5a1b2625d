//! Preference learning.
//!
//! Interaction outcomes are folded into confidence-weighted
//! [`LearnedPattern`]s, independent of the trait vector. Each observation
//! either reinforces the most similar existing pattern in its category or
//! creates a new one; confidence moves toward the outcome signal with
//! `confidence += alpha * (signal - confidence)`.
//!
//! The store is capped: past capacity the weakest patterns
//! (`confidence * reinforcement_count`) are evicted first.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PsycheError, Result};
use crate::types::{ActionStyle, PatternId};

/// What kind of regularity a pattern records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningCategory {
    /// Which action styles work.
    BehavioralPattern,
    /// What the user tends to want.
    UserPreference,
    /// How interactions end.
    InteractionOutcome,
    /// Emotional responses to situations.
    EmotionalPattern,
    /// Responses tied to a context.
    ContextualResponse,
    /// Improving at a task.
    SkillDevelopment,
    /// Relationship dynamics.
    SocialDynamics,
}

impl LearningCategory {
    /// Snake-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BehavioralPattern => "behavioral_pattern",
            Self::UserPreference => "user_preference",
            Self::InteractionOutcome => "interaction_outcome",
            Self::EmotionalPattern => "emotional_pattern",
            Self::ContextualResponse => "contextual_response",
            Self::SkillDevelopment => "skill_development",
            Self::SocialDynamics => "social_dynamics",
        }
    }
}

impl fmt::Display for LearningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered key/value description of a situation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub BTreeMap<String, String>);

impl Fingerprint {
    /// Build from pairs.
    #[must_use]
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Value of a feature.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Matching `(key, value)` pairs over the union of keys, in `[0, 1]`.
    /// Two empty fingerprints are identical.
    #[must_use]
    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        let union = self
            .0
            .keys()
            .chain(other.0.keys().filter(|k| !self.0.contains_key(*k)))
            .count();
        if union == 0 {
            return 1.0;
        }
        let matching = self
            .0
            .iter()
            .filter(|(k, v)| other.0.get(*k) == Some(v))
            .count();
        matching as f64 / union as f64
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(", "))
    }
}

/// A confidence-weighted record of an observed regularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    /// Unique id.
    pub id: PatternId,
    /// Category.
    pub category: LearningCategory,
    /// Situation description used for deduplication.
    pub fingerprint: Fingerprint,
    /// Free-form description.
    pub description: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Observations folded in.
    pub reinforcement_count: u32,
    /// Observations whose signal met the success threshold.
    pub positive_count: u32,
    /// `positive_count / reinforcement_count`.
    pub success_rate: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last reinforcement.
    pub last_updated: DateTime<Utc>,
}

impl LearnedPattern {
    /// Eviction weight: `confidence * reinforcement_count`.
    #[must_use]
    pub fn strength(&self) -> f64 {
        self.confidence * f64::from(self.reinforcement_count)
    }
}

/// One interaction outcome to learn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Category.
    pub category: LearningCategory,
    /// Outcome quality in `[0, 1]`.
    pub signal: f64,
    /// Situation fingerprint.
    pub fingerprint: Fingerprint,
    /// Description for a newly created pattern.
    pub description: String,
}

/// Per-agent pattern store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternStore {
    /// When false observations are ignored.
    pub enabled: bool,
    /// Stored patterns.
    pub patterns: Vec<LearnedPattern>,
}

impl PatternStore {
    /// Empty store with the given toggle.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            patterns: Vec::new(),
        }
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new(true)
    }
}

/// What an observation did to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum LearningUpdate {
    /// A new pattern was created.
    Created {
        /// New pattern id.
        id: PatternId,
        /// Patterns evicted to stay within capacity.
        evicted: usize,
    },
    /// An existing pattern was reinforced.
    Reinforced {
        /// Reinforced pattern id.
        id: PatternId,
        /// Confidence after the update.
        confidence: f64,
    },
}

/// Tunables for [`LearningEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningParams {
    /// Update rate α in `(0, 1]`.
    pub alpha: f64,
    /// Maximum stored patterns.
    pub capacity: usize,
    /// Minimum fingerprint similarity to reinforce instead of create.
    pub similarity_threshold: f64,
    /// Confidence kept by `reset(keep_strong = true)`.
    pub strong_threshold: f64,
    /// Confidence a new pattern starts from before its first update.
    pub initial_confidence: f64,
    /// Signal at or above which an outcome counts as a success.
    pub success_threshold: f64,
    /// Scale of the utility bias from behavioral patterns.
    pub adaptation_strength: f64,
    /// Minimum confidence before a pattern biases decisions.
    pub application_threshold: f64,
}

/// Aggregate view of what an agent has learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSummary {
    /// Number of patterns.
    pub total: usize,
    /// Counts per category.
    pub by_category: BTreeMap<LearningCategory, usize>,
    /// Up to five strongest patterns as `(description, strength)`.
    pub strongest: Vec<(String, f64)>,
    /// Up to three most reinforced as `(description, count)`.
    pub most_reinforced: Vec<(String, u32)>,
    /// Sum of reinforcement counts.
    pub total_reinforcements: u64,
    /// Mean confidence, 0 when empty.
    pub average_confidence: f64,
}

/// Applies observations, eviction, reset and decision biasing.
#[derive(Debug, Clone)]
pub struct LearningEngine {
    params: LearningParams,
}

impl LearningEngine {
    /// Validate parameters.
    ///
    /// # Errors
    /// Returns `PsycheError::Config` if α is outside `(0, 1]`, capacity is
    /// zero, or a threshold is outside `[0, 1]`.
    pub fn new(params: LearningParams) -> Result<Self> {
        if !(params.alpha > 0.0 && params.alpha <= 1.0) {
            return Err(PsycheError::Config(format!(
                "learning alpha must be in (0, 1], got {}",
                params.alpha
            )));
        }
        if params.capacity == 0 {
            return Err(PsycheError::Config("learning capacity must be positive".into()));
        }
        for (name, value) in [
            ("similarity_threshold", params.similarity_threshold),
            ("strong_threshold", params.strong_threshold),
            ("initial_confidence", params.initial_confidence),
            ("success_threshold", params.success_threshold),
            ("application_threshold", params.application_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PsycheError::Config(format!(
                    "learning {name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(Self { params })
    }

    /// Engine parameters.
    #[must_use]
    pub fn params(&self) -> LearningParams {
        self.params
    }

    /// Most similar pattern in `category` at or above the similarity threshold.
    #[must_use]
    pub fn find<'s>(
        &self,
        store: &'s PatternStore,
        category: LearningCategory,
        fingerprint: &Fingerprint,
    ) -> Option<&'s LearnedPattern> {
        self.best_match(store, category, fingerprint)
            .map(|i| &store.patterns[i])
    }

    fn best_match(
        &self,
        store: &PatternStore,
        category: LearningCategory,
        fingerprint: &Fingerprint,
    ) -> Option<usize> {
        store
            .patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| p.category == category)
            .map(|(i, p)| (i, p.fingerprint.similarity(fingerprint)))
            .filter(|(_, s)| *s >= self.params.similarity_threshold)
            .max_by(|(ia, a), (ib, b)| {
                OrderedFloat(*a)
                    .cmp(&OrderedFloat(*b))
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(i, _)| i)
    }

    /// Fold one observation into the store. Returns `None` when learning is
    /// disabled.
    pub fn observe(
        &self,
        store: &mut PatternStore,
        observation: &Observation,
        now: DateTime<Utc>,
    ) -> Option<LearningUpdate> {
        if !store.enabled {
            return None;
        }
        let signal = if observation.signal.is_nan() {
            0.0
        } else {
            observation.signal.clamp(0.0, 1.0)
        };
        let success = signal >= self.params.success_threshold;

        if let Some(i) = self.best_match(store, observation.category, &observation.fingerprint) {
            let pattern = &mut store.patterns[i];
            self.reinforce(pattern, signal, success, now);
            return Some(LearningUpdate::Reinforced {
                id: pattern.id,
                confidence: pattern.confidence,
            });
        }

        let mut pattern = LearnedPattern {
            id: PatternId::new(),
            category: observation.category,
            fingerprint: observation.fingerprint.clone(),
            description: observation.description.clone(),
            confidence: self.params.initial_confidence,
            reinforcement_count: 0,
            positive_count: 0,
            success_rate: 0.0,
            created_at: now,
            last_updated: now,
        };
        self.reinforce(&mut pattern, signal, success, now);
        let id = pattern.id;
        store.patterns.push(pattern);
        let evicted = self.evict(store, id);
        Some(LearningUpdate::Created { id, evicted })
    }

    fn reinforce(
        &self,
        pattern: &mut LearnedPattern,
        signal: f64,
        success: bool,
        now: DateTime<Utc>,
    ) {
        let updated = pattern.confidence + self.params.alpha * (signal - pattern.confidence);
        pattern.confidence = updated.clamp(0.0, 1.0);
        pattern.reinforcement_count = pattern.reinforcement_count.saturating_add(1);
        if success {
            pattern.positive_count = pattern.positive_count.saturating_add(1);
        }
        pattern.success_rate =
            f64::from(pattern.positive_count) / f64::from(pattern.reinforcement_count);
        pattern.last_updated = now;
    }

    /// Evict the weakest patterns until within capacity, never the one just
    /// added. Ties go to the least recently updated.
    fn evict(&self, store: &mut PatternStore, keep: PatternId) -> usize {
        let mut evicted = 0;
        while store.patterns.len() > self.params.capacity {
            let weakest = store
                .patterns
                .iter()
                .enumerate()
                .filter(|(_, p)| p.id != keep)
                .min_by(|(_, a), (_, b)| {
                    OrderedFloat(a.strength())
                        .cmp(&OrderedFloat(b.strength()))
                        .then_with(|| a.last_updated.cmp(&b.last_updated))
                })
                .map(|(i, _)| i);
            let Some(i) = weakest else { break };
            let removed = store.patterns.remove(i);
            debug!(pattern = %removed.id, strength = removed.strength(), "Evicted learned pattern");
            evicted += 1;
        }
        evicted
    }

    /// Clear the store. With `keep_strong`, patterns whose confidence is above
    /// the strong threshold survive.
    pub fn reset(&self, store: &mut PatternStore, keep_strong: bool) {
        if keep_strong {
            store
                .patterns
                .retain(|p| p.confidence > self.params.strong_threshold);
        } else {
            store.patterns.clear();
        }
    }

    /// Per-style utility bias from confident behavioral patterns:
    /// `adaptation_strength * (success_rate - 0.5) * confidence`, summed over
    /// patterns whose `action_style` feature names the style.
    #[must_use]
    pub fn style_biases(&self, store: &PatternStore, styles: &[ActionStyle]) -> Vec<f64> {
        let mut biases = vec![0.0; styles.len()];
        if !store.enabled || self.params.adaptation_strength == 0.0 {
            return biases;
        }
        for pattern in store.patterns.iter().filter(|p| {
            p.category == LearningCategory::BehavioralPattern
                && p.confidence >= self.params.application_threshold
        }) {
            let Some(style) = pattern.fingerprint.get("action_style") else {
                continue;
            };
            if let Some(i) = styles.iter().position(|s| s.as_str() == style) {
                let lean = pattern.success_rate - 0.5;
                biases[i] += self.params.adaptation_strength * lean * pattern.confidence;
            }
        }
        biases
    }

    /// Summarize the store.
    #[must_use]
    pub fn summary(&self, store: &PatternStore) -> LearningSummary {
        let mut by_category = BTreeMap::new();
        for p in &store.patterns {
            *by_category.entry(p.category).or_default() += 1;
        }

        let mut strongest: Vec<&LearnedPattern> = store.patterns.iter().collect();
        strongest.sort_by_key(|p| std::cmp::Reverse(OrderedFloat(p.strength())));
        let mut reinforced: Vec<&LearnedPattern> = store.patterns.iter().collect();
        reinforced.sort_by_key(|p| std::cmp::Reverse(p.reinforcement_count));

        let total = store.patterns.len();
        let average_confidence = if total == 0 {
            0.0
        } else {
            store.patterns.iter().map(|p| p.confidence).sum::<f64>() / total as f64
        };

        LearningSummary {
            total,
            by_category,
            strongest: strongest
                .into_iter()
                .take(5)
                .map(|p| (p.description.clone(), p.strength()))
                .collect(),
            most_reinforced: reinforced
                .into_iter()
                .take(3)
                .map(|p| (p.description.clone(), p.reinforcement_count))
                .collect(),
            total_reinforcements: store
                .patterns
                .iter()
                .map(|p| u64::from(p.reinforcement_count))
                .sum(),
            average_confidence,
        }
    }
}
