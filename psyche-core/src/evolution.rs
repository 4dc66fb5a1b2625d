//! Long-term personality evolution.
//!
//! A categorized [`InteractionEvent`] becomes an [`EvolutionShift`]:
//! `delta = direction(trigger) * learning_rate * valence`. Shifts decay
//! linearly to zero over their TTL and are then dropped. The effective base
//! vector used for utility scoring is `clamp(base + Σ decayed shifts)`.
//!
//! Directions are expressed per unit of *positive* valence. Triggers with a
//! fixed polarity force the sign of their valence on construction, so a
//! `negative_interaction` always carries valence `<= 0` and its `trust`
//! direction of `+0.6` lowers trust.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PsycheError, Result};
use crate::traits::{TraitCatalog, TraitVector};

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Category of a life event that may reshape personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionTrigger {
    /// A pleasant exchange.
    PositiveInteraction,
    /// An unpleasant exchange.
    NegativeInteraction,
    /// Learned something new.
    LearningExperience,
    /// Bond deepened.
    SocialBonding,
    /// Succeeded at something.
    Achievement,
    /// Failed at something.
    Failure,
    /// Under stress.
    StressEvent,
    /// Quiet time passed.
    TimePassage,
    /// Unusually intense emotion.
    EmotionalPeak,
    /// Nothing notable; habit reinforcement.
    RepeatedBehavior,
}

/// Sign constraint a trigger imposes on event valence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Valence forced to `>= 0`.
    Positive,
    /// Valence forced to `<= 0`.
    Negative,
    /// Valence kept as given.
    Neutral,
}

impl EvolutionTrigger {
    /// Every trigger, in declaration order.
    pub const ALL: [EvolutionTrigger; 10] = [
        Self::PositiveInteraction,
        Self::NegativeInteraction,
        Self::LearningExperience,
        Self::SocialBonding,
        Self::Achievement,
        Self::Failure,
        Self::StressEvent,
        Self::TimePassage,
        Self::EmotionalPeak,
        Self::RepeatedBehavior,
    ];

    /// Snake-case name, as used in configuration tables.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PositiveInteraction => "positive_interaction",
            Self::NegativeInteraction => "negative_interaction",
            Self::LearningExperience => "learning_experience",
            Self::SocialBonding => "social_bonding",
            Self::Achievement => "achievement",
            Self::Failure => "failure",
            Self::StressEvent => "stress_event",
            Self::TimePassage => "time_passage",
            Self::EmotionalPeak => "emotional_peak",
            Self::RepeatedBehavior => "repeated_behavior",
        }
    }

    /// Valence sign constraint.
    #[must_use]
    pub fn polarity(self) -> Polarity {
        match self {
            Self::PositiveInteraction
            | Self::LearningExperience
            | Self::SocialBonding
            | Self::Achievement => Polarity::Positive,
            Self::NegativeInteraction | Self::Failure | Self::StressEvent => Polarity::Negative,
            Self::TimePassage | Self::EmotionalPeak | Self::RepeatedBehavior => Polarity::Neutral,
        }
    }
}

impl fmt::Display for EvolutionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvolutionTrigger {
    type Err = PsycheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PsycheError::Config(format!("unknown evolution trigger '{s}'")))
    }
}

/// Pick a trigger for a finished turn: an explicit kind wins, otherwise the
/// emotional impact decides.
#[must_use]
pub fn determine_trigger(kind: Option<EvolutionTrigger>, impact: f64) -> EvolutionTrigger {
    if let Some(kind) = kind {
        return kind;
    }
    if impact.abs() > 0.8 {
        EvolutionTrigger::EmotionalPeak
    } else if impact > 0.3 {
        EvolutionTrigger::PositiveInteraction
    } else if impact < -0.3 {
        EvolutionTrigger::NegativeInteraction
    } else {
        EvolutionTrigger::RepeatedBehavior
    }
}

// ---------------------------------------------------------------------------
// Events and shifts
// ---------------------------------------------------------------------------

/// A categorized event with valence in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Category.
    pub trigger: EvolutionTrigger,
    /// Signed strength, sign-constrained by the trigger's polarity.
    pub valence: f64,
    /// When it happened.
    pub at: DateTime<Utc>,
}

impl InteractionEvent {
    /// Build an event, clamping valence and applying the trigger's polarity.
    #[must_use]
    pub fn new(trigger: EvolutionTrigger, valence: f64, at: DateTime<Utc>) -> Self {
        let v = if valence.is_nan() { 0.0 } else { valence.clamp(-1.0, 1.0) };
        let valence = match trigger.polarity() {
            Polarity::Positive => v.abs(),
            Polarity::Negative => -v.abs(),
            Polarity::Neutral => v,
        };
        Self { trigger, valence, at }
    }
}

/// One active adjustment to an agent's trait vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionShift {
    /// What caused it.
    pub trigger_type: EvolutionTrigger,
    /// Full-strength per-trait delta.
    pub delta: Vec<f64>,
    /// When it was created.
    pub created_at: DateTime<Utc>,
    /// Hours until it has decayed to zero.
    pub ttl_hours: f64,
}

impl EvolutionShift {
    /// Linear decay factor in `[0, 1]`: 1 at creation, 0 once the TTL has
    /// elapsed. Times before creation count as fresh.
    #[must_use]
    pub fn decay_factor(&self, now: DateTime<Utc>) -> f64 {
        if self.ttl_hours <= 0.0 {
            return 0.0;
        }
        let elapsed_hours = (now - self.created_at).num_milliseconds().max(0) as f64 / 3_600_000.0;
        (1.0 - elapsed_hours / self.ttl_hours).clamp(0.0, 1.0)
    }

    /// Whether the shift no longer contributes anything.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.decay_factor(now) <= 0.0
    }

    /// Moment the shift reaches zero.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::milliseconds((self.ttl_hours * 3_600_000.0) as i64)
    }
}

/// Per-agent evolution state: toggle plus the active shifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionState {
    /// When false no new shifts are created; existing ones keep decaying.
    pub enabled: bool,
    /// Active shifts, oldest first.
    pub shifts: Vec<EvolutionShift>,
}

impl EvolutionState {
    /// Empty state with the given toggle.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            shifts: Vec::new(),
        }
    }
}

impl Default for EvolutionState {
    fn default() -> Self {
        Self::new(true)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Configured direction for one trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRule {
    /// `trait name -> direction` per unit positive valence.
    pub direction: BTreeMap<String, f64>,
    /// Overrides the default TTL for shifts from this trigger.
    #[serde(default)]
    pub ttl_hours: Option<f64>,
}

/// Tunables for [`EvolutionEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionParams {
    /// Scales every shift.
    pub learning_rate: f64,
    /// Default shift lifetime.
    pub shift_ttl_hours: f64,
    /// Cap on simultaneously active shifts; oldest dropped first.
    pub max_active_shifts: usize,
    /// Minimum |Δ| for a trait to count as significantly changed.
    pub significant_change: f64,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    direction: Vec<f64>,
    ttl_hours: f64,
}

/// Creates, decays and folds evolution shifts.
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    rules: HashMap<EvolutionTrigger, CompiledRule>,
    dim: usize,
    params: EvolutionParams,
}

/// A trait whose effective value moved noticeably from the initial vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitChange {
    /// Trait name.
    pub name: String,
    /// Value at creation.
    pub initial: f64,
    /// Current effective value.
    pub current: f64,
    /// `current - initial`.
    pub change: f64,
}

/// How an agent's personality has developed since creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentReport {
    /// L2 distance between initial and current effective vectors.
    pub total_change: f64,
    /// Number of traits past the significance threshold.
    pub significant_changes: usize,
    /// Up to five largest changes.
    pub most_influenced: Vec<TraitChange>,
    /// Up to three most frequent active triggers with counts.
    pub common_triggers: Vec<(EvolutionTrigger, usize)>,
    /// `1 / (1 + total_change)`.
    pub stability: f64,
}

impl EvolutionEngine {
    /// Compile trigger rules against the catalog.
    ///
    /// # Errors
    /// Returns `PsycheError::Config` for unknown trigger names or invalid
    /// parameters, and `PsycheError::UnknownTrait` for unknown trait names.
    pub fn new(
        catalog: &TraitCatalog,
        rules: &BTreeMap<String, TriggerRule>,
        params: EvolutionParams,
    ) -> Result<Self> {
        if !(params.learning_rate.is_finite() && params.learning_rate >= 0.0) {
            return Err(PsycheError::Config(format!(
                "evolution learning_rate must be non-negative, got {}",
                params.learning_rate
            )));
        }
        if !(params.shift_ttl_hours.is_finite() && params.shift_ttl_hours > 0.0) {
            return Err(PsycheError::Config(format!(
                "evolution shift_ttl_hours must be positive, got {}",
                params.shift_ttl_hours
            )));
        }
        let mut compiled = HashMap::with_capacity(rules.len());
        for (name, rule) in rules {
            let trigger: EvolutionTrigger = name.parse()?;
            let direction = catalog.dense(rule.direction.iter().map(|(k, v)| (k.as_str(), *v)))?;
            compiled.insert(
                trigger,
                CompiledRule {
                    direction,
                    ttl_hours: rule.ttl_hours.unwrap_or(params.shift_ttl_hours),
                },
            );
        }
        Ok(Self {
            rules: compiled,
            dim: catalog.len(),
            params,
        })
    }

    /// Engine parameters.
    #[must_use]
    pub fn params(&self) -> EvolutionParams {
        self.params
    }

    /// Record an event. Returns the new shift, or `None` when evolution is
    /// disabled, the trigger has no rule, or the valence is zero.
    pub fn record<'s>(
        &self,
        state: &'s mut EvolutionState,
        event: &InteractionEvent,
    ) -> Option<&'s EvolutionShift> {
        if !state.enabled {
            return None;
        }
        let rule = self.rules.get(&event.trigger)?;
        if event.valence == 0.0 {
            return None;
        }
        self.prune(state, event.at);

        let scale = self.params.learning_rate * event.valence;
        let delta = rule.direction.iter().map(|d| d * scale).collect();
        state.shifts.push(EvolutionShift {
            trigger_type: event.trigger,
            delta,
            created_at: event.at,
            ttl_hours: rule.ttl_hours,
        });
        if state.shifts.len() > self.params.max_active_shifts {
            let excess = state.shifts.len() - self.params.max_active_shifts;
            state.shifts.drain(..excess);
            debug!(dropped = excess, "Evolution shift cap reached, dropped oldest");
        }
        debug!(trigger = %event.trigger, valence = event.valence, "Evolution shift created");
        state.shifts.last()
    }

    /// Drop shifts that have fully decayed.
    pub fn prune(&self, state: &mut EvolutionState, now: DateTime<Utc>) {
        state.shifts.retain(|s| !s.is_expired(now));
    }

    /// Sum of all active shifts at `now`, each scaled by its decay factor.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if a stored shift has the
    /// wrong length.
    pub fn active_delta(&self, state: &EvolutionState, now: DateTime<Utc>) -> Result<Vec<f64>> {
        let mut total = vec![0.0; self.dim];
        for shift in &state.shifts {
            crate::error::ensure_dim("evolution shift", self.dim, shift.delta.len())?;
            let factor = shift.decay_factor(now);
            if factor <= 0.0 {
                continue;
            }
            for (t, d) in total.iter_mut().zip(&shift.delta) {
                *t += d * factor;
            }
        }
        Ok(total)
    }

    /// `clamp(base + Σ decayed shifts)`.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` on any length disagreement.
    pub fn effective_base(
        &self,
        base: &TraitVector,
        state: &EvolutionState,
        now: DateTime<Utc>,
    ) -> Result<TraitVector> {
        base.check_dim(self.dim)?;
        base.offset(&self.active_delta(state, now)?)
    }

    /// Clear all shifts. With `keep_shifts`, their current contribution is
    /// folded into `base` first.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` on any length disagreement.
    pub fn reset(
        &self,
        base: &mut TraitVector,
        state: &mut EvolutionState,
        keep_shifts: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if keep_shifts {
            *base = self.effective_base(base, state, now)?;
        }
        state.shifts.clear();
        Ok(())
    }

    /// Compare the current effective vector against the initial one.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if the vectors disagree.
    pub fn development_report(
        &self,
        catalog: &TraitCatalog,
        initial: &TraitVector,
        current: &TraitVector,
        state: &EvolutionState,
    ) -> Result<DevelopmentReport> {
        let total_change = initial.distance(current)?;

        let mut changes: Vec<TraitChange> = initial
            .as_slice()
            .iter()
            .zip(current.as_slice())
            .enumerate()
            .filter(|(_, (a, b))| (*b - *a).abs() > self.params.significant_change)
            .map(|(i, (a, b))| TraitChange {
                name: catalog.name_of(i).unwrap_or("unknown").to_string(),
                initial: *a,
                current: *b,
                change: b - a,
            })
            .collect();
        let significant_changes = changes.len();
        changes.sort_by_key(|c| std::cmp::Reverse(OrderedFloat(c.change.abs())));
        changes.truncate(5);

        let mut counts: BTreeMap<EvolutionTrigger, usize> = BTreeMap::new();
        for shift in &state.shifts {
            *counts.entry(shift.trigger_type).or_default() += 1;
        }
        let mut common_triggers: Vec<(EvolutionTrigger, usize)> = counts.into_iter().collect();
        common_triggers.sort_by_key(|(t, n)| (std::cmp::Reverse(*n), *t));
        common_triggers.truncate(3);

        Ok(DevelopmentReport {
            total_change,
            significant_changes,
            most_influenced: changes,
            common_triggers,
            stability: 1.0 / (1.0 + total_change),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap()
    }

    fn params() -> EvolutionParams {
        EvolutionParams {
            learning_rate: 0.1,
            shift_ttl_hours: 10.0,
            max_active_shifts: 4,
            significant_change: 0.05,
        }
    }

    fn engine() -> (TraitCatalog, EvolutionEngine) {
        let catalog = TraitCatalog::canonical();
        let mut rules = BTreeMap::new();
        rules.insert(
            "negative_interaction".to_string(),
            TriggerRule {
                direction: [("trust".to_string(), 0.6), ("caution".to_string(), -0.8)]
                    .into_iter()
                    .collect(),
                ttl_hours: None,
            },
        );
        rules.insert(
            "positive_interaction".to_string(),
            TriggerRule {
                direction: [("sociability".to_string(), 1.0)].into_iter().collect(),
                ttl_hours: Some(20.0),
            },
        );
        let engine = EvolutionEngine::new(&catalog, &rules, params()).unwrap();
        (catalog, engine)
    }

    #[test]
    fn polarity_forces_valence_sign() {
        let event = InteractionEvent::new(EvolutionTrigger::NegativeInteraction, 0.8, t0());
        assert_eq!(event.valence, -0.8);
        assert_eq!(InteractionEvent::new(EvolutionTrigger::Achievement, -0.4, t0()).valence, 0.4);
        let event = InteractionEvent::new(EvolutionTrigger::EmotionalPeak, -0.9, t0());
        assert_eq!(event.valence, -0.9);
        assert_eq!(InteractionEvent::new(EvolutionTrigger::Failure, 3.0, t0()).valence, -1.0);
    }

    #[test]
    fn negative_event_lowers_trust_and_raises_caution() {
        let (catalog, engine) = engine();
        let mut state = EvolutionState::default();
        let event = InteractionEvent::new(EvolutionTrigger::NegativeInteraction, -1.0, t0());
        engine.record(&mut state, &event).unwrap();
        let base = TraitVector::neutral(catalog.len());
        let eff = engine.effective_base(&base, &state, t0()).unwrap();
        assert!((eff.value(&catalog, "trust").unwrap() - 0.44).abs() < 1e-12);
        assert!((eff.value(&catalog, "caution").unwrap() - 0.58).abs() < 1e-12);
    }

    #[test]
    fn shifts_decay_linearly_then_expire() {
        let (catalog, engine) = engine();
        let mut state = EvolutionState::default();
        let hurt = InteractionEvent::new(EvolutionTrigger::NegativeInteraction, -1.0, t0());
        engine.record(&mut state, &hurt);
        let base = TraitVector::neutral(catalog.len());
        let half = engine.effective_base(&base, &state, t0() + Duration::hours(5)).unwrap();
        assert!((half.value(&catalog, "trust").unwrap() - 0.47).abs() < 1e-9);
        let later = t0() + Duration::hours(11);
        assert_eq!(engine.effective_base(&base, &state, later).unwrap(), base);
        engine.prune(&mut state, later);
        assert!(state.shifts.is_empty());
    }

    #[test]
    fn per_trigger_ttl_overrides_default() {
        let (_, engine) = engine();
        let mut state = EvolutionState::default();
        let shift = engine
            .record(
                &mut state,
                &InteractionEvent::new(EvolutionTrigger::PositiveInteraction, 1.0, t0()),
            )
            .unwrap();
        assert_eq!(shift.ttl_hours, 20.0);
        assert_eq!(shift.expires_at(), t0() + Duration::hours(20));
    }

    #[test]
    fn disabled_engine_creates_nothing() {
        let (_, engine) = engine();
        let mut state = EvolutionState::new(false);
        assert!(engine
            .record(
                &mut state,
                &InteractionEvent::new(EvolutionTrigger::NegativeInteraction, -1.0, t0()),
            )
            .is_none());
        assert!(state.shifts.is_empty());
    }

    #[test]
    fn triggers_without_rules_are_ignored() {
        let (_, engine) = engine();
        let mut state = EvolutionState::default();
        assert!(engine
            .record(&mut state, &InteractionEvent::new(EvolutionTrigger::StressEvent, -1.0, t0()))
            .is_none());
    }

    #[test]
    fn cap_drops_oldest_shift() {
        let (_, engine) = engine();
        let mut state = EvolutionState::default();
        for i in 0..6 {
            let at = t0() + Duration::minutes(i);
            let event = InteractionEvent::new(EvolutionTrigger::PositiveInteraction, 1.0, at);
            engine.record(&mut state, &event);
        }
        assert_eq!(state.shifts.len(), 4);
        assert_eq!(state.shifts[0].created_at, t0() + Duration::minutes(2));
    }

    #[test]
    fn reset_folds_or_discards() {
        let (catalog, engine) = engine();
        let event = InteractionEvent::new(EvolutionTrigger::NegativeInteraction, -1.0, t0());

        let mut base = TraitVector::neutral(catalog.len());
        let mut state = EvolutionState::default();
        engine.record(&mut state, &event);
        engine.reset(&mut base, &mut state, true, t0()).unwrap();
        assert!(state.shifts.is_empty());
        assert!((base.value(&catalog, "trust").unwrap() - 0.44).abs() < 1e-12);

        let mut base = TraitVector::neutral(catalog.len());
        let mut state = EvolutionState::default();
        engine.record(&mut state, &event);
        engine.reset(&mut base, &mut state, false, t0()).unwrap();
        assert_eq!(base, TraitVector::neutral(catalog.len()));
    }

    #[test]
    fn trigger_determination() {
        assert_eq!(
            determine_trigger(Some(EvolutionTrigger::Achievement), -0.9),
            EvolutionTrigger::Achievement
        );
        assert_eq!(determine_trigger(None, 0.9), EvolutionTrigger::EmotionalPeak);
        assert_eq!(determine_trigger(None, 0.5), EvolutionTrigger::PositiveInteraction);
        assert_eq!(determine_trigger(None, -0.5), EvolutionTrigger::NegativeInteraction);
        assert_eq!(determine_trigger(None, 0.1), EvolutionTrigger::RepeatedBehavior);
        assert_eq!(
            "stress_event".parse::<EvolutionTrigger>().unwrap(),
            EvolutionTrigger::StressEvent
        );
        assert!("meteor_strike".parse::<EvolutionTrigger>().is_err());
    }

    #[test]
    fn development_report_summarizes_changes() {
        let (catalog, engine) = engine();
        let mut state = EvolutionState::default();
        for _ in 0..3 {
            let hurt = InteractionEvent::new(EvolutionTrigger::NegativeInteraction, -1.0, t0());
            engine.record(&mut state, &hurt);
        }
        let kind = InteractionEvent::new(EvolutionTrigger::PositiveInteraction, 1.0, t0());
        engine.record(&mut state, &kind);
        let initial = TraitVector::neutral(catalog.len());
        let current = engine.effective_base(&initial, &state, t0()).unwrap();
        let report = engine.development_report(&catalog, &initial, &current, &state).unwrap();
        assert_eq!(report.significant_changes, 3);
        assert_eq!(report.most_influenced[0].name, "caution");
        assert_eq!(report.common_triggers[0], (EvolutionTrigger::NegativeInteraction, 3));
        assert!(report.stability < 1.0 && report.stability > 0.0);
    }
}
