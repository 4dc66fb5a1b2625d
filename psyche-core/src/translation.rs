//! Translation gate and per-agent-type profiles.
//!
//! The gate is a pure predicate over an agent's stats: every configured
//! `stat comparator threshold` condition must hold for a human-readable
//! rendering to accompany the agent's stylized output. Conditions are
//! written as short strings such as `"> 40"` or `"<= 5"`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PsycheError, Result};
use crate::types::Stats;

/// Comparison applied between a stat and its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
}

impl Comparator {
    /// Operator symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
        }
    }

    /// Evaluate `value <op> threshold`.
    #[must_use]
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }
}

/// A comparator and threshold, e.g. `> 50`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Condition {
    /// Operator.
    pub comparator: Comparator,
    /// Right-hand side.
    pub threshold: f64,
}

impl Condition {
    /// Build a condition.
    #[must_use]
    pub fn new(comparator: Comparator, threshold: f64) -> Self {
        Self {
            comparator,
            threshold,
        }
    }
}

impl FromStr for Condition {
    type Err = PsycheError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        // Two-character operators must be tried before their prefixes.
        let (comparator, rest) = [
            (">=", Comparator::Ge),
            ("<=", Comparator::Le),
            ("==", Comparator::Eq),
            (">", Comparator::Gt),
            ("<", Comparator::Lt),
            ("=", Comparator::Eq),
        ]
        .into_iter()
        .find_map(|(op, cmp)| s.strip_prefix(op).map(|rest| (cmp, rest)))
        .ok_or_else(|| PsycheError::Config(format!("condition '{s}' has no comparator")))?;
        let threshold: f64 = rest.trim().parse().map_err(|_| {
            PsycheError::Config(format!("condition '{s}' has a non-numeric threshold"))
        })?;
        if !threshold.is_finite() {
            return Err(PsycheError::Config(format!(
                "condition '{s}' has a non-finite threshold"
            )));
        }
        Ok(Self::new(comparator, threshold))
    }
}

impl TryFrom<String> for Condition {
    type Error = PsycheError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Condition> for String {
    fn from(c: Condition) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparator.symbol(), self.threshold)
    }
}

/// `stat name -> condition` for one agent type.
pub type TranslationConditions = BTreeMap<String, Condition>;

/// A condition that did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmetCondition {
    /// Stat name.
    pub stat: String,
    /// The failed condition.
    pub condition: Condition,
    /// Stat value used (0 when the stat was missing).
    pub actual: f64,
}

/// Result of evaluating the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationVerdict {
    /// Whether every condition held.
    pub can_translate: bool,
    /// Failed conditions in stat-name order.
    pub unmet: Vec<UnmetCondition>,
}

impl TranslationVerdict {
    /// Hint naming every unmet stat, or `None` when translation is allowed.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        if self.can_translate {
            return None;
        }
        let parts: Vec<String> = self
            .unmet
            .iter()
            .map(|u| format!("{} must be {} (currently {})", u.stat, u.condition, u.actual))
            .collect();
        Some(format!("Translation unavailable: {}", parts.join("; ")))
    }
}

/// Evaluate the gate. An empty condition set always allows translation; a
/// stat missing from `stats` is treated as 0.
#[must_use]
pub fn evaluate(conditions: &TranslationConditions, stats: &Stats) -> TranslationVerdict {
    let unmet: Vec<UnmetCondition> = conditions
        .iter()
        .filter_map(|(stat, condition)| {
            let actual = stats.get(stat).unwrap_or(0.0);
            (!condition.comparator.holds(actual, condition.threshold)).then(|| UnmetCondition {
                stat: stat.clone(),
                condition: *condition,
                actual,
            })
        })
        .collect();
    TranslationVerdict {
        can_translate: unmet.is_empty(),
        unmet,
    }
}

// ---------------------------------------------------------------------------
// Agent profiles
// ---------------------------------------------------------------------------

/// Per-agent-type configuration: gate conditions, starting stats and the
/// vocalisations used by the deterministic fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Translation gate for this type.
    #[serde(default)]
    pub translation_conditions: TranslationConditions,
    /// Stats a new agent of this type starts with.
    #[serde(default)]
    pub default_stats: Stats,
    /// `emotion label -> sounds`, quietest first.
    #[serde(default)]
    pub vocalizations: BTreeMap<String, Vec<String>>,
}

impl AgentProfile {
    /// Pick a vocalisation for an emotion by energy: low energy takes the
    /// first sound, high energy the last, otherwise the middle one. Unknown
    /// emotions, and emotions with no sounds listed, fall back to `neutral`.
    #[must_use]
    pub fn vocalization(&self, emotion: &str, energy: f64) -> &str {
        let lookup = |key: &str| self.vocalizations.get(key).filter(|s| !s.is_empty());
        let sounds = lookup(emotion).or_else(|| lookup("neutral"));
        let Some(sounds) = sounds else {
            return "*quiet sound*";
        };
        let idx = if energy < 30.0 {
            0
        } else if energy > 70.0 {
            sounds.len() - 1
        } else {
            sounds.len() / 2
        };
        &sounds[idx]
    }
}

// ---------------------------------------------------------------------------
// State modifiers
// ---------------------------------------------------------------------------

/// Stat value assumed by [`apply_state_modifiers`] for a missing stat.
const NEUTRAL_STAT: f64 = 50.0;

const VERY_TIRED: &[(&str, &str)] = &[
    ("*jump*", "*slow movement*"),
    ("*bounce*", "*gentle sway*"),
    ("*run*", "*slow walk*"),
    ("*pounce*", "*careful approach*"),
    ("*leap*", "*small step*"),
    ("*excited*", "*weary*"),
    ("*energetic*", "*tired*"),
];

const TIRED: &[(&str, &str)] = &[
    ("*jump*", "*small hop*"),
    ("*bounce*", "*gentle movement*"),
    ("*run*", "*trot*"),
    ("*excited*", "*mildly interested*"),
];

/// Colour a stylized line with the agent's condition.
///
/// Energy below 20 (or 40) swaps energetic actions for tired ones. Happiness
/// below 30 subdues the line unless it already reads as sad. Hunger below 30
/// adds a rumbling stomach unless food is already mentioned. Missing stats
/// count as 50.
#[must_use]
pub fn apply_state_modifiers(text: &str, stats: &Stats) -> String {
    let stat = |name: &str| stats.get(name).unwrap_or(NEUTRAL_STAT);
    let mut out = text.to_string();

    let energy = stat("energy");
    let replacements: &[(&str, &str)] = if energy < 20.0 {
        VERY_TIRED
    } else if energy < 40.0 {
        TIRED
    } else {
        &[]
    };
    for (from, to) in replacements {
        out = out.replace(from, to);
    }

    if stat("happiness") < 30.0 {
        out = out.replace("*happy*", "*subdued*");
        let lower = out.to_lowercase();
        if !["*droop*", "*whimper*", "*sad*"].iter().any(|w| lower.contains(w)) {
            out.insert_str(0, "*subdued demeanor* ");
        }
    }

    if stat("hunger") < 30.0 {
        let lower = out.to_lowercase();
        if !["*stomach*", "*food*", "*hungry*"].iter().any(|w| lower.contains(w)) {
            out.insert_str(0, "*stomach rumbles quietly* ");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_above_50() -> TranslationConditions {
        ["happiness", "energy", "hunger"]
            .into_iter()
            .map(|s| (s.to_string(), "> 50".parse().unwrap()))
            .collect()
    }

    #[test]
    fn all_conditions_met_allows_translation() {
        let stats = Stats::from([("happiness", 55.0), ("energy", 55.0), ("hunger", 55.0)]);
        let verdict = evaluate(&all_above_50(), &stats);
        assert!(verdict.can_translate);
        assert!(verdict.hint().is_none());
    }

    #[test]
    fn unmet_condition_is_named_in_hint() {
        let stats = Stats::from([("happiness", 40.0), ("energy", 55.0), ("hunger", 55.0)]);
        let verdict = evaluate(&all_above_50(), &stats);
        assert!(!verdict.can_translate);
        assert_eq!(verdict.unmet.len(), 1);
        assert_eq!(verdict.unmet[0].stat, "happiness");
        let hint = verdict.hint().unwrap();
        assert!(hint.contains("happiness"));
        assert!(!hint.contains("energy"));
    }

    #[test]
    fn missing_stat_counts_as_zero() {
        let conditions: TranslationConditions =
            [("magical_power".to_string(), "> 40".parse().unwrap())].into_iter().collect();
        let verdict = evaluate(&conditions, &Stats::new());
        assert_eq!(verdict.unmet[0].actual, 0.0);
    }

    #[test]
    fn parses_every_comparator() {
        let cases = [
            ("> 50", Comparator::Gt, 50.0),
            (">=30", Comparator::Ge, 30.0),
            ("< 20", Comparator::Lt, 20.0),
            ("<= 5.5", Comparator::Le, 5.5),
            ("= 1", Comparator::Eq, 1.0),
            ("== 2", Comparator::Eq, 2.0),
        ];
        for (text, cmp, threshold) in cases {
            let c: Condition = text.parse().unwrap();
            assert_eq!(c.comparator, cmp, "{text}");
            assert_eq!(c.threshold, threshold, "{text}");
        }
        assert!("about 50".parse::<Condition>().is_err());
        assert!("> lots".parse::<Condition>().is_err());
    }

    #[test]
    fn boundary_is_strict_for_gt() {
        let c: Condition = "> 50".parse().unwrap();
        assert!(!c.comparator.holds(50.0, c.threshold));
        assert!(c.comparator.holds(50.1, c.threshold));
    }

    #[test]
    fn conditions_round_trip_through_serde_as_strings() {
        let c: Condition = ">= 30".parse().unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\">= 30\"");
        assert_eq!(serde_json::from_str::<Condition>(&json).unwrap(), c);
    }

    #[test]
    fn vocalization_by_energy() {
        let mut profile = AgentProfile::default();
        profile.vocalizations.insert(
            "happy".into(),
            vec!["*purr*".into(), "*chirp*".into(), "*bounce*".into()],
        );
        profile.vocalizations.insert("neutral".into(), vec!["*hm*".into()]);
        assert_eq!(profile.vocalization("happy", 10.0), "*purr*");
        assert_eq!(profile.vocalization("happy", 50.0), "*chirp*");
        assert_eq!(profile.vocalization("happy", 90.0), "*bounce*");
        assert_eq!(profile.vocalization("bored", 90.0), "*hm*");
        assert_eq!(AgentProfile::default().vocalization("happy", 50.0), "*quiet sound*");
    }

    #[test]
    fn low_energy_tires_out_actions() {
        let line = "*jump* *excited* *run*";
        let weary = apply_state_modifiers(line, &Stats::from([("energy", 10.0)]));
        assert_eq!(weary, "*slow movement* *weary* *slow walk*");
        let tired = apply_state_modifiers(line, &Stats::from([("energy", 35.0)]));
        assert_eq!(tired, "*small hop* *mildly interested* *trot*");
        assert_eq!(apply_state_modifiers(line, &Stats::from([("energy", 60.0)])), line);
    }

    #[test]
    fn unhappy_and_hungry_agents_show_it() {
        let stats = Stats::from([("happiness", 20.0), ("hunger", 10.0)]);
        assert_eq!(
            apply_state_modifiers("*happy* *wag*", &stats),
            "*stomach rumbles quietly* *subdued demeanor* *subdued* *wag*"
        );
        // Already sad, already about food.
        assert_eq!(apply_state_modifiers("*whimper* *food*", &stats), "*whimper* *food*");
        // Missing stats are neutral.
        assert_eq!(apply_state_modifiers("*wag*", &Stats::new()), "*wag*");
    }

    #[test]
    fn emotion_without_sounds_uses_neutral() {
        let mut profile = AgentProfile::default();
        profile.vocalizations.insert("sad".into(), Vec::new());
        profile.vocalizations.insert("neutral".into(), vec!["*hm*".into()]);
        assert_eq!(profile.vocalization("sad", 50.0), "*hm*");
    }
}
