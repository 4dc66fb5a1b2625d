//! Context encoder.
//!
//! Maps the labelled situational signals of one turn (perceived intent,
//! tone, the agent's emotion, relationship quality, familiarity and stats)
//! into a fixed-length, L2-normalized [`ContextVector`].
//!
//! Every categorical signal goes through a configured [`LookupTable`] that
//! adds per-feature contributions. Labels missing from a table use the
//! table's `fallback` row, so unknown input is never an error. Slot values
//! are clamped to `[0, 1]` before normalization.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PsycheError, Result, ensure_dim};
use crate::types::{EmotionalState, Stats};

// ---------------------------------------------------------------------------
// Configuration shapes
// ---------------------------------------------------------------------------

/// `label -> feature -> contribution`, plus a row used for unknown labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    /// Known labels and their feature contributions.
    #[serde(default)]
    pub entries: BTreeMap<String, BTreeMap<String, f64>>,
    /// Contributions applied when the label is unknown or empty.
    #[serde(default)]
    pub fallback: BTreeMap<String, f64>,
}

/// A slot fed from the mean of one or more stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatFeature {
    /// Target feature name.
    pub feature: String,
    /// Stats averaged into the slot.
    pub stats: Vec<String>,
    /// Divisor bringing stat values into `[0, 1]`.
    #[serde(default = "default_stat_scale")]
    pub scale: f64,
    /// Raw stat value assumed when a stat is missing.
    #[serde(default = "default_stat_value")]
    pub default: f64,
    /// Use `1 - value` (e.g. fatigue from energy).
    #[serde(default)]
    pub invert: bool,
}

fn default_stat_scale() -> f64 { 100.0 }
fn default_stat_value() -> f64 { 50.0 }

/// Feature slots and the tables that fill them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextLayout {
    /// Ordered feature names; the context dimension M is their count.
    pub features: Vec<String>,
    /// Feature receiving the emotion intensity directly.
    #[serde(default)]
    pub intensity_feature: Option<String>,
    /// Perceived user intent.
    #[serde(default)]
    pub intent: LookupTable,
    /// Perceived user tone.
    #[serde(default)]
    pub tone: LookupTable,
    /// The agent's current emotion label.
    #[serde(default)]
    pub emotion: LookupTable,
    /// Relationship-quality label from the memory collaborator.
    #[serde(default)]
    pub relationship: LookupTable,
    /// Familiarity label derived from learned patterns.
    #[serde(default)]
    pub familiarity: LookupTable,
    /// Stat-derived slots.
    #[serde(default)]
    pub stats: Vec<StatFeature>,
}

impl Default for ContextLayout {
    fn default() -> Self {
        crate::presets::context_layout()
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// How familiar the current situation is to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Familiarity {
    /// Never seen anything like it.
    Novel,
    /// Seen something similar a few times.
    Similar,
    /// Routine.
    Frequent,
}

impl Familiarity {
    /// Table label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Novel => "novel",
            Self::Similar => "similar",
            Self::Frequent => "frequent",
        }
    }
}

impl fmt::Display for Familiarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the encoder reads for one turn.
#[derive(Debug, Clone, Copy)]
pub struct ContextInput<'a> {
    /// Intent label from perception.
    pub intent: &'a str,
    /// Tone label from perception.
    pub tone: &'a str,
    /// The agent's emotion after the emotion stage.
    pub emotion: &'a EmotionalState,
    /// Relationship-quality label from memory.
    pub relationship: &'a str,
    /// Familiarity derived in the memory stage.
    pub familiarity: Familiarity,
    /// Current stats.
    pub stats: &'a Stats,
}

// ---------------------------------------------------------------------------
// Context Vector
// ---------------------------------------------------------------------------

/// Per-turn situational encoding. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVector(Vec<f64>);

impl ContextVector {
    /// Wrap raw values without normalizing.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// L2-normalize `values`. An all-zero (or non-finite norm) input yields
    /// the zero vector.
    #[must_use]
    pub fn normalized(values: Vec<f64>) -> Self {
        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Self(vec![0.0; values.len()]);
        }
        Self(values.into_iter().map(|v| v / norm).collect())
    }

    /// Uniform unit-length vector, used for personality tendency analysis.
    #[must_use]
    pub fn neutral(dim: usize) -> Self {
        Self::normalized(vec![0.5; dim])
    }

    /// Raw component slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// L2 norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.0.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Fail unless the vector has exactly `expected` slots.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch`.
    pub fn check_dim(&self, expected: usize) -> Result<()> {
        ensure_dim("context vector", expected, self.len())
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

type Contributions = Vec<(usize, f64)>;

#[derive(Debug, Clone)]
struct CompiledTable {
    entries: HashMap<String, Contributions>,
    fallback: Contributions,
}

impl CompiledTable {
    fn compile(name: &str, table: &LookupTable, index: &HashMap<&str, usize>) -> Result<Self> {
        let resolve = |row: &BTreeMap<String, f64>| -> Result<Contributions> {
            row.iter()
                .map(|(feature, value)| {
                    index.get(feature.as_str()).map(|i| (*i, *value)).ok_or_else(|| {
                        PsycheError::Config(format!(
                            "{name} table references unknown context feature '{feature}'"
                        ))
                    })
                })
                .collect()
        };
        let mut entries = HashMap::with_capacity(table.entries.len());
        for (label, row) in &table.entries {
            entries.insert(label.to_lowercase(), resolve(row)?);
        }
        Ok(Self {
            entries,
            fallback: resolve(&table.fallback)?,
        })
    }

    fn apply(&self, label: &str, raw: &mut [f64]) {
        let row = self
            .entries
            .get(label.trim().to_lowercase().as_str())
            .unwrap_or(&self.fallback);
        for (idx, value) in row {
            raw[*idx] += value;
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledStat {
    slot: usize,
    stats: Vec<String>,
    scale: f64,
    default: f64,
    invert: bool,
}

/// Encodes [`ContextInput`]s into [`ContextVector`]s using a validated layout.
#[derive(Debug, Clone)]
pub struct ContextEncoder {
    features: Vec<String>,
    intensity_slot: Option<usize>,
    intent: CompiledTable,
    tone: CompiledTable,
    emotion: CompiledTable,
    relationship: CompiledTable,
    familiarity: CompiledTable,
    stats: Vec<CompiledStat>,
}

impl ContextEncoder {
    /// Validate a layout and compile its tables into slot indices.
    ///
    /// # Errors
    /// Returns `PsycheError::Config` for an empty or duplicated feature list,
    /// unknown feature references, or a non-positive stat scale.
    pub fn new(layout: &ContextLayout) -> Result<Self> {
        if layout.features.is_empty() {
            return Err(PsycheError::Config("context layout has no features".into()));
        }
        let mut index = HashMap::with_capacity(layout.features.len());
        for (i, name) in layout.features.iter().enumerate() {
            if index.insert(name.as_str(), i).is_some() {
                return Err(PsycheError::Config(format!(
                    "duplicate context feature '{name}'"
                )));
            }
        }
        let slot = |feature: &str| {
            index.get(feature).copied().ok_or_else(|| {
                PsycheError::Config(format!("unknown context feature '{feature}'"))
            })
        };

        let intensity_slot = layout.intensity_feature.as_deref().map(slot).transpose()?;
        let stats = layout
            .stats
            .iter()
            .map(|s| {
                if s.scale <= 0.0 || !s.scale.is_finite() {
                    return Err(PsycheError::Config(format!(
                        "stat feature '{}' has non-positive scale",
                        s.feature
                    )));
                }
                Ok(CompiledStat {
                    slot: slot(&s.feature)?,
                    stats: s.stats.clone(),
                    scale: s.scale,
                    default: s.default,
                    invert: s.invert,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            features: layout.features.clone(),
            intensity_slot,
            intent: CompiledTable::compile("intent", &layout.intent, &index)?,
            tone: CompiledTable::compile("tone", &layout.tone, &index)?,
            emotion: CompiledTable::compile("emotion", &layout.emotion, &index)?,
            relationship: CompiledTable::compile("relationship", &layout.relationship, &index)?,
            familiarity: CompiledTable::compile("familiarity", &layout.familiarity, &index)?,
            stats,
        })
    }

    /// Context dimension M.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.features.len()
    }

    /// Feature names in slot order.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Encode one turn's signals. Deterministic for identical input.
    #[must_use]
    pub fn encode(&self, input: &ContextInput<'_>) -> ContextVector {
        ContextVector::normalized(self.encode_raw(input))
    }

    /// Slot values before normalization, each clamped to `[0, 1]`.
    #[must_use]
    pub fn encode_raw(&self, input: &ContextInput<'_>) -> Vec<f64> {
        let mut raw = vec![0.0; self.dim()];

        self.intent.apply(input.intent, &mut raw);
        self.tone.apply(input.tone, &mut raw);
        self.emotion.apply(&input.emotion.label, &mut raw);
        self.relationship.apply(input.relationship, &mut raw);
        self.familiarity.apply(input.familiarity.as_str(), &mut raw);

        for stat in &self.stats {
            if stat.stats.is_empty() {
                continue;
            }
            let total: f64 = stat
                .stats
                .iter()
                .map(|name| input.stats.get(name).unwrap_or(stat.default) / stat.scale)
                .sum();
            let mean = total / stat.stats.len() as f64;
            raw[stat.slot] += if stat.invert { 1.0 - mean } else { mean };
        }

        if let Some(slot) = self.intensity_slot {
            raw[slot] += input.emotion.intensity;
        }

        for v in &mut raw {
            *v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        }
        raw
    }
}
