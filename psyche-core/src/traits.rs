//! Trait catalog and the bounded trait vector.
//!
//! An agent's personality is a fixed-length vector of floats in `[0, 1]`,
//! one slot per named trait in the [`TraitCatalog`]. The vector is clamped on
//! every construction and every mutation; nothing outside this module can
//! produce an out-of-range component.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PsycheError, Result, ensure_dim};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Definition of one trait slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDef {
    /// Machine name, e.g. `curiosity`.
    pub name: String,
    /// Grouping, e.g. `cognitive`.
    pub category: String,
    /// Human-readable description.
    pub description: String,
}

/// The canonical 50 traits: `(name, category, description)`.
const CANONICAL_TRAITS: [(&str, &str, &str); 50] = [
    ("openness", "core", "Openness to experience"),
    ("conscientiousness", "core", "Conscientiousness and organization"),
    ("extraversion", "core", "Extraversion and social energy"),
    ("agreeableness", "core", "Agreeableness and cooperation"),
    ("neuroticism", "core", "Emotional volatility"),
    ("curiosity", "cognitive", "Intellectual curiosity"),
    ("creativity", "cognitive", "Creative thinking"),
    ("adaptability", "adaptation", "Ability to adapt to change"),
    ("resilience", "adaptation", "Emotional resilience"),
    ("empathy", "social", "Emotional empathy"),
    ("assertiveness", "social", "Assertiveness in communication"),
    ("patience", "self_regulation", "Patience with processes"),
    ("self_efficacy", "self_regulation", "Belief in own abilities"),
    ("integrity", "character", "Moral integrity"),
    ("humility", "character", "Humility and modesty"),
    ("optimism", "emotional", "Optimistic outlook"),
    ("ambition", "drive", "Drive for achievement"),
    ("altruism", "social", "Concern for others"),
    ("confidence", "self_regulation", "Self-confidence"),
    ("self_control", "self_regulation", "Self-control and discipline"),
    ("emotional_stability", "emotional", "Emotional stability"),
    ("emotional_expressiveness", "emotional", "Emotional expressiveness"),
    ("tolerance", "social", "Tolerance for differences"),
    ("trust", "social", "Trust in others"),
    ("risk_taking", "behavioral", "Willingness to take risks"),
    ("innovativeness", "cognitive", "Drive to innovate"),
    ("pragmatism", "thinking", "Practical approach"),
    ("sociability", "social", "Enjoyment of social interaction"),
    ("independence", "behavioral", "Preference for independence"),
    ("competitiveness", "drive", "Competitive drive"),
    ("perseverance", "drive", "Persistence through difficulties"),
    ("focus", "cognitive", "Ability to maintain focus"),
    ("detail_orientation", "cognitive", "Attention to detail"),
    ("big_picture_thinking", "cognitive", "Systems thinking ability"),
    ("decisiveness", "cognitive", "Speed of decision making"),
    ("reflectiveness", "cognitive", "Tendency to reflect deeply"),
    ("self_awareness", "emotional", "Understanding of own thoughts and feelings"),
    ("empathic_accuracy", "social", "Accuracy in reading others"),
    ("enthusiasm", "emotional", "Enthusiasm and energy"),
    ("curiosity_intellectual", "cognitive", "Intellectual curiosity"),
    ("systematic_thinking", "cognitive", "Systematic approach to problems"),
    ("open_mindedness", "cognitive", "Openness to new ideas"),
    ("resourcefulness", "practical", "Ability to find solutions"),
    ("collaboration", "social", "Ability to work with others"),
    ("humor", "social", "Use of humor"),
    ("mindfulness", "emotional", "Present-moment awareness"),
    ("caution", "behavioral", "Cautious approach"),
    ("boldness", "behavioral", "Willingness to be bold"),
    ("altruistic_leadership", "leadership", "Leadership for others' benefit"),
    ("ethical_reasoning", "character", "Ethical reasoning ability"),
];

/// Simple descriptor words and the trait values they imply.
const DESCRIPTOR_MAPPINGS: &[(&str, &[(&str, f64)])] = &[
    ("playful", &[("curiosity", 0.8), ("extraversion", 0.7), ("openness", 0.7)]),
    ("loyal", &[("agreeableness", 0.9), ("conscientiousness", 0.8)]),
    ("energetic", &[("extraversion", 0.9), ("neuroticism", 0.3)]),
    ("calm", &[("neuroticism", 0.2), ("emotional_stability", 0.9)]),
    ("curious", &[("curiosity", 0.9), ("openness", 0.8)]),
    ("creative", &[("creativity", 0.9), ("openness", 0.8)]),
    ("friendly", &[("agreeableness", 0.8), ("extraversion", 0.7)]),
    ("independent", &[("extraversion", 0.3), ("conscientiousness", 0.7)]),
    ("intelligent", &[("curiosity", 0.8), ("creativity", 0.7)]),
    ("protective", &[("agreeableness", 0.6), ("conscientiousness", 0.8)]),
    ("gentle", &[("agreeableness", 0.9), ("neuroticism", 0.2)]),
    ("brave", &[("neuroticism", 0.2), ("resilience", 0.9)]),
    ("wise", &[("openness", 0.8), ("conscientiousness", 0.7)]),
    ("mischievous", &[("openness", 0.7), ("agreeableness", 0.4)]),
];

/// Ordered set of named traits. Index `i` of every [`TraitVector`] means
/// `catalog.defs()[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitCatalog {
    defs: Vec<TraitDef>,
}

impl TraitCatalog {
    /// The canonical 50-trait catalog.
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            defs: CANONICAL_TRAITS
                .iter()
                .map(|(name, category, description)| TraitDef {
                    name: (*name).to_string(),
                    category: (*category).to_string(),
                    description: (*description).to_string(),
                })
                .collect(),
        }
    }

    /// Build a custom catalog.
    ///
    /// # Errors
    /// Returns `PsycheError::Config` if the list is empty or names repeat.
    pub fn new(defs: Vec<TraitDef>) -> Result<Self> {
        if defs.is_empty() {
            return Err(PsycheError::Config("trait catalog is empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for def in &defs {
            if !seen.insert(def.name.as_str()) {
                return Err(PsycheError::Config(format!(
                    "duplicate trait name '{}'",
                    def.name
                )));
            }
        }
        Ok(Self { defs })
    }

    /// Number of traits (the trait dimension N).
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the catalog is empty. Never true for a constructed catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// All definitions in slot order.
    #[must_use]
    pub fn defs(&self) -> &[TraitDef] {
        &self.defs
    }

    /// Slot index of a trait name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.defs.iter().position(|d| d.name == name)
    }

    /// Slot index of a trait name, or `UnknownTrait`.
    ///
    /// # Errors
    /// Returns `PsycheError::UnknownTrait` if the name is not in the catalog.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| PsycheError::UnknownTrait(name.to_string()))
    }

    /// Name of the trait at a slot.
    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.defs.get(index).map(|d| d.name.as_str())
    }

    /// Trait names grouped by category.
    #[must_use]
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for def in &self.defs {
            groups
                .entry(def.category.as_str())
                .or_default()
                .push(def.name.as_str());
        }
        groups
    }

    /// Turn a sparse `trait name -> value` map into a dense per-slot vector.
    ///
    /// # Errors
    /// Returns `PsycheError::UnknownTrait` for names outside the catalog.
    pub fn dense<'a>(&self, sparse: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.len()];
        for (name, value) in sparse {
            out[self.require(name)?] = value;
        }
        Ok(out)
    }
}

impl Default for TraitCatalog {
    fn default() -> Self {
        Self::canonical()
    }
}

// ---------------------------------------------------------------------------
// Trait Vector
// ---------------------------------------------------------------------------

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// An agent's personality: one value in `[0, 1]` per catalog slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct TraitVector(Vec<f64>);

impl TraitVector {
    /// Build from raw values, clamping each to `[0, 1]` (NaN becomes 0).
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values.into_iter().map(clamp_unit).collect())
    }

    /// The neutral vector: every trait at 0.5.
    #[must_use]
    pub fn neutral(dim: usize) -> Self {
        Self(vec![0.5; dim])
    }

    /// Neutral vector with the named traits overridden.
    ///
    /// # Errors
    /// Returns `PsycheError::UnknownTrait` for names outside the catalog.
    pub fn from_named(catalog: &TraitCatalog, values: &[(&str, f64)]) -> Result<Self> {
        let mut out = vec![0.5; catalog.len()];
        for (name, value) in values {
            out[catalog.require(name)?] = *value;
        }
        Ok(Self::new(out))
    }

    /// Map simple descriptor words ("playful", "loyal", ...) onto a neutral
    /// vector. Unknown words, and mapped traits missing from a custom
    /// catalog, are ignored.
    #[must_use]
    pub fn from_descriptors<S: AsRef<str>>(catalog: &TraitCatalog, words: &[S]) -> Self {
        let mut out = vec![0.5; catalog.len()];
        for word in words {
            let word = word.as_ref().to_lowercase();
            let Some((_, mapping)) = DESCRIPTOR_MAPPINGS.iter().find(|(w, _)| *w == word) else {
                continue;
            };
            for (trait_name, value) in *mapping {
                if let Some(idx) = catalog.index_of(trait_name) {
                    out[idx] = *value;
                }
            }
        }
        Self::new(out)
    }

    /// Uniformly perturb every component by up to `±jitter`, then clamp.
    #[must_use]
    pub fn randomized<R: Rng + ?Sized>(&self, jitter: f64, rng: &mut R) -> Self {
        let jitter = jitter.abs();
        if jitter == 0.0 {
            return self.clone();
        }
        Self::new(
            self.0
                .iter()
                .map(|v| v + rng.gen_range(-jitter..=jitter))
                .collect(),
        )
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw component slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Component at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Value of a named trait.
    #[must_use]
    pub fn value(&self, catalog: &TraitCatalog, name: &str) -> Option<f64> {
        catalog.index_of(name).and_then(|i| self.get(i))
    }

    /// Fail unless the vector has exactly `expected` components.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch`.
    pub fn check_dim(&self, expected: usize) -> Result<()> {
        ensure_dim("trait vector", expected, self.len())
    }

    /// `clamp(self + delta)`, component-wise.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if `delta` has a different length.
    pub fn offset(&self, delta: &[f64]) -> Result<Self> {
        ensure_dim("trait delta", self.len(), delta.len())?;
        Ok(Self(
            self.0
                .iter()
                .zip(delta)
                .map(|(v, d)| clamp_unit(v + d))
                .collect(),
        ))
    }

    /// Euclidean distance to another vector of the same length.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if lengths differ.
    pub fn distance(&self, other: &TraitVector) -> Result<f64> {
        ensure_dim("trait vector", self.len(), other.len())?;
        Ok(self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt())
    }

    /// The `n` highest traits as `(name, value)`, highest first. Ties keep
    /// catalog order.
    #[must_use]
    pub fn dominant(&self, catalog: &TraitCatalog, n: usize) -> Vec<(String, f64)> {
        let mut indexed: Vec<(usize, f64)> = self.0.iter().copied().enumerate().collect();
        indexed.sort_by_key(|(i, v)| (std::cmp::Reverse(OrderedFloat(*v)), *i));
        indexed
            .into_iter()
            .take(n)
            .filter_map(|(i, v)| catalog.name_of(i).map(|name| (name.to_string(), v)))
            .collect()
    }
}

impl TryFrom<Vec<f64>> for TraitVector {
    type Error = PsycheError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PsycheError::Validation(
                "trait vector contains a non-finite value".into(),
            ));
        }
        Ok(Self::new(values))
    }
}

impl From<TraitVector> for Vec<f64> {
    fn from(v: TraitVector) -> Self {
        v.0
    }
}
