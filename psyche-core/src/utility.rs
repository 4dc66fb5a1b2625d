//! Trait-based utility model.
//!
//! For every configured action style `a` the model holds a dense weight
//! matrix `W_a` (trait_dim x context_dim) and a bias `b_a`, and scores
//!
//! ```text
//! U(a | t, c) = t' · W_a · c + b_a,    t' = λ·t + (1 - λ)·0.5
//! ```
//!
//! where λ is the trait-influence coefficient. With λ = 1 this is the plain
//! bilinear form. Either way the score is linear in `c`.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::ContextVector;
use crate::error::{PsycheError, Result, ensure_dim};
use crate::traits::{TraitCatalog, TraitVector};
use crate::types::ActionStyle;

/// Sparse `style -> trait -> context feature -> weight`. Missing pairs are 0.
pub type SparseWeights = BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>;

/// One configured action style and the guidance that goes with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDef {
    /// Label, e.g. `playful`.
    pub name: String,
    /// What the style looks like, used in generation prompts.
    #[serde(default)]
    pub description: String,
    /// Short behaviour tags.
    #[serde(default)]
    pub behavior_tags: Vec<String>,
    /// Bias `b_a`.
    #[serde(default)]
    pub bias: f64,
    /// Stylized line appended to the vocalisation on the fallback path.
    #[serde(default)]
    pub fallback_output: String,
    /// Human-readable fallback rendering.
    #[serde(default)]
    pub fallback_translation: String,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Utility per style, in configured style order. Valid for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityScores {
    entries: Vec<(ActionStyle, f64)>,
}

impl UtilityScores {
    /// Build from `(style, score)` pairs; order is the tie-break order.
    #[must_use]
    pub fn new(entries: Vec<(ActionStyle, f64)>) -> Self {
        Self { entries }
    }

    /// Score for a style.
    #[must_use]
    pub fn get(&self, style: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s.as_str() == style)
            .map(|(_, u)| *u)
    }

    /// `(style, score)` pairs in configured order.
    pub fn iter(&self) -> impl Iterator<Item = (&ActionStyle, f64)> {
        self.entries.iter().map(|(s, u)| (s, *u))
    }

    /// Styles in configured order.
    #[must_use]
    pub fn styles(&self) -> Vec<ActionStyle> {
        self.entries.iter().map(|(s, _)| s.clone()).collect()
    }

    /// Scores in configured order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, u)| *u).collect()
    }

    /// Number of styles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no styles are scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-scoring style; the first one wins ties.
    #[must_use]
    pub fn argmax(&self) -> Option<&ActionStyle> {
        crate::selection::argmax(&self.values()).map(|i| &self.entries[i].0)
    }

    /// Return a copy with `biases[i]` added to the i-th score.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if the lengths differ.
    pub fn with_bias(&self, biases: &[f64]) -> Result<Self> {
        ensure_dim("style bias", self.entries.len(), biases.len())?;
        Ok(Self {
            entries: self
                .entries
                .iter()
                .zip(biases)
                .map(|((s, u), b)| (s.clone(), u + b))
                .collect(),
        })
    }

    /// Scores keyed by style name, for debug output.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|(s, u)| (s.as_str().to_string(), *u))
            .collect()
    }
}

/// Personality tendencies under a neutral context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tendencies {
    /// Three most preferred styles, best first.
    pub preferred: Vec<(String, f64)>,
    /// Two least preferred styles, worst first.
    pub avoided: Vec<(String, f64)>,
    /// One-line description.
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightSnapshot {
    styles: Vec<String>,
    trait_dim: usize,
    context_dim: usize,
    trait_influence: f64,
    biases: Vec<f64>,
    /// `weights[style][trait][feature]`.
    weights: Vec<Vec<Vec<f64>>>,
}

/// The utility model: one weight matrix and bias per action style.
#[derive(Debug, Clone)]
pub struct UtilityModel {
    styles: Vec<StyleDef>,
    labels: Vec<ActionStyle>,
    /// Row-major `trait_dim * context_dim` per style.
    weights: Vec<Vec<f64>>,
    trait_dim: usize,
    context_dim: usize,
    trait_influence: f64,
}

impl UtilityModel {
    /// Build dense matrices from the sparse table. When `noise > 0`, every
    /// cell gets an extra uniform draw from `[-noise, noise]`.
    ///
    /// # Errors
    /// - `Config` for an empty or duplicated style list, an unknown context
    ///   feature, or λ outside `[0, 1]`,
    /// - `UnknownActionStyle` for a sparse entry naming an unconfigured style,
    /// - `UnknownTrait` for a trait outside the catalog.
    pub fn from_sparse<R: Rng + ?Sized>(
        catalog: &TraitCatalog,
        features: &[String],
        styles: Vec<StyleDef>,
        sparse: &SparseWeights,
        trait_influence: f64,
        noise: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if styles.is_empty() {
            return Err(PsycheError::Config("no action styles configured".into()));
        }
        if features.is_empty() {
            return Err(PsycheError::Config("no context features configured".into()));
        }
        for (i, s) in styles.iter().enumerate() {
            if styles[..i].iter().any(|o| o.name == s.name) {
                return Err(PsycheError::Config(format!("duplicate action style '{}'", s.name)));
            }
        }
        if !(0.0..=1.0).contains(&trait_influence) {
            return Err(PsycheError::Config(format!(
                "trait_influence must be within [0, 1], got {trait_influence}"
            )));
        }
        if !(noise.is_finite() && noise >= 0.0) {
            return Err(PsycheError::Config(format!(
                "weight_noise must be non-negative, got {noise}"
            )));
        }

        let trait_dim = catalog.len();
        let context_dim = features.len();
        let mut weights = vec![vec![0.0; trait_dim * context_dim]; styles.len()];

        for (style, rows) in sparse {
            let k = styles
                .iter()
                .position(|s| &s.name == style)
                .ok_or_else(|| PsycheError::UnknownActionStyle(style.clone()))?;
            for (trait_name, cells) in rows {
                let i = catalog.require(trait_name)?;
                for (feature, w) in cells {
                    let j = features.iter().position(|f| f == feature).ok_or_else(|| {
                        PsycheError::Config(format!(
                            "utility weight for '{style}' references unknown context feature \
                             '{feature}'"
                        ))
                    })?;
                    weights[k][i * context_dim + j] = *w;
                }
            }
        }

        if noise > 0.0 {
            for w in weights.iter_mut().flatten() {
                *w += rng.gen_range(-noise..=noise);
            }
        }

        let labels = styles.iter().map(|s| ActionStyle::new(s.name.clone())).collect();
        Ok(Self {
            styles,
            labels,
            weights,
            trait_dim,
            context_dim,
            trait_influence,
        })
    }

    /// Configured styles in tie-break order.
    #[must_use]
    pub fn styles(&self) -> &[StyleDef] {
        &self.styles
    }

    /// Style labels in tie-break order.
    #[must_use]
    pub fn labels(&self) -> &[ActionStyle] {
        &self.labels
    }

    /// Guidance for a style.
    #[must_use]
    pub fn guidance(&self, style: &str) -> Option<&StyleDef> {
        self.styles.iter().find(|s| s.name == style)
    }

    /// Trait dimension N.
    #[must_use]
    pub fn trait_dim(&self) -> usize {
        self.trait_dim
    }

    /// Context dimension M.
    #[must_use]
    pub fn context_dim(&self) -> usize {
        self.context_dim
    }

    /// λ.
    #[must_use]
    pub fn trait_influence(&self) -> f64 {
        self.trait_influence
    }

    /// Score every style.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if either vector disagrees
    /// with the configured N or M.
    pub fn compute_utilities(
        &self,
        traits: &TraitVector,
        context: &ContextVector,
    ) -> Result<UtilityScores> {
        traits.check_dim(self.trait_dim)?;
        context.check_dim(self.context_dim)?;

        let lambda = self.trait_influence;
        let operand: Vec<f64> = traits
            .as_slice()
            .iter()
            .map(|t| lambda * t + (1.0 - lambda) * 0.5)
            .collect();
        let c = context.as_slice();

        let entries = self
            .weights
            .iter()
            .zip(&self.styles)
            .zip(&self.labels)
            .map(|((w, def), label)| {
                let mut u = def.bias;
                for (row, t) in w.chunks_exact(self.context_dim).zip(&operand) {
                    if *t == 0.0 {
                        continue;
                    }
                    let dot: f64 = row.iter().zip(c).map(|(a, b)| a * b).sum();
                    u += t * dot;
                }
                (label.clone(), u)
            })
            .collect();
        Ok(UtilityScores::new(entries))
    }

    /// Utilities under the uniform unit-length context, ranked.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` for a wrong-length vector.
    pub fn tendencies(&self, traits: &TraitVector) -> Result<Tendencies> {
        let scores = self.compute_utilities(traits, &ContextVector::neutral(self.context_dim))?;
        let mut ranked: Vec<(usize, String, f64)> = scores
            .iter()
            .enumerate()
            .map(|(i, (s, u))| (i, s.as_str().to_string(), u))
            .collect();
        ranked.sort_by_key(|(i, _, u)| (std::cmp::Reverse(OrderedFloat(*u)), *i));

        let preferred: Vec<(String, f64)> =
            ranked.iter().take(3).map(|(_, s, u)| (s.clone(), *u)).collect();
        let avoided: Vec<(String, f64)> =
            ranked.iter().rev().take(2).map(|(_, s, u)| (s.clone(), *u)).collect();

        let names = |v: &[(String, f64)]| {
            v.iter().map(|(s, _)| s.as_str()).collect::<Vec<_>>().join(", ")
        };
        let summary = format!(
            "Tends to be {}; least likely to be {}",
            names(&preferred),
            names(&avoided)
        );
        Ok(Tendencies {
            preferred,
            avoided,
            summary,
        })
    }

    /// Serialize the dense weights, biases and λ.
    ///
    /// # Errors
    /// Returns `PsycheError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        let snapshot = WeightSnapshot {
            styles: self.styles.iter().map(|s| s.name.clone()).collect(),
            trait_dim: self.trait_dim,
            context_dim: self.context_dim,
            trait_influence: self.trait_influence,
            biases: self.styles.iter().map(|s| s.bias).collect(),
            weights: self
                .weights
                .iter()
                .map(|w| w.chunks_exact(self.context_dim).map(<[f64]>::to_vec).collect())
                .collect(),
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Restore a model from [`to_json`](Self::to_json) output. `styles` supplies
    /// the guidance text; names must match the snapshot in order. Biases come
    /// from the snapshot.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Config` for a style mismatch and
    /// `DimensionMismatch` for any wrongly shaped matrix.
    pub fn from_json(json: &str, mut styles: Vec<StyleDef>) -> Result<Self> {
        let snapshot: WeightSnapshot = serde_json::from_str(json)?;
        let names: Vec<&str> = styles.iter().map(|s| s.name.as_str()).collect();
        if names != snapshot.styles.iter().map(String::as_str).collect::<Vec<_>>() {
            return Err(PsycheError::Config(format!(
                "weight snapshot styles {:?} do not match configured styles {names:?}",
                snapshot.styles
            )));
        }
        if snapshot.context_dim == 0 {
            return Err(PsycheError::Config("weight snapshot has no context features".into()));
        }
        ensure_dim("style biases", styles.len(), snapshot.biases.len())?;
        ensure_dim("style matrices", styles.len(), snapshot.weights.len())?;

        let mut weights = Vec::with_capacity(styles.len());
        for matrix in &snapshot.weights {
            ensure_dim("weight rows", snapshot.trait_dim, matrix.len())?;
            let mut dense = Vec::with_capacity(snapshot.trait_dim * snapshot.context_dim);
            for row in matrix {
                ensure_dim("weight columns", snapshot.context_dim, row.len())?;
                if row.iter().any(|w| !w.is_finite()) {
                    return Err(PsycheError::Validation(
                        "weight snapshot contains a non-finite value".into(),
                    ));
                }
                dense.extend_from_slice(row);
            }
            weights.push(dense);
        }
        for (style, bias) in styles.iter_mut().zip(&snapshot.biases) {
            style.bias = *bias;
        }

        let labels = styles.iter().map(|s| ActionStyle::new(s.name.clone())).collect();
        Ok(Self {
            styles,
            labels,
            weights,
            trait_dim: snapshot.trait_dim,
            context_dim: snapshot.context_dim,
            trait_influence: snapshot.trait_influence.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tiny() -> (TraitCatalog, Vec<String>, UtilityModel) {
        let catalog = TraitCatalog::canonical();
        let features = vec!["play".to_string(), "danger".to_string()];
        let styles = vec![
            StyleDef {
                name: "playful".into(),
                description: String::new(),
                behavior_tags: vec![],
                bias: 0.1,
                fallback_output: String::new(),
                fallback_translation: String::new(),
            },
            StyleDef {
                name: "cautious".into(),
                description: String::new(),
                behavior_tags: vec![],
                bias: 0.0,
                fallback_output: String::new(),
                fallback_translation: String::new(),
            },
        ];
        let mut sparse = SparseWeights::new();
        sparse
            .entry("playful".into())
            .or_default()
            .entry("extraversion".into())
            .or_default()
            .insert("play".into(), 1.0);
        sparse
            .entry("cautious".into())
            .or_default()
            .entry("caution".into())
            .or_default()
            .insert("danger".into(), 2.0);
        let model = UtilityModel::from_sparse(
            &catalog,
            &features,
            styles,
            &sparse,
            1.0,
            0.0,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        (catalog, features, model)
    }

    #[test]
    fn bilinear_score() {
        let (catalog, _, model) = tiny();
        let traits =
            TraitVector::from_named(&catalog, &[("extraversion", 0.8), ("caution", 0.25)]).unwrap();
        let scores = model.compute_utilities(&traits, &ContextVector::new(vec![1.0, 0.5])).unwrap();
        assert!((scores.get("playful").unwrap() - (0.8 + 0.1)).abs() < 1e-12);
        assert!((scores.get("cautious").unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(scores.argmax().map(ActionStyle::as_str), Some("playful"));
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let (_, _, model) = tiny();
        let err = model
            .compute_utilities(&TraitVector::neutral(49), &ContextVector::new(vec![1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, PsycheError::DimensionMismatch { expected: 50, actual: 49, .. }));
        assert!(model
            .compute_utilities(&TraitVector::neutral(50), &ContextVector::new(vec![1.0]))
            .is_err());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let catalog = TraitCatalog::canonical();
        let features = vec!["play".to_string()];
        let styles = crate::presets::action_styles();
        let mut rng = StdRng::seed_from_u64(1);

        let mut sparse = SparseWeights::new();
        sparse.entry("moody".into()).or_default();
        assert!(matches!(
            UtilityModel::from_sparse(
                &catalog,
                &features,
                styles.clone(),
                &sparse,
                1.0,
                0.0,
                &mut rng,
            ),
            Err(PsycheError::UnknownActionStyle(_))
        ));

        let mut sparse = SparseWeights::new();
        sparse.entry("playful".into()).or_default().entry("zest".into()).or_default();
        assert!(matches!(
            UtilityModel::from_sparse(&catalog, &features, styles, &sparse, 1.0, 0.0, &mut rng),
            Err(PsycheError::UnknownTrait(_))
        ));
    }

    #[test]
    fn zero_influence_ignores_traits() {
        let catalog = TraitCatalog::canonical();
        let features: Vec<String> =
            crate::presets::CONTEXT_FEATURES.iter().map(|s| (*s).to_string()).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let model = UtilityModel::from_sparse(
            &catalog,
            &features,
            crate::presets::action_styles(),
            &crate::presets::utility_weights(),
            0.0,
            0.0,
            &mut rng,
        )
        .unwrap();
        let c = ContextVector::neutral(features.len());
        let a = model.compute_utilities(&TraitVector::new(vec![0.0; 50]), &c).unwrap();
        let b = model.compute_utilities(&TraitVector::new(vec![1.0; 50]), &c).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn json_snapshot_restores_identical_scores() {
        let (catalog, _, model) = tiny();
        let json = model.to_json().unwrap();
        let restored = UtilityModel::from_json(&json, model.styles().to_vec()).unwrap();
        let traits = TraitVector::from_named(&catalog, &[("caution", 0.9)]).unwrap();
        let c = ContextVector::new(vec![0.6, 0.8]);
        assert_eq!(
            model.compute_utilities(&traits, &c).unwrap(),
            restored.compute_utilities(&traits, &c).unwrap()
        );

        let mut renamed = model.styles().to_vec();
        renamed[0].name = "zany".into();
        assert!(UtilityModel::from_json(&json, renamed).is_err());
    }

    #[test]
    fn tendencies_rank_styles() {
        let (catalog, _, model) = tiny();
        let traits =
            TraitVector::from_named(&catalog, &[("caution", 1.0), ("extraversion", 0.0)]).unwrap();
        let t = model.tendencies(&traits).unwrap();
        assert_eq!(t.preferred[0].0, "cautious");
        assert_eq!(t.avoided[0].0, "playful");
        assert!(t.summary.contains("cautious"));
    }

    #[test]
    fn bias_is_added_per_style() {
        let (catalog, _, model) = tiny();
        let scores = model
            .compute_utilities(
                &TraitVector::neutral(catalog.len()),
                &ContextVector::new(vec![0.0, 0.0]),
            )
            .unwrap();
        let biased = scores.with_bias(&[0.0, 1.0]).unwrap();
        assert_eq!(biased.argmax().map(ActionStyle::as_str), Some("cautious"));
        assert!(scores.with_bias(&[1.0]).is_err());
    }
}
