//! Archetypes: immutable, named preset trait vectors.
//!
//! The table is loaded once and shared read-only. Blending renormalizes the
//! supplied weights to sum to 1, so `blend({a: 2, b: 2})` and
//! `blend({a: 0.5, b: 0.5})` are the same vector.

use serde::{Deserialize, Serialize};

use crate::error::{PsycheError, Result};
use crate::traits::TraitVector;

/// How an archetype talks; used to flavour generation prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechStyle {
    /// Overall tone.
    pub tone: String,
    /// Recurring speech patterns.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Characteristic phrases.
    #[serde(default)]
    pub common_phrases: Vec<String>,
}

/// A named preset personality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    /// Table key, e.g. `einstein`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Preset trait vector.
    pub vector: TraitVector,
    /// Speech flavour.
    #[serde(default)]
    pub speech_style: SpeechStyle,
}

/// Listing entry for [`ArchetypeTable::list`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeSummary {
    /// Table key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
}

/// The shared archetype table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeTable {
    archetypes: Vec<Archetype>,
    dim: usize,
}

impl ArchetypeTable {
    /// Validate and build the table.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if any vector is not `dim`
    /// long, or `PsycheError::Config` on duplicate ids.
    pub fn new(archetypes: Vec<Archetype>, dim: usize) -> Result<Self> {
        for (i, a) in archetypes.iter().enumerate() {
            a.vector.check_dim(dim)?;
            if archetypes[..i].iter().any(|b| b.id == a.id) {
                return Err(PsycheError::Config(format!("duplicate archetype id '{}'", a.id)));
            }
        }
        Ok(Self { archetypes, dim })
    }

    /// Look up an archetype.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Archetype> {
        self.archetypes.iter().find(|a| a.id == id)
    }

    /// Look up an archetype or fail with `UnknownArchetype`.
    ///
    /// # Errors
    /// Returns `PsycheError::UnknownArchetype`.
    pub fn require(&self, id: &str) -> Result<&Archetype> {
        self.get(id)
            .ok_or_else(|| PsycheError::UnknownArchetype(id.to_string()))
    }

    /// Id, name and description of every archetype in table order.
    #[must_use]
    pub fn list(&self) -> Vec<ArchetypeSummary> {
        self.archetypes
            .iter()
            .map(|a| ArchetypeSummary {
                id: a.id.clone(),
                name: a.name.clone(),
                description: a.description.clone(),
            })
            .collect()
    }

    /// Number of archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Weighted blend `Σ (w_i / Σw) * v_i`, clamped.
    ///
    /// # Errors
    /// - `Validation` for a negative or non-finite weight,
    /// - `UnknownArchetype` for an id not in the table,
    /// - `EmptyBlend` when the weights sum to zero (including no weights).
    pub fn blend(&self, weights: &[(&str, f64)]) -> Result<TraitVector> {
        for (id, w) in weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(PsycheError::Validation(format!(
                    "blend weight for '{id}' must be a non-negative number, got {w}"
                )));
            }
        }
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Err(PsycheError::EmptyBlend);
        }

        let mut out = vec![0.0; self.dim];
        for (id, w) in weights {
            let archetype = self.require(id)?;
            let share = w / total;
            for (o, v) in out.iter_mut().zip(archetype.vector.as_slice()) {
                *o += v * share;
            }
        }
        Ok(TraitVector::new(out))
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self {
            archetypes: crate::presets::archetypes(),
            dim: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_lists_six_archetypes() {
        let table = ArchetypeTable::default();
        assert_eq!(table.len(), 6);
        let ids: Vec<String> = table.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["leonardo", "einstein", "montessori", "socrates", "rogers", "yoda"]);
        assert!(ArchetypeTable::new(crate::presets::archetypes(), 50).is_ok());
    }

    #[test]
    fn self_blend_is_identity() {
        let table = ArchetypeTable::default();
        let original = table.require("yoda").unwrap().vector.clone();
        let blended = table.blend(&[("yoda", 0.3), ("yoda", 0.7)]).unwrap();
        for (a, b) in original.as_slice().iter().zip(blended.as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn weights_are_renormalized() {
        let table = ArchetypeTable::default();
        let a = table.blend(&[("einstein", 2.0), ("rogers", 2.0)]).unwrap();
        let b = table.blend(&[("einstein", 0.5), ("rogers", 0.5)]).unwrap();
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_weight_blend_is_an_error() {
        let table = ArchetypeTable::default();
        assert!(matches!(table.blend(&[("yoda", 0.0)]), Err(PsycheError::EmptyBlend)));
        assert!(matches!(table.blend(&[]), Err(PsycheError::EmptyBlend)));
    }

    #[test]
    fn bad_inputs_rejected() {
        let table = ArchetypeTable::default();
        assert!(matches!(table.blend(&[("gandalf", 1.0)]), Err(PsycheError::UnknownArchetype(_))));
        assert!(matches!(table.blend(&[("yoda", -1.0)]), Err(PsycheError::Validation(_))));
    }

    #[test]
    fn wrong_vector_length_rejected() {
        let bad = Archetype {
            id: "tiny".into(),
            name: "Tiny".into(),
            description: String::new(),
            vector: TraitVector::neutral(3),
            speech_style: SpeechStyle::default(),
        };
        assert!(matches!(
            ArchetypeTable::new(vec![bad], 50),
            Err(PsycheError::DimensionMismatch { .. })
        ));
    }
}
