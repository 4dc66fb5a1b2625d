//! Action style selection.
//!
//! Stochastic selection draws from a temperature-scaled softmax using an
//! injected RNG; deterministic selection takes the arg-max, with ties going
//! to the style listed first in configuration.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::error::{PsycheError, Result};
use crate::types::ActionStyle;
use crate::utility::UtilityScores;

/// Temperatures at or below this select the arg-max outright.
pub const MIN_TEMPERATURE: f64 = 1e-6;

/// How utilities become a choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Softmax sampling at temperature `T`.
    Stochastic {
        /// `T`; must be positive.
        temperature: f64,
    },
    /// Arg-max, first style wins ties.
    Deterministic,
}

/// Index of the largest value; the lowest index wins ties. NaN never wins.
#[must_use]
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if *v <= b => {}
            _ => best = Some((i, *v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Temperature-scaled softmax, stabilised by subtracting the maximum.
///
/// A temperature at or below [`MIN_TEMPERATURE`] yields a one-hot vector on
/// the arg-max. Empty input yields an empty vector.
#[must_use]
pub fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    let Some(best) = argmax(values) else {
        return vec![0.0; values.len()];
    };
    if temperature <= MIN_TEMPERATURE || !temperature.is_finite() {
        let mut one_hot = vec![0.0; values.len()];
        one_hot[best] = 1.0;
        return one_hot;
    }
    let max = values[best];
    let exps: Vec<f64> = values
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { ((v - max) / temperature).exp() })
        .collect();
    // exps[best] == 1, so the sum is at least 1.
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Shannon entropy in nats.
#[must_use]
pub fn entropy(probabilities: &[f64]) -> f64 {
    probabilities
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Outcome of one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Chosen style.
    pub style: ActionStyle,
    /// Its position in the configured order.
    pub index: usize,
    /// Probability per style (one-hot for the deterministic policy).
    pub probabilities: Vec<f64>,
}

/// Applies a [`SelectionPolicy`] to utility scores.
#[derive(Debug, Clone, Copy)]
pub struct ActionSelector {
    policy: SelectionPolicy,
}

impl ActionSelector {
    /// Validate the policy.
    ///
    /// # Errors
    /// Returns `PsycheError::Config` for a non-positive or non-finite
    /// stochastic temperature.
    pub fn new(policy: SelectionPolicy) -> Result<Self> {
        if let SelectionPolicy::Stochastic { temperature } = policy {
            if !(temperature.is_finite() && temperature > 0.0) {
                return Err(PsycheError::Config(format!(
                    "stochastic temperature must be positive, got {temperature}"
                )));
            }
        }
        Ok(Self { policy })
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Selection probabilities for these scores under the active policy.
    #[must_use]
    pub fn probabilities(&self, scores: &UtilityScores) -> Vec<f64> {
        let values = scores.values();
        match self.policy {
            SelectionPolicy::Stochastic { temperature } => softmax(&values, temperature),
            SelectionPolicy::Deterministic => softmax(&values, 0.0),
        }
    }

    /// Pick a style. `rng` is only consulted by the stochastic policy.
    ///
    /// # Errors
    /// Returns `PsycheError::Validation` when there are no scores or every
    /// score is NaN.
    pub fn select<R: Rng + ?Sized>(
        &self,
        scores: &UtilityScores,
        rng: &mut R,
    ) -> Result<Selection> {
        let values = scores.values();
        let best = argmax(&values)
            .ok_or_else(|| PsycheError::Validation("no utility scores to select from".into()))?;
        let probabilities = self.probabilities(scores);

        let index = match self.policy {
            SelectionPolicy::Deterministic => best,
            SelectionPolicy::Stochastic { .. } => WeightedIndex::new(&probabilities)
                .map(|dist| dist.sample(rng))
                .unwrap_or(best),
        };
        let style = scores.styles().swap_remove(index);
        Ok(Selection {
            style,
            index,
            probabilities,
        })
    }
}
