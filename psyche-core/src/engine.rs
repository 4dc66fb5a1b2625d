//! The assembled, read-only decision engine.
//!
//! [`Engine`] compiles a [`PsycheConfig`] into the component models once and
//! is then shared between agents. Every method takes the agent's state
//! explicitly; the engine itself never changes after construction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::AgentState;
use crate::archetype::ArchetypeTable;
use crate::config::PsycheConfig;
use crate::context::{ContextEncoder, ContextInput, ContextVector, Familiarity};
use crate::emotion::{AppraisalOutcome, EmotionEngine, appraise};
use crate::error::{PsycheError, Result};
use crate::evolution::EvolutionEngine;
use crate::learning::{Fingerprint, LearningCategory, LearningEngine, PatternStore};
use crate::selection::{ActionSelector, Selection};
use crate::traits::{TraitCatalog, TraitVector};
use crate::translation::AgentProfile;
use crate::types::{AgentId, EmotionalState, Stats};
use crate::utility::{UtilityModel, UtilityScores};

/// Reinforcements after which a situation counts as routine.
const FREQUENT_AFTER: u32 = 3;

/// Odd multiplier spreading creation ordinals across the seed space.
const CREATION_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Where a new agent's base trait vector comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum TraitSource {
    /// A built-in or configured archetype id.
    Archetype(String),
    /// Weighted archetype blend, renormalised.
    Blend(Vec<(String, f64)>),
    /// Descriptor words on a neutral vector, optionally jittered.
    Descriptors {
        /// Words such as `playful` or `loyal`.
        words: Vec<String>,
        /// Uniform jitter amplitude; 0 keeps the vector exact.
        #[serde(default)]
        jitter: f64,
    },
    /// A full vector, clamped to `[0, 1]`.
    Explicit(Vec<f64>),
    /// Every trait at 0.5.
    Neutral,
}

/// Everything the personality stage produced for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityOutcome {
    /// Base plus active shifts plus the emotional overlay.
    pub effective_traits: TraitVector,
    /// Encoded situation.
    pub context: ContextVector,
    /// Utilities straight from the model.
    pub raw_scores: UtilityScores,
    /// Utilities after learned-preference bias; selection used these.
    pub scores: UtilityScores,
    /// The chosen style and its probabilities.
    pub selection: Selection,
    /// Dominant effective traits, strongest first.
    pub top_traits: Vec<(String, f64)>,
}

/// Per-turn signals read by the personality stage.
#[derive(Debug, Clone, Copy)]
pub struct TurnSignals<'a> {
    /// Intent label from perception.
    pub intent: &'a str,
    /// Tone label from perception.
    pub tone: &'a str,
    /// Relationship-quality label from memory.
    pub relationship: &'a str,
    /// Familiarity from the memory stage.
    pub familiarity: Familiarity,
    /// This turn's emotion.
    pub emotion: &'a EmotionalState,
}

/// The compiled engine: catalog, archetypes, encoder, utility model,
/// selector, and the emotion, evolution and learning engines.
#[derive(Debug, Clone)]
pub struct Engine {
    config: PsycheConfig,
    catalog: TraitCatalog,
    archetypes: ArchetypeTable,
    encoder: ContextEncoder,
    utility: UtilityModel,
    selector: ActionSelector,
    emotion: EmotionEngine,
    evolution: EvolutionEngine,
    learning: LearningEngine,
}

impl Engine {
    /// Validate `config` and build every component.
    ///
    /// # Errors
    /// Returns `PsycheError::Config` (or `UnknownTrait`/`UnknownActionStyle`)
    /// for any inconsistency between the tables and the dimensions.
    pub fn new(config: PsycheConfig) -> Result<Self> {
        let tables = &config.tables;
        let catalog = TraitCatalog::new(tables.traits.clone())?;
        if catalog.len() != config.personality.trait_dim {
            return Err(PsycheError::Config(format!(
                "personality.trait_dim is {} but the trait catalog has {} entries",
                config.personality.trait_dim,
                catalog.len()
            )));
        }
        let archetypes = ArchetypeTable::new(tables.archetypes.clone(), catalog.len())?;
        let encoder = ContextEncoder::new(&tables.context)?;

        let mut rng = match config.utility.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let utility = UtilityModel::from_sparse(
            &catalog,
            encoder.features(),
            tables.action_styles.clone(),
            &tables.utility_weights,
            config.utility.trait_influence,
            config.utility.weight_noise,
            &mut rng,
        )?;
        let selector = ActionSelector::new(config.utility.selection_policy())?;
        let emotion = EmotionEngine::new(
            &catalog,
            &tables.emotion_directions,
            config.emotion.scaling,
            config.emotion.max_influence,
            config.emotion.threshold,
        )?;
        let evolution =
            EvolutionEngine::new(&catalog, &tables.triggers, config.evolution.params())?;
        let learning = LearningEngine::new(config.learning.params())?;

        for (agent_type, profile) in &tables.agent_profiles {
            profile.default_stats.validate().map_err(|e| {
                PsycheError::Config(format!("agent profile '{agent_type}': {e}"))
            })?;
        }

        info!(
            traits = catalog.len(),
            features = encoder.dim(),
            styles = utility.labels().len(),
            archetypes = archetypes.len(),
            "Decision engine ready"
        );
        Ok(Self {
            config,
            catalog,
            archetypes,
            encoder,
            utility,
            selector,
            emotion,
            evolution,
            learning,
        })
    }

    // -- accessors ----------------------------------------------------------

    /// The configuration this engine was built from.
    #[must_use]
    pub fn config(&self) -> &PsycheConfig {
        &self.config
    }

    /// Trait catalog.
    #[must_use]
    pub fn catalog(&self) -> &TraitCatalog {
        &self.catalog
    }

    /// Archetype table.
    #[must_use]
    pub fn archetypes(&self) -> &ArchetypeTable {
        &self.archetypes
    }

    /// Context encoder.
    #[must_use]
    pub fn encoder(&self) -> &ContextEncoder {
        &self.encoder
    }

    /// Utility model.
    #[must_use]
    pub fn utility(&self) -> &UtilityModel {
        &self.utility
    }

    /// Style selector.
    #[must_use]
    pub fn selector(&self) -> &ActionSelector {
        &self.selector
    }

    /// Emotional overlay engine.
    #[must_use]
    pub fn emotion(&self) -> &EmotionEngine {
        &self.emotion
    }

    /// Evolution engine.
    #[must_use]
    pub fn evolution(&self) -> &EvolutionEngine {
        &self.evolution
    }

    /// Learning engine.
    #[must_use]
    pub fn learning(&self) -> &LearningEngine {
        &self.learning
    }

    /// Profile for an agent type.
    #[must_use]
    pub fn profile(&self, agent_type: &str) -> Option<&AgentProfile> {
        self.config.tables.agent_profiles.get(agent_type)
    }

    /// Trait dimension N.
    #[must_use]
    pub fn trait_dim(&self) -> usize {
        self.catalog.len()
    }

    /// A per-agent RNG: the configured seed mixed with the agent id, or
    /// entropy when no seed is configured.
    #[must_use]
    pub fn agent_rng(&self, id: &AgentId) -> StdRng {
        match self.config.utility.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ id.seed_bits()),
            None => StdRng::from_entropy(),
        }
    }

    /// RNG for creating the `ordinal`-th agent of a run: the configured seed
    /// mixed with the ordinal, or entropy when no seed is configured.
    #[must_use]
    pub fn creation_rng(&self, ordinal: u64) -> StdRng {
        match self.config.utility.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ ordinal.wrapping_mul(CREATION_STRIDE)),
            None => StdRng::from_entropy(),
        }
    }

    // -- agents -------------------------------------------------------------

    /// Resolve a trait source into a base vector.
    ///
    /// # Errors
    /// Archetype and blend errors from [`ArchetypeTable`], and
    /// `DimensionMismatch` for an explicit vector of the wrong length.
    pub fn resolve_traits<R: Rng + ?Sized>(
        &self,
        source: &TraitSource,
        rng: &mut R,
    ) -> Result<TraitVector> {
        match source {
            TraitSource::Archetype(id) => Ok(self.archetypes.require(id)?.vector.clone()),
            TraitSource::Blend(weights) => {
                let weights: Vec<(&str, f64)> =
                    weights.iter().map(|(id, w)| (id.as_str(), *w)).collect();
                self.archetypes.blend(&weights)
            }
            TraitSource::Descriptors { words, jitter } => {
                let base = TraitVector::from_descriptors(&self.catalog, words);
                if *jitter > 0.0 {
                    Ok(base.randomized(*jitter, rng))
                } else {
                    Ok(base)
                }
            }
            TraitSource::Explicit(values) => {
                let v = TraitVector::new(values.clone());
                v.check_dim(self.trait_dim())?;
                Ok(v)
            }
            TraitSource::Neutral => Ok(TraitVector::neutral(self.trait_dim())),
        }
    }

    /// A fresh agent of `agent_type`, seeded with the profile's default stats
    /// and the configured evolution and learning toggles.
    ///
    /// # Errors
    /// `Validation` for a blank name or an agent type without a profile, plus
    /// anything [`resolve_traits`](Self::resolve_traits) reports.
    pub fn new_agent<R: Rng + ?Sized>(
        &self,
        name: &str,
        agent_type: &str,
        source: &TraitSource,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<AgentState> {
        if name.trim().is_empty() {
            return Err(PsycheError::Validation("agent name must not be empty".into()));
        }
        let profile = self
            .profile(agent_type)
            .ok_or_else(|| PsycheError::Validation(format!("unknown agent type '{agent_type}'")))?;
        let traits = self.resolve_traits(source, rng)?;
        let archetype = match source {
            TraitSource::Archetype(id) => Some(id.clone()),
            _ => None,
        };

        let mut agent = AgentState::new(
            name,
            agent_type,
            archetype,
            traits,
            profile.default_stats.clone(),
            now,
        );
        agent.evolution.enabled = self.config.evolution.enabled;
        agent.learning = PatternStore::new(self.config.learning.enabled);
        debug!(agent = %agent.id, agent_type, "Created agent");
        Ok(agent)
    }

    // -- turn stages --------------------------------------------------------

    /// Emotion stage: appraise perceived tone/intent against the previous
    /// emotion.
    #[must_use]
    pub fn appraise(
        &self,
        tone: &str,
        intent: &str,
        previous: &EmotionalState,
    ) -> AppraisalOutcome {
        appraise(
            &self.config.tables.appraisal,
            tone,
            intent,
            previous,
            self.config.emotion.carryover,
        )
    }

    /// Memory stage: how familiar this `(intent, tone)` pair is, judged by the
    /// learned user-preference pattern for it.
    #[must_use]
    pub fn familiarity(&self, store: &PatternStore, intent: &str, tone: &str) -> Familiarity {
        let fingerprint = situation_fingerprint(intent, tone);
        match self.learning.find(store, LearningCategory::UserPreference, &fingerprint) {
            None => Familiarity::Novel,
            Some(p) if p.reinforcement_count < FREQUENT_AFTER => Familiarity::Similar,
            Some(_) => Familiarity::Frequent,
        }
    }

    /// Personality stage: effective traits, context encoding, utilities,
    /// learned bias and selection. Reads `agent`, never writes it.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` if the agent's vectors do not
    /// match the engine.
    pub fn personality_stage<R: Rng + ?Sized>(
        &self,
        agent: &AgentState,
        signals: &TurnSignals<'_>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<PersonalityOutcome> {
        let base = self.evolution.effective_base(&agent.base_traits, &agent.evolution, now)?;
        let effective_traits = self.emotion.apply(&base, signals.emotion)?;

        let context = self.encoder.encode(&ContextInput {
            intent: signals.intent,
            tone: signals.tone,
            emotion: signals.emotion,
            relationship: signals.relationship,
            familiarity: signals.familiarity,
            stats: &agent.stats,
        });

        let raw_scores = self.utility.compute_utilities(&effective_traits, &context)?;
        let biases = self.learning.style_biases(&agent.learning, self.utility.labels());
        let scores = raw_scores.with_bias(&biases)?;
        let selection = self.selector.select(&scores, rng)?;
        let top_traits =
            effective_traits.dominant(&self.catalog, self.config.personality.top_traits);

        debug!(
            agent = %agent.id,
            style = %selection.style,
            familiarity = %signals.familiarity,
            "Personality stage selected style"
        );
        Ok(PersonalityOutcome {
            effective_traits,
            context,
            raw_scores,
            scores,
            selection,
            top_traits,
        })
    }

    /// Current effective base vector (shifts applied, no emotion).
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` on a malformed agent.
    pub fn effective_traits(&self, agent: &AgentState, now: DateTime<Utc>) -> Result<TraitVector> {
        self.evolution.effective_base(&agent.base_traits, &agent.evolution, now)
    }

    /// Apply stat deltas from an external activity, clamped to
    /// `STAT_MIN..=STAT_MAX`.
    pub fn apply_stat_deltas(&self, stats: &mut Stats, deltas: &Stats) {
        stats.apply_deltas(deltas, STAT_MIN, STAT_MAX);
    }

    /// Named values of the current effective traits.
    ///
    /// # Errors
    /// Returns `PsycheError::DimensionMismatch` on a malformed agent.
    pub fn named_traits(
        &self,
        agent: &AgentState,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, f64>> {
        let effective = self.effective_traits(agent, now)?;
        Ok(self
            .catalog
            .defs()
            .iter()
            .zip(effective.as_slice())
            .map(|(d, v)| (d.name.clone(), *v))
            .collect())
    }
}

/// Lower stat bound; stats live on a 0..=100 scale.
pub const STAT_MIN: f64 = 0.0;
/// Upper stat bound.
pub const STAT_MAX: f64 = 100.0;

/// Fingerprint identifying an `(intent, tone)` situation.
#[must_use]
pub fn situation_fingerprint(intent: &str, tone: &str) -> Fingerprint {
    Fingerprint::from_pairs([("intent", intent.to_lowercase()), ("tone", tone.to_lowercase())])
}
