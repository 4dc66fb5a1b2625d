//! Configuration for the psyche decision engine.
//!
//! Maps directly to `psyche.toml`. Every field has a default, so an empty
//! file yields the built-in setup. The config is loaded once and shared
//! read-only; [`Engine::new`](crate::engine::Engine::new) validates it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::context::ContextLayout;
use crate::emotion::{AppraisalTables, EmotionDirections, EmotionScaling};
use crate::evolution::{EvolutionParams, TriggerRule};
use crate::learning::LearningParams;
use crate::selection::SelectionPolicy;
use crate::traits::TraitDef;
use crate::translation::AgentProfile;
use crate::utility::{SparseWeights, StyleDef};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PsycheConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Trait vector settings.
    #[serde(default)]
    pub personality: PersonalityConfig,
    /// Utility model and selection.
    #[serde(default)]
    pub utility: UtilityConfig,
    /// Emotional influence and appraisal.
    #[serde(default)]
    pub emotion: EmotionConfig,
    /// Long-term trait evolution.
    #[serde(default)]
    pub evolution: EvolutionConfig,
    /// Preference learning.
    #[serde(default)]
    pub learning: LearningConfig,
    /// Generative-text collaborator.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Concurrency limits.
    #[serde(default)]
    pub performance: PerformanceConfig,
    /// Shared immutable tables.
    #[serde(default)]
    pub tables: Tables,
}

impl PsycheConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PsycheError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::PsycheError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Trait vector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityConfig {
    /// Must equal the trait catalog length.
    #[serde(default = "default_50")]
    pub trait_dim: usize,
    /// Dominant traits reported per turn.
    #[serde(default = "default_5")]
    pub top_traits: usize,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            trait_dim: 50,
            top_traits: 5,
        }
    }
}

/// Which selection policy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Softmax sampling.
    #[default]
    Stochastic,
    /// Arg-max.
    Deterministic,
}

/// Utility model and selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityConfig {
    /// Softmax temperature.
    #[serde(default = "default_0_4")]
    pub temperature: f64,
    /// Selection policy.
    #[serde(default)]
    pub policy: PolicyKind,
    /// λ mixing trait-driven and neutral trait operands.
    #[serde(default = "default_1_0")]
    pub trait_influence: f64,
    /// Uniform noise amplitude added to every weight at build time.
    #[serde(default)]
    pub weight_noise: f64,
    /// Seed for all engine randomness; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl UtilityConfig {
    /// Runtime selection policy.
    #[must_use]
    pub fn selection_policy(&self) -> SelectionPolicy {
        match self.policy {
            PolicyKind::Stochastic => SelectionPolicy::Stochastic {
                temperature: self.temperature,
            },
            PolicyKind::Deterministic => SelectionPolicy::Deterministic,
        }
    }
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            policy: PolicyKind::Stochastic,
            trait_influence: 1.0,
            weight_noise: 0.0,
            seed: None,
        }
    }
}

/// Emotional influence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionConfig {
    /// Direction scaling.
    #[serde(default)]
    pub scaling: EmotionScaling,
    /// Multiplier on `direction * intensity`.
    #[serde(default = "default_0_3")]
    pub max_influence: f64,
    /// Intensities below this have no effect.
    #[serde(default = "default_0_1")]
    pub threshold: f64,
    /// Fraction of a repeated emotion's intensity carried into the next turn.
    #[serde(default = "default_0_5")]
    pub carryover: f64,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            scaling: EmotionScaling::Raw,
            max_influence: 0.3,
            threshold: 0.1,
            carryover: 0.5,
        }
    }
}

/// Evolution settings. When disabled, existing shifts keep decaying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Default toggle for new agents.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Scales every shift.
    #[serde(default = "default_0_05")]
    pub learning_rate: f64,
    /// Default shift lifetime.
    #[serde(default = "default_168")]
    pub shift_ttl_hours: f64,
    /// Active shift cap per agent.
    #[serde(default = "default_256")]
    pub max_active_shifts: usize,
    /// Threshold for a "significant" trait change in reports.
    #[serde(default = "default_0_05")]
    pub significant_change: f64,
}

impl EvolutionConfig {
    /// Engine parameters.
    #[must_use]
    pub fn params(&self) -> EvolutionParams {
        EvolutionParams {
            learning_rate: self.learning_rate,
            shift_ttl_hours: self.shift_ttl_hours,
            max_active_shifts: self.max_active_shifts,
            significant_change: self.significant_change,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            learning_rate: 0.05,
            shift_ttl_hours: 168.0,
            max_active_shifts: 256,
            significant_change: 0.05,
        }
    }
}

/// Preference learning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Default toggle for new agents.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Confidence learning rate α, in (0, 1].
    #[serde(default = "default_0_1")]
    pub alpha: f64,
    /// Pattern cap per agent.
    #[serde(default = "default_100")]
    pub capacity: usize,
    /// Fingerprint similarity for deduplication.
    #[serde(default = "default_0_7")]
    pub similarity_threshold: f64,
    /// Confidence kept by `reset(keep_strong = true)`.
    #[serde(default = "default_0_8")]
    pub strong_threshold: f64,
    /// Confidence of a new pattern before its first update.
    #[serde(default = "default_0_5")]
    pub initial_confidence: f64,
    /// Signals at or above this count as positive outcomes.
    #[serde(default = "default_0_5")]
    pub success_threshold: f64,
    /// Scale of learned style biases; 0 disables them.
    #[serde(default = "default_0_3")]
    pub adaptation_strength: f64,
    /// Minimum confidence for a pattern to bias selection.
    #[serde(default = "default_0_6")]
    pub application_threshold: f64,
}

impl LearningConfig {
    /// Engine parameters.
    #[must_use]
    pub fn params(&self) -> LearningParams {
        LearningParams {
            alpha: self.alpha,
            capacity: self.capacity,
            similarity_threshold: self.similarity_threshold,
            strong_threshold: self.strong_threshold,
            initial_confidence: self.initial_confidence,
            success_threshold: self.success_threshold,
            adaptation_strength: self.adaptation_strength,
            application_threshold: self.application_threshold,
        }
    }
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alpha: 0.1,
            capacity: 100,
            similarity_threshold: 0.7,
            strong_threshold: 0.8,
            initial_confidence: 0.5,
            success_threshold: 0.5,
            adaptation_strength: 0.3,
            application_threshold: 0.6,
        }
    }
}

/// Generative-text collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: ollama, openai, none.
    #[serde(default = "default_ollama")]
    pub provider: String,
    /// Base URL.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key (OpenAI-compatible only).
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Per-attempt timeout. The decision stage allows `max_retries + 1`
    /// attempts in total before falling back.
    #[serde(default = "default_5000")]
    pub request_timeout_ms: u64,
    /// Retries after the first attempt.
    #[serde(default = "default_1_u32")]
    pub max_retries: u32,
    /// Generation token cap.
    #[serde(default = "default_256_u32")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_0_7_f32")]
    pub temperature: f32,
}

impl LlmConfig {
    /// Upper bound on the whole generation call, retries included.
    #[must_use]
    pub fn stage_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(
            self.request_timeout_ms
                .saturating_mul(u64::from(self.max_retries) + 1),
        )
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_ollama(),
            base_url: default_ollama_url(),
            model: default_model(),
            api_key_env: None,
            request_timeout_ms: 5000,
            max_retries: 1,
            max_tokens: 256,
            temperature: 0.7,
        }
    }
}

/// Concurrency limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Turns allowed inside the generation call at once, across agents.
    #[serde(default = "default_4")]
    pub max_concurrent_turns: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_turns: 4,
        }
    }
}

/// Shared immutable tables. Each defaults to the built-in preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tables {
    /// Trait catalog, in vector order.
    #[serde(default = "crate::presets::trait_defs")]
    pub traits: Vec<TraitDef>,
    /// Action styles, in tie-break order.
    #[serde(default = "crate::presets::action_styles")]
    pub action_styles: Vec<StyleDef>,
    /// Context features and lookup tables.
    #[serde(default = "crate::presets::context_layout")]
    pub context: ContextLayout,
    /// Sparse utility weights.
    #[serde(default = "crate::presets::utility_weights")]
    pub utility_weights: SparseWeights,
    /// Emotion -> trait directions.
    #[serde(default = "crate::presets::emotion_directions")]
    pub emotion_directions: EmotionDirections,
    /// Tone/intent -> emotion appraisal.
    #[serde(default = "crate::presets::appraisal_tables")]
    pub appraisal: AppraisalTables,
    /// Trigger -> trait directions.
    #[serde(default = "crate::presets::trigger_rules")]
    pub triggers: BTreeMap<String, TriggerRule>,
    /// Per-agent-type profiles.
    #[serde(default = "crate::presets::agent_profiles")]
    pub agent_profiles: BTreeMap<String, AgentProfile>,
    /// Preset personalities.
    #[serde(default = "crate::presets::archetypes")]
    pub archetypes: Vec<Archetype>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            traits: crate::presets::trait_defs(),
            action_styles: crate::presets::action_styles(),
            context: crate::presets::context_layout(),
            utility_weights: crate::presets::utility_weights(),
            emotion_directions: crate::presets::emotion_directions(),
            appraisal: crate::presets::appraisal_tables(),
            triggers: crate::presets::trigger_rules(),
            agent_profiles: crate::presets::agent_profiles(),
            archetypes: crate::presets::archetypes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde requires named functions)
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_ollama() -> String { "ollama".to_string() }
fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "qwen2.5:1.5b".to_string() }
fn default_0_05() -> f64 { 0.05 }
fn default_0_1() -> f64 { 0.1 }
fn default_0_3() -> f64 { 0.3 }
fn default_0_4() -> f64 { 0.4 }
fn default_0_5() -> f64 { 0.5 }
fn default_0_6() -> f64 { 0.6 }
fn default_0_7() -> f64 { 0.7 }
fn default_0_7_f32() -> f32 { 0.7 }
fn default_0_8() -> f64 { 0.8 }
fn default_1_0() -> f64 { 1.0 }
fn default_168() -> f64 { 168.0 }
fn default_1_u32() -> u32 { 1 }
fn default_256_u32() -> u32 { 256 }
fn default_4() -> usize { 4 }
fn default_5() -> usize { 5 }
fn default_50() -> usize { 50 }
fn default_100() -> usize { 100 }
fn default_256() -> usize { 256 }
fn default_5000() -> u64 { 5000 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = PsycheConfig::from_toml("").unwrap();
        assert_eq!(config.personality.trait_dim, 50);
        assert!((config.utility.temperature - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.utility.policy, PolicyKind::Stochastic);
        assert_eq!(config.evolution.max_active_shifts, 256);
        assert_eq!(config.learning.capacity, 100);
        assert_eq!(config.performance.max_concurrent_turns, 4);
        assert_eq!(config.tables.action_styles.len(), 10);
        assert_eq!(config.tables.archetypes.len(), 6);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PsycheConfig::from_toml(
            r#"
            [utility]
            policy = "deterministic"
            seed = 7

            [emotion]
            scaling = "unit_norm"

            [tables.agent_profiles.golem.translation_conditions]
            stone = ">= 10"
            "#,
        )
        .unwrap();
        assert_eq!(config.utility.selection_policy(), SelectionPolicy::Deterministic);
        assert_eq!(config.utility.seed, Some(7));
        assert_eq!(config.emotion.scaling, EmotionScaling::UnitNorm);
        assert!((config.emotion.max_influence - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.tables.agent_profiles.len(), 1);
        assert_eq!(
            config.tables.agent_profiles["golem"].translation_conditions["stone"].to_string(),
            ">= 10"
        );
        assert_eq!(config.tables.context.features.len(), 25);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        assert!(matches!(
            PsycheConfig::from_toml("[utility]\ntemperature = \"hot\""),
            Err(crate::PsycheError::Config(_))
        ));
        let bad = "[tables.agent_profiles.x.translation_conditions]\nhp = \"about 3\"";
        assert!(PsycheConfig::from_toml(bad).is_err());
    }

    #[test]
    fn default_tables_survive_a_toml_round_trip() {
        let tables = Tables::default();
        let text = toml::to_string(&tables).unwrap();
        let back: Tables = toml::from_str(&text).unwrap();
        assert_eq!(back.action_styles, tables.action_styles);
        assert_eq!(back.triggers, tables.triggers);
        assert_eq!(back.archetypes.len(), tables.archetypes.len());
    }
}
