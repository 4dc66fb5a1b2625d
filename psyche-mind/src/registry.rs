//! Agent registry and turn runtime.
//!
//! Agents live in a [`DashMap`] keyed by id. Each entry is an
//! `Arc<tokio::sync::Mutex<..>>`, so turns on one agent are serialized while
//! different agents run in parallel, bounded by one global [`Semaphore`].
//!
//! A turn works on a cloned snapshot of the agent (and of its RNG) and only
//! writes back after feedback has been applied. A turn that errors or is
//! cancelled leaves the agent exactly as it was.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use psyche_core::agent::AgentState;
use psyche_core::config::LlmConfig;
use psyche_core::engine::TraitSource;
use psyche_core::evolution::{DevelopmentReport, EvolutionTrigger, InteractionEvent};
use psyche_core::learning::LearningSummary;
use psyche_core::types::{AgentId, Stats};
use psyche_core::utility::Tendencies;
use psyche_core::{Engine, PsycheConfig};
use psyche_llm::{LlmClient, LlmProvider, TextGenerator};

use crate::error::{MindError, Result};
use crate::feedback::apply_feedback;
use crate::output::TurnOutput;
use crate::pipeline::run_turn;
use crate::stages::TurnRequest;

/// How to create an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display name.
    pub name: String,
    /// Agent profile key.
    pub agent_type: String,
    /// Where the initial traits come from.
    #[serde(default = "neutral_source")]
    pub traits: TraitSource,
}

fn neutral_source() -> TraitSource {
    TraitSource::Neutral
}

struct AgentSlot {
    state: AgentState,
    rng: StdRng,
}

type SharedSlot = Arc<Mutex<AgentSlot>>;

/// Owns the engine, the generator and every registered agent.
pub struct Runtime {
    engine: Arc<Engine>,
    generator: Arc<dyn TextGenerator>,
    agents: DashMap<AgentId, SharedSlot>,
    permits: Arc<Semaphore>,
    created: AtomicU64,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("generator", &self.generator.name())
            .field("agents", &self.agents.len())
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

/// Build the generator named by the LLM configuration. The API key, when
/// needed, is read from the environment variable `api_key_env` names.
///
/// # Errors
/// `MindError::Config` for an unknown provider or a missing key.
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>> {
    let api_key = config
        .api_key_env
        .as_deref()
        .and_then(|var| std::env::var(var).ok())
        .filter(|k| !k.is_empty());
    let provider = LlmProvider::from_name(&config.provider, &config.base_url, api_key)
        .map_err(|e| MindError::Config(e.to_string()))?;
    Ok(Arc::new(LlmClient::new(provider, &config.model, config.max_retries)))
}

impl Runtime {
    /// Create a runtime around an explicit generator.
    ///
    /// # Errors
    /// `Config` when `max_concurrent_turns` is zero, `Core` when the engine
    /// rejects the configuration.
    pub fn new(config: PsycheConfig, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let limit = config.performance.max_concurrent_turns;
        if limit == 0 {
            return Err(MindError::Config(
                "performance.max_concurrent_turns must be at least 1".into(),
            ));
        }
        let engine = Engine::new(config)?;
        info!(generator = generator.name(), max_concurrent_turns = limit, "Runtime ready");
        Ok(Self {
            engine: Arc::new(engine),
            generator,
            agents: DashMap::new(),
            permits: Arc::new(Semaphore::new(limit)),
            created: AtomicU64::new(0),
        })
    }

    /// Create a runtime whose generator comes from `config.llm`.
    ///
    /// # Errors
    /// See [`Runtime::new`] and [`build_generator`].
    pub fn from_config(config: PsycheConfig) -> Result<Self> {
        let generator = build_generator(&config.llm)?;
        Self::new(config, generator)
    }

    /// The shared engine.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Ids of every registered agent.
    #[must_use]
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|e| *e.key()).collect()
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Stop admitting generation calls. In-flight turns finish; later turns
    /// fail with `ConcurrencyClosed`.
    pub fn shutdown(&self) {
        self.permits.close();
        info!("Runtime shut down");
    }

    // -- lifecycle ----------------------------------------------------------

    /// Create and register a new agent.
    ///
    /// # Errors
    /// `Core(Validation)` for a blank name or unknown agent type, or any
    /// trait-source error.
    pub fn create_agent(&self, spec: &AgentSpec) -> Result<AgentId> {
        let ordinal = self.created.fetch_add(1, Ordering::Relaxed);
        let mut rng = self.engine.creation_rng(ordinal);
        let state = self
            .engine
            .new_agent(&spec.name, &spec.agent_type, &spec.traits, &mut rng, Utc::now())?;
        let id = state.id;
        self.insert(state)?;
        Ok(id)
    }

    /// Register an existing state, e.g. one loaded from disk.
    ///
    /// # Errors
    /// `AgentExists` if the id is taken, `Core` if the state is malformed.
    pub fn restore(&self, state: AgentState) -> Result<AgentId> {
        state.validate(self.engine.trait_dim())?;
        let id = state.id;
        self.insert(state)?;
        Ok(id)
    }

    fn insert(&self, state: AgentState) -> Result<()> {
        let id = state.id;
        let rng = self.engine.agent_rng(&id);
        match self.agents.entry(id) {
            Entry::Occupied(_) => Err(MindError::AgentExists(id)),
            Entry::Vacant(v) => {
                v.insert(Arc::new(Mutex::new(AgentSlot { state, rng })));
                debug!(agent = %id, "Registered agent");
                Ok(())
            }
        }
    }

    /// Unregister an agent, returning its final state.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id.
    pub async fn remove(&self, id: AgentId) -> Result<AgentState> {
        let (_, slot) = self.agents.remove(&id).ok_or(MindError::AgentNotFound(id))?;
        let state = slot.lock().await.state.clone();
        debug!(agent = %id, "Removed agent");
        Ok(state)
    }

    /// A copy of the agent's current state.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id.
    pub async fn snapshot(&self, id: AgentId) -> Result<AgentState> {
        let slot = self.slot(id)?;
        let guard = slot.lock().await;
        Ok(guard.state.clone())
    }

    /// Write the agent's state to `path` as JSON.
    ///
    /// # Errors
    /// `AgentNotFound`, or `Core` for I/O and encoding failures.
    pub async fn save_agent(&self, id: AgentId, path: &Path) -> Result<()> {
        self.snapshot(id).await?.save(path)?;
        Ok(())
    }

    /// Load an agent state from `path` and register it.
    ///
    /// # Errors
    /// `Core` for I/O, parse or validation failures, `AgentExists` if the id
    /// is already registered.
    pub fn load_agent(&self, path: &Path) -> Result<AgentId> {
        let state = AgentState::load(path, self.engine.trait_dim())?;
        self.restore(state)
    }

    // Clone the Arc so no DashMap guard is held across an await.
    fn slot(&self, id: AgentId) -> Result<SharedSlot> {
        self.agents
            .get(&id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(MindError::AgentNotFound(id))
    }

    async fn with_state<T>(
        &self,
        id: AgentId,
        f: impl FnOnce(&Engine, &mut AgentState) -> Result<T> + Send,
    ) -> Result<T> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        f(&self.engine, &mut guard.state)
    }

    // -- turns --------------------------------------------------------------

    /// Run one turn for `id` and commit its feedback.
    ///
    /// # Errors
    /// `AgentNotFound`, `Validation` for malformed perception,
    /// `ConcurrencyClosed` after [`shutdown`](Self::shutdown), or `Core` for
    /// a structurally broken agent.
    pub async fn turn(&self, id: AgentId, request: &TurnRequest) -> Result<TurnOutput> {
        let slot = self.slot(id)?;
        let mut guard = slot.lock().await;
        let mut working = guard.state.clone();
        let mut rng = guard.rng.clone();
        let now = Utc::now();

        let result = run_turn(
            &self.engine,
            self.generator.as_ref(),
            &self.permits,
            &working,
            request,
            &mut rng,
            now,
        )
        .await
        .inspect_err(|e| warn!(agent = %id, error = %e, "Turn rejected"))?;

        apply_feedback(&self.engine, &mut working, &result.outcome, now);
        guard.state = working;
        guard.rng = rng;
        Ok(result.output)
    }

    // -- state operations ---------------------------------------------------

    /// Apply stat deltas from an external activity.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id, `Validation` for non-finite deltas.
    pub async fn update_stats(&self, id: AgentId, deltas: &Stats) -> Result<Stats> {
        deltas.validate()?;
        self.with_state(id, |engine, state| {
            engine.apply_stat_deltas(&mut state.stats, deltas);
            Ok(state.stats.clone())
        })
        .await
    }

    /// Record an external life event. Returns whether a shift was created.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id.
    pub async fn record_event(
        &self,
        id: AgentId,
        trigger: EvolutionTrigger,
        valence: f64,
    ) -> Result<bool> {
        self.with_state(id, |engine, state| {
            let event = InteractionEvent::new(trigger, valence, Utc::now());
            Ok(engine.evolution().record(&mut state.evolution, &event).is_some())
        })
        .await
    }

    /// Turn evolution on or off. Existing shifts keep decaying either way.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id.
    pub async fn set_evolution_enabled(&self, id: AgentId, enabled: bool) -> Result<()> {
        self.with_state(id, |_, state| {
            state.evolution.enabled = enabled;
            Ok(())
        })
        .await
    }

    /// Turn learning on or off.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id.
    pub async fn set_learning_enabled(&self, id: AgentId, enabled: bool) -> Result<()> {
        self.with_state(id, |_, state| {
            state.learning.enabled = enabled;
            Ok(())
        })
        .await
    }

    /// Clear evolution shifts, optionally folding them into the base traits.
    ///
    /// # Errors
    /// `AgentNotFound`, or `Core` for a malformed agent.
    pub async fn reset_evolution(&self, id: AgentId, keep_shifts: bool) -> Result<()> {
        self.with_state(id, |engine, state| {
            engine
                .evolution()
                .reset(&mut state.base_traits, &mut state.evolution, keep_shifts, Utc::now())?;
            Ok(())
        })
        .await
    }

    /// Clear learned patterns, optionally keeping strong ones.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id.
    pub async fn reset_learning(&self, id: AgentId, keep_strong: bool) -> Result<()> {
        self.with_state(id, |engine, state| {
            engine.learning().reset(&mut state.learning, keep_strong);
            Ok(())
        })
        .await
    }

    // -- reports ------------------------------------------------------------

    /// How the agent has developed since creation.
    ///
    /// # Errors
    /// `AgentNotFound`, or `Core` for a malformed agent.
    pub async fn development_report(&self, id: AgentId) -> Result<DevelopmentReport> {
        self.with_state(id, |engine, state| {
            let current = engine.effective_traits(state, Utc::now())?;
            Ok(engine.evolution().development_report(
                engine.catalog(),
                &state.initial_traits,
                &current,
                &state.evolution,
            )?)
        })
        .await
    }

    /// What the agent has learned.
    ///
    /// # Errors
    /// `AgentNotFound` for an unknown id.
    pub async fn learning_summary(&self, id: AgentId) -> Result<LearningSummary> {
        self.with_state(id, |engine, state| Ok(engine.learning().summary(&state.learning)))
            .await
    }

    /// Preferred and avoided styles under a neutral context.
    ///
    /// # Errors
    /// `AgentNotFound`, or `Core` for a malformed agent.
    pub async fn tendencies(&self, id: AgentId) -> Result<Tendencies> {
        self.with_state(id, |engine, state| {
            let traits = engine.effective_traits(state, Utc::now())?;
            Ok(engine.utility().tendencies(&traits)?)
        })
        .await
    }
}
