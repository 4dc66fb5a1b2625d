//! Integration Tests — End-to-End Engine Flows
//!
//! Snapshot round-trips through the filesystem and the archetype →
//! personality → evolution → learning lifecycle of a single agent.

use chrono::{Duration, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use psyche_core::agent::AgentState;
use psyche_core::config::{PolicyKind, PsycheConfig};
use psyche_core::context::Familiarity;
use psyche_core::engine::{TraitSource, TurnSignals, situation_fingerprint};
use psyche_core::evolution::{EvolutionTrigger, InteractionEvent};
use psyche_core::learning::{Fingerprint, LearningCategory, Observation};
use psyche_core::translation;
use psyche_core::types::{EmotionalState, Stats};
use psyche_core::utility::UtilityModel;
use psyche_core::{Engine, PsycheError};

fn engine() -> Engine {
    let mut config = PsycheConfig::default();
    config.utility.seed = Some(2026);
    config.utility.policy = PolicyKind::Deterministic;
    Engine::new(config).unwrap()
}

fn t(hours: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).single().unwrap() + Duration::hours(hours)
}

// ---------------------------------------------------------------------------
// Snapshot persistence
// ---------------------------------------------------------------------------

#[test]
fn agent_snapshot_survives_disk_round_trip() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(3);
    let mut agent = engine
        .new_agent("Biscuit", "mammal", &TraitSource::Archetype("rogers".into()), &mut rng, t(0))
        .unwrap();

    let event = InteractionEvent::new(EvolutionTrigger::SocialBonding, 0.7, t(1));
    engine.evolution().record(&mut agent.evolution, &event);
    engine.learning().observe(
        &mut agent.learning,
        &Observation {
            category: LearningCategory::UserPreference,
            signal: 0.9,
            fingerprint: situation_fingerprint("affection", "gentle"),
            description: "likes gentle affection".into(),
        },
        t(1),
    );
    agent.emotional_state = EmotionalState::new("happy", 0.6);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("biscuit.json");
    agent.save(&path).unwrap();
    let restored = AgentState::load(&path, engine.trait_dim()).unwrap();

    assert_eq!(restored.id, agent.id);
    assert_eq!(restored.name, "Biscuit");
    assert_eq!(restored.evolution.shifts.len(), 1);
    assert_eq!(restored.learning.patterns.len(), 1);
    assert_eq!(restored.emotional_state.label, "happy");
    for (a, b) in restored
        .base_traits
        .as_slice()
        .iter()
        .zip(agent.base_traits.as_slice())
    {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn loading_with_another_dimension_fails_fast() {
    let engine = engine();
    let agent = engine
        .new_agent("Sly", "reptile", &TraitSource::Neutral, &mut StdRng::seed_from_u64(0), t(0))
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sly.json");
    agent.save(&path).unwrap();
    assert!(matches!(
        AgentState::load(&path, 48),
        Err(PsycheError::DimensionMismatch { .. })
    ));
}

#[test]
fn utility_weights_round_trip_through_json() {
    let engine = engine();
    let json = engine.utility().to_json().unwrap();
    let restored =
        UtilityModel::from_json(&json, engine.config().tables.action_styles.clone()).unwrap();
    let traits = engine.archetypes().get("einstein").unwrap().vector.clone();
    let a = engine.utility().tendencies(&traits).unwrap();
    let b = restored.tendencies(&traits).unwrap();
    assert_eq!(
        a.preferred.iter().map(|(s, _)| s.as_str()).collect::<Vec<_>>(),
        b.preferred.iter().map(|(s, _)| s.as_str()).collect::<Vec<_>>()
    );
}

// ---------------------------------------------------------------------------
// Lifecycle: archetype → turns → evolution → learning → reset
// ---------------------------------------------------------------------------

#[test]
fn archetype_agent_lifecycle() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(9);
    let mut agent = engine
        .new_agent(
            "Nova",
            "mammal",
            &TraitSource::Blend(vec![("leonardo".into(), 2.0), ("yoda".into(), 1.0)]),
            &mut rng,
            t(0),
        )
        .unwrap();
    assert!(agent.archetype.is_none());

    // A run of rough interactions.
    for h in 0..20 {
        let event = InteractionEvent::new(EvolutionTrigger::NegativeInteraction, -0.9, t(h));
        engine.evolution().record(&mut agent.evolution, &event);
    }
    let catalog = engine.catalog();
    let before = agent.base_traits.value(catalog, "trust").unwrap();
    let after = engine
        .effective_traits(&agent, t(20))
        .unwrap()
        .value(catalog, "trust")
        .unwrap();
    assert!(after < before);

    let report = engine
        .evolution()
        .development_report(
            catalog,
            &agent.initial_traits,
            &engine.effective_traits(&agent, t(20)).unwrap(),
            &agent.evolution,
        )
        .unwrap();
    assert!(report.total_change > 0.0);
    assert!(report.stability < 1.0);
    assert_eq!(report.common_triggers[0].0, EvolutionTrigger::NegativeInteraction);

    // Shifts fade out after the TTL window.
    let later = t(20 + 24 * 8);
    let faded = engine.effective_traits(&agent, later).unwrap();
    assert!((faded.value(catalog, "trust").unwrap() - before).abs() < 1e-12);

    // Keeping shifts folds them into the base.
    engine
        .evolution()
        .reset(&mut agent.base_traits, &mut agent.evolution, true, t(20))
        .unwrap();
    assert!(agent.evolution.shifts.is_empty());
    assert!(agent.base_traits.value(catalog, "trust").unwrap() < before);

    // Familiarity grows as the same situation recurs.
    let mut seen = Vec::new();
    for h in 0..4 {
        seen.push(engine.familiarity(&agent.learning, "play", "excited"));
        engine.learning().observe(
            &mut agent.learning,
            &Observation {
                category: LearningCategory::UserPreference,
                signal: 0.8,
                fingerprint: situation_fingerprint("play", "excited"),
                description: "play while excited".into(),
            },
            t(30 + h),
        );
    }
    assert_eq!(
        seen,
        vec![Familiarity::Novel, Familiarity::Similar, Familiarity::Similar, Familiarity::Frequent]
    );

    let summary = engine.learning().summary(&agent.learning);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.total_reinforcements, 4);

    engine.learning().reset(&mut agent.learning, false);
    assert!(agent.learning.patterns.is_empty());
}

#[test]
fn confident_behavioral_pattern_biases_selection() {
    let engine = engine();
    let now = t(0);
    let mut agent = engine
        .new_agent("Echo", "mammal", &TraitSource::Neutral, &mut StdRng::seed_from_u64(1), now)
        .unwrap();
    let emotion = EmotionalState::neutral();
    let signals = TurnSignals {
        intent: "chat",
        tone: "neutral",
        relationship: "acquaintance",
        familiarity: Familiarity::Novel,
        emotion: &emotion,
    };
    let baseline = engine
        .personality_stage(&agent, &signals, now, &mut StdRng::seed_from_u64(1))
        .unwrap();
    let loser = baseline
        .scores
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s.clone())
        .unwrap();

    for _ in 0..40 {
        engine.learning().observe(
            &mut agent.learning,
            &Observation {
                category: LearningCategory::BehavioralPattern,
                signal: 1.0,
                fingerprint: Fingerprint::from_pairs([("action_style", loser.as_str())]),
                description: format!("{loser} works"),
            },
            now,
        );
    }
    let biased = engine
        .personality_stage(&agent, &signals, now, &mut StdRng::seed_from_u64(1))
        .unwrap();
    let raw = biased.raw_scores.get(loser.as_str()).unwrap();
    let boosted = biased.scores.get(loser.as_str()).unwrap();
    assert!(boosted > raw);
    assert_eq!(raw, baseline.scores.get(loser.as_str()).unwrap());
}

#[test]
fn profile_gate_tracks_stat_changes() {
    let engine = engine();
    let mut agent = engine
        .new_agent("Mochi", "mammal", &TraitSource::Neutral, &mut StdRng::seed_from_u64(5), t(0))
        .unwrap();
    let conditions = &engine.profile("mammal").unwrap().translation_conditions;
    assert!(translation::evaluate(conditions, &agent.stats).can_translate);

    engine.apply_stat_deltas(&mut agent.stats, &Stats::from([("energy", -70.0)]));
    let verdict = translation::evaluate(conditions, &agent.stats);
    assert!(!verdict.can_translate);
    assert!(verdict.hint().unwrap().contains("energy"));

    engine.apply_stat_deltas(&mut agent.stats, &Stats::from([("energy", 500.0)]));
    assert_eq!(agent.stats.get("energy"), Some(100.0));
}
