//! Psyche benchmark suite.
//!
//! Hot paths of a turn, excluding the generation call:
//!   utility_compute_50x10 ............ one bilinear pass over all styles
//!   selection_softmax ................ probabilities plus a sample
//!   personality_stage ................ shifts + emotion + encode + utilities + select
//!   feedback_apply ................... evolution record + two learning observations
//!   cohort_turn_cpu_20_agents ........ personality stage and feedback for 20 agents

use chrono::Utc;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use psyche_core::agent::AgentState;
use psyche_core::config::PolicyKind;
use psyche_core::context::Familiarity;
use psyche_core::engine::{TraitSource, TurnSignals};
use psyche_core::evolution::{EvolutionTrigger, InteractionEvent};
use psyche_core::types::EmotionalState;
use psyche_core::{Engine, PsycheConfig};
use psyche_mind::feedback::{TurnOutcome, apply_feedback};

const ARCHETYPES: [&str; 6] = ["leonardo", "einstein", "montessori", "socrates", "rogers", "yoda"];

fn engine(policy: PolicyKind) -> Engine {
    let mut config = PsycheConfig::default();
    config.utility.seed = Some(42);
    config.utility.policy = policy;
    match Engine::new(config) {
        Ok(e) => e,
        Err(e) => panic!("default config must build: {e}"),
    }
}

fn agent(engine: &Engine, archetype: &str, rng: &mut StdRng) -> AgentState {
    let source = TraitSource::Archetype(archetype.to_string());
    match engine.new_agent(archetype, "mammal", &source, rng, Utc::now()) {
        Ok(mut a) => {
            // A lived-in agent: a handful of active shifts.
            for (i, trigger) in EvolutionTrigger::ALL.iter().enumerate() {
                let valence = if i % 2 == 0 { 0.6 } else { -0.4 };
                let event = InteractionEvent::new(*trigger, valence, Utc::now());
                engine.evolution().record(&mut a.evolution, &event);
            }
            a
        }
        Err(e) => panic!("archetype {archetype} must exist: {e}"),
    }
}

fn signals(emotion: &EmotionalState) -> TurnSignals<'_> {
    TurnSignals {
        intent: "play",
        tone: "excited",
        relationship: "friend",
        familiarity: Familiarity::Similar,
        emotion,
    }
}

fn bench_utility(c: &mut Criterion) {
    let engine = engine(PolicyKind::Stochastic);
    let mut rng = StdRng::seed_from_u64(1);
    let agent = agent(&engine, "leonardo", &mut rng);
    let emotion = EmotionalState::new("happy", 0.7);
    let Ok(outcome) =
        engine.personality_stage(&agent, &signals(&emotion), Utc::now(), &mut rng)
    else {
        panic!("personality stage failed");
    };

    c.bench_function("utility_compute_50x10", |b| {
        b.iter(|| {
            let scores = engine
                .utility()
                .compute_utilities(
                    black_box(&outcome.effective_traits),
                    black_box(&outcome.context),
                );
            black_box(scores)
        });
    });

    c.bench_function("selection_softmax", |b| {
        b.iter(|| black_box(engine.selector().select(black_box(&outcome.scores), &mut rng)));
    });
}

fn bench_personality_stage(c: &mut Criterion) {
    let engine = engine(PolicyKind::Stochastic);
    let mut rng = StdRng::seed_from_u64(2);
    let agent = agent(&engine, "rogers", &mut rng);
    let emotion = EmotionalState::new("excited", 0.8);
    let now = Utc::now();

    c.bench_function("personality_stage", |b| {
        b.iter(|| {
            black_box(engine.personality_stage(
                black_box(&agent),
                &signals(&emotion),
                now,
                &mut rng,
            ))
        });
    });
}

fn bench_feedback(c: &mut Criterion) {
    let engine = engine(PolicyKind::Deterministic);
    let mut rng = StdRng::seed_from_u64(3);
    let mut agent = agent(&engine, "socrates", &mut rng);
    let outcome = TurnOutcome {
        trigger_hint: None,
        impact: 0.5,
        intent: "play".into(),
        tone: "excited".into(),
        action_style: "playful".into(),
        emotion: EmotionalState::new("happy", 0.6),
    };

    c.bench_function("feedback_apply", |b| {
        b.iter(|| black_box(apply_feedback(&engine, black_box(&mut agent), &outcome, Utc::now())));
    });
}

fn bench_cohort(c: &mut Criterion) {
    let engine = engine(PolicyKind::Stochastic);
    let mut rng = StdRng::seed_from_u64(4);
    let mut agents: Vec<AgentState> = (0..20)
        .map(|i| agent(&engine, ARCHETYPES[i % ARCHETYPES.len()], &mut rng))
        .collect();
    let emotion = EmotionalState::new("curious", 0.5);

    c.bench_function("cohort_turn_cpu_20_agents", |b| {
        b.iter(|| {
            let now = Utc::now();
            for a in &mut agents {
                let Ok(p) = engine.personality_stage(a, &signals(&emotion), now, &mut rng) else {
                    continue;
                };
                let outcome = TurnOutcome {
                    trigger_hint: None,
                    impact: 0.2,
                    intent: "explore".into(),
                    tone: "curious".into(),
                    action_style: p.selection.style.to_string(),
                    emotion: emotion.clone(),
                };
                black_box(apply_feedback(&engine, a, &outcome, now));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_utility,
    bench_personality_stage,
    bench_feedback,
    bench_cohort,
);
criterion_main!(benches);
