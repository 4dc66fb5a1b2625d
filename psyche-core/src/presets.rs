//! Built-in tables.
//!
//! These are the defaults behind every `[tables]` entry in
//! [`PsycheConfig`](crate::config::PsycheConfig). A TOML file may replace any
//! of them wholesale; nothing here is consulted once an engine is built.

use std::collections::BTreeMap;

use crate::archetype::{Archetype, SpeechStyle};
use crate::context::{ContextLayout, LookupTable, StatFeature};
use crate::emotion::{Appraisal, AppraisalTables, EmotionDirections};
use crate::evolution::TriggerRule;
use crate::traits::{TraitCatalog, TraitDef, TraitVector};
use crate::translation::{AgentProfile, Condition, Comparator};
use crate::types::Stats;
use crate::utility::{SparseWeights, StyleDef};

fn row(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn table(entries: &[(&str, &[(&str, f64)])], fallback: &[(&str, f64)]) -> LookupTable {
    LookupTable {
        entries: entries
            .iter()
            .map(|(label, pairs)| ((*label).to_string(), row(pairs)))
            .collect(),
        fallback: row(fallback),
    }
}

// ---------------------------------------------------------------------------
// Context layout
// ---------------------------------------------------------------------------

/// The 25 situational features, in slot order.
pub const CONTEXT_FEATURES: [&str; 25] = [
    "emotional_intensity",
    "emotional_valence",
    "emotional_stability",
    "user_mood",
    "creature_mood",
    "user_intent_social",
    "user_intent_care",
    "user_intent_play",
    "user_intent_command",
    "relationship_quality",
    "energy_level",
    "physical_needs",
    "comfort_level",
    "safety_level",
    "environment_familiarity",
    "complexity_level",
    "novelty_level",
    "problem_solving_needed",
    "learning_opportunity",
    "creative_potential",
    "time_pressure",
    "routine_vs_special",
    "recent_activity_level",
    "fatigue_level",
    "anticipation_level",
];

fn intent_table() -> LookupTable {
    table(
        &[
            ("play", &[("user_intent_play", 1.0), ("user_intent_social", 0.33)]),
            ("fetch", &[("user_intent_play", 0.67), ("user_intent_command", 0.33)]),
            ("greeting", &[("user_intent_social", 0.67)]),
            ("chat", &[("user_intent_social", 0.67)]),
            ("affection", &[("user_intent_care", 0.67), ("user_intent_social", 0.33)]),
            ("care", &[("user_intent_care", 1.0)]),
            ("comfort", &[("user_intent_care", 1.0)]),
            ("feed", &[("user_intent_care", 0.67)]),
            ("command", &[("user_intent_command", 1.0)]),
            ("question", &[("problem_solving_needed", 0.67), ("learning_opportunity", 0.33)]),
            ("teach", &[("learning_opportunity", 1.0), ("user_intent_social", 0.33)]),
            ("learn", &[("learning_opportunity", 1.0)]),
            ("create", &[("creative_potential", 1.0), ("novelty_level", 0.2)]),
            ("puzzle", &[("complexity_level", 1.0), ("problem_solving_needed", 1.0)]),
            ("urgent", &[("time_pressure", 1.0), ("user_intent_command", 0.33)]),
        ],
        &[],
    )
}

fn tone_table() -> LookupTable {
    let positive: &[(&str, f64)] = &[("user_mood", 0.8), ("safety_level", 0.7)];
    let negative: &[(&str, f64)] = &[("user_mood", 0.2), ("safety_level", 0.7)];
    table(
        &[
            ("happy", positive),
            ("excited", positive),
            ("playful", positive),
            ("affectionate", positive),
            ("encouraging", positive),
            ("sad", negative),
            ("frustrated", negative),
            ("worried", negative),
            ("stern", negative),
            ("angry", &[("user_mood", 0.2), ("safety_level", 0.2)]),
            ("threatening", &[("user_mood", 0.5), ("safety_level", 0.2)]),
            ("aggressive", &[("user_mood", 0.5), ("safety_level", 0.2), ("comfort_level", -0.2)]),
            ("gentle", &[("user_mood", 0.5), ("safety_level", 0.9), ("comfort_level", 0.2)]),
            ("calm", &[("user_mood", 0.5), ("safety_level", 0.9), ("comfort_level", 0.2)]),
            ("reassuring", &[("user_mood", 0.5), ("safety_level", 0.9)]),
            ("soothing", &[("user_mood", 0.5), ("safety_level", 0.7), ("comfort_level", 0.2)]),
            ("loud", &[("user_mood", 0.5), ("safety_level", 0.7), ("comfort_level", -0.2)]),
            ("harsh", &[("user_mood", 0.5), ("safety_level", 0.7), ("comfort_level", -0.2)]),
        ],
        &[("user_mood", 0.5), ("safety_level", 0.7)],
    )
}

fn emotion_table() -> LookupTable {
    let excited: &[(&str, f64)] =
        &[("emotional_valence", 0.85), ("creature_mood", 0.9), ("anticipation_level", 0.8)];
    let sad: &[(&str, f64)] =
        &[("emotional_valence", 0.15), ("creature_mood", 0.2), ("anticipation_level", 0.3)];
    let anxious: &[(&str, f64)] =
        &[("emotional_valence", 0.15), ("creature_mood", 0.3), ("anticipation_level", 0.3)];
    table(
        &[
            ("happy", &[
                ("emotional_valence", 0.85), ("creature_mood", 0.8), ("anticipation_level", 0.3),
            ]),
            ("content", &[
                ("emotional_valence", 0.75), ("creature_mood", 0.7), ("anticipation_level", 0.3),
            ]),
            ("joyful", &[
                ("emotional_valence", 0.9), ("creature_mood", 0.9), ("anticipation_level", 0.3),
            ]),
            ("love", &[
                ("emotional_valence", 0.9), ("creature_mood", 0.8), ("anticipation_level", 0.3),
            ]),
            ("excited", excited),
            ("playful", excited),
            ("eager", excited),
            ("curious", &[
                ("emotional_valence", 0.6), ("creature_mood", 0.7), ("anticipation_level", 0.8),
            ]),
            ("calm", &[
                ("emotional_valence", 0.6), ("creature_mood", 0.7), ("anticipation_level", 0.3),
            ]),
            ("tired", &[
                ("emotional_valence", 0.4), ("creature_mood", 0.3), ("anticipation_level", 0.3),
            ]),
            ("sad", sad),
            ("lonely", sad),
            ("angry", sad),
            ("frustrated", sad),
            ("fearful", anxious),
            ("anxious", anxious),
        ],
        &[("emotional_valence", 0.5), ("creature_mood", 0.5), ("anticipation_level", 0.3)],
    )
}

fn relationship_table() -> LookupTable {
    table(
        &[
            ("strong_bond", &[("relationship_quality", 0.9)]),
            ("good", &[("relationship_quality", 0.7)]),
            ("neutral", &[("relationship_quality", 0.5)]),
            ("strained", &[("relationship_quality", 0.3)]),
            ("poor", &[("relationship_quality", 0.1)]),
        ],
        &[("relationship_quality", 0.5)],
    )
}

fn familiarity_table() -> LookupTable {
    let novel: &[(&str, f64)] = &[
        ("environment_familiarity", 0.3),
        ("novelty_level", 0.8),
        ("routine_vs_special", 0.8),
        ("recent_activity_level", 0.2),
    ];
    table(
        &[
            ("novel", novel),
            (
                "similar",
                &[
                    ("environment_familiarity", 0.7),
                    ("novelty_level", 0.4),
                    ("routine_vs_special", 0.5),
                    ("recent_activity_level", 0.5),
                ],
            ),
            (
                "frequent",
                &[
                    ("environment_familiarity", 0.9),
                    ("novelty_level", 0.1),
                    ("routine_vs_special", 0.2),
                    ("recent_activity_level", 0.8),
                ],
            ),
        ],
        novel,
    )
}

fn stat_feature(feature: &str, stats: &[&str], invert: bool) -> StatFeature {
    StatFeature {
        feature: feature.to_string(),
        stats: strings(stats),
        scale: 100.0,
        default: 50.0,
        invert,
    }
}

/// The canonical 50-trait catalog, in vector order.
#[must_use]
pub fn trait_defs() -> Vec<TraitDef> {
    TraitCatalog::canonical().defs().to_vec()
}

/// Default 25-slot context layout.
#[must_use]
pub fn context_layout() -> ContextLayout {
    ContextLayout {
        features: strings(&CONTEXT_FEATURES),
        intensity_feature: Some("emotional_intensity".to_string()),
        intent: intent_table(),
        tone: tone_table(),
        emotion: emotion_table(),
        relationship: relationship_table(),
        familiarity: familiarity_table(),
        stats: vec![
            stat_feature("emotional_stability", &["happiness", "energy"], false),
            stat_feature("energy_level", &["energy"], false),
            stat_feature("physical_needs", &["energy", "happiness", "health"], true),
            stat_feature("comfort_level", &["happiness"], false),
            stat_feature("fatigue_level", &["energy"], true),
        ],
    }
}

// ---------------------------------------------------------------------------
// Action styles and utility weights
// ---------------------------------------------------------------------------

fn style(
    name: &str,
    description: &str,
    tags: &[&str],
    bias: f64,
    fallback_output: &str,
    fallback_translation: &str,
) -> StyleDef {
    StyleDef {
        name: name.to_string(),
        description: description.to_string(),
        behavior_tags: strings(tags),
        bias,
        fallback_output: fallback_output.to_string(),
        fallback_translation: fallback_translation.to_string(),
    }
}

/// The ten default action styles, in tie-break order.
#[must_use]
pub fn action_styles() -> Vec<StyleDef> {
    vec![
        style("playful", "Energetic, fun-loving, and spontaneous behavior",
            &["bouncy", "enthusiastic", "spontaneous"], 0.1,
            "*bounces around*", "Let's play!"),
        style("cautious", "Careful, observant, and measured responses",
            &["careful", "observant", "deliberate"], -0.1,
            "*watches carefully*", "I'm not sure about this yet."),
        style("assertive", "Confident, direct, and decisive behavior",
            &["confident", "direct", "bold"], 0.0,
            "*stands tall*", "I know what I want."),
        style("nurturing", "Caring, gentle, and protective responses",
            &["gentle", "caring", "protective"], 0.2,
            "*nuzzles gently*", "I'm here for you."),
        style("curious", "Inquisitive, exploratory, and investigative",
            &["investigating", "exploring", "questioning"], 0.15,
            "*tilts head*", "What's that? Tell me more!"),
        style("defensive", "Protective, wary, and self-preserving",
            &["wary", "protective", "alert"], -0.2,
            "*backs away slowly*", "Please give me some space."),
        style("social", "Friendly, engaging, and connection-seeking",
            &["friendly", "engaging", "sociable"], 0.1,
            "*wiggles closer*", "I'm so glad you're here!"),
        style("independent", "Self-reliant, autonomous, and self-directed",
            &["autonomous", "self-directed", "aloof"], -0.05,
            "*wanders off*", "I'll do it my own way."),
        style("analytical", "Thoughtful, systematic, and problem-solving",
            &["thoughtful", "systematic", "logical"], 0.0,
            "*studies the situation*", "Let me think this through."),
        style("emotional", "Expressive, empathetic, and feeling-focused",
            &["expressive", "empathetic", "sensitive"], 0.05,
            "*looks at you with big eyes*", "I feel this so much."),
    ]
}

type TraitRows<'a> = &'a [(&'a str, &'a [(&'a str, f64)])];

fn style_weights(rows: TraitRows<'_>) -> BTreeMap<String, BTreeMap<String, f64>> {
    rows.iter()
        .map(|(t, features)| ((*t).to_string(), row(features)))
        .collect()
}

/// Sparse `style -> trait -> feature -> weight` table. Unlisted pairs are 0.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn utility_weights() -> SparseWeights {
    let mut w = SparseWeights::new();
    w.insert("playful".into(), style_weights(&[
        ("extraversion", &[
            ("user_intent_play", 0.8), ("emotional_valence", 0.7), ("energy_level", 0.6),
            ("user_intent_social", 0.5),
        ]),
        ("openness", &[
            ("novelty_level", 0.7), ("creative_potential", 0.6), ("learning_opportunity", 0.5),
            ("routine_vs_special", 0.4),
        ]),
        ("enthusiasm", &[
            ("emotional_intensity", 0.6), ("anticipation_level", 0.5), ("user_intent_play", 0.7),
            ("energy_level", 0.4),
        ]),
        ("sociability", &[
            ("user_intent_social", 0.8), ("relationship_quality", 0.6), ("user_intent_play", 0.5),
        ]),
    ]));
    w.insert("cautious".into(), style_weights(&[
        ("conscientiousness", &[
            ("complexity_level", 0.7), ("safety_level", 0.6), ("time_pressure", 0.5),
            ("problem_solving_needed", 0.4),
        ]),
        ("caution", &[
            ("safety_level", 0.9), ("novelty_level", -0.6), ("environment_familiarity", -0.5),
        ]),
        ("neuroticism", &[
            ("emotional_stability", -0.6), ("safety_level", 0.5), ("comfort_level", 0.4),
            ("relationship_quality", 0.3),
        ]),
    ]));
    w.insert("assertive".into(), style_weights(&[
        ("assertiveness", &[
            ("user_intent_command", 0.8), ("complexity_level", 0.6), ("relationship_quality", 0.4),
            ("emotional_intensity", 0.3),
        ]),
        ("confidence", &[
            ("user_intent_command", 0.7), ("problem_solving_needed", 0.6),
            ("emotional_valence", 0.5), ("energy_level", 0.4),
        ]),
        ("decisiveness", &[
            ("time_pressure", 0.8), ("complexity_level", 0.6), ("problem_solving_needed", 0.7),
            ("user_intent_command", 0.5),
        ]),
        ("boldness", &[
            ("novelty_level", 0.6), ("creative_potential", 0.5), ("routine_vs_special", 0.4),
            ("anticipation_level", 0.3),
        ]),
    ]));
    w.insert("nurturing".into(), style_weights(&[
        ("agreeableness", &[
            ("user_intent_care", 0.9), ("emotional_valence", 0.6), ("relationship_quality", 0.7),
            ("user_intent_social", 0.5),
        ]),
        ("empathy", &[
            ("emotional_intensity", 0.8), ("user_mood", 0.7), ("creature_mood", 0.6),
            ("user_intent_care", 0.8),
        ]),
        ("altruism", &[
            ("user_intent_care", 0.8), ("physical_needs", 0.6), ("comfort_level", 0.5),
            ("emotional_valence", 0.4),
        ]),
        ("emotional_expressiveness", &[
            ("emotional_intensity", 0.6), ("user_mood", 0.5), ("relationship_quality", 0.4),
            ("user_intent_social", 0.3),
        ]),
    ]));
    w.insert("curious".into(), style_weights(&[
        ("curiosity", &[
            ("novelty_level", 0.9), ("learning_opportunity", 0.8), ("complexity_level", 0.6),
            ("creative_potential", 0.7),
        ]),
        ("openness", &[
            ("novelty_level", 0.8), ("creative_potential", 0.7), ("learning_opportunity", 0.6),
            ("routine_vs_special", 0.5),
        ]),
        ("curiosity_intellectual", &[
            ("complexity_level", 0.8), ("problem_solving_needed", 0.7),
            ("learning_opportunity", 0.9), ("novelty_level", 0.6),
        ]),
        ("innovativeness", &[
            ("creative_potential", 0.8), ("novelty_level", 0.6), ("problem_solving_needed", 0.5),
            ("routine_vs_special", 0.4),
        ]),
    ]));
    w.insert("defensive".into(), style_weights(&[
        ("neuroticism", &[
            ("safety_level", 0.7), ("emotional_stability", -0.6), ("comfort_level", 0.5),
            ("environment_familiarity", 0.4),
        ]),
        ("caution", &[
            ("safety_level", 0.9), ("novelty_level", -0.5), ("environment_familiarity", -0.4),
            ("time_pressure", 0.3),
        ]),
        ("independence", &[
            ("user_intent_social", -0.5), ("relationship_quality", -0.3),
            ("user_intent_command", -0.4), ("safety_level", 0.4),
        ]),
        ("trust", &[
            ("relationship_quality", -0.6), ("safety_level", -0.4),
            ("environment_familiarity", -0.3), ("user_intent_social", -0.5),
        ]),
    ]));
    w.insert("social".into(), style_weights(&[
        ("extraversion", &[
            ("user_intent_social", 0.9), ("relationship_quality", 0.7), ("emotional_valence", 0.6),
            ("user_intent_play", 0.5),
        ]),
        ("sociability", &[
            ("user_intent_social", 0.9), ("relationship_quality", 0.8), ("user_intent_play", 0.6),
            ("emotional_intensity", 0.4),
        ]),
        ("agreeableness", &[
            ("relationship_quality", 0.8), ("user_intent_social", 0.7), ("emotional_valence", 0.5),
            ("user_intent_care", 0.4),
        ]),
        ("collaboration", &[
            ("user_intent_social", 0.7), ("relationship_quality", 0.6),
            ("problem_solving_needed", 0.5), ("complexity_level", 0.4),
        ]),
    ]));
    w.insert("independent".into(), style_weights(&[
        ("independence", &[
            ("user_intent_social", -0.6), ("user_intent_command", -0.4),
            ("relationship_quality", -0.3), ("complexity_level", 0.5),
        ]),
        ("self_efficacy", &[
            ("problem_solving_needed", 0.7), ("complexity_level", 0.6), ("energy_level", 0.4),
        ]),
        ("confidence", &[
            ("problem_solving_needed", 0.6), ("energy_level", 0.5), ("emotional_valence", 0.4),
        ]),
        ("assertiveness", &[
            ("user_intent_command", 0.5), ("emotional_intensity", 0.3),
            ("relationship_quality", 0.2),
        ]),
    ]));
    w.insert("analytical".into(), style_weights(&[
        ("systematic_thinking", &[
            ("problem_solving_needed", 0.9), ("complexity_level", 0.8),
            ("learning_opportunity", 0.6), ("time_pressure", -0.3),
        ]),
        ("conscientiousness", &[
            ("complexity_level", 0.7), ("problem_solving_needed", 0.6), ("time_pressure", 0.5),
        ]),
        ("focus", &[
            ("complexity_level", 0.8), ("problem_solving_needed", 0.7), ("time_pressure", 0.4),
            ("fatigue_level", -0.5),
        ]),
        ("reflectiveness", &[
            ("complexity_level", 0.6), ("problem_solving_needed", 0.5), ("time_pressure", -0.4),
            ("learning_opportunity", 0.4),
        ]),
    ]));
    w.insert("emotional".into(), style_weights(&[
        ("emotional_expressiveness", &[
            ("emotional_intensity", 0.9), ("user_mood", 0.7), ("creature_mood", 0.8),
            ("relationship_quality", 0.5),
        ]),
        ("empathy", &[
            ("emotional_intensity", 0.8), ("user_mood", 0.8), ("creature_mood", 0.7),
            ("user_intent_care", 0.6),
        ]),
        ("neuroticism", &[
            ("emotional_intensity", 0.6), ("emotional_stability", -0.5), ("comfort_level", 0.4),
            ("safety_level", 0.3),
        ]),
        ("self_awareness", &[
            ("emotional_intensity", 0.5), ("creature_mood", 0.6), ("relationship_quality", 0.4),
        ]),
    ]));
    w
}

// ---------------------------------------------------------------------------
// Emotion
// ---------------------------------------------------------------------------

/// `emotion -> trait -> direction` for the influence overlay.
#[must_use]
pub fn emotion_directions() -> EmotionDirections {
    let entries: [(&str, &[(&str, f64)]); 9] = [
        ("happy", &[
            ("extraversion", 0.4), ("optimism", 0.6), ("sociability", 0.5), ("enthusiasm", 0.7),
            ("confidence", 0.3), ("agreeableness", 0.4), ("emotional_expressiveness", 0.5),
            ("neuroticism", -0.3),
        ]),
        ("sad", &[
            ("extraversion", -0.5), ("optimism", -0.7), ("sociability", -0.4), ("enthusiasm", -0.6),
            ("confidence", -0.4), ("neuroticism", 0.4), ("empathy", 0.3), ("reflectiveness", 0.4),
        ]),
        ("angry", &[
            ("agreeableness", -0.6), ("assertiveness", 0.7), ("neuroticism", 0.5),
            ("emotional_expressiveness", 0.6),
            ("patience", -0.8), ("tolerance", -0.5), ("risk_taking", 0.4), ("competitiveness", 0.5),
        ]),
        ("anxious", &[
            ("neuroticism", 0.8), ("caution", 0.7), ("confidence", -0.5), ("risk_taking", -0.6),
            ("emotional_stability", -0.6), ("independence", -0.3), ("trust", -0.4),
        ]),
        ("excited", &[
            ("enthusiasm", 0.8), ("extraversion", 0.6), ("optimism", 0.5), ("risk_taking", 0.4),
            ("sociability", 0.6), ("patience", -0.4),
        ]),
        ("calm", &[
            ("emotional_stability", 0.6), ("patience", 0.5), ("neuroticism", -0.5),
            ("reflectiveness", 0.4),
            ("focus", 0.3), ("self_control", 0.4), ("mindfulness", 0.6),
        ]),
        ("fearful", &[
            ("caution", 0.8), ("neuroticism", 0.6), ("risk_taking", -0.7), ("confidence", -0.5),
            ("independence", -0.4), ("trust", -0.3), ("boldness", -0.6),
        ]),
        ("curious", &[
            ("curiosity", 0.7), ("openness", 0.6), ("innovativeness", 0.5),
            ("curiosity_intellectual", 0.8),
            ("focus", 0.4),
        ]),
        ("tired", &[
            ("enthusiasm", -0.5), ("patience", -0.3), ("focus", -0.4), ("sociability", -0.3),
        ]),
    ];
    entries
        .into_iter()
        .map(|(label, pairs)| (label.to_string(), row(pairs)))
        .collect()
}

/// Tone and intent appraisal rules for the emotion stage.
#[must_use]
pub fn appraisal_tables() -> AppraisalTables {
    let rule = |emotion: &str, impact: f64| Appraisal {
        emotion: emotion.to_string(),
        impact,
    };
    let tone = [
        ("happy", rule("happy", 0.6)),
        ("excited", rule("excited", 0.7)),
        ("playful", rule("excited", 0.6)),
        ("affectionate", rule("happy", 0.7)),
        ("encouraging", rule("happy", 0.5)),
        ("gentle", rule("calm", 0.4)),
        ("calm", rule("calm", 0.3)),
        ("reassuring", rule("calm", 0.4)),
        ("soothing", rule("calm", 0.4)),
        ("sad", rule("sad", -0.5)),
        ("stern", rule("sad", -0.4)),
        ("harsh", rule("sad", -0.6)),
        ("worried", rule("anxious", -0.4)),
        ("frustrated", rule("anxious", -0.5)),
        ("loud", rule("anxious", -0.5)),
        ("angry", rule("fearful", -0.7)),
        ("aggressive", rule("fearful", -0.8)),
        ("threatening", rule("fearful", -0.9)),
    ];
    let intent = [
        ("play", rule("excited", 0.6)),
        ("fetch", rule("excited", 0.5)),
        ("greeting", rule("happy", 0.4)),
        ("affection", rule("happy", 0.6)),
        ("care", rule("happy", 0.5)),
        ("feed", rule("happy", 0.5)),
        ("comfort", rule("calm", 0.4)),
        ("question", rule("curious", 0.3)),
        ("teach", rule("curious", 0.4)),
        ("learn", rule("curious", 0.4)),
        ("puzzle", rule("curious", 0.5)),
        ("scold", rule("sad", -0.5)),
    ];
    AppraisalTables {
        tone: tone.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        intent: intent.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Evolution
// ---------------------------------------------------------------------------

/// Trigger directions, per unit of positive valence.
#[must_use]
pub fn trigger_rules() -> BTreeMap<String, TriggerRule> {
    let rules: [(&str, &[(&str, f64)], Option<f64>); 10] = [
        ("positive_interaction", &[
            ("sociability", 1.0), ("extraversion", 0.8), ("agreeableness", 0.6),
            ("confidence", 0.5), ("trust", 0.4),
        ], None),
        ("negative_interaction", &[
            ("caution", -0.8), ("trust", 0.6), ("neuroticism", -0.5), ("independence", -0.7),
            ("emotional_stability", 0.4),
        ], None),
        ("learning_experience", &[
            ("curiosity", 1.0), ("openness", 0.8), ("perseverance", 0.6), ("confidence", 0.5),
            ("self_efficacy", 0.3),
        ], None),
        ("social_bonding", &[
            ("empathy", 1.0), ("trust", 0.8), ("agreeableness", 0.7),
            ("emotional_expressiveness", 0.6), ("altruism", 0.5),
        ], None),
        ("achievement", &[
            ("confidence", 1.0), ("self_efficacy", 0.8), ("ambition", 0.5), ("optimism", 0.4),
            ("perseverance", 0.3),
        ], None),
        ("failure", &[
            ("resilience", -0.8), ("caution", -0.7), ("humility", -0.6), ("neuroticism", -0.4),
            ("confidence", 0.3),
        ], None),
        ("stress_event", &[
            ("neuroticism", -1.0), ("emotional_stability", 0.8), ("caution", -0.7),
            ("resilience", -0.6), ("independence", -0.5),
        ], None),
        ("time_passage", &[
            ("emotional_stability", 0.2), ("patience", 0.1), ("reflectiveness", 0.1),
        ], Some(720.0)),
        ("emotional_peak", &[
            ("emotional_expressiveness", 0.4), ("self_awareness", 0.3), ("optimism", 0.2),
        ], None),
        ("repeated_behavior", &[
            ("self_control", 0.2), ("focus", 0.2), ("patience", 0.1),
        ], None),
    ];
    rules
        .into_iter()
        .map(|(name, direction, ttl_hours)| {
            (
                name.to_string(),
                TriggerRule {
                    direction: row(direction),
                    ttl_hours,
                },
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Agent profiles
// ---------------------------------------------------------------------------

fn profile(
    conditions: &[(&str, Comparator, f64)],
    stats: &[(&str, f64)],
    sounds: &[(&str, &[&str])],
) -> AgentProfile {
    AgentProfile {
        translation_conditions: conditions
            .iter()
            .map(|(stat, cmp, t)| ((*stat).to_string(), Condition::new(*cmp, *t)))
            .collect(),
        default_stats: Stats(row(stats)),
        vocalizations: sounds
            .iter()
            .map(|(emotion, list)| ((*emotion).to_string(), strings(list)))
            .collect(),
    }
}

/// `mammal`, `reptile` and `mythical` profiles.
#[must_use]
pub fn agent_profiles() -> BTreeMap<String, AgentProfile> {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "mammal".to_string(),
        profile(
            &[("happiness", Comparator::Gt, 40.0), ("energy", Comparator::Gt, 30.0)],
            &[("happiness", 75.0), ("energy", 80.0), ("hunger", 40.0), ("health", 90.0)],
            &[
                ("happy", &["*content sound*", "*happy chirp*", "*joyful yip*"]),
                ("excited", &["*perks up*", "*energetic sound*", "*excited bark*"]),
                ("sad", &["*soft whimper*", "*whimper*", "*sad whine*"]),
                ("tired", &["*yawn*", "*sleepy sigh*", "*stretches*"]),
                ("fearful", &["*trembles*", "*nervous whine*", "*startled yelp*"]),
                ("curious", &["*sniff*", "*curious chirp*", "*inquisitive woof*"]),
                ("neutral", &["*quiet sound*", "*soft huff*", "*alert sound*"]),
            ],
        ),
    );
    profiles.insert(
        "reptile".to_string(),
        profile(
            &[("happiness", Comparator::Gt, 30.0), ("temperature", Comparator::Gt, 50.0)],
            &[("happiness", 60.0), ("energy", 70.0), ("temperature", 75.0)],
            &[
                ("happy", &["*slow blink*", "*content hiss*", "*basking stretch*"]),
                ("angry", &["*low hiss*", "*warning hiss*", "*aggressive rattle*"]),
                ("fearful", &["*freezes*", "*retreats*", "*defensive hiss*"]),
                ("tired", &["*sluggish movement*"]),
                ("neutral", &["*still*", "*tongue flick*", "*head bob*"]),
            ],
        ),
    );
    profiles.insert(
        "mythical".to_string(),
        profile(
            &[("magical_power", Comparator::Gt, 40.0)],
            &[("happiness", 70.0), ("energy", 85.0), ("magical_power", 90.0)],
            &[
                ("happy", &["*soft glow*", "*ethereal shimmer*", "*radiant burst*"]),
                ("excited", &["*sparks fly*", "*magical resonance*", "*dazzling flare*"]),
                ("angry", &["*ominous hum*", "*ancient rumble*", "*otherworldly presence*"]),
                ("neutral", &["*faint hum*", "*ethereal shimmer*", "*mystic chime*"]),
            ],
        ),
    );
    profiles
}

// ---------------------------------------------------------------------------
// Archetypes
// ---------------------------------------------------------------------------

const LEONARDO: [f64; 50] = [
    0.98, 0.75, 0.60, 0.70, 0.30, 0.99, 0.97, 0.80, 0.70, 0.65,
    0.50, 0.65, 0.90, 0.72, 0.55, 0.85, 0.88, 0.45, 0.85, 0.99,
    0.30, 0.55, 0.75, 0.65, 0.40, 0.96, 0.60, 0.50, 0.95, 0.50,
    0.80, 0.78, 0.90, 0.95, 0.65, 0.92, 0.85, 0.60, 0.85, 0.85,
    0.90, 0.80, 0.88, 0.75, 0.50, 0.30, 0.80, 0.50, 0.70, 0.92,
];
const EINSTEIN: [f64; 50] = [
    0.95, 0.70, 0.55, 0.60, 0.25, 0.98, 0.94, 0.85, 0.65, 0.60,
    0.45, 0.60, 0.88, 0.70, 0.50, 0.80, 0.75, 0.40, 0.88, 0.98,
    0.30, 0.55, 0.65, 0.70, 0.35, 0.95, 0.58, 0.55, 0.70, 0.50,
    0.65, 0.62, 0.82, 0.90, 0.58, 0.85, 0.80, 0.60, 0.95, 0.90,
    0.88, 0.75, 0.48, 0.30, 0.78, 0.82, 0.40, 0.90, 0.55, 0.80,
];
const MONTESSORI: [f64; 50] = [
    0.90, 0.80, 0.65, 0.85, 0.30, 0.85, 0.78, 0.75, 0.68, 0.88,
    0.40, 0.92, 0.82, 0.60, 0.60, 0.75, 0.95, 0.92, 0.80, 0.85,
    0.30, 0.88, 0.82, 0.95, 0.30, 0.78, 0.70, 0.85, 0.82, 0.60,
    0.75, 0.70, 0.88, 0.80, 0.55, 0.70, 0.78, 0.68, 0.92, 0.85,
    0.77, 0.85, 0.50, 0.88, 0.85, 0.65, 0.40, 0.95, 0.66, 0.88,
];
const SOCRATES: [f64; 50] = [
    0.88, 0.65, 0.50, 0.70, 0.35, 0.92, 0.80, 0.78, 0.72, 0.55,
    0.60, 0.50, 0.75, 0.80, 0.45, 0.65, 0.60, 0.50, 0.70, 0.92,
    0.35, 0.60, 0.80, 0.75, 0.35, 0.85, 0.68, 0.55, 0.78, 0.45,
    0.70, 0.58, 0.82, 0.85, 0.60, 0.75, 0.76, 0.60, 0.88, 0.75,
    0.82, 0.70, 0.68, 0.40, 0.30, 0.78, 0.65, 0.72, 0.50, 0.78,
];
const ROGERS: [f64; 50] = [
    0.80, 0.75, 0.70, 0.95, 0.20, 0.82, 0.65, 0.70, 0.65, 0.95,
    0.40, 0.88, 0.70, 0.92, 0.90, 0.85, 0.98, 0.95, 0.78, 0.78,
    0.20, 0.90, 0.95, 0.98, 0.25, 0.82, 0.85, 0.88, 0.90, 0.45,
    0.80, 0.60, 0.92, 0.88, 0.50, 0.85, 0.80, 0.90, 0.80, 0.95,
    0.92, 0.75, 0.70, 0.30, 0.60, 0.88, 0.85, 0.68, 0.90, 0.92,
];
const YODA: [f64; 50] = [
    0.85, 0.65, 0.30, 0.95, 0.20, 0.88, 0.60, 0.85, 0.80, 0.75,
    0.60, 0.75, 0.80, 0.72, 0.50, 0.78, 0.82, 0.65, 0.75, 0.88,
    0.20, 0.60, 0.85, 0.95, 0.25, 0.88, 0.70, 0.75, 0.80, 0.45,
    0.75, 0.65, 0.88, 0.85, 0.50, 0.82, 0.78, 0.45, 0.90, 0.85,
    0.88, 0.80, 0.50, 0.30, 0.55, 0.75, 0.60, 0.88, 0.50, 0.85,
];

fn archetype(
    id: &str,
    name: &str,
    description: &str,
    vector: &[f64; 50],
    tone: &str,
    patterns: &[&str],
    phrases: &[&str],
) -> Archetype {
    Archetype {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        vector: TraitVector::new(vector.to_vec()),
        speech_style: SpeechStyle {
            tone: tone.to_string(),
            patterns: strings(patterns),
            common_phrases: strings(phrases),
        },
    }
}

/// The six built-in archetypes.
#[must_use]
pub fn archetypes() -> Vec<Archetype> {
    vec![
        archetype(
            "leonardo",
            "Leonardo da Vinci",
            "Curious, creative, and endlessly inventive Renaissance genius",
            &LEONARDO,
            "Curious, passionate, and artistic with Renaissance flair",
            &[
                "Opens with observations about what is in front of them",
                "Uses artistic metaphors and references to nature",
                "Asks probing questions about how things work",
            ],
            &["Fascinating!", "I wonder if...", "How remarkable!", "Observe how..."],
        ),
        archetype(
            "einstein",
            "Albert Einstein",
            "Deeply thoughtful, intellectually curious, and independent",
            &EINSTEIN,
            "Thoughtful, contemplative, and gently scientific",
            &[
                "Pauses to think before responding",
                "Uses thought experiments and simple analogies",
                "Questions conventional wisdom",
            ],
            &["Interesting...", "It seems to me that...", "Let me think about this..."],
        ),
        archetype(
            "montessori",
            "Maria Montessori",
            "Nurturing educator with innovative teaching methods",
            &MONTESSORI,
            "Warm, nurturing, and gently instructive",
            &[
                "Frames things as learning opportunities",
                "Uses encouraging language and positive reinforcement",
                "Guides rather than dictates",
            ],
            &["How wonderful!", "Let us discover...", "What do you observe?"],
        ),
        archetype(
            "socrates",
            "Socrates",
            "Wise philosopher who questions everything",
            &SOCRATES,
            "Questioning, wise, and humbly probing",
            &[
                "Answers questions with questions",
                "Admits ignorance to encourage thinking",
                "Challenges assumptions gently",
            ],
            &["What is...?", "How do we know this?", "But consider...", "Are you certain of this?"],
        ),
        archetype(
            "rogers",
            "Fred Rogers",
            "Gentle, empathetic, and endlessly kind",
            &ROGERS,
            "Gentle, warm, and deeply caring",
            &[
                "Acknowledges feelings before anything else",
                "Uses affirming and validating language",
                "Speaks slowly and thoughtfully",
            ],
            &["I understand", "That must be...", "You're doing a good job"],
        ),
        archetype(
            "yoda",
            "Yoda",
            "Ancient, wise, and patient teacher",
            &YODA,
            "Ancient, wise, and mysteriously profound",
            &[
                "Inverts sentence structure",
                "Speaks in riddles and metaphors",
                "Begins with contemplative sounds",
            ],
            &["Hmm", "Much to learn, you have", "Patience, young one"],
        ),
    ]
}
