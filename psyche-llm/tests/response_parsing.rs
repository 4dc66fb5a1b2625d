//! Prompt rendering and structured-response parsing.
//!
//! Offline checks only: templates must render without leftover placeholders
//! and the parser must accept every reply shape we have seen from local
//! models while rejecting everything else.

use psyche_llm::LlmError;
use psyche_llm::parse_structured_response;
use psyche_llm::prompt::{self, DecisionPrompt};

fn prompt() -> DecisionPrompt {
    DecisionPrompt {
        agent_name: "Pip".into(),
        agent_type: "mammal".into(),
        top_traits: vec![("playfulness".into(), 0.91), ("curiosity".into(), 0.84)],
        emotion: "happy".into(),
        intensity: 0.7,
        action_style: "playful".into(),
        style_description: "Bouncy, eager to turn anything into a game.".into(),
        behavior_tags: vec!["bouncing".into(), "pouncing".into()],
        vocalizations: vec!["*happy chirp*".into(), "*excited yip*".into()],
        energy: 85.0,
        message: "Want to play fetch?".into(),
        intent: "play".into(),
        tone: "excited".into(),
        relationship: "friend".into(),
        history: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn decision_prompt_fills_every_placeholder() {
    let (system, user) = prompt().render();
    let expected_system = [
        "Pip",
        "mammal",
        "playful",
        "Bouncy",
        "*excited yip*",
        "playfulness 0.91",
        "full of energy",
    ];
    for needle in expected_system {
        assert!(system.contains(needle), "system prompt missing '{needle}'");
    }
    let expected_user = [
        "Want to play fetch?",
        "play",
        "excited",
        "friend",
        "nothing in particular",
        "human_translation",
    ];
    for needle in expected_user {
        assert!(user.contains(needle), "user prompt missing '{needle}'");
    }
    for rendered in [&system, &user] {
        for placeholder in
            ["{agent_name}", "{emotion}", "{message}", "{energy_hint}", "{history}"]
        {
            assert!(!rendered.contains(placeholder), "unrendered {placeholder}");
        }
    }
}

#[test]
fn history_is_included_when_present() {
    let mut p = prompt();
    p.history = "fetched the ball together yesterday".into();
    let (_, user) = p.render();
    assert!(user.contains("fetched the ball together yesterday"));
    assert!(!user.contains("nothing in particular"));
}

#[test]
fn request_carries_grammar_and_limits() {
    let request = prompt().to_request(128, 0.5, 2500);
    assert_eq!(request.grammar.as_deref(), Some(prompt::RESPONSE_GRAMMAR));
    assert_eq!(request.max_tokens, 128);
    assert_eq!(request.timeout_ms, 2500);
}

#[test]
fn render_template_leaves_unknown_keys() {
    let out = prompt::render_template("{a} and {b}", &[("a", "x")]);
    assert_eq!(out, "x and {b}");
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn parses_plain_json() {
    let out = parse_structured_response(
        r#"{"stylized_output": "*tail wag* *yip*", "human_translation": "Yes, let's play!"}"#,
    )
    .unwrap();
    assert_eq!(out.stylized_output, "*tail wag* *yip*");
    assert_eq!(out.human_translation.as_deref(), Some("Yes, let's play!"));
}

#[test]
fn parses_fenced_json_with_null_translation() {
    let text = "Sure!\n```json\n\
                {\"stylized_output\": \"*curls up*\", \"human_translation\": null}\n```";
    let out = parse_structured_response(text).unwrap();
    assert_eq!(out.stylized_output, "*curls up*");
    assert!(out.human_translation.is_none());
}

#[test]
fn parses_line_format() {
    let text = "STYLIZED_OUTPUT: *purr* *head bump*\n\
                HUMAN_TRANSLATION: I missed you.\n\
                DEBUG: affectionate";
    let out = parse_structured_response(text).unwrap();
    assert_eq!(out.stylized_output, "*purr* *head bump*");
    assert_eq!(out.human_translation.as_deref(), Some("I missed you."));
}

#[test]
fn line_format_accepts_creature_language_and_none() {
    let text = "creature_language: *hiss*\nhuman_translation: none";
    let out = parse_structured_response(text).unwrap();
    assert_eq!(out.stylized_output, "*hiss*");
    assert!(out.human_translation.is_none());
}

#[test]
fn empty_stylized_output_fails_validation() {
    let blank = r#"{"stylized_output": "  ", "human_translation": "hi"}"#;
    let err = parse_structured_response(blank).unwrap_err();
    assert!(matches!(err, LlmError::SchemaValidation(_)));
}

#[test]
fn free_text_is_a_parse_error() {
    for text in ["", "   ", "Hello there, I am a friendly dog!", "{not json at all}"] {
        let err = parse_structured_response(text).unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)), "accepted '{text}'");
    }
}
