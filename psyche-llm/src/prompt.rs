//! Prompt templates for the decision stage.
//!
//! The decision stage has already picked an action style. The prompt asks the
//! model to act it out and reply with the structured format parsed by
//! [`crate::response`]. A translation is always requested; whether it is
//! shown is decided afterwards by the translation gate.

use crate::types::GenerationRequest;

/// System prompt for the decision call.
pub const DECISION_SYSTEM: &str = r"You are {agent_name}, a {agent_type}.
You do not speak human language. You communicate only through actions and sounds.
Personality highlights: {top_traits}.
Current emotion: {emotion} (intensity {intensity}).

Act in the {action_style} style: {style_description}
Typical behaviours: {behavior_tags}.
Sounds you make when feeling {emotion}: {vocalizations}.

RULES:
- Write actions and sounds in asterisks, e.g. *tail wag* or *soft chirp*.
- Never use human words in the stylized output.
- Match your energy: {energy_hint}.
- Your response must be valid JSON.";

/// User prompt for the decision call.
pub const DECISION_USER: &str = r#"Someone says: "{message}"
Their intent: {intent}. Their tone: {tone}.
Your relationship with them: {relationship}.
What you remember: {history}

Also give a short human_translation of what you are trying to say.
Return JSON:
{"stylized_output": "your actions and sounds", "human_translation": "what you mean, in plain words, or null"}"#;

/// GBNF grammar for the structured decision output.
pub const RESPONSE_GRAMMAR: &str = r#"root   ::= "{" ws "\"stylized_output\"" ws ":" ws string "," ws "\"human_translation\"" ws ":" ws (string | "null") ws "}" ws
string ::= "\"" ([^"\\] | "\\" .)* "\""
ws     ::= [ \t\n]*"#;

/// Simple template interpolation: replaces `{key}` with its value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Everything the decision prompt mentions.
#[derive(Debug, Clone, Default)]
pub struct DecisionPrompt {
    /// Agent display name.
    pub agent_name: String,
    /// Agent type (`mammal`, ...).
    pub agent_type: String,
    /// Dominant traits, strongest first.
    pub top_traits: Vec<(String, f64)>,
    /// Emotion label.
    pub emotion: String,
    /// Emotion intensity in `[0, 1]`.
    pub intensity: f64,
    /// Chosen action style.
    pub action_style: String,
    /// Its description.
    pub style_description: String,
    /// Its behaviour tags.
    pub behavior_tags: Vec<String>,
    /// Sounds for the current emotion.
    pub vocalizations: Vec<String>,
    /// Current energy stat, 0..=100.
    pub energy: f64,
    /// What was said.
    pub message: String,
    /// Perceived intent.
    pub intent: String,
    /// Perceived tone.
    pub tone: String,
    /// Relationship label.
    pub relationship: String,
    /// History summary from memory.
    pub history: String,
}

impl DecisionPrompt {
    /// Render `(system, user)`.
    #[must_use]
    pub fn render(&self) -> (String, String) {
        let top_traits = self
            .top_traits
            .iter()
            .map(|(name, v)| format!("{name} {v:.2}"))
            .collect::<Vec<_>>()
            .join(", ");
        let intensity = format!("{:.2}", self.intensity);
        let tags = self.behavior_tags.join(", ");
        let sounds = if self.vocalizations.is_empty() {
            "*quiet sound*".to_string()
        } else {
            self.vocalizations.join(", ")
        };
        let energy_hint = if self.energy < 30.0 {
            "you are tired, keep it quiet and slow"
        } else if self.energy > 70.0 {
            "you are full of energy, be lively"
        } else {
            "you are calm and steady"
        };
        let history = if self.history.trim().is_empty() {
            "nothing in particular"
        } else {
            self.history.as_str()
        };

        let system = render_template(
            DECISION_SYSTEM,
            &[
                ("agent_name", self.agent_name.as_str()),
                ("agent_type", self.agent_type.as_str()),
                ("top_traits", top_traits.as_str()),
                ("emotion", self.emotion.as_str()),
                ("intensity", intensity.as_str()),
                ("action_style", self.action_style.as_str()),
                ("style_description", self.style_description.as_str()),
                ("behavior_tags", tags.as_str()),
                ("vocalizations", sounds.as_str()),
                ("energy_hint", energy_hint),
            ],
        );
        let user = render_template(
            DECISION_USER,
            &[
                ("message", self.message.as_str()),
                ("intent", self.intent.as_str()),
                ("tone", self.tone.as_str()),
                ("relationship", self.relationship.as_str()),
                ("history", history),
            ],
        );
        (system, user)
    }

    /// Render into a grammar-constrained request.
    #[must_use]
    pub fn to_request(
        &self,
        max_tokens: u32,
        temperature: f32,
        timeout_ms: u64,
    ) -> GenerationRequest {
        let (system, user) = self.render();
        GenerationRequest::new(system, user)
            .with_grammar(RESPONSE_GRAMMAR)
            .with_sampling(max_tokens, temperature)
            .with_timeout(timeout_ms)
    }
}
