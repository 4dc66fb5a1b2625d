//! Structured-response parsing.
//!
//! Accepts the JSON object the prompt asks for (optionally wrapped in a code
//! fence or surrounded by chatter), or the line format
//! `STYLIZED_OUTPUT: ...` / `HUMAN_TRANSLATION: ...`.

use crate::error::{LlmError, Result};
use crate::types::StructuredOutput;

/// Parse model text into a [`StructuredOutput`].
///
/// # Errors
/// `SchemaValidation` when JSON parses but the stylized output is empty,
/// `ParseError` when neither format is found.
pub fn parse_structured_response(text: &str) -> Result<StructuredOutput> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LlmError::ParseError("empty response".into()));
    }

    if let Some(candidate) = json_object(trimmed) {
        if let Ok(parsed) = serde_json::from_str::<StructuredOutput>(candidate) {
            return validated(parsed);
        }
    }

    parse_lines(trimmed).map_or_else(
        || {
            Err(LlmError::ParseError(format!(
                "no structured output found in: '{}'",
                preview(trimmed)
            )))
        },
        validated,
    )
}

/// The outermost `{ ... }` span, if any.
fn json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_lines(text: &str) -> Option<StructuredOutput> {
    let mut stylized = None;
    let mut translation = None;
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_start_matches(['-', '*', ' ']).to_uppercase();
        let value = value.trim().to_string();
        match key.as_str() {
            "STYLIZED_OUTPUT" | "CREATURE_LANGUAGE" => stylized = Some(value),
            "HUMAN_TRANSLATION" => translation = Some(value),
            _ => {}
        }
    }
    stylized.map(|stylized_output| StructuredOutput {
        stylized_output,
        human_translation: translation,
    })
}

fn validated(mut output: StructuredOutput) -> Result<StructuredOutput> {
    output.stylized_output = output.stylized_output.trim().to_string();
    if output.stylized_output.is_empty() {
        return Err(LlmError::SchemaValidation("stylized_output is empty".into()));
    }
    output.human_translation = output
        .human_translation
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && !matches!(t.to_lowercase().as_str(), "null" | "none" | "n/a"));
    Ok(output)
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
