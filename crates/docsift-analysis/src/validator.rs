//! Parsing and sanitizing model output.

use docsift_core::models::{AnalysisResult, OutputLimits};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Model returned no text content")]
    EmptyResponse,

    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Model output field `{0}` is missing or not a string")]
    MissingField(&'static str),

    #[error("Model output field `{0}` is empty")]
    EmptyField(&'static str),
}

/// Extract the JSON payload from a response that may be wrapped in a
/// ```` ```json ```` or bare ```` ``` ```` fence.
pub fn strip_code_fences(text: &str) -> &str {
    if text.contains("```json") {
        text.split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(text)
            .trim()
    } else if text.contains("```") {
        text.split("```")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(text)
            .trim()
    } else {
        text.trim()
    }
}

/// Drop control characters, keeping newlines and tabs.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Keep at most `max_chars` Unicode scalar values.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Sanitize and trim a single field, then cap it.
pub fn clean_field(text: &str, max_chars: usize) -> String {
    truncate_chars(sanitize(text).trim(), max_chars)
        .trim_end()
        .to_string()
}

fn string_field<'a>(value: &'a Value, name: &'static str) -> Result<&'a str, ValidationError> {
    value
        .get(name)
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField(name))
}

/// Turn raw model text into an [`AnalysisResult`].
pub fn validate_response(
    text: &str,
    limits: OutputLimits,
) -> Result<AnalysisResult, ValidationError> {
    let payload = strip_code_fences(text);
    if payload.is_empty() {
        return Err(ValidationError::EmptyResponse);
    }

    let value: Value =
        serde_json::from_str(payload).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    let description = clean_field(
        string_field(&value, "description")?,
        limits.description_max_chars,
    );
    let summary = clean_field(string_field(&value, "summary")?, limits.summary_max_chars);

    if description.is_empty() {
        return Err(ValidationError::EmptyField("description"));
    }
    if summary.is_empty() {
        return Err(ValidationError::EmptyField("summary"));
    }

    Ok(AnalysisResult {
        description,
        summary,
        is_fallback: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> OutputLimits {
        OutputLimits::default()
    }

    #[test]
    fn test_plain_json() {
        let result = validate_response(
            r#"{"description": "A scanned invoice.", "summary": "Invoice"}"#,
            limits(),
        )
        .unwrap();
        assert_eq!(result.description, "A scanned invoice.");
        assert_eq!(result.summary, "Invoice");
        assert!(!result.is_fallback);
    }

    #[test]
    fn test_fenced_json() {
        let text = "Here you go:\n```json\n{\"description\": \"d\", \"summary\": \"s\"}\n```";
        let result = validate_response(text, limits()).unwrap();
        assert_eq!(result.description, "d");

        let bare = "```\n{\"description\": \"d2\", \"summary\": \"s2\"}\n```";
        assert_eq!(validate_response(bare, limits()).unwrap().summary, "s2");
    }

    #[test]
    fn test_missing_or_wrong_type_fields() {
        assert_eq!(
            validate_response(r#"{"summary": "s"}"#, limits()).unwrap_err(),
            ValidationError::MissingField("description")
        );
        assert_eq!(
            validate_response(r#"{"description": "d", "summary": 5}"#, limits()).unwrap_err(),
            ValidationError::MissingField("summary")
        );
        assert!(matches!(
            validate_response("not json", limits()).unwrap_err(),
            ValidationError::InvalidJson(_)
        ));
        assert_eq!(
            validate_response("   ", limits()).unwrap_err(),
            ValidationError::EmptyResponse
        );
    }

    #[test]
    fn test_long_description_truncated_to_cap() {
        let body = json!({ "description": "a".repeat(500), "summary": "b".repeat(400) });
        let result = validate_response(&body.to_string(), limits()).unwrap();
        assert_eq!(result.description.chars().count(), 300);
        assert_eq!(result.summary.chars().count(), 150);
    }

    #[test]
    fn test_leading_whitespace_does_not_eat_into_cap() {
        let description = format!("   \n\t{}", "a".repeat(500));
        let body = json!({ "description": description, "summary": "  short summary  " });
        let result = validate_response(&body.to_string(), limits()).unwrap();
        assert_eq!(result.description, "a".repeat(300));
        assert_eq!(result.summary, "short summary");
    }

    #[test]
    fn test_control_characters_stripped() {
        let body = json!({
            "description": "line one\nline\ttwo\u{0007}\u{0000}\r end",
            "summary": "\u{001b}[31mred"
        });
        let result = validate_response(&body.to_string(), limits()).unwrap();
        assert_eq!(result.description, "line one\nline\ttwo end");
        assert_eq!(result.summary, "[31mred");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let body = json!({ "description": "é".repeat(400), "summary": "🦀".repeat(200) });
        let result = validate_response(&body.to_string(), limits()).unwrap();
        assert_eq!(result.description, "é".repeat(300));
        assert_eq!(result.summary, "🦀".repeat(150));
    }

    #[test]
    fn test_blank_field_rejected() {
        let body = json!({ "description": "\u{0001}\u{0002}", "summary": "ok" });
        assert_eq!(
            validate_response(&body.to_string(), limits()).unwrap_err(),
            ValidationError::EmptyField("description")
        );
    }
}
