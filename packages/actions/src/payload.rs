//! Turning an upstream text response into a validated [`ActionBatch`].

use crate::action::{ActionBatch, EditAction};
use crate::error::SchemaViolation;
use crate::normalize::normalize;
use crate::schema::{json_type, validate};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Reason carried by the synthetic `noop` that replaces an unparseable payload.
pub const TRUNCATED_RESPONSE_HINT: &str = "The AI response was too long and got cut off. \
Please try generating the report section-by-section (e.g., 'Generate Introduction', then \
'Generate Objective') to avoid size limits.";

/// The span from the first `[` to the last `]`, or the trimmed input when there
/// is no such span. Tolerates prose or code fences around the array.
pub fn extract_json_array(raw: &str) -> &str {
    match (raw.find('['), raw.rfind(']')) {
        (Some(start), Some(end)) if end > start => &raw[start..=end],
        _ => raw.trim(),
    }
}

/// Parse, normalize and validate a raw action payload.
///
/// Text that is not valid JSON yields a batch with a single `noop` carrying
/// [`TRUNCATED_RESPONSE_HINT`]. Valid JSON that breaks the schema is an error.
pub fn parse_actions(raw: &str) -> Result<ActionBatch, SchemaViolation> {
    let payload = extract_json_array(raw);

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => parse_action_values(value),
        Err(err) => {
            warn!(error = %err, bytes = raw.len(), "Action payload is not valid JSON");
            Ok(ActionBatch::new(vec![EditAction::noop(TRUNCATED_RESPONSE_HINT)]))
        }
    }
}

/// Normalize and validate an already-parsed payload.
pub fn parse_action_values(value: Value) -> Result<ActionBatch, SchemaViolation> {
    let Value::Array(mut values) = value else {
        return Err(SchemaViolation::NotAnArray {
            found: json_type(&value),
        });
    };

    let corrections = normalize(&mut values);
    validate(&values)?;

    let actions = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| convert(index, value))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        actions = actions.len(),
        corrections = corrections.len(),
        "Validated action payload"
    );

    Ok(ActionBatch::new(actions))
}

fn convert(index: usize, value: Value) -> Result<EditAction, SchemaViolation> {
    let name = value
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();

    serde_json::from_value(value).map_err(|err| {
        debug!(index, error = %err, "Validated action failed to convert");
        SchemaViolation::invalid_field(index, name, "action", err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_code_fence() {
        let raw = "Here you go:\n```json\n[{\"action\": \"noop\"}]\n```";
        assert_eq!(extract_json_array(raw), "[{\"action\": \"noop\"}]");
    }

    #[test]
    fn test_extract_keeps_backticks_inside_strings() {
        let raw = r#"[{"action": "insert_paragraph", "section_id": "s1", "new_text": "```mermaid\ngraph TD\n```"}]"#;
        assert_eq!(extract_json_array(raw), raw);
    }

    #[test]
    fn test_extract_without_brackets() {
        assert_eq!(extract_json_array("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_truncated_payload_becomes_noop() {
        let raw = r#"[{"action": "insert_paragraph", "section_id": "s1", "new_text": "A very long"#;
        let batch = parse_actions(raw).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.actions()[0], EditAction::noop(TRUNCATED_RESPONSE_HINT));
    }

    #[test]
    fn test_object_payload_is_rejected() {
        let err = parse_action_values(json!({"action": "noop"})).unwrap_err();
        assert_eq!(err, SchemaViolation::NotAnArray { found: "object" });
    }

    #[test]
    fn test_normalized_then_converted() {
        let batch = parse_actions(
            r#"[{"op": "clarify", "prompt": "Which heading?"},
                {"action": "update_style_font", "style_name": "Heading 1", "size_pt": 18, "justification": "justify"}]"#,
        )
        .unwrap();

        assert_eq!(batch.clarification(), Some("Which heading?"));
        assert!(matches!(
            batch.actions()[1],
            EditAction::UpdateStyleFont {
                size_pt: 18,
                justification: Some(crate::Justification::Justified),
                ..
            }
        ));
    }
}
