//! Tolerant pre-validation pass for known field-name slips.
//!
//! Only three corrections are made:
//! - `op` is renamed to `action` when `action` is absent
//! - on `clarify`, `prompt` is renamed to `question` when `question` is absent
//! - on `update_style_font`, justification `justify` becomes `justified`
//!
//! Missing data is never invented.

use serde_json::Value;
use tracing::debug;

/// One applied correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub index: usize,
    pub description: String,
}

impl Correction {
    fn new(index: usize, description: impl Into<String>) -> Self {
        Self {
            index,
            description: description.into(),
        }
    }
}

/// Correct known slips in place and report what changed.
pub fn normalize(actions: &mut [Value]) -> Vec<Correction> {
    let mut corrections = Vec::new();

    for (index, action) in actions.iter_mut().enumerate() {
        let Some(object) = action.as_object_mut() else {
            continue;
        };

        if !object.contains_key("action") {
            if let Some(op) = object.remove("op") {
                object.insert("action".to_string(), op);
                corrections.push(Correction::new(index, "renamed `op` to `action`"));
            }
        }

        let kind = object
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match kind.as_deref() {
            Some("clarify") if !object.contains_key("question") => {
                if let Some(prompt) = object.remove("prompt") {
                    object.insert("question".to_string(), prompt);
                    corrections.push(Correction::new(index, "renamed `prompt` to `question`"));
                }
            }
            Some("update_style_font") => {
                if let Some(value) = object.get_mut("justification") {
                    if value.as_str() == Some("justify") {
                        *value = Value::String("justified".to_string());
                        corrections.push(Correction::new(
                            index,
                            "changed justification `justify` to `justified`",
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    for correction in &corrections {
        debug!(index = correction.index, correction = %correction.description, "Normalized action");
    }

    corrections
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_op_becomes_action() {
        let mut actions = vec![json!({"op": "noop", "reason": "nothing to do"})];
        let corrections = normalize(&mut actions);

        assert_eq!(actions[0], json!({"action": "noop", "reason": "nothing to do"}));
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].index, 0);
    }

    #[test]
    fn test_op_ignored_when_action_present() {
        let mut actions = vec![json!({"action": "noop", "op": "delete_paragraph"})];
        assert!(normalize(&mut actions).is_empty());
        assert_eq!(actions[0]["op"], "delete_paragraph");
    }

    #[test]
    fn test_prompt_becomes_question() {
        let mut actions = vec![json!({"op": "clarify", "prompt": "Which table?"})];
        let corrections = normalize(&mut actions);

        assert_eq!(actions[0], json!({"action": "clarify", "question": "Which table?"}));
        assert_eq!(corrections.len(), 2);
    }

    #[test]
    fn test_prompt_kept_when_question_present() {
        let mut actions = vec![json!({"action": "clarify", "question": "A?", "prompt": "B?"})];
        assert!(normalize(&mut actions).is_empty());
        assert_eq!(actions[0]["question"], "A?");
    }

    #[test]
    fn test_justify_becomes_justified() {
        let mut actions = vec![
            json!({"action": "update_style_font", "style_name": "Normal", "size_pt": 11, "justification": "justify"}),
            json!({"action": "update_style_font", "style_name": "Normal", "size_pt": 11, "justification": "left"}),
        ];
        let corrections = normalize(&mut actions);

        assert_eq!(actions[0]["justification"], "justified");
        assert_eq!(actions[1]["justification"], "left");
        assert_eq!(corrections.len(), 1);
    }

    #[test]
    fn test_nothing_invented() {
        let mut actions = vec![json!({"action": "clarify"}), json!(42)];
        assert!(normalize(&mut actions).is_empty());
        assert_eq!(actions[0], json!({"action": "clarify"}));
    }
}
