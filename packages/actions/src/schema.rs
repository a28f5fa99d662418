//! # Action Schema
//!
//! A table-driven discriminated union. Each [`VariantSchema`] pins the
//! `action` discriminator to a constant and lists required and optional
//! fields with their types. An action is valid when exactly one variant
//! accepts it. Fields a variant does not name are ignored.

use crate::error::SchemaViolation;
use serde_json::{Map, Value};

const STYLE_TYPES: &[&str] = &["h1", "h2", "h3", "text", "list_item", "title"];
const JUSTIFICATIONS: &[&str] = &["left", "center", "right", "justified"];
const REWRITE_STYLES: &[&str] = &["simplify", "concise", "formal", "expand"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// Non-negative integer no larger than `u32::MAX`
    Integer,
    Boolean,
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn string(name: &'static str) -> FieldSchema {
    FieldSchema {
        name,
        ty: FieldType::String,
    }
}

const fn integer(name: &'static str) -> FieldSchema {
    FieldSchema {
        name,
        ty: FieldType::Integer,
    }
}

const fn boolean(name: &'static str) -> FieldSchema {
    FieldSchema {
        name,
        ty: FieldType::Boolean,
    }
}

const fn one_of(name: &'static str, values: &'static [&'static str]) -> FieldSchema {
    FieldSchema {
        name,
        ty: FieldType::Enum(values),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSchema {
    pub action: &'static str,
    pub required: &'static [FieldSchema],
    pub optional: &'static [FieldSchema],
}

pub static VARIANTS: &[VariantSchema] = &[
    VariantSchema {
        action: "replace_paragraph",
        required: &[
            string("section_id"),
            string("paragraph_id"),
            string("new_text"),
        ],
        optional: &[one_of("style_type", STYLE_TYPES)],
    },
    VariantSchema {
        action: "insert_paragraph",
        required: &[string("section_id"), string("new_text")],
        optional: &[
            string("after_paragraph_id"),
            string("before_paragraph_id"),
            one_of("style_type", STYLE_TYPES),
        ],
    },
    VariantSchema {
        action: "delete_paragraph",
        required: &[string("section_id"), string("paragraph_id")],
        optional: &[],
    },
    VariantSchema {
        action: "update_table_cell",
        required: &[
            string("table_id"),
            integer("row"),
            integer("col"),
            string("new_text"),
        ],
        optional: &[],
    },
    VariantSchema {
        action: "update_paragraph_style",
        required: &[
            string("section_id"),
            string("paragraph_id"),
            one_of("style_type", STYLE_TYPES),
        ],
        optional: &[],
    },
    VariantSchema {
        action: "update_style_font",
        required: &[string("style_name"), integer("size_pt")],
        optional: &[
            boolean("bold"),
            boolean("italic"),
            one_of("justification", JUSTIFICATIONS),
        ],
    },
    VariantSchema {
        action: "replace_text_globally",
        required: &[string("old_text"), string("new_text")],
        optional: &[boolean("case_sensitive")],
    },
    VariantSchema {
        action: "rewrite_section",
        required: &[string("section_id")],
        optional: &[one_of("style", REWRITE_STYLES), integer("max_sentences")],
    },
    VariantSchema {
        action: "clarify",
        required: &[string("question")],
        optional: &[],
    },
    VariantSchema {
        action: "noop",
        required: &[],
        optional: &[string("reason")],
    },
];

enum Mismatch {
    /// The `action` constant belongs to another variant
    Discriminator,
    Field(SchemaViolation),
}

impl From<SchemaViolation> for Mismatch {
    fn from(violation: SchemaViolation) -> Self {
        Mismatch::Field(violation)
    }
}

impl VariantSchema {
    pub fn find(action: &str) -> Option<&'static VariantSchema> {
        VARIANTS.iter().find(|variant| variant.action == action)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.required.iter().chain(self.optional.iter())
    }

    fn check(&self, index: usize, object: &Map<String, Value>) -> Result<(), Mismatch> {
        if object.get("action").and_then(Value::as_str) != Some(self.action) {
            return Err(Mismatch::Discriminator);
        }

        for field in self.required {
            match object.get(field.name) {
                Some(value) => field.check(index, self.action, value)?,
                None => {
                    return Err(SchemaViolation::missing_field(index, self.action, field.name).into())
                }
            }
        }

        for field in self.optional {
            if let Some(value) = object.get(field.name) {
                field.check(index, self.action, value)?;
            }
        }

        Ok(())
    }
}

impl FieldSchema {
    fn check(&self, index: usize, action: &str, value: &Value) -> Result<(), SchemaViolation> {
        let problem = match self.ty {
            FieldType::String if value.is_string() => return Ok(()),
            FieldType::String => format!("must be a string, found {}", describe(value)),

            FieldType::Integer => match value.as_u64() {
                Some(n) if n <= u64::from(u32::MAX) => return Ok(()),
                _ => format!("must be a non-negative integer, found {}", describe(value)),
            },

            FieldType::Boolean if value.is_boolean() => return Ok(()),
            FieldType::Boolean => format!("must be a boolean, found {}", describe(value)),

            FieldType::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => return Ok(()),
                _ => format!(
                    "must be one of [{}], found {}",
                    allowed.join(", "),
                    describe(value)
                ),
            },
        };

        Err(SchemaViolation::invalid_field(index, action, self.name, problem))
    }
}

/// Validate one action against the union (oneOf semantics).
pub fn validate_action(index: usize, value: &Value) -> Result<(), SchemaViolation> {
    let object = value.as_object().ok_or(SchemaViolation::NotAnObject {
        index,
        found: json_type(value),
    })?;

    let mut matches = 0;
    let mut failure = None;

    for variant in VARIANTS {
        match variant.check(index, object) {
            Ok(()) => matches += 1,
            Err(Mismatch::Discriminator) => {}
            Err(Mismatch::Field(violation)) => {
                failure.get_or_insert(violation);
            }
        }
    }

    match matches {
        1 => Ok(()),
        0 => Err(failure.unwrap_or_else(|| discriminator_violation(index, object))),
        count => Err(SchemaViolation::Ambiguous { index, count }),
    }
}

/// Validate every action of a payload, stopping at the first violation.
pub fn validate(actions: &[Value]) -> Result<(), SchemaViolation> {
    actions
        .iter()
        .enumerate()
        .try_for_each(|(index, action)| validate_action(index, action))
}

fn discriminator_violation(index: usize, object: &Map<String, Value>) -> SchemaViolation {
    match object.get("action") {
        None => SchemaViolation::MissingAction { index },
        Some(Value::String(name)) => SchemaViolation::UnknownAction {
            index,
            action: name.clone(),
        },
        Some(other) => SchemaViolation::invalid_field(
            index,
            "?",
            "action",
            format!("must be a string, found {}", describe(other)),
        ),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => json_type(value).to_string(),
        scalar => scalar.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_variant_is_unique() {
        for variant in VARIANTS {
            assert_eq!(
                VARIANTS.iter().filter(|v| v.action == variant.action).count(),
                1
            );
        }
        assert_eq!(VARIANTS.len(), 10);
    }

    #[test]
    fn test_valid_actions() {
        let actions = [
            json!({"action": "replace_paragraph", "section_id": "s1", "paragraph_id": "s1_p1", "new_text": "x"}),
            json!({"action": "insert_paragraph", "section_id": "s1", "new_text": "x", "after_paragraph_id": "s1_p2"}),
            json!({"action": "delete_paragraph", "section_id": "s1", "paragraph_id": "s1_p1"}),
            json!({"action": "update_table_cell", "table_id": "s1_t1", "row": 0, "col": 2, "new_text": "x"}),
            json!({"action": "update_paragraph_style", "section_id": "s1", "paragraph_id": "s1_p1", "style_type": "h2"}),
            json!({"action": "update_style_font", "style_name": "Normal", "size_pt": 11, "justification": "center"}),
            json!({"action": "replace_text_globally", "old_text": "a", "new_text": "b", "case_sensitive": false}),
            json!({"action": "rewrite_section", "section_id": "s1", "style": "concise", "max_sentences": 3}),
            json!({"action": "clarify", "question": "Which one?"}),
            json!({"action": "noop"}),
        ];

        for (i, action) in actions.iter().enumerate() {
            assert_eq!(validate_action(i, action), Ok(()), "{}", action);
        }
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate_action(0, &json!({"action": "replace_paragraph", "new_text": "x"}))
            .unwrap_err();

        assert_eq!(
            err,
            SchemaViolation::missing_field(0, "replace_paragraph", "section_id")
        );
        assert_eq!(err.index(), Some(0));
        assert_eq!(err.field(), Some("section_id"));
    }

    #[test]
    fn test_wrong_field_types() {
        let err = validate_action(
            2,
            &json!({"action": "update_table_cell", "table_id": "t", "row": "1", "col": 0, "new_text": "x"}),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("row"));
        assert_eq!(err.index(), Some(2));

        let err = validate_action(
            0,
            &json!({"action": "update_style_font", "style_name": "Normal", "size_pt": -4}),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("size_pt"));

        let err = validate_action(
            0,
            &json!({"action": "update_style_font", "style_name": "Normal", "size_pt": 12.5}),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("size_pt"));
    }

    #[test]
    fn test_enum_domain() {
        let err = validate_action(
            0,
            &json!({"action": "update_paragraph_style", "section_id": "s1", "paragraph_id": "p", "style_type": "h4"}),
        )
        .unwrap_err();

        match err {
            SchemaViolation::InvalidField { field, problem, .. } => {
                assert_eq!(field, "style_type");
                assert!(problem.contains("h1, h2, h3, text, list_item, title"));
            }
            other => panic!("unexpected violation: {:?}", other),
        }
    }

    #[test]
    fn test_optional_field_type_is_checked() {
        let err = validate_action(0, &json!({"action": "noop", "reason": 5})).unwrap_err();
        assert_eq!(err.field(), Some("reason"));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let action = json!({"action": "clarify", "question": "?", "confidence": 0.4});
        assert_eq!(validate_action(0, &action), Ok(()));
    }

    #[test]
    fn test_discriminator_errors() {
        assert_eq!(
            validate_action(0, &json!({"question": "?"})),
            Err(SchemaViolation::MissingAction { index: 0 })
        );
        assert_eq!(
            validate_action(1, &json!({"action": "move_paragraph"})),
            Err(SchemaViolation::UnknownAction {
                index: 1,
                action: "move_paragraph".to_string()
            })
        );
        assert!(matches!(
            validate_action(0, &json!({"action": 3})),
            Err(SchemaViolation::InvalidField { field: "action", .. })
        ));
        assert_eq!(
            validate_action(4, &json!("noop")),
            Err(SchemaViolation::NotAnObject {
                index: 4,
                found: "string"
            })
        );
    }

    #[test]
    fn test_validate_reports_first_bad_index() {
        let actions = vec![
            json!({"action": "noop"}),
            json!({"action": "delete_paragraph", "section_id": "s1"}),
            json!({"action": "bogus"}),
        ];

        assert_eq!(validate(&actions).unwrap_err().index(), Some(1));
    }
}
