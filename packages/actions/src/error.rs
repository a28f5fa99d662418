//! Error types for action validation

use thiserror::Error;

/// An action payload failed schema validation. The whole batch is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("Expected a JSON array of actions, found {found}")]
    NotAnArray { found: &'static str },

    #[error("Action {index}: expected an object, found {found}")]
    NotAnObject { index: usize, found: &'static str },

    #[error("Action {index}: missing `action` field")]
    MissingAction { index: usize },

    #[error("Action {index}: unknown action `{action}`")]
    UnknownAction { index: usize, action: String },

    #[error("Action {index} ({action}): missing required field `{field}`")]
    MissingField {
        index: usize,
        action: String,
        field: &'static str,
    },

    #[error("Action {index} ({action}): field `{field}` {problem}")]
    InvalidField {
        index: usize,
        action: String,
        field: &'static str,
        problem: String,
    },

    #[error("Action {index}: matches {count} action variants")]
    Ambiguous { index: usize, count: usize },
}

impl SchemaViolation {
    pub fn missing_field(index: usize, action: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            index,
            action: action.into(),
            field,
        }
    }

    pub fn invalid_field(
        index: usize,
        action: impl Into<String>,
        field: &'static str,
        problem: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            index,
            action: action.into(),
            field,
            problem: problem.into(),
        }
    }

    /// Position of the offending action, when the payload was an array
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::NotAnArray { .. } => None,
            Self::NotAnObject { index, .. }
            | Self::MissingAction { index }
            | Self::UnknownAction { index, .. }
            | Self::MissingField { index, .. }
            | Self::InvalidField { index, .. }
            | Self::Ambiguous { index, .. } => Some(*index),
        }
    }

    /// Field named by the violation, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field, .. } | Self::InvalidField { field, .. } => Some(*field),
            Self::MissingAction { .. } | Self::UnknownAction { .. } => Some("action"),
            _ => None,
        }
    }
}
