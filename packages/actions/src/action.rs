//! # Edit Actions
//!
//! Declarative edits against a document structure tree.
//!
//! ## Action Semantics
//!
//! ### Paragraph-scoped
//! - `replace_paragraph`, `delete_paragraph`, `update_paragraph_style` address
//!   a paragraph by id. A missing id is logged, never fatal.
//! - `insert_paragraph` anchors on `after_paragraph_id` or
//!   `before_paragraph_id` and falls back to appending/prepending.
//!
//! ### Document-scoped
//! - `replace_text_globally` is a literal substring replace over all text.
//! - `update_style_font` overrides a named style definition.
//!
//! ### Signals
//! - `clarify` asks the user a question; callers short-circuit the batch.
//! - `noop` records why nothing changed.
//!
//! `update_table_cell` and `rewrite_section` are part of the vocabulary but are
//! not applied by the structure engine.

use serde::{Deserialize, Serialize};

/// Paragraph type, shared by actions and the structure tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleType {
    H1,
    H2,
    H3,
    #[default]
    Text,
    ListItem,
    Title,
}

impl StyleType {
    pub const ALL: [StyleType; 6] = [
        StyleType::H1,
        StyleType::H2,
        StyleType::H3,
        StyleType::Text,
        StyleType::ListItem,
        StyleType::Title,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleType::H1 => "h1",
            StyleType::H2 => "h2",
            StyleType::H3 => "h3",
            StyleType::Text => "text",
            StyleType::ListItem => "list_item",
            StyleType::Title => "title",
        }
    }
}

impl std::fmt::Display for StyleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justification {
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteStyle {
    Simplify,
    Concise,
    Formal,
    Expand,
}

/// A single validated edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditAction {
    ReplaceParagraph {
        section_id: String,
        paragraph_id: String,
        new_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style_type: Option<StyleType>,
    },

    InsertParagraph {
        section_id: String,
        new_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after_paragraph_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before_paragraph_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style_type: Option<StyleType>,
    },

    DeleteParagraph {
        section_id: String,
        paragraph_id: String,
    },

    UpdateTableCell {
        table_id: String,
        row: usize,
        col: usize,
        new_text: String,
    },

    UpdateParagraphStyle {
        section_id: String,
        paragraph_id: String,
        style_type: StyleType,
    },

    UpdateStyleFont {
        style_name: String,
        size_pt: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bold: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        italic: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        justification: Option<Justification>,
    },

    ReplaceTextGlobally {
        old_text: String,
        new_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        case_sensitive: Option<bool>,
    },

    RewriteSection {
        section_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<RewriteStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_sentences: Option<u32>,
    },

    Clarify {
        question: String,
    },

    Noop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl EditAction {
    /// The wire discriminator of this action
    pub fn name(&self) -> &'static str {
        match self {
            EditAction::ReplaceParagraph { .. } => "replace_paragraph",
            EditAction::InsertParagraph { .. } => "insert_paragraph",
            EditAction::DeleteParagraph { .. } => "delete_paragraph",
            EditAction::UpdateTableCell { .. } => "update_table_cell",
            EditAction::UpdateParagraphStyle { .. } => "update_paragraph_style",
            EditAction::UpdateStyleFont { .. } => "update_style_font",
            EditAction::ReplaceTextGlobally { .. } => "replace_text_globally",
            EditAction::RewriteSection { .. } => "rewrite_section",
            EditAction::Clarify { .. } => "clarify",
            EditAction::Noop { .. } => "noop",
        }
    }

    pub fn noop(reason: impl Into<String>) -> Self {
        EditAction::Noop {
            reason: Some(reason.into()),
        }
    }
}

/// An ordered list of actions that passed validation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionBatch {
    actions: Vec<EditAction>,
}

impl ActionBatch {
    /// Wrap already-typed actions. The enum makes them valid by construction.
    pub fn new(actions: Vec<EditAction>) -> Self {
        Self { actions }
    }

    /// First clarification question in the batch, if any.
    ///
    /// A batch containing a `clarify` is a request for user input as a whole.
    pub fn clarification(&self) -> Option<&str> {
        self.actions.iter().find_map(|action| match action {
            EditAction::Clarify { question } => Some(question.as_str()),
            _ => None,
        })
    }

    pub fn actions(&self) -> &[EditAction] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn into_actions(self) -> Vec<EditAction> {
        self.actions
    }
}

impl<'a> IntoIterator for &'a ActionBatch {
    type Item = &'a EditAction;
    type IntoIter = std::slice::Iter<'a, EditAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl IntoIterator for ActionBatch {
    type Item = EditAction;
    type IntoIter = std::vec::IntoIter<EditAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}
