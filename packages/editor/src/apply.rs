//! # Action Application
//!
//! Applies a validated action batch to a structure tree in memory. The input
//! tree is never mutated; a fresh tree and a change log come back.
//!
//! Every action contributes exactly one change-log line, in action order.
//! Per-action failures (unknown paragraph, unknown section) are logged and
//! skipped so one bad action never aborts the rest of the batch.

use crate::id_generator::synthesized_paragraph_id;
use crate::structure::{DocumentStructure, Paragraph, StyleOverride};
use docedit_actions::{EditAction, StyleType};
use tracing::{debug, info, instrument};

/// Result of applying a batch
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub structure: DocumentStructure,
    pub changes: Vec<String>,
}

/// Applies action batches. Holds the clock used for synthesized paragraph ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct Applier {
    timestamp_ms: Option<i64>,
}

impl Applier {
    /// Ids of inserted paragraphs use the wall clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of inserted paragraphs use a fixed timestamp
    pub fn at(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
        }
    }

    #[instrument(skip_all, fields(actions = actions.len()))]
    pub fn apply(&self, structure: &DocumentStructure, actions: &[EditAction]) -> ApplyOutcome {
        let timestamp_ms = self
            .timestamp_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        let mut pass = Pass {
            structure: structure.clone(),
            timestamp_ms,
        };

        let changes: Vec<String> = actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                let change = pass.apply(index, action);
                debug!(index, action = action.name(), change = %change, "Applied action");
                change
            })
            .collect();

        info!(changes = changes.len(), "Applied action batch");

        ApplyOutcome {
            structure: pass.structure,
            changes,
        }
    }
}

/// Apply `actions` using the wall clock for synthesized ids
pub fn apply_actions(structure: &DocumentStructure, actions: &[EditAction]) -> ApplyOutcome {
    Applier::new().apply(structure, actions)
}

struct Pass {
    structure: DocumentStructure,
    timestamp_ms: i64,
}

impl Pass {
    fn apply(&mut self, index: usize, action: &EditAction) -> String {
        match action {
            EditAction::Noop { reason } => {
                format!("No change: {}", reason.as_deref().unwrap_or("None"))
            }

            EditAction::Clarify { question } => format!("Question: {}", question),

            EditAction::ReplaceTextGlobally {
                old_text,
                new_text,
                case_sensitive,
            } => self.replace_globally(old_text, new_text, case_sensitive.unwrap_or(true)),

            EditAction::ReplaceParagraph {
                paragraph_id,
                new_text,
                style_type,
                ..
            } => match self.structure.paragraph_mut(paragraph_id) {
                Some(paragraph) => {
                    paragraph.text = new_text.clone();
                    if let Some(kind) = style_type {
                        paragraph.kind = *kind;
                    }
                    format!("Updated paragraph {}", paragraph_id)
                }
                None => format!("Failed to find paragraph {}", paragraph_id),
            },

            EditAction::DeleteParagraph { paragraph_id, .. } => {
                let section = self
                    .structure
                    .sections
                    .iter_mut()
                    .find_map(|section| Some((section.position(paragraph_id)?, section)));

                match section {
                    Some((position, section)) => {
                        section.paragraphs.remove(position);
                        format!("Deleted paragraph {}", paragraph_id)
                    }
                    None => format!("Failed to find paragraph {} for deletion", paragraph_id),
                }
            }

            EditAction::UpdateParagraphStyle {
                paragraph_id,
                style_type,
                ..
            } => match self.structure.paragraph_mut(paragraph_id) {
                Some(paragraph) => {
                    paragraph.kind = *style_type;
                    format!("Changed paragraph {} style to {}", paragraph_id, style_type)
                }
                None => format!("Failed to find paragraph {} for style update", paragraph_id),
            },

            EditAction::InsertParagraph {
                section_id,
                new_text,
                after_paragraph_id,
                before_paragraph_id,
                style_type,
            } => self.insert(
                index,
                section_id,
                new_text,
                after_paragraph_id.as_deref(),
                before_paragraph_id.as_deref(),
                style_type.unwrap_or_default(),
            ),

            EditAction::UpdateStyleFont {
                style_name,
                size_pt,
                bold,
                italic,
                justification,
            } => {
                self.structure.meta.styles.insert(
                    style_name.clone(),
                    StyleOverride {
                        size_pt: Some(*size_pt),
                        bold: *bold,
                        italic: *italic,
                        justification: *justification,
                    },
                );
                format!("Updated style '{}' to {}pt", style_name, size_pt)
            }

            EditAction::UpdateTableCell { .. } | EditAction::RewriteSection { .. } => {
                format!("Unhandled action {}", action.name())
            }
        }
    }

    fn replace_globally(&mut self, old_text: &str, new_text: &str, case_sensitive: bool) -> String {
        if old_text.is_empty() {
            return "Skipped global replace: empty search text".to_string();
        }

        let mut count = 0;
        for section in &mut self.structure.sections {
            for paragraph in &mut section.paragraphs {
                let (text, replaced) = if case_sensitive {
                    let replaced = paragraph.text.matches(old_text).count();
                    (paragraph.text.replace(old_text, new_text), replaced)
                } else {
                    replace_ignore_ascii_case(&paragraph.text, old_text, new_text)
                };

                if replaced > 0 {
                    paragraph.text = text;
                    count += replaced;
                }
            }
        }

        format!(
            "Replaced {} occurrences of '{}' with '{}'",
            count, old_text, new_text
        )
    }

    fn insert(
        &mut self,
        index: usize,
        section_id: &str,
        new_text: &str,
        after: Option<&str>,
        before: Option<&str>,
        kind: StyleType,
    ) -> String {
        let id = self.fresh_id(section_id, index);

        let Some(section) = self.structure.section_mut(section_id) else {
            return format!("Failed to find section {} for insertion", section_id);
        };
        let paragraph = Paragraph::new(id, new_text, kind);

        if let Some(after) = after {
            match section.position(after) {
                Some(position) => {
                    section.paragraphs.insert(position + 1, paragraph);
                    format!("Inserted paragraph after {}", after)
                }
                None => {
                    section.paragraphs.push(paragraph);
                    format!("Inserted paragraph (fallback append) in {}", section_id)
                }
            }
        } else if let Some(before) = before {
            match section.position(before) {
                Some(position) => {
                    section.paragraphs.insert(position, paragraph);
                    format!("Inserted paragraph before {}", before)
                }
                None => {
                    section.paragraphs.insert(0, paragraph);
                    format!("Inserted paragraph (fallback prepend) in {}", section_id)
                }
            }
        } else {
            section.paragraphs.push(paragraph);
            format!("Inserted paragraph in {}", section_id)
        }
    }

    /// Synthesized id not already present anywhere in the tree
    fn fresh_id(&self, section_id: &str, ordinal: usize) -> String {
        let ids = self.structure.paragraph_ids();
        let mut timestamp = self.timestamp_ms;
        loop {
            let id = synthesized_paragraph_id(section_id, timestamp, ordinal);
            if !ids.contains(id.as_str()) {
                return id;
            }
            timestamp += 1;
        }
    }
}

/// Literal replace with ASCII case folding. Returns the new text and the
/// number of replacements.
fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> (String, usize) {
    // ASCII lowercasing keeps byte offsets, so matches index into `haystack`
    let folded = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut count = 0;
    let mut last = 0;

    for (start, _) in folded.match_indices(&needle) {
        out.push_str(&haystack[last..start]);
        out.push_str(replacement);
        last = start + needle.len();
        count += 1;
    }
    out.push_str(&haystack[last..]);

    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Meta, Section};
    use docedit_actions::Justification;

    fn structure() -> DocumentStructure {
        DocumentStructure {
            meta: Meta::default(),
            sections: vec![Section {
                id: "s1".to_string(),
                title: "Document Start".to_string(),
                paragraphs: vec![
                    Paragraph::new("s1_p1", "Title", StyleType::Title),
                    Paragraph::new("s1_p2", "Old body", StyleType::Text),
                    Paragraph::new("s1_p3", "Closing", StyleType::Text),
                ],
                tables: vec![],
            }],
        }
    }

    fn texts(structure: &DocumentStructure) -> Vec<&str> {
        structure.paragraphs().map(|p| p.text.as_str()).collect()
    }

    fn insert(after: Option<&str>, before: Option<&str>) -> EditAction {
        EditAction::InsertParagraph {
            section_id: "s1".to_string(),
            new_text: "New".to_string(),
            after_paragraph_id: after.map(str::to_string),
            before_paragraph_id: before.map(str::to_string),
            style_type: None,
        }
    }

    #[test]
    fn test_input_is_not_mutated() {
        let original = structure();
        let outcome = Applier::at(1).apply(
            &original,
            &[EditAction::DeleteParagraph {
                section_id: "s1".to_string(),
                paragraph_id: "s1_p2".to_string(),
            }],
        );

        assert_eq!(original, structure());
        assert_eq!(texts(&outcome.structure), vec!["Title", "Closing"]);
        assert_eq!(outcome.changes, vec!["Deleted paragraph s1_p2"]);
    }

    #[test]
    fn test_replace_paragraph() {
        let outcome = Applier::at(1).apply(
            &structure(),
            &[
                EditAction::ReplaceParagraph {
                    section_id: "s1".to_string(),
                    paragraph_id: "s1_p2".to_string(),
                    new_text: "New body".to_string(),
                    style_type: Some(StyleType::H2),
                },
                EditAction::ReplaceParagraph {
                    section_id: "s1".to_string(),
                    paragraph_id: "s1_p9".to_string(),
                    new_text: "x".to_string(),
                    style_type: None,
                },
            ],
        );

        let paragraph = outcome.structure.paragraph("s1_p2").unwrap();
        assert_eq!(paragraph.text, "New body");
        assert_eq!(paragraph.kind, StyleType::H2);
        assert_eq!(
            outcome.changes,
            vec!["Updated paragraph s1_p2", "Failed to find paragraph s1_p9"]
        );
    }

    #[test]
    fn test_insert_positions() {
        let applier = Applier::at(1_000);

        let after = applier.apply(&structure(), &[insert(Some("s1_p1"), None)]);
        assert_eq!(texts(&after.structure), vec!["Title", "New", "Old body", "Closing"]);
        assert_eq!(after.changes, vec!["Inserted paragraph after s1_p1"]);
        assert_eq!(after.structure.sections[0].paragraphs[1].id, "s1_new_1000_0");

        let before = applier.apply(&structure(), &[insert(None, Some("s1_p3"))]);
        assert_eq!(texts(&before.structure), vec!["Title", "Old body", "New", "Closing"]);

        let append = applier.apply(&structure(), &[insert(Some("missing"), None)]);
        assert_eq!(texts(&append.structure).last(), Some(&"New"));
        assert_eq!(append.changes, vec!["Inserted paragraph (fallback append) in s1"]);

        let prepend = applier.apply(&structure(), &[insert(None, Some("missing"))]);
        assert_eq!(texts(&prepend.structure)[0], "New");
        assert_eq!(prepend.changes, vec!["Inserted paragraph (fallback prepend) in s1"]);

        let plain = applier.apply(&structure(), &[insert(None, None)]);
        assert_eq!(plain.changes, vec!["Inserted paragraph in s1"]);
    }

    #[test]
    fn test_insert_into_missing_section() {
        let outcome = Applier::at(1).apply(
            &structure(),
            &[EditAction::InsertParagraph {
                section_id: "s7".to_string(),
                new_text: "x".to_string(),
                after_paragraph_id: None,
                before_paragraph_id: None,
                style_type: None,
            }],
        );

        assert_eq!(outcome.structure, structure());
        assert_eq!(outcome.changes, vec!["Failed to find section s7 for insertion"]);
    }

    #[test]
    fn test_inserted_ids_are_unique() {
        let outcome = Applier::at(5).apply(
            &structure(),
            &[insert(None, None), EditAction::noop("filler"), insert(None, None)],
        );

        let ids: Vec<_> = outcome.structure.paragraphs().map(|p| p.id.clone()).collect();
        assert_eq!(ids[3], "s1_new_5_0");
        assert_eq!(ids[4], "s1_new_5_2");

        let again = Applier::at(5).apply(&outcome.structure, &[insert(None, None)]);
        let last = again.structure.paragraphs().last().unwrap();
        assert_eq!(last.id, "s1_new_6_0");
    }

    #[test]
    fn test_insert_with_style_type() {
        let outcome = Applier::at(1).apply(
            &structure(),
            &[EditAction::InsertParagraph {
                section_id: "s1".to_string(),
                new_text: "Heading".to_string(),
                after_paragraph_id: None,
                before_paragraph_id: None,
                style_type: Some(StyleType::H1),
            }],
        );

        assert_eq!(outcome.structure.paragraphs().last().unwrap().kind, StyleType::H1);
    }

    #[test]
    fn test_global_replace_counts_occurrences() {
        let mut input = structure();
        input.sections[0].paragraphs[1].text = "Acme and Acme".to_string();
        input.sections[0].paragraphs[2].text = "Signed, Acme".to_string();

        let outcome = Applier::at(1).apply(
            &input,
            &[EditAction::ReplaceTextGlobally {
                old_text: "Acme".to_string(),
                new_text: "AcmeCorp".to_string(),
                case_sensitive: None,
            }],
        );

        assert_eq!(
            outcome.changes,
            vec!["Replaced 3 occurrences of 'Acme' with 'AcmeCorp'"]
        );
        let all: String = texts(&outcome.structure).concat();
        assert_eq!(all.matches("AcmeCorp").count(), 3);
        assert_eq!(all.matches("Acme").count(), 3);
    }

    #[test]
    fn test_global_replace_case_insensitive() {
        let mut input = structure();
        input.sections[0].paragraphs[1].text = "ACME, acme, Acme".to_string();

        let outcome = Applier::at(1).apply(
            &input,
            &[EditAction::ReplaceTextGlobally {
                old_text: "acme".to_string(),
                new_text: "Beta".to_string(),
                case_sensitive: Some(false),
            }],
        );

        assert_eq!(outcome.structure.paragraph("s1_p2").unwrap().text, "Beta, Beta, Beta");
        assert_eq!(outcome.changes, vec!["Replaced 3 occurrences of 'acme' with 'Beta'"]);
    }

    #[test]
    fn test_global_replace_empty_needle() {
        let outcome = Applier::at(1).apply(
            &structure(),
            &[EditAction::ReplaceTextGlobally {
                old_text: String::new(),
                new_text: "x".to_string(),
                case_sensitive: None,
            }],
        );

        assert_eq!(outcome.structure, structure());
        assert_eq!(outcome.changes, vec!["Skipped global replace: empty search text"]);
    }

    #[test]
    fn test_style_font_and_signals() {
        let outcome = Applier::at(1).apply(
            &structure(),
            &[
                EditAction::UpdateStyleFont {
                    style_name: "Normal".to_string(),
                    size_pt: 14,
                    bold: Some(true),
                    italic: None,
                    justification: Some(Justification::Justified),
                },
                EditAction::Clarify {
                    question: "Which heading?".to_string(),
                },
                EditAction::Noop { reason: None },
                EditAction::UpdateParagraphStyle {
                    section_id: "s1".to_string(),
                    paragraph_id: "s1_p3".to_string(),
                    style_type: StyleType::ListItem,
                },
                EditAction::UpdateTableCell {
                    table_id: "s1_t1".to_string(),
                    row: 0,
                    col: 0,
                    new_text: "x".to_string(),
                },
            ],
        );

        assert_eq!(
            outcome.changes,
            vec![
                "Updated style 'Normal' to 14pt",
                "Question: Which heading?",
                "No change: None",
                "Changed paragraph s1_p3 style to list_item",
                "Unhandled action update_table_cell",
            ]
        );
        assert_eq!(
            outcome.structure.meta.styles["Normal"],
            StyleOverride {
                size_pt: Some(14),
                bold: Some(true),
                italic: None,
                justification: Some(Justification::Justified),
            }
        );
        assert_eq!(outcome.structure.paragraph("s1_p3").unwrap().kind, StyleType::ListItem);
    }

    #[test]
    fn test_empty_batch_is_identity() {
        let outcome = apply_actions(&structure(), &[]);
        assert_eq!(outcome.structure, structure());
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn test_ascii_case_folding_keeps_other_text() {
        assert_eq!(
            replace_ignore_ascii_case("Ünï ACME ünï", "acme", "x"),
            ("Ünï x ünï".to_string(), 1)
        );
    }
}
