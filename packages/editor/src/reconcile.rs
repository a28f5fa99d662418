//! # Reconciliation
//!
//! Regenerates a binary document from the pristine original and a structure
//! tree. Always replays from the original, never from a previous revision.
//!
//! ## Algorithm
//!
//! 1. Apply `meta.styles` overrides to the original style definitions.
//! 2. Re-derive positional ids for the original body paragraphs.
//! 3. Walk the structure's paragraphs with a cursor (the last element written):
//!    - single text block: reuse the original element with the same id, or
//!      splice a new paragraph after the cursor
//!    - anything else: splice fresh elements for every block after the cursor;
//!      the original element with that id is not reused
//! 4. Remove every original paragraph that was not reused.
//! 5. Serialize.
//!
//! Reused elements are never moved. For identical inputs the output bytes are
//! identical.

use crate::errors::EditorResult;
use crate::extract::index_paragraphs;
use crate::id_generator::{fingerprint, is_synthesized};
use crate::render::DiagramRenderer;
use crate::structure::{DocumentStructure, ParagraphType, StyleOverride};
use docedit_actions::Justification;
use docedit_docx::{
    write_atomic, Alignment, Document, FontOverride, NodeId, Paragraph as DocParagraph, StyleKind,
    EMU_PER_INCH,
};
use docedit_parser::{parse_inline, parse_table, segment, BlockKind, ContentBlock, ListMarker, TableRow};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Text of the paragraph emitted when a diagram cannot be rendered
pub const DIAGRAM_FAILURE_MARKER: &str = "[DIAGRAM GENERATION FAILED]";

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOptions {
    /// Width of inline diagram images
    pub image_width_inches: f64,
    /// Table style applied to tables built from markdown, when defined
    pub table_style: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            image_width_inches: 6.0,
            table_style: "Table Grid".to_string(),
        }
    }
}

/// What a reconciliation did to the original body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub reused: usize,
    pub rewritten: usize,
    pub created: usize,
    pub removed: usize,
    pub diagram_failures: usize,
}

pub struct Reconciler<'a> {
    renderer: &'a dyn DiagramRenderer,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(renderer: &'a dyn DiagramRenderer) -> Self {
        Self {
            renderer,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// `(original bytes, structure) -> new bytes`
    pub fn reconcile(&self, original: &[u8], structure: &DocumentStructure) -> EditorResult<Vec<u8>> {
        let mut document = Document::from_bytes(original)?;
        self.reconcile_document(&mut document, structure);
        Ok(document.to_bytes()?)
    }

    /// Reconcile `original` and write the result atomically to `output`
    pub fn reconcile_file(
        &self,
        original: impl AsRef<Path>,
        structure: &DocumentStructure,
        output: impl AsRef<Path>,
    ) -> EditorResult<()> {
        let bytes = std::fs::read(original.as_ref())?;
        let reconciled = self.reconcile(&bytes, structure)?;
        write_atomic(output.as_ref(), &reconciled)?;
        Ok(())
    }

    /// Mutate a freshly loaded original in place
    #[instrument(skip_all)]
    pub fn reconcile_document(
        &self,
        document: &mut Document,
        structure: &DocumentStructure,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        apply_style_overrides(document, &structure.meta.styles);

        let originals = index_paragraphs(document);
        let by_id: HashMap<&str, usize> = originals
            .iter()
            .enumerate()
            .map(|(i, original)| (original.id.as_str(), i))
            .collect();

        let mut visited: HashSet<&str> = HashSet::new();
        let mut cursor: Option<NodeId> = None;

        for paragraph in structure.paragraphs() {
            let blocks: Vec<ContentBlock> = segment(&paragraph.text).collect();

            if let [block] = blocks.as_slice() {
                if block.is_text() {
                    match by_id.get(paragraph.id.as_str()) {
                        Some(&i) => {
                            let original = &originals[i];
                            visited.insert(original.id.as_str());

                            let unchanged =
                                original.text == paragraph.text && original.kind == paragraph.kind;

                            if unchanged && !carries_markdown(&block.content) {
                                debug!(
                                    id = %original.id,
                                    fingerprint = %fingerprint(&original.text),
                                    "Reusing paragraph untouched"
                                );
                                report.reused += 1;
                            } else {
                                if original.kind != paragraph.kind {
                                    self.apply_type_style(document, original.paragraph, paragraph.kind);
                                }
                                document.clear_runs(original.paragraph);
                                self.render_markdown(document, original.paragraph, &block.content);
                                report.rewritten += 1;
                            }

                            cursor = Some(original.paragraph.node());
                        }
                        None => {
                            debug!(
                                id = %paragraph.id,
                                synthesized = is_synthesized(&paragraph.id),
                                "Creating paragraph"
                            );
                            let new = document.new_paragraph();
                            self.apply_type_style(document, new, paragraph.kind);
                            self.render_markdown(document, new, &block.content);
                            cursor = Some(self.splice(document, cursor, new.node()));
                            report.created += 1;
                        }
                    }
                    continue;
                }
            }

            debug!(id = %paragraph.id, blocks = blocks.len(), "Rebuilding paragraph from blocks");
            for block in &blocks {
                let node = match block.kind {
                    BlockKind::Text if block.content.trim().is_empty() => continue,
                    BlockKind::Text => {
                        let new = document.new_paragraph();
                        self.render_markdown(document, new, &block.content);
                        new.node()
                    }
                    BlockKind::Table => self.emit_table(document, &block.content),
                    BlockKind::Diagram => self.emit_diagram(document, &block.content, &mut report),
                };
                cursor = Some(self.splice(document, cursor, node));
                report.created += 1;
            }
        }

        for original in &originals {
            if !visited.contains(original.id.as_str()) {
                document.remove(original.paragraph.node());
                report.removed += 1;
            }
        }

        info!(
            reused = report.reused,
            rewritten = report.rewritten,
            created = report.created,
            removed = report.removed,
            "Reconciled document"
        );

        report
    }

    fn splice(&self, document: &mut Document, cursor: Option<NodeId>, node: NodeId) -> NodeId {
        document.insert_after(cursor, node);
        node
    }

    /// Point a paragraph at the style for its type. Plain text drops the
    /// explicit style.
    fn apply_type_style(&self, document: &mut Document, paragraph: DocParagraph, kind: ParagraphType) {
        let style = match kind {
            ParagraphType::H1 => "Heading 1",
            ParagraphType::H2 => "Heading 2",
            ParagraphType::H3 => "Heading 3",
            ParagraphType::Title => "Title",
            ParagraphType::ListItem => "List Paragraph",
            ParagraphType::Text => {
                document.clear_paragraph_style(paragraph);
                return;
            }
        };

        if !document.set_paragraph_style(paragraph, style) {
            debug!(style, kind = %kind, "Type style unavailable, paragraph style unchanged");
        }
    }

    /// Write markdown text as runs. A list marker overrides the paragraph
    /// style.
    fn render_markdown(&self, document: &mut Document, paragraph: DocParagraph, text: &str) {
        let inline = parse_inline(text);

        match inline.list {
            Some(marker) => {
                let style = match marker {
                    ListMarker::Bullet => "List Bullet",
                    ListMarker::Numbered => "List Number",
                };
                if !document.set_paragraph_style(paragraph, style) {
                    document.set_paragraph_style(paragraph, "List Paragraph");
                }
            }
            None => {}
        }

        for run in &inline.runs {
            document.add_run(paragraph, &run.text, run.bold);
        }
    }

    fn emit_table(&self, document: &mut Document, markup: &str) -> NodeId {
        let Some(table) = parse_table(markup) else {
            debug!("Table block without cells, writing it as text");
            let paragraph = document.new_paragraph();
            document.add_run(paragraph, markup.trim(), false);
            return paragraph.node();
        };

        let style = document
            .has_style(&self.options.table_style, StyleKind::Table)
            .then_some(self.options.table_style.as_str());
        let handle = document.new_table(table.row_count(), table.column_count, style);

        for (r, row) in table.rows.iter().enumerate() {
            let TableRow::Cells(cells) = row else {
                continue;
            };
            for (c, text) in cells.iter().enumerate() {
                document.set_cell_text(handle, r, c, text);
            }
        }

        debug!(
            rows = table.row_count(),
            columns = table.column_count,
            "Built table from markdown"
        );
        handle.node()
    }

    fn emit_diagram(&self, document: &mut Document, source: &str, report: &mut ReconcileReport) -> NodeId {
        let width_emu = (self.options.image_width_inches * EMU_PER_INCH as f64).round() as u64;

        match self.renderer.render(source) {
            Ok(image) => match document.new_image_paragraph(&image, width_emu) {
                Ok(paragraph) => return paragraph.node(),
                Err(err) => warn!(error = %err, "Rendered diagram is not a usable image"),
            },
            Err(err) => warn!(error = %err, "Diagram rendering failed"),
        }

        report.diagram_failures += 1;
        let paragraph = document.new_paragraph();
        document.add_run(
            paragraph,
            &format!("{}\n{}", DIAGRAM_FAILURE_MARKER, source),
            false,
        );
        paragraph.node()
    }
}

/// Whether rendering `text` would change more than its runs' text: a list
/// marker or bold delimiters
fn carries_markdown(text: &str) -> bool {
    parse_inline(text).list.is_some() || text.contains("**")
}

/// Reconcile with default options
pub fn reconcile(
    original: &[u8],
    structure: &DocumentStructure,
    renderer: &dyn DiagramRenderer,
) -> EditorResult<Vec<u8>> {
    Reconciler::new(renderer).reconcile(original, structure)
}

fn apply_style_overrides(document: &mut Document, styles: &BTreeMap<String, StyleOverride>) {
    for (name, style) in styles {
        let overrides = FontOverride {
            size_pt: style.size_pt,
            bold: style.bold,
            italic: style.italic,
            alignment: style.justification.map(alignment),
        };

        if document.apply_style_override(name, &overrides) {
            debug!(style = %name, "Applied style override");
        } else {
            warn!(style = %name, "Style not found, override skipped");
        }
    }
}

fn alignment(justification: Justification) -> Alignment {
    match justification {
        Justification::Left => Alignment::Left,
        Justification::Center => Alignment::Center,
        Justification::Right => Alignment::Right,
        Justification::Justified => Alignment::Both,
    }
}
