//! # Docedit Editor
//!
//! Structure extraction, action application and reconciliation for
//! word-processing documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ docx: .docx bytes ⇄ Document (XML arena)    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor                                      │
//! │  - extract: Document → DocumentStructure    │
//! │  - apply: structure + actions → structure   │
//! │  - reconcile: original + structure → .docx  │
//! │  - pipeline: validate → apply → reconcile   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ RevisionStore: original, current structure, │
//! │ bounded revision history                    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Structure is source of truth**: the binary document is derived
//! 2. **Replay from the original**: every revision is reconciled against the
//!    first upload, never against the previous revision
//! 3. **Identity by position**: paragraph ids are positional within one
//!    extraction
//! 4. **Local recovery**: a bad action or a failed diagram is logged and
//!    skipped, never fatal
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docedit_editor::{extract_bytes, Applier, Reconciler, UnavailableRenderer};
//! use docedit_actions::parse_actions;
//!
//! let original = std::fs::read("report.docx")?;
//! let structure = extract_bytes(&original)?;
//!
//! let batch = parse_actions(llm_output)?;
//! let outcome = Applier::new().apply(&structure, batch.actions());
//!
//! let bytes = Reconciler::new(&UnavailableRenderer).reconcile(&original, &outcome.structure)?;
//! ```

mod apply;
mod errors;
mod extract;
mod id_generator;
mod pipeline;
mod reconcile;
mod render;
mod structure;

pub use apply::{apply_actions, Applier, ApplyOutcome};
pub use errors::{EditorError, EditorResult, RenderError};
pub use extract::{
    extract, extract_bytes, extract_file, paragraph_type_for_style, DEFAULT_SECTION_TITLE,
};
pub use id_generator::{fingerprint, is_synthesized, synthesized_paragraph_id, IdGenerator};
pub use pipeline::{
    EditOutcome, EditPipeline, MemoryRevisionStore, NewRevision, RevisionEntry, RevisionStore,
    HISTORY_LIMIT, ORIGINAL_REVISION,
};
pub use reconcile::{
    reconcile, ReconcileOptions, ReconcileReport, Reconciler, DIAGRAM_FAILURE_MARKER,
};
pub use render::{DiagramRenderer, StaticDiagramRenderer, UnavailableRenderer};
pub use structure::{
    DocumentStructure, Meta, Paragraph, ParagraphType, Section, StyleOverride, Table,
};

// Re-export the action vocabulary for convenience
pub use docedit_actions::{ActionBatch, EditAction};
