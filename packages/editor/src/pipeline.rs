//! # Edit Pipeline
//!
//! One edit request, end to end:
//!
//! ```text
//! payload ──parse/validate──► ActionBatch ──clarify?──► question back to caller
//!                                  │
//!                                  ▼
//!   store.structure() ──Applier──► new structure + change log
//!                                  │
//!   store.original() ──Reconciler──► new binary ──► store.save_revision()
//! ```
//!
//! Storage is behind [`RevisionStore`]; [`MemoryRevisionStore`] keeps
//! everything in memory with a bounded history.

use crate::apply::Applier;
use crate::errors::{EditorError, EditorResult};
use crate::extract::extract_bytes;
use crate::reconcile::{ReconcileOptions, Reconciler};
use crate::render::DiagramRenderer;
use crate::structure::DocumentStructure;
use docedit_actions::{parse_actions, ActionBatch};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{info, instrument};

/// History entries kept per document, the original upload included
pub const HISTORY_LIMIT: usize = 10;

pub const ORIGINAL_REVISION: &str = "0";

/// One line of a document's revision history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionEntry {
    pub rev_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub instruction: String,
    pub changes: Vec<String>,
}

/// Everything persisted for a new revision
#[derive(Debug, Clone, PartialEq)]
pub struct NewRevision {
    pub instruction: String,
    pub changes: Vec<String>,
    pub structure: DocumentStructure,
    pub document: Vec<u8>,
}

/// Storage collaborator. Implementations serialize writers per document.
pub trait RevisionStore {
    /// The binary document as first uploaded
    fn original(&self, doc_id: &str) -> EditorResult<Vec<u8>>;

    /// The current structure tree
    fn structure(&self, doc_id: &str) -> EditorResult<DocumentStructure>;

    /// Persist a revision and make its structure current. Returns the
    /// revision id.
    fn save_revision(&mut self, doc_id: &str, revision: NewRevision) -> EditorResult<String>;

    fn history(&self, doc_id: &str) -> EditorResult<Vec<RevisionEntry>>;

    /// Binary document of a revision still in history
    fn revision(&self, doc_id: &str, rev_id: &str) -> EditorResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
struct StoredDocument {
    original: Vec<u8>,
    structure: DocumentStructure,
    history: VecDeque<RevisionEntry>,
    revisions: HashMap<String, Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRevisionStore {
    documents: HashMap<String, StoredDocument>,
    next_document: usize,
    last_rev: i64,
}

impl MemoryRevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest an upload: extract its structure and record revision `0`
    pub fn create(&mut self, original: Vec<u8>) -> EditorResult<String> {
        let structure = extract_bytes(&original)?;
        self.next_document += 1;
        let doc_id = format!("doc{}", self.next_document);
        self.insert(&doc_id, original, structure);
        Ok(doc_id)
    }

    /// Register a document with an existing structure tree
    pub fn insert(&mut self, doc_id: &str, original: Vec<u8>, structure: DocumentStructure) {
        let mut history = VecDeque::new();
        history.push_back(RevisionEntry {
            rev_id: ORIGINAL_REVISION.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            instruction: "Original Upload".to_string(),
            changes: Vec::new(),
        });

        let mut revisions = HashMap::new();
        revisions.insert(ORIGINAL_REVISION.to_string(), original.clone());

        self.documents.insert(
            doc_id.to_string(),
            StoredDocument {
                original,
                structure,
                history,
                revisions,
            },
        );
    }

    pub fn latest_revision(&self, doc_id: &str) -> Option<&RevisionEntry> {
        self.documents.get(doc_id)?.history.back()
    }

    fn document(&self, doc_id: &str) -> EditorResult<&StoredDocument> {
        self.documents
            .get(doc_id)
            .ok_or_else(|| EditorError::DocumentNotFound(doc_id.to_string()))
    }

    /// Millisecond timestamp, bumped to stay unique within this store
    fn next_rev(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_rev = now.max(self.last_rev + 1);
        self.last_rev
    }
}

impl RevisionStore for MemoryRevisionStore {
    fn original(&self, doc_id: &str) -> EditorResult<Vec<u8>> {
        Ok(self.document(doc_id)?.original.clone())
    }

    fn structure(&self, doc_id: &str) -> EditorResult<DocumentStructure> {
        Ok(self.document(doc_id)?.structure.clone())
    }

    fn save_revision(&mut self, doc_id: &str, revision: NewRevision) -> EditorResult<String> {
        if !self.documents.contains_key(doc_id) {
            return Err(EditorError::DocumentNotFound(doc_id.to_string()));
        }

        let timestamp = self.next_rev();
        let rev_id = timestamp.to_string();

        let document = self
            .documents
            .get_mut(doc_id)
            .ok_or_else(|| EditorError::DocumentNotFound(doc_id.to_string()))?;

        document.structure = revision.structure;
        document.revisions.insert(rev_id.clone(), revision.document);
        document.history.push_back(RevisionEntry {
            rev_id: rev_id.clone(),
            timestamp,
            instruction: revision.instruction,
            changes: revision.changes,
        });

        while document.history.len() > HISTORY_LIMIT {
            if let Some(evicted) = document.history.pop_front() {
                document.revisions.remove(&evicted.rev_id);
            }
        }

        Ok(rev_id)
    }

    fn history(&self, doc_id: &str) -> EditorResult<Vec<RevisionEntry>> {
        Ok(self.document(doc_id)?.history.iter().cloned().collect())
    }

    fn revision(&self, doc_id: &str, rev_id: &str) -> EditorResult<Vec<u8>> {
        self.document(doc_id)?
            .revisions
            .get(rev_id)
            .cloned()
            .ok_or_else(|| EditorError::DocumentNotFound(format!("{}@{}", doc_id, rev_id)))
    }
}

/// Result of one edit request
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The batch asked a question; nothing was applied or saved
    Clarification { question: String },
    Applied {
        rev_id: String,
        changes: Vec<String>,
        structure: DocumentStructure,
    },
}

pub struct EditPipeline<S, R> {
    store: S,
    renderer: R,
    options: ReconcileOptions,
    applier: Applier,
}

impl<S: RevisionStore, R: DiagramRenderer> EditPipeline<S, R> {
    pub fn new(store: S, renderer: R) -> Self {
        Self {
            store,
            renderer,
            options: ReconcileOptions::default(),
            applier: Applier::new(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_applier(mut self, applier: Applier) -> Self {
        self.applier = applier;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parse an untrusted payload and run it. A payload that violates the
    /// schema is rejected before anything is applied.
    pub fn edit(&mut self, doc_id: &str, instruction: &str, payload: &str) -> EditorResult<EditOutcome> {
        let batch = parse_actions(payload)?;
        self.edit_batch(doc_id, instruction, &batch)
    }

    #[instrument(skip(self, batch), fields(actions = batch.len()))]
    pub fn edit_batch(
        &mut self,
        doc_id: &str,
        instruction: &str,
        batch: &ActionBatch,
    ) -> EditorResult<EditOutcome> {
        if let Some(question) = batch.clarification() {
            info!(question, "Batch requests clarification");
            return Ok(EditOutcome::Clarification {
                question: question.to_string(),
            });
        }

        let structure = self.store.structure(doc_id)?;
        let outcome = self.applier.apply(&structure, batch.actions());

        let original = self.store.original(doc_id)?;
        let document = Reconciler::new(&self.renderer)
            .with_options(self.options.clone())
            .reconcile(&original, &outcome.structure)?;

        let rev_id = self.store.save_revision(
            doc_id,
            NewRevision {
                instruction: instruction.to_string(),
                changes: outcome.changes.clone(),
                structure: outcome.structure.clone(),
                document,
            },
        )?;

        info!(rev_id = %rev_id, changes = outcome.changes.len(), "Saved revision");

        Ok(EditOutcome::Applied {
            rev_id,
            changes: outcome.changes,
            structure: outcome.structure,
        })
    }
}
