//! Error types for the editor

use docedit_actions::SchemaViolation;
use docedit_docx::DocxError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("Document error: {0}")]
    Docx(#[from] DocxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}

/// Failure of the diagram renderer. Never fatal: the reconciler falls back to
/// a visible text paragraph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Diagram renderer unavailable: {0}")]
    Unavailable(String),

    #[error("Diagram rendering failed: {0}")]
    Failed(String),
}
