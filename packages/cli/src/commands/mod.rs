pub mod apply;
pub mod extract;
pub mod reconcile;
pub mod validate;

pub use apply::{apply, ApplyArgs};
pub use extract::{extract, ExtractArgs};
pub use reconcile::{reconcile, ReconcileArgs};
pub use validate::{validate, ValidateArgs};

use anyhow::{Context, Result};
use docedit_editor::DocumentStructure;
use std::path::{Path, PathBuf};

/// Resolve a command-line path against the working directory
pub(crate) fn resolve(cwd: &str, path: &Path) -> PathBuf {
    Path::new(cwd).join(path)
}

pub(crate) fn read_structure(path: &Path) -> Result<DocumentStructure> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read structure {}", path.display()))?;
    DocumentStructure::from_json(&json)
        .with_context(|| format!("Invalid structure {}", path.display()))
}

pub(crate) fn write_structure(structure: &DocumentStructure, path: &Path) -> Result<()> {
    let json = structure.to_json_pretty()?;
    docedit_docx::write_atomic(path, json.as_bytes())
        .with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(())
}
