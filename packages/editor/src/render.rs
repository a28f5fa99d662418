//! Diagram rendering collaborators.
//!
//! The reconciler hands diagram source to a [`DiagramRenderer`] and embeds the
//! returned image bytes. Rendering markup is out of scope here: the provided
//! renderers either serve a pre-baked asset or report that no renderer exists.

use crate::errors::RenderError;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait DiagramRenderer {
    /// Image bytes (PNG, JPEG or GIF) for a diagram source
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError>;
}

impl<F> DiagramRenderer for F
where
    F: Fn(&str) -> Result<Vec<u8>, RenderError>,
{
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        self(source)
    }
}

/// Serves the same pre-baked image for every diagram, ignoring the source
#[derive(Debug, Clone)]
pub struct StaticDiagramRenderer {
    asset: PathBuf,
}

impl StaticDiagramRenderer {
    pub fn new(asset: impl Into<PathBuf>) -> Self {
        Self {
            asset: asset.into(),
        }
    }

    pub fn asset(&self) -> &Path {
        &self.asset
    }
}

impl DiagramRenderer for StaticDiagramRenderer {
    fn render(&self, _source: &str) -> Result<Vec<u8>, RenderError> {
        debug!(asset = %self.asset.display(), "Serving static diagram");
        std::fs::read(&self.asset)
            .map_err(|e| RenderError::Failed(format!("{}: {}", self.asset.display(), e)))
    }
}

/// Always reports that no renderer is available
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRenderer;

impl DiagramRenderer for UnavailableRenderer {
    fn render(&self, _source: &str) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unavailable(
            "no diagram renderer configured".to_string(),
        ))
    }
}
