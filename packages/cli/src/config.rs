use docedit_editor::{
    DiagramRenderer, ReconcileOptions, RenderError, StaticDiagramRenderer, UnavailableRenderer,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "docedit.config.json";

/// Docedit configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Pre-baked image embedded for every diagram block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_asset: Option<String>,

    /// Width of inline diagram images
    #[serde(default = "default_image_width")]
    pub image_width_inches: f64,

    /// Table style for tables built from markdown
    #[serde(default = "default_table_style")]
    pub table_style: String,
}

fn default_image_width() -> f64 {
    6.0
}

fn default_table_style() -> String {
    "Table Grid".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            image_width_inches: self.image_width_inches,
            table_style: self.table_style.clone(),
        }
    }

    /// Diagram asset paths are relative to the config directory
    pub fn renderer(&self, cwd: &str) -> ConfiguredRenderer {
        match &self.diagram_asset {
            Some(asset) => {
                ConfiguredRenderer::Static(StaticDiagramRenderer::new(PathBuf::from(cwd).join(asset)))
            }
            None => ConfiguredRenderer::Unavailable(UnavailableRenderer),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            diagram_asset: None,
            image_width_inches: default_image_width(),
            table_style: default_table_style(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfiguredRenderer {
    Static(StaticDiagramRenderer),
    Unavailable(UnavailableRenderer),
}

impl DiagramRenderer for ConfiguredRenderer {
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        match self {
            ConfiguredRenderer::Static(renderer) => renderer.render(source),
            ConfiguredRenderer::Unavailable(renderer) => renderer.render(source),
        }
    }
}
