//! Viewer configuration (`arview.toml`)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::catalog::AssetCatalog;
use crate::error::CatalogError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Main viewer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Selectable model file names, in dropdown order
    #[serde(default = "default_models")]
    pub models: AssetCatalog,
    /// Index of the model shown at startup
    #[serde(default = "default_initial")]
    pub initial: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            initial: default_initial(),
        }
    }
}

fn default_models() -> AssetCatalog {
    AssetCatalog::default()
}

fn default_initial() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// URL prefix the frontend loads models from
    #[serde(default = "default_model_base")]
    pub model_base: String,
    /// Directory holding the model files on disk
    #[serde(default = "default_models_root")]
    pub root: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            model_base: default_model_base(),
            root: default_models_root(),
        }
    }
}

fn default_model_base() -> String {
    "/models".to_string()
}

fn default_models_root() -> String {
    "./assets/models".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Try to start marker tracking; orbit controls are used otherwise
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Marker pattern file handed to the tracker
    #[serde(default = "default_pattern_url")]
    pub pattern_url: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern_url: default_pattern_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_pattern_url() -> String {
    "/patterns/hiro.patt".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Offset applied to every new pivot, relative to the attachment point
    #[serde(default = "default_pivot_offset")]
    pub pivot_offset: [f32; 3],
    /// Let the key light wander around the model
    #[serde(default = "default_true")]
    pub animate_key_light: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pivot_offset: default_pivot_offset(),
            animate_key_light: true,
        }
    }
}

fn default_pivot_offset() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Label shown next to the model dropdown
    #[serde(default = "default_select_label")]
    pub select_label: String,
    /// Width of the settings panel in logical pixels
    #[serde(default = "default_panel_width")]
    pub panel_width: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            select_label: default_select_label(),
            panel_width: default_panel_width(),
        }
    }
}

fn default_select_label() -> String {
    "Select model: ".to_string()
}

fn default_panel_width() -> f32 {
    320.0
}

impl ViewerConfig {
    /// Parse and validate a configuration document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.models.validate_initial(self.catalog.initial)?;
        Ok(())
    }

    /// URL of the model at `index`, below the configured model base
    pub fn model_url(&self, index: usize) -> Option<String> {
        self.catalog.models.model_url(&self.assets.model_base, index)
    }
}

/// Catalog view served to the web frontend (`GET /api/catalog`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub models: AssetCatalog,
    pub selected: usize,
    pub model_base: String,
    pub pattern_url: String,
}

impl From<&ViewerConfig> for CatalogInfo {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            models: config.catalog.models.clone(),
            selected: config.catalog.initial,
            model_base: config.assets.model_base.clone(),
            pattern_url: config.tracking.pattern_url.clone(),
        }
    }
}

impl CatalogInfo {
    /// Overlay the served catalog onto a local configuration
    pub fn apply_to(self, config: &mut ViewerConfig) -> Result<(), ConfigError> {
        self.models.validate_initial(self.selected)?;
        config.catalog.models = self.models;
        config.catalog.initial = self.selected;
        config.assets.model_base = self.model_base;
        config.tracking.pattern_url = self.pattern_url;
        Ok(())
    }
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = ViewerConfig::from_toml(&content)?;
        info!(path = %path.display(), models = config.catalog.models.len(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(ViewerConfig::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(&ViewerConfig::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
