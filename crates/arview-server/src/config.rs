//! Configuration loading and validation

use anyhow::Result;
use arview_core::ViewerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
///
/// Server settings live under `[server]`; every other section belongs to the
/// viewer and is shared with the frontend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(flatten)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory holding the built WASM frontend
    #[serde(default = "default_web_dir")]
    pub web_dir: String,
    /// Directory holding marker pattern files
    #[serde(default = "default_patterns_dir")]
    pub patterns_dir: String,
    /// TLS configuration (optional - enables HTTPS when present)
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            web_dir: default_web_dir(),
            patterns_dir: default_patterns_dir(),
            tls: None,
        }
    }
}

/// TLS/HTTPS configuration
///
/// Browsers only grant camera access to secure origins, so marker tracking
/// from another device needs this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format)
    pub cert: String,
    /// Path to private key file (PEM format)
    pub key: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_web_dir() -> String {
    "web".to_string()
}

fn default_patterns_dir() -> String {
    "./assets/patterns".to_string()
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.viewer.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_and_viewer_sections() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind = "127.0.0.1:9000"

            [server.tls]
            cert = "cert.pem"
            key = "key.pem"

            [catalog]
            models = ["A.glb", "B.glb"]
            initial = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.web_dir, "web");
        assert_eq!(config.server.tls.as_ref().map(|t| t.key.as_str()), Some("key.pem"));
        assert_eq!(config.viewer.catalog.models.len(), 2);
        assert_eq!(config.viewer.assets.model_base, "/models");
    }

    #[test]
    fn test_default_config_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("arview.toml");

        save_default_config(&path).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded.server.bind, "0.0.0.0:8080");
        assert_eq!(loaded.viewer.catalog.initial, 1);
        assert_eq!(loaded.viewer.catalog.models, Config::default().viewer.catalog.models);
    }

    #[test]
    fn test_invalid_initial_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("arview.toml");
        std::fs::write(&path, "[catalog]\nmodels = [\"A.glb\"]\ninitial = 4\n").unwrap();

        assert!(load_config(&path).is_err());
    }
}
