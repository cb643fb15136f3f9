//! Configuration management for annobench using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::Palette;
use crate::llm::ChatConfig;

/// Store subdirectory name.
const STORE_SUBDIR: &str = "store";
/// Export fallback subdirectory name.
const EXPORTS_SUBDIR: &str = "exports";

/// Failure loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// REST API base, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply `ANNOBENCH_BACKEND_URL` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = std::env::var("ANNOBENCH_BACKEND_URL")
            .ok()
            .filter(|s| !s.is_empty())
        {
            tracing::debug!("Using ANNOBENCH_BACKEND_URL from environment: {}", url);
            self.base_url = url;
        }
        self
    }
}

/// Annotation display settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Replacement palette as `#rrggbb` strings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<String>,
}

impl AnnotationConfig {
    pub fn is_default(&self) -> bool {
        self.palette.is_empty()
    }

    /// Configured palette, or the built-in one.
    pub fn palette(&self) -> Palette {
        Palette::new(self.palette.clone()).unwrap_or_default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Backend REST API.
    #[serde(default, skip_serializing_if = "BackendConfig::is_default")]
    pub backend: BackendConfig,
    /// Chat assistant.
    #[serde(default, skip_serializing_if = "ChatConfig::is_default")]
    pub chat: ChatConfig,
    /// Annotation display.
    #[serde(default, skip_serializing_if = "AnnotationConfig::is_default")]
    pub annotation: AnnotationConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no annobench config file is found.
    pub async fn load() -> Self {
        match prefer::load("annobench").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}; using defaults", e);
                        Self::default_with_env()
                    }
                },
                None => Self::default_with_env(),
            },
            Err(_) => Self::default_with_env(),
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        self.backend = self.backend.with_env_overrides();
        self.chat = self.chat.with_env_overrides();
        self
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_err("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_err("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_err("JSON", e.to_string())),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.set_data_dir(self.resolve_path(data_dir, base_dir));
        }
    }
}

/// Resolved filesystem locations.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Local key-value store directory.
    pub store_dir: PathBuf,
    /// Where exported reports are written.
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("annobench");
        let export_dir = dirs::download_dir().unwrap_or_else(|| data_dir.join(EXPORTS_SUBDIR));
        Self {
            store_dir: data_dir.join(STORE_SUBDIR),
            data_dir,
            export_dir,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let mut settings = Self::default();
        settings.set_data_dir(data_dir);
        settings
    }

    fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.store_dir = data_dir.join(STORE_SUBDIR);
        self.data_dir = data_dir;
    }

    /// Ensure data and store directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.store_dir)?;
        Ok(())
    }
}

/// Command-line overrides for configuration loading.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (skips discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory override.
    pub data_dir: Option<PathBuf>,
    /// Backend URL override.
    pub backend_url: Option<String>,
}

/// Load settings and config, applying overrides in order:
/// file < environment < command line.
pub async fn load_settings(options: LoadOptions) -> Result<(Settings, Config), ConfigError> {
    let mut config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(data_dir) = options.data_dir {
        settings.set_data_dir(data_dir);
    }
    if let Some(url) = options.backend_url {
        config.backend.base_url = url;
    }
    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_sections() {
        let config = Config::parse(
            Path::new("annobench.toml"),
            r##"
data_dir = "~/annotations"

[backend]
base_url = "http://10.0.0.5:8080/api"

[chat]
model = "deepseek-reasoner"

[annotation]
palette = ["#ff0000", "#00ff00"]
"##,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.chat.model, "deepseek-reasoner");
        assert_eq!(config.chat.max_history, 40);
        assert_eq!(config.annotation.palette().size(), 2);
    }

    #[test]
    fn test_yaml_and_json() {
        let yaml = Config::parse(Path::new("c.yml"), "backend:\n  timeout_secs: 5\n").unwrap();
        assert_eq!(yaml.backend.timeout_secs, 5);
        let json = Config::parse(Path::new("c.json"), r#"{"chat":{"max_tokens":64}}"#).unwrap();
        assert_eq!(json.chat.max_tokens, 64);
        assert!(matches!(
            Config::parse(Path::new("c.toml"), "backend = 3"),
            Err(ConfigError::Parse { format: "TOML", .. })
        ));
    }

    #[test]
    fn test_empty_config_serializes_to_nothing() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert_eq!(json, "{}");
        assert_eq!(AnnotationConfig::default().palette().size(), 30);
    }

    #[test]
    fn test_relative_data_dir_resolves_against_config_dir() {
        let config = Config {
            data_dir: Some("data".to_string()),
            source_path: Some(PathBuf::from("/etc/annobench/annobench.toml")),
            ..Config::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());
        assert_eq!(settings.data_dir, PathBuf::from("/etc/annobench/data"));
        assert_eq!(settings.store_dir, PathBuf::from("/etc/annobench/data/store"));
    }

    #[tokio::test]
    async fn test_explicit_config_path_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annobench.toml");
        std::fs::write(&path, "data_dir = \"work\"\n").unwrap();

        let (settings, config) = load_settings(LoadOptions {
            config_path: Some(path.clone()),
            data_dir: None,
            backend_url: Some("http://backend:9000/api".to_string()),
        })
        .await
        .unwrap();
        assert_eq!(settings.data_dir, dir.path().join("work"));
        assert_eq!(config.backend.base_url, "http://backend:9000/api");
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }
}
