use projctx_core::capture::CaptureOptions;
use projctx_core::restore::RestoreOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-project directory holding the context record and project config
pub const PROJECT_DIR: &str = ".projctx";

/// Configuration file name, in both the user and project layers
pub const CONFIG_FILENAME: &str = "config.json";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Where contexts are persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Layout capture
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Layout restore
    #[serde(default)]
    pub restore: RestoreConfig,
}

/// Location of the context record inside the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StorageConfig {
    /// Directory under the workspace root
    #[serde(default = "default_dir_name")]
    pub dir_name: String,

    /// Record file name inside `dir_name`
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_dir_name() -> String {
    PROJECT_DIR.to_string()
}

fn default_file_name() -> String {
    "project-contexts.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir_name: default_dir_name(),
            file_name: default_file_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaptureConfig {
    /// Record open terminals alongside the editor panes
    #[serde(default = "default_true")]
    pub capture_terminals: bool,

    /// Trust pane positions reported by the editor over the inferred grid
    #[serde(default = "default_true")]
    pub prefer_reported_geometry: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_terminals: true,
            prefer_reported_geometry: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RestoreConfig {
    /// Recreate saved terminals
    #[serde(default = "default_true")]
    pub restore_terminals: bool,

    /// Put the cursor back at the saved anchor in the active pane
    #[serde(default = "default_true")]
    pub restore_scroll: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            restore_terminals: true,
            restore_scroll: true,
        }
    }
}

impl From<CaptureConfig> for CaptureOptions {
    fn from(config: CaptureConfig) -> Self {
        CaptureOptions {
            capture_terminals: config.capture_terminals,
            prefer_reported_geometry: config.prefer_reported_geometry,
        }
    }
}

impl From<RestoreConfig> for RestoreOptions {
    fn from(config: RestoreConfig) -> Self {
        RestoreOptions {
            restore_terminals: config.restore_terminals,
            restore_scroll: config.restore_scroll,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Path of the context record for a workspace
    pub fn storage_path(&self, workspace: &Path) -> PathBuf {
        workspace
            .join(&self.storage.dir_name)
            .join(&self.storage.file_name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_component("storage.dir_name", &self.storage.dir_name)?;
        validate_component("storage.file_name", &self.storage.file_name)?;
        Ok(())
    }
}

/// A single, non-empty path component
fn validate_component(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{field} cannot be empty"
        )));
    }
    if value == "." || value == ".." || value.contains('/') || value.contains('\\') {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be a plain name, got {value:?}"
        )));
    }
    Ok(())
}

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
