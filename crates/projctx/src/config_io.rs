use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigError, CONFIG_FILENAME, PROJECT_DIR};
use crate::partial_config::{Merge, PartialConfig};

/// Manages loading and merging of all configuration layers.
///
/// Resolution order: Defaults → User → Project
/// Higher precedence layers override lower precedence layers.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    dir_context: DirectoryContext,
    working_dir: PathBuf,
}

impl ConfigResolver {
    /// Create a new ConfigResolver for a workspace.
    pub fn new(dir_context: DirectoryContext, working_dir: PathBuf) -> Self {
        Self {
            dir_context,
            working_dir,
        }
    }

    /// Load all layers and merge them into a validated Config.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut merged = self.load_project_layer()?.unwrap_or_default();

        if let Some(user_partial) = self.load_user_layer()? {
            tracing::debug!("Loaded user config layer");
            merged.merge_from(&user_partial);
        }

        let config = merged.resolve();
        config.validate()?;
        Ok(config)
    }

    /// Get the path to user config file.
    pub fn user_config_path(&self) -> PathBuf {
        self.dir_context.config_path()
    }

    /// Get the path to project config file.
    pub fn project_config_path(&self) -> PathBuf {
        self.working_dir.join(PROJECT_DIR).join(CONFIG_FILENAME)
    }

    /// Load the user layer from disk.
    pub fn load_user_layer(&self) -> Result<Option<PartialConfig>, ConfigError> {
        self.load_layer_from_path(&self.user_config_path())
    }

    /// Load the project layer from disk.
    pub fn load_project_layer(&self) -> Result<Option<PartialConfig>, ConfigError> {
        let layer = self.load_layer_from_path(&self.project_config_path())?;
        if layer.is_some() {
            tracing::debug!("Loaded project config layer");
        }
        Ok(layer)
    }

    fn load_layer_from_path(&self, path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let partial: PartialConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(Some(partial))
    }
}

/// Directory paths for user configuration
///
/// Only `main` should build this from `dirs::*`; everything else receives
/// it by parameter so tests can point it at a temp directory.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// Config directory for user configuration
    /// e.g., ~/.config/projctx on Linux
    pub config_dir: PathBuf,
}

impl DirectoryContext {
    /// Create a DirectoryContext from the system directories
    pub fn from_system() -> std::io::Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not determine config directory",
                )
            })?
            .join("projctx");

        Ok(Self { config_dir })
    }

    /// Create a DirectoryContext for testing with a temp directory
    pub fn for_testing(temp_dir: &Path) -> Self {
        Self {
            config_dir: temp_dir.join("config"),
        }
    }

    /// Get the user config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_resolver() -> (TempDir, ConfigResolver) {
        let temp_dir = TempDir::new().unwrap();
        let dir_context = DirectoryContext::for_testing(temp_dir.path());
        let working_dir = temp_dir.path().join("project");
        std::fs::create_dir_all(&working_dir).unwrap();
        let resolver = ConfigResolver::new(dir_context, working_dir);
        (temp_dir, resolver)
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolver_returns_defaults_when_no_config_files() {
        let (_temp, resolver) = create_test_resolver();
        let config = resolver.resolve().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_resolver_loads_user_layer() {
        let (_temp, resolver) = create_test_resolver();
        write(
            &resolver.user_config_path(),
            r#"{"restore": {"restore_terminals": false}}"#,
        );

        let config = resolver.resolve().unwrap();
        assert!(!config.restore.restore_terminals);
        assert!(config.restore.restore_scroll);
    }

    #[test]
    fn test_resolver_project_overrides_user() {
        let (_temp, resolver) = create_test_resolver();
        write(
            &resolver.user_config_path(),
            r#"{"storage": {"file_name": "user.json"}, "capture": {"capture_terminals": false}}"#,
        );
        write(
            &resolver.project_config_path(),
            r#"{"storage": {"file_name": "project.json"}}"#,
        );

        let config = resolver.resolve().unwrap();
        assert_eq!(config.storage.file_name, "project.json");
        assert!(!config.capture.capture_terminals);
    }

    #[test]
    fn test_resolver_reports_parse_errors_with_path() {
        let (_temp, resolver) = create_test_resolver();
        write(&resolver.project_config_path(), "{ not json");

        match resolver.resolve() {
            Err(ConfigError::ParseError(msg)) => assert!(msg.contains("config.json")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_resolver_validates_merged_config() {
        let (_temp, resolver) = create_test_resolver();
        write(
            &resolver.project_config_path(),
            r#"{"storage": {"dir_name": "../elsewhere"}}"#,
        );

        assert!(matches!(
            resolver.resolve(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
