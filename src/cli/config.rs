//! Configuration file
//!
//! JSON object; only `data_dir` is required:
//!
//! ```json
//! {"data_dir": "./data", "entity_dir": "entity", "helper_dir": "helper",
//!  "coerce_params": true, "log_level": "info", "log_format": "text"}
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::{LogFormat, LOG_LEVELS};
use crate::store::FileStore;

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the flat-file data (required)
    pub data_dir: String,

    /// Entity directory, relative to `data_dir`
    #[serde(default = "default_entity_dir")]
    pub entity_dir: String,

    /// Helper directory, relative to `data_dir`
    #[serde(default = "default_helper_dir")]
    pub helper_dir: String,

    /// Coerce query/path/header strings to numbers
    #[serde(default = "default_coerce_params")]
    pub coerce_params: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_entity_dir() -> String {
    "entity".to_string()
}
fn default_helper_dir() -> String {
    "helper".to_string()
}
fn default_coerce_params() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Configuration with every default and the given data directory
    pub fn with_data_dir(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            entity_dir: default_entity_dir(),
            helper_dir: default_helper_dir(),
            coerce_params: default_coerce_params(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Write configuration to file
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::config_error(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content + "\n")
            .map_err(|e| CliError::config_error(format!("Failed to write config: {}", e)))
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of {}.",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        for (key, dir) in [("entity_dir", &self.entity_dir), ("helper_dir", &self.helper_dir)] {
            validate_subdir(key, dir)?;
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn entity_path(&self) -> PathBuf {
        self.data_path().join(&self.entity_dir)
    }

    pub fn helper_path(&self) -> PathBuf {
        self.data_path().join(&self.helper_dir)
    }

    /// File store over the configured directories
    pub fn store(&self) -> FileStore {
        FileStore::with_dirs(self.entity_path(), self.helper_path())
    }

    /// Both data directories exist
    pub fn is_initialized(&self) -> bool {
        self.entity_path().is_dir() && self.helper_path().is_dir()
    }
}

/// Sub-directories stay inside `data_dir`.
fn validate_subdir(key: &str, dir: &str) -> CliResult<()> {
    let path = Path::new(dir);
    if dir.trim().is_empty() {
        return Err(CliError::config_error(format!("{} must not be empty", key)));
    }
    if path.is_absolute() || path.components().any(|c| !matches!(c, Component::Normal(_) | Component::CurDir)) {
        return Err(CliError::config_error(format!(
            "Invalid {}: '{}'. Must be a relative path inside data_dir.",
            key, dir
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn load_str(content: &str) -> CliResult<Config> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pqlmock.json");
        fs::write(&path, content).unwrap();
        Config::load(&path)
    }

    #[test]
    fn test_defaults() {
        let config = load_str(r#"{"data_dir": "/srv/mock"}"#).unwrap();
        assert_eq!(config, Config::with_data_dir("/srv/mock"));
        assert_eq!(config.entity_path(), PathBuf::from("/srv/mock/entity"));
    }

    #[test]
    fn test_missing_data_dir() {
        let err = load_str("{}").unwrap_err();
        assert_eq!(err.code_str(), "CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_empty_data_dir() {
        assert!(load_str(r#"{"data_dir": " "}"#).is_err());
    }

    #[test]
    fn test_bad_log_settings() {
        assert!(load_str(r#"{"data_dir": "d", "log_level": "loud"}"#).is_err());
        assert!(load_str(r#"{"data_dir": "d", "log_format": "xml"}"#).is_err());
        assert!(load_str(r#"{"data_dir": "d", "log_level": "debug", "log_format": "json"}"#).is_ok());
    }

    #[test]
    fn test_subdirs_stay_inside_data_dir() {
        assert!(load_str(r#"{"data_dir": "d", "entity_dir": "../x"}"#).is_err());
        assert!(load_str(r#"{"data_dir": "d", "helper_dir": "/etc"}"#).is_err());
        assert!(load_str(r#"{"data_dir": "d", "entity_dir": "data/rows"}"#).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/pqlmock.json")).unwrap_err();
        assert_eq!(err.code_str(), "CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pqlmock.json");
        let config = Config::with_data_dir("data");
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
