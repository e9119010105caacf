//! Editor configuration
//!
//! A flat string key-value store persisted as TOML next to the editor.

use std::collections::BTreeMap;
use std::path::Path;

use light_engine::config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Key holding the current project directory
pub const PROJECT_PATH_KEY: &str = "project_path";

/// String key-value editor settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditorConfig {
    values: BTreeMap<String, String>,
}

impl Config for EditorConfig {}

impl EditorConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key is set
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value of a key
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a key, replacing any previous value
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Merge the values stored at `path` into this config
    ///
    /// Keys present in the file win over keys already set.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let loaded = Self::load_from_file(path)?;
        self.values.extend(loaded.values);
        Ok(())
    }

    /// Write every value to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.save_to_file(path)?;
        log::debug!("Saved editor config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(file: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("light_editor_{}_{}", std::process::id(), file))
    }

    #[test]
    fn test_set_and_get() {
        let mut config = EditorConfig::new();
        assert!(!config.has(PROJECT_PATH_KEY));

        config.set_string(PROJECT_PATH_KEY, "/tmp/project");
        assert!(config.has(PROJECT_PATH_KEY));
        assert_eq!(config.get_string(PROJECT_PATH_KEY), Some("/tmp/project"));
        assert_eq!(config.get_string("theme"), None);
    }

    #[test]
    fn test_save_then_load_merges() {
        let path = temp_path("editor.toml");
        let mut saved = EditorConfig::new();
        saved.set_string(PROJECT_PATH_KEY, "projects/demo");
        saved.save(&path).unwrap();

        let mut loaded = EditorConfig::new();
        loaded.set_string("theme", "dark");
        loaded.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.get_string(PROJECT_PATH_KEY), Some("projects/demo"));
        assert_eq!(loaded.get_string("theme"), Some("dark"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let mut config = EditorConfig::new();
        assert!(matches!(config.load(temp_path("absent.toml")), Err(ConfigError::Io(_))));
    }
}
