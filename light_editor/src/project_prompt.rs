//! Project path prompt
//!
//! Opened at start-up when no project is configured, and on Ctrl+O.
//! Submitting stores the path in the editor config and saves it.

use std::path::{Path, PathBuf};

use crate::editor_config::{EditorConfig, PROJECT_PATH_KEY};
use crate::{EditorError, EditorResult};

/// Modal prompt asking for the project directory
#[derive(Debug, Clone)]
pub struct ProjectPrompt {
    open: bool,
    config_path: PathBuf,
}

impl ProjectPrompt {
    /// Closed prompt saving to `config_path`
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self { open: false, config_path: config_path.into() }
    }

    /// Show the prompt
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Hide the prompt without submitting
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Whether the prompt is showing
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Config file the prompt saves to
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Store `path` as the project path, save the config and close
    ///
    /// Blank paths are rejected and leave the prompt open.
    pub fn submit(&mut self, path: &str, config: &mut EditorConfig) -> EditorResult<()> {
        let path = path.trim();
        if path.is_empty() {
            return Err(EditorError::InvalidProjectPath(path.to_owned()));
        }

        config.set_string(PROJECT_PATH_KEY, path);
        config.save(&self.config_path)?;
        self.open = false;
        log::debug!("Project path set to {}", path);
        Ok(())
    }
}
