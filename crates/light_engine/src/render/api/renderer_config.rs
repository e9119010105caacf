//! Renderer configuration for application-specific settings
//!
//! Applications customize the renderer through this struct instead of the
//! renderer hardcoding values. Loadable from TOML or RON via [`Config`].

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Configuration for the [`crate::render::Renderer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name, used in log output
    pub application_name: String,
    /// Clear color [R, G, B, A] (0.0-1.0 range) set at init
    pub clear_color: [f32; 4],
}

impl RendererConfig {
    /// Create a new renderer configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }

    /// Set background clear color [R, G, B, A] (0.0-1.0 range)
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new("Light Editor")
    }
}

impl Config for RendererConfig {}
