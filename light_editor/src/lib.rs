//! # Light Editor
//!
//! Editor integration layer on top of `light_engine`: the viewport panel
//! state, entity picking under the cursor, gizmo operation state, the
//! performance HUD and the project prompt.
//!
//! The immediate-mode widget layer is not part of this crate; it feeds
//! [`ViewportPanel`] state and gizmo results into [`EditorLayer`] and reads
//! back what the layer exposes.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod editor_config;
pub mod editor_layer;
pub mod gizmo;
pub mod perf_stats;
pub mod project_prompt;
pub mod viewport;

pub use editor_config::EditorConfig;
pub use editor_layer::EditorLayer;
pub use gizmo::{GizmoOperation, GizmoState};
pub use perf_stats::{PerfStats, StatsCorner};
pub use project_prompt::ProjectPrompt;
pub use viewport::ViewportPanel;

use light_engine::config::ConfigError;
use light_engine::render::RenderError;

/// Editor errors
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    /// Rendering core failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Editor config could not be loaded or saved
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A mesh or shader the editor relies on is missing
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Rejected project path
    #[error("Invalid project path: {0:?}")]
    InvalidProjectPath(String),
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
