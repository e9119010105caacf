//! Backend-agnostic rendering API
//!
//! [`RenderBackend`] is the seam between the renderer and a graphics device;
//! [`RenderCommand`] is the only thing above it that talks to the device.

pub mod render_backend;
pub mod render_command;
pub mod renderer_config;

pub use render_backend::{BackendResult, ClearFlags, RenderBackend, RenderStats, TextureBinding};
pub use render_command::RenderCommand;
pub use renderer_config::RendererConfig;
