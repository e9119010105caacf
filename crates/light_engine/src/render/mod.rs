//! Rendering core
//!
//! The layers, bottom to top:
//! - [`api::RenderBackend`]: the GPU device façade (one implementation, the
//!   software reference device in [`backends::software`])
//! - [`api::RenderCommand`]: thin owning wrapper issuing state changes and draws
//! - [`Renderer`] / [`SceneFrame`]: the frame-scoped scene submission protocol
//! - [`crate::scene::SceneRenderer`]: walks a scene and drives the passes
//!
//! Resources (shaders, geometry, framebuffers) are owned by backend arenas
//! and referred to by generational handles; the renderer only borrows them.

pub mod api;
pub mod backends;
pub mod framebuffer;
pub mod lighting;
pub mod picking;
pub mod primitives;
pub mod renderer;
pub mod shader;

pub use api::{ClearFlags, RenderBackend, RenderCommand, RenderStats, RendererConfig, TextureBinding};
pub use framebuffer::{
    Framebuffer, FramebufferAttachmentSpec, FramebufferSpec, FramebufferTextureFormat, TextureWrap,
    MAX_FRAMEBUFFER_SIZE,
};
pub use lighting::{DirectionalLight, PointLight, SpotLight};
pub use picking::PickId;
pub use primitives::{Camera, EditorCamera, MeshLibrary, Projection, Vertex};
pub use renderer::{Renderer, SceneData, SceneFrame, SceneLight, DEFAULT_SHADOW_MAP_UNIT};
pub use shader::{ShaderLibrary, ShaderSource, UniformSlot, UniformValue};

pub use crate::foundation::collections::{FramebufferHandle, GeometryHandle, ShaderHandle};

/// Rendering system errors
///
/// Comprehensive error type covering all possible failure modes in the rendering
/// core. Resource-creation failures abort editor start-up; contract violations
/// (wrong attachment, wrong matrix count) are returned here and logged at the
/// call site.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Occurs when GPU resources (geometry, shaders, framebuffers) cannot be
    /// created, typically due to invalid data or an unrecognized shader.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),

    /// An operation that requires `Renderer::init` ran before it
    #[error("Renderer not initialized: {0}")]
    NotInitialized(String),

    /// A handle no longer (or never) refers to a live resource
    #[error("Invalid {kind} handle")]
    InvalidHandle {
        /// Resource kind ("shader", "geometry", "framebuffer")
        kind: &'static str,
    },

    /// Attachment index past the end of the framebuffer's attachment list
    #[error("Attachment index {index} out of range (framebuffer has {count} attachments)")]
    AttachmentIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of attachments
        count: usize,
    },

    /// Attachment exists but has the wrong format for the operation
    #[error("Attachment {index} is {actual:?}, expected {expected}")]
    AttachmentFormatMismatch {
        /// Attachment index
        index: usize,
        /// Format found
        actual: FramebufferTextureFormat,
        /// Format family required
        expected: &'static str,
    },

    /// Pixel coordinate outside the framebuffer
    #[error("Pixel ({x}, {y}) outside {width}x{height} framebuffer")]
    PixelOutOfBounds {
        /// Requested X
        x: i32,
        /// Requested Y
        y: i32,
        /// Framebuffer width
        width: u32,
        /// Framebuffer height
        height: u32,
    },

    /// Caller broke an argument contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
