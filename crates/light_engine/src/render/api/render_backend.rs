//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait that rendering backends must implement to
//! provide a consistent, OpenGL-like state machine to the high-level
//! renderer: one bound framebuffer, one bound shader, one bound geometry,
//! per-program uniform state, and texture units.

use bitflags::bitflags;

use crate::foundation::collections::{FramebufferHandle, GeometryHandle, ShaderHandle};
use crate::foundation::math::Vec4;
use crate::render::framebuffer::FramebufferSpec;
use crate::render::primitives::Vertex;
use crate::render::shader::{ShaderSource, UniformSlot, UniformValue};
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

bitflags! {
    /// Buffers cleared by [`RenderBackend::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Every color attachment (integer attachments excluded)
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
        /// Stencil part of the depth attachment
        const STENCIL = 1 << 2;
    }
}

/// Framebuffer attachment sampled through a texture unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    /// Framebuffer owning the attachment
    pub framebuffer: FramebufferHandle,
    /// Attachment index within the framebuffer
    pub attachment: usize,
}

/// Counters accumulated since the last [`RenderBackend::reset_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Indexed draw calls issued
    pub draw_calls: u32,
    /// Triangles submitted
    pub triangles: u32,
    /// Fragments that passed every test and were written
    pub fragments_written: u64,
    /// Uniform uploads that reached a declared slot
    pub uniform_uploads: u32,
}

/// Main rendering backend trait
///
/// Errors are reserved for invalid handles, broken contracts and resource
/// failures. Uploading to a uniform the bound program does not declare is
/// not an error (it behaves like a GL location of -1).
pub trait RenderBackend {
    /// One-time device state setup (depth test, blending)
    fn init(&mut self) -> BackendResult<()>;

    /// Set the viewport rectangle in pixels, origin bottom-left
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Color used by [`ClearFlags::COLOR`]
    fn set_clear_color(&mut self, color: Vec4);

    /// Clear buffers of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Fill an integer attachment of the bound framebuffer with `value`
    fn clear_attachment_int(&mut self, attachment_index: usize, value: i32) -> BackendResult<()>;

    /// Enable or disable depth writes
    fn set_depth_mask(&mut self, enabled: bool);

    /// Compile a program from parsed source
    fn create_shader(&mut self, source: &ShaderSource) -> BackendResult<ShaderHandle>;

    /// Release a program
    fn destroy_shader(&mut self, shader: ShaderHandle) -> BackendResult<()>;

    /// Upload indexed triangle geometry
    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<GeometryHandle>;

    /// Release geometry
    fn destroy_geometry(&mut self, geometry: GeometryHandle) -> BackendResult<()>;

    /// Allocate a framebuffer and storage for each attachment
    fn create_framebuffer(&mut self, spec: &FramebufferSpec) -> BackendResult<FramebufferHandle>;

    /// Reallocate every attachment at a new size, keeping attachment roles
    fn resize_framebuffer(&mut self, framebuffer: FramebufferHandle, width: u32, height: u32) -> BackendResult<()>;

    /// Release a framebuffer
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) -> BackendResult<()>;

    /// Current size of a framebuffer
    fn framebuffer_size(&self, framebuffer: FramebufferHandle) -> BackendResult<(u32, u32)>;

    /// Make a framebuffer the draw target; `None` selects the default target
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> BackendResult<()>;

    /// Currently bound draw target
    fn bound_framebuffer(&self) -> Option<FramebufferHandle>;

    /// Read one texel of an integer attachment, origin bottom-left
    fn read_pixel_int(&self, framebuffer: FramebufferHandle, attachment_index: usize, x: i32, y: i32) -> BackendResult<i32>;

    /// Read one texel of a color attachment, origin bottom-left
    fn read_pixel_rgba(&self, framebuffer: FramebufferHandle, attachment_index: usize, x: i32, y: i32) -> BackendResult<[u8; 4]>;

    /// Bind a framebuffer attachment to a texture unit; `None` unbinds
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureBinding>) -> BackendResult<()>;

    /// Make a program current; `None` unbinds
    fn bind_shader(&mut self, shader: Option<ShaderHandle>) -> BackendResult<()>;

    /// Upload a uniform to the current program
    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue) -> BackendResult<()>;

    /// Make geometry current; `None` unbinds
    fn bind_geometry(&mut self, geometry: Option<GeometryHandle>) -> BackendResult<()>;

    /// Draw the bound geometry with the bound program
    fn draw_indexed(&mut self) -> BackendResult<()>;

    /// Counters since the last reset
    fn stats(&self) -> RenderStats;

    /// Zero the counters
    fn reset_stats(&mut self);

    /// Downcast to concrete backend type for inspection
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast to mutable concrete backend type
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
