//! Thin command façade over the active backend
//!
//! Everything above this layer (renderer, framebuffers, mesh library) talks
//! to the device only through `RenderCommand`, so the backend can be swapped
//! at construction time.

use super::render_backend::{ClearFlags, RenderBackend, RenderStats, TextureBinding};
use crate::foundation::collections::{FramebufferHandle, GeometryHandle, ShaderHandle};
use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};
use crate::render::framebuffer::FramebufferSpec;
use crate::render::primitives::Vertex;
use crate::render::shader::{ShaderSource, UniformSlot, UniformValue};
use crate::render::RenderResult;

/// Owning wrapper around a boxed [`RenderBackend`]
pub struct RenderCommand {
    backend: Box<dyn RenderBackend>,
    viewport: (i32, i32, u32, u32),
}

impl RenderCommand {
    /// Wrap a backend
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self { backend, viewport: (0, 0, 0, 0) }
    }

    /// One-time device state setup
    pub fn init(&mut self) -> RenderResult<()> {
        self.backend.init()
    }

    /// Set the viewport rectangle in pixels
    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        log::trace!("Viewport ({}, {}) {}x{}", x, y, width, height);
        self.backend.set_viewport(x, y, width, height);
        self.viewport = (x, y, width, height);
    }

    /// Last viewport set as `(x, y, width, height)`
    pub fn viewport(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    /// Set the clear color
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.backend.set_clear_color(color);
    }

    /// Clear buffers of the bound framebuffer
    pub fn clear(&mut self, flags: ClearFlags) {
        self.backend.clear(flags);
    }

    /// Fill an integer attachment of the bound framebuffer
    pub fn clear_attachment_int(&mut self, attachment_index: usize, value: i32) -> RenderResult<()> {
        self.backend.clear_attachment_int(attachment_index, value)
    }

    /// Enable or disable depth writes
    pub fn depth_mask(&mut self, enabled: bool) {
        self.backend.set_depth_mask(enabled);
    }

    /// Draw the bound geometry with the bound program
    pub fn draw_indexed(&mut self) -> RenderResult<()> {
        self.backend.draw_indexed()
    }

    /// Compile a parsed shader
    pub fn create_shader(&mut self, source: &ShaderSource) -> RenderResult<ShaderHandle> {
        let handle = self.backend.create_shader(source)?;
        log::debug!("Created shader '{}' ({} uniform slots)", source.name(), source.slots().len());
        Ok(handle)
    }

    /// Release a shader
    pub fn destroy_shader(&mut self, shader: ShaderHandle) -> RenderResult<()> {
        self.backend.destroy_shader(shader)
    }

    /// Upload indexed geometry
    pub fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> RenderResult<GeometryHandle> {
        self.backend.create_geometry(vertices, indices)
    }

    /// Release geometry
    pub fn destroy_geometry(&mut self, geometry: GeometryHandle) -> RenderResult<()> {
        self.backend.destroy_geometry(geometry)
    }

    /// Allocate a framebuffer
    pub fn create_framebuffer(&mut self, spec: &FramebufferSpec) -> RenderResult<FramebufferHandle> {
        self.backend.create_framebuffer(spec)
    }

    /// Reallocate a framebuffer's attachments
    pub fn resize_framebuffer(&mut self, framebuffer: FramebufferHandle, width: u32, height: u32) -> RenderResult<()> {
        self.backend.resize_framebuffer(framebuffer, width, height)
    }

    /// Release a framebuffer
    pub fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) -> RenderResult<()> {
        self.backend.destroy_framebuffer(framebuffer)
    }

    /// Current size of a framebuffer
    pub fn framebuffer_size(&self, framebuffer: FramebufferHandle) -> RenderResult<(u32, u32)> {
        self.backend.framebuffer_size(framebuffer)
    }

    /// Select the draw target
    pub fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> RenderResult<()> {
        self.backend.bind_framebuffer(framebuffer)
    }

    /// Currently bound draw target
    pub fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.backend.bound_framebuffer()
    }

    /// Read an integer texel, origin bottom-left
    pub fn read_pixel_int(&self, framebuffer: FramebufferHandle, attachment_index: usize, x: i32, y: i32) -> RenderResult<i32> {
        self.backend.read_pixel_int(framebuffer, attachment_index, x, y)
    }

    /// Read a color texel, origin bottom-left
    pub fn read_pixel_rgba(&self, framebuffer: FramebufferHandle, attachment_index: usize, x: i32, y: i32) -> RenderResult<[u8; 4]> {
        self.backend.read_pixel_rgba(framebuffer, attachment_index, x, y)
    }

    /// Bind a framebuffer attachment to a texture unit
    pub fn bind_texture(&mut self, unit: u32, texture: Option<TextureBinding>) -> RenderResult<()> {
        self.backend.bind_texture(unit, texture)
    }

    /// Make a program current
    pub fn bind_shader(&mut self, shader: Option<ShaderHandle>) -> RenderResult<()> {
        self.backend.bind_shader(shader)
    }

    /// Make geometry current
    pub fn bind_geometry(&mut self, geometry: Option<GeometryHandle>) -> RenderResult<()> {
        self.backend.bind_geometry(geometry)
    }

    /// Upload a `mat4`
    pub fn set_uniform_mat4(&mut self, slot: UniformSlot, value: &Mat4) -> RenderResult<()> {
        self.backend.set_uniform(slot, UniformValue::Mat4(*value))
    }

    /// Upload a `mat3`
    pub fn set_uniform_mat3(&mut self, slot: UniformSlot, value: &Mat3) -> RenderResult<()> {
        self.backend.set_uniform(slot, UniformValue::Mat3(*value))
    }

    /// Upload an `int` (or sampler unit)
    pub fn set_uniform_int(&mut self, slot: UniformSlot, value: i32) -> RenderResult<()> {
        self.backend.set_uniform(slot, UniformValue::Int(value))
    }

    /// Upload a `vec3`
    pub fn set_uniform_vec3(&mut self, slot: UniformSlot, value: &Vec3) -> RenderResult<()> {
        self.backend.set_uniform(slot, UniformValue::Vec3(*value))
    }

    /// Upload a `vec4`
    pub fn set_uniform_vec4(&mut self, slot: UniformSlot, value: &Vec4) -> RenderResult<()> {
        self.backend.set_uniform(slot, UniformValue::Vec4(*value))
    }

    /// Upload a `float`
    pub fn set_uniform_float(&mut self, slot: UniformSlot, value: f32) -> RenderResult<()> {
        self.backend.set_uniform(slot, UniformValue::Float(value))
    }

    /// Counters since the last reset
    pub fn stats(&self) -> RenderStats {
        self.backend.stats()
    }

    /// Zero the counters
    pub fn reset_stats(&mut self) {
        self.backend.reset_stats();
    }

    /// Borrow the backend as a concrete type
    pub fn backend<B: RenderBackend + 'static>(&self) -> Option<&B> {
        self.backend.as_any().downcast_ref::<B>()
    }

    /// Mutably borrow the backend as a concrete type
    pub fn backend_mut<B: RenderBackend + 'static>(&mut self) -> Option<&mut B> {
        self.backend.as_any_mut().downcast_mut::<B>()
    }
}

impl std::fmt::Debug for RenderCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCommand").finish_non_exhaustive()
    }
}
