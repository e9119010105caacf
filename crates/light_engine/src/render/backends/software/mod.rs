//! Software reference device
//!
//! A CPU implementation of [`RenderBackend`] with the same state machine as
//! the GL device it stands in for: arenas of programs, geometry and
//! framebuffers addressed by generational handles, one bound target, one
//! bound program with persistent uniform state, and texture units that
//! refer to framebuffer attachments.
//!
//! Every indexed draw is rasterized into the bound framebuffer, so the pick
//! attachment can be read back exactly as the editor does on the GPU. Draws
//! are also recorded in a [`DrawRecord`] log for inspection.

mod programs;
mod rasterizer;
mod storage;

use std::collections::HashMap;
use std::path::Path;

use programs::{Pipeline, ShadowSampler};
use rasterizer::Viewport;
use storage::{pack_color, AttachmentStorage, FramebufferStorage, GeometryBuffers, ShaderProgram, CLEAR_DEPTH};

use crate::foundation::collections::{Arena, FramebufferHandle, GeometryHandle, ShaderHandle};
use crate::foundation::math::Vec4;
use crate::render::api::{BackendResult, ClearFlags, RenderBackend, RenderStats, TextureBinding};
use crate::render::framebuffer::{FramebufferSpec, FramebufferTextureFormat, MAX_FRAMEBUFFER_SIZE};
use crate::render::primitives::Vertex;
use crate::render::shader::{ShaderSource, UniformSlot, UniformValue};
use crate::render::RenderError;

/// One indexed draw as the device executed it
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Program used
    pub shader: ShaderHandle,
    /// Name the program was compiled under
    pub shader_name: String,
    /// Draw target; `None` is the default target
    pub target: Option<FramebufferHandle>,
    /// Uploads to declared slots since the program was bound, in order
    pub uploads: Vec<(UniformSlot, UniformValue)>,
    /// Every uniform value the program held at draw time
    pub uniforms: HashMap<UniformSlot, UniformValue>,
    /// Depth write state
    pub depth_mask: bool,
    /// Triangles submitted
    pub triangles: u32,
    /// Fragments written
    pub fragments: u64,
}

impl DrawRecord {
    /// Value a slot held at draw time
    pub fn uniform(&self, slot: UniformSlot) -> Option<UniformValue> {
        self.uniforms.get(&slot).copied()
    }

    /// Last value uploaded to a slot during this bind
    pub fn uploaded(&self, slot: UniformSlot) -> Option<UniformValue> {
        self.uploads.iter().rev().find(|(s, _)| *s == slot).map(|(_, v)| *v)
    }
}

/// CPU rasterizing backend
#[derive(Debug)]
pub struct SoftwareBackend {
    initialized: bool,
    viewport: Viewport,
    clear_color: Vec4,
    depth_mask: bool,
    shaders: Arena<ShaderHandle, ShaderProgram>,
    geometries: Arena<GeometryHandle, GeometryBuffers>,
    framebuffers: Arena<FramebufferHandle, FramebufferStorage>,
    bound_framebuffer: Option<FramebufferHandle>,
    bound_shader: Option<ShaderHandle>,
    bound_geometry: Option<GeometryHandle>,
    texture_units: HashMap<u32, TextureBinding>,
    uploads_since_bind: Vec<(UniformSlot, UniformValue)>,
    stats: RenderStats,
    draw_log: Vec<DrawRecord>,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareBackend {
    /// Create a device with empty arenas
    pub fn new() -> Self {
        Self {
            initialized: false,
            viewport: Viewport::default(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            depth_mask: true,
            shaders: Arena::with_key(),
            geometries: Arena::with_key(),
            framebuffers: Arena::with_key(),
            bound_framebuffer: None,
            bound_shader: None,
            bound_geometry: None,
            texture_units: HashMap::new(),
            uploads_since_bind: Vec::new(),
            stats: RenderStats::default(),
            draw_log: Vec::new(),
        }
    }

    /// Whether [`RenderBackend::init`] has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Draws executed since the last stats reset
    pub fn draw_log(&self) -> &[DrawRecord] {
        &self.draw_log
    }

    /// Drain the draw log
    pub fn take_draw_log(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draw_log)
    }

    /// Current viewport as `(x, y, width, height)`
    pub fn viewport(&self) -> (i32, i32, u32, u32) {
        (self.viewport.x, self.viewport.y, self.viewport.width, self.viewport.height)
    }

    /// Current depth write state
    pub fn depth_mask(&self) -> bool {
        self.depth_mask
    }

    /// Current clear color
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Currently bound program
    pub fn bound_shader(&self) -> Option<ShaderHandle> {
        self.bound_shader
    }

    /// Currently bound geometry
    pub fn bound_geometry(&self) -> Option<GeometryHandle> {
        self.bound_geometry
    }

    /// Attachment bound to a texture unit
    pub fn texture_unit(&self, unit: u32) -> Option<TextureBinding> {
        self.texture_units.get(&unit).copied()
    }

    /// Read one depth texel; `layer` selects the cube face for cube attachments
    pub fn read_depth(&self, framebuffer: FramebufferHandle, attachment_index: usize, layer: usize, x: u32, y: u32) -> BackendResult<f32> {
        let fb = self.framebuffer(framebuffer)?;
        if x >= fb.width() || y >= fb.height() {
            return Err(out_of_bounds(fb, x, y));
        }
        let texel = fb.texel_index(x, y);
        match attachment(fb, attachment_index)? {
            AttachmentStorage::DepthStencil { depth, .. } => Ok(depth[texel]),
            AttachmentStorage::DepthCube(layers) => layers
                .get(layer)
                .map(|l| l[texel])
                .ok_or_else(|| RenderError::InvalidArgument(format!("cube layer {layer} out of range"))),
            _ => Err(mismatch(fb, attachment_index, "depth")),
        }
    }

    /// Write a color attachment to an image file, top row first
    pub fn save_attachment_png(&self, framebuffer: FramebufferHandle, attachment_index: usize, path: impl AsRef<Path>) -> BackendResult<()> {
        let fb = self.framebuffer(framebuffer)?;
        let AttachmentStorage::Color(texels) = attachment(fb, attachment_index)? else {
            return Err(mismatch(fb, attachment_index, "color"));
        };

        let width = fb.width() as usize;
        let bytes: Vec<u8> = texels
            .chunks_exact(width)
            .rev()
            .flat_map(|row| bytemuck::cast_slice::<[u8; 4], u8>(row).iter().copied())
            .collect();
        let image = image::RgbaImage::from_raw(fb.width(), fb.height(), bytes)
            .ok_or_else(|| RenderError::BackendError("attachment size does not match its storage".into()))?;

        let path = path.as_ref();
        image
            .save(path)
            .map_err(|e| RenderError::BackendError(format!("failed to write {}: {e}", path.display())))?;
        log::info!("Saved attachment {} to {}", attachment_index, path.display());
        Ok(())
    }

    fn framebuffer(&self, handle: FramebufferHandle) -> BackendResult<&FramebufferStorage> {
        self.framebuffers.get(handle).ok_or(RenderError::InvalidHandle { kind: "framebuffer" })
    }

    /// Snapshot the shadow map sampled by the surface program, if one is bound
    fn shadow_sampler(&self, program: &ShaderProgram) -> Option<ShadowSampler> {
        let unit = program.values.get(&UniformSlot::DepthMap).and_then(UniformValue::as_int)?;
        let binding = self.texture_units.get(&u32::try_from(unit).ok()?)?;
        let light_space = program
            .values
            .get(&UniformSlot::LightSpaceMatrix)
            .and_then(UniformValue::as_mat4)?;
        let source = self.framebuffers.get(binding.framebuffer)?;
        ShadowSampler::capture(source, binding.attachment, light_space)
    }
}

fn attachment(fb: &FramebufferStorage, index: usize) -> BackendResult<&AttachmentStorage> {
    fb.attachments
        .get(index)
        .ok_or(RenderError::AttachmentIndexOutOfRange { index, count: fb.attachments.len() })
}

fn mismatch(fb: &FramebufferStorage, index: usize, expected: &'static str) -> RenderError {
    let actual = fb
        .spec
        .attachments
        .get(index)
        .map_or(FramebufferTextureFormat::Rgba8, |a| a.format);
    RenderError::AttachmentFormatMismatch { index, actual, expected }
}

fn out_of_bounds(fb: &FramebufferStorage, x: u32, y: u32) -> RenderError {
    RenderError::PixelOutOfBounds {
        x: i32::try_from(x).unwrap_or(i32::MAX),
        y: i32::try_from(y).unwrap_or(i32::MAX),
        width: fb.width(),
        height: fb.height(),
    }
}

fn texel_coords(fb: &FramebufferStorage, x: i32, y: i32) -> BackendResult<usize> {
    match (u32::try_from(x), u32::try_from(y)) {
        (Ok(ux), Ok(uy)) if ux < fb.width() && uy < fb.height() => Ok(fb.texel_index(ux, uy)),
        _ => Err(RenderError::PixelOutOfBounds { x, y, width: fb.width(), height: fb.height() }),
    }
}

impl RenderBackend for SoftwareBackend {
    fn init(&mut self) -> BackendResult<()> {
        self.initialized = true;
        self.depth_mask = true;
        log::debug!("Software device initialized");
        Ok(())
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Viewport { x, y, width, height };
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    fn clear(&mut self, flags: ClearFlags) {
        let Some(fb) = self.bound_framebuffer.and_then(|h| self.framebuffers.get_mut(h)) else {
            log::trace!("Clear on the default target ignored");
            return;
        };
        let color = pack_color(self.clear_color);

        for storage in &mut fb.attachments {
            match storage {
                AttachmentStorage::Color(texels) if flags.contains(ClearFlags::COLOR) => texels.fill(color),
                AttachmentStorage::DepthStencil { depth, stencil } => {
                    if flags.contains(ClearFlags::DEPTH) {
                        depth.fill(CLEAR_DEPTH);
                    }
                    if flags.contains(ClearFlags::STENCIL) {
                        stencil.fill(0);
                    }
                }
                AttachmentStorage::DepthCube(layers) if flags.contains(ClearFlags::DEPTH) => {
                    layers.iter_mut().for_each(|layer| layer.fill(CLEAR_DEPTH));
                }
                _ => {}
            }
        }
    }

    fn clear_attachment_int(&mut self, attachment_index: usize, value: i32) -> BackendResult<()> {
        let handle = self
            .bound_framebuffer
            .ok_or_else(|| RenderError::RenderingFailed("clear_attachment_int with no framebuffer bound".into()))?;
        let fb = self
            .framebuffers
            .get_mut(handle)
            .ok_or(RenderError::InvalidHandle { kind: "framebuffer" })?;

        match attachment(fb, attachment_index)? {
            AttachmentStorage::Integer(_) => {}
            _ => return Err(mismatch(fb, attachment_index, "integer")),
        }
        if let Some(AttachmentStorage::Integer(ids)) = fb.attachments.get_mut(attachment_index) {
            ids.fill(value);
        }
        Ok(())
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.depth_mask = enabled;
    }

    fn create_shader(&mut self, source: &ShaderSource) -> BackendResult<ShaderHandle> {
        let kind = programs::classify(source)?;
        let handle = self.shaders.insert(ShaderProgram {
            name: source.name().to_string(),
            kind,
            declared: source.slots().clone(),
            values: HashMap::new(),
        });
        log::debug!("Compiled shader '{}' as {:?}", source.name(), kind);
        Ok(handle)
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) -> BackendResult<()> {
        self.shaders.remove(shader).ok_or(RenderError::InvalidHandle { kind: "shader" })?;
        if self.bound_shader == Some(shader) {
            self.bound_shader = None;
            self.uploads_since_bind.clear();
        }
        Ok(())
    }

    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<GeometryHandle> {
        if indices.len() % 3 != 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|i| **i as usize >= vertices.len()) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }

        log::trace!("Uploading geometry with {} vertices and {} indices", vertices.len(), indices.len());
        Ok(self.geometries.insert(GeometryBuffers {
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        }))
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) -> BackendResult<()> {
        self.geometries.remove(geometry).ok_or(RenderError::InvalidHandle { kind: "geometry" })?;
        if self.bound_geometry == Some(geometry) {
            self.bound_geometry = None;
        }
        Ok(())
    }

    fn create_framebuffer(&mut self, spec: &FramebufferSpec) -> BackendResult<FramebufferHandle> {
        spec.validate()?;
        Ok(self.framebuffers.insert(FramebufferStorage::new(spec.clone())))
    }

    fn resize_framebuffer(&mut self, framebuffer: FramebufferHandle, width: u32, height: u32) -> BackendResult<()> {
        if width == 0 || height == 0 || width > MAX_FRAMEBUFFER_SIZE || height > MAX_FRAMEBUFFER_SIZE {
            return Err(RenderError::InvalidArgument(format!("framebuffer size {width}x{height}")));
        }
        self.framebuffers
            .get_mut(framebuffer)
            .ok_or(RenderError::InvalidHandle { kind: "framebuffer" })?
            .resize(width, height);
        Ok(())
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) -> BackendResult<()> {
        self.framebuffers
            .remove(framebuffer)
            .ok_or(RenderError::InvalidHandle { kind: "framebuffer" })?;
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
        self.texture_units.retain(|_, binding| binding.framebuffer != framebuffer);
        Ok(())
    }

    fn framebuffer_size(&self, framebuffer: FramebufferHandle) -> BackendResult<(u32, u32)> {
        self.framebuffer(framebuffer).map(|fb| (fb.width(), fb.height()))
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> BackendResult<()> {
        if let Some(handle) = framebuffer {
            self.framebuffer(handle)?;
        }
        self.bound_framebuffer = framebuffer;
        Ok(())
    }

    fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.bound_framebuffer
    }

    fn read_pixel_int(&self, framebuffer: FramebufferHandle, attachment_index: usize, x: i32, y: i32) -> BackendResult<i32> {
        let fb = self.framebuffer(framebuffer)?;
        let AttachmentStorage::Integer(ids) = attachment(fb, attachment_index)? else {
            return Err(mismatch(fb, attachment_index, "integer"));
        };
        Ok(ids[texel_coords(fb, x, y)?])
    }

    fn read_pixel_rgba(&self, framebuffer: FramebufferHandle, attachment_index: usize, x: i32, y: i32) -> BackendResult<[u8; 4]> {
        let fb = self.framebuffer(framebuffer)?;
        let AttachmentStorage::Color(texels) = attachment(fb, attachment_index)? else {
            return Err(mismatch(fb, attachment_index, "color"));
        };
        Ok(texels[texel_coords(fb, x, y)?])
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureBinding>) -> BackendResult<()> {
        match texture {
            Some(binding) => {
                attachment(self.framebuffer(binding.framebuffer)?, binding.attachment)?;
                self.texture_units.insert(unit, binding);
            }
            None => {
                self.texture_units.remove(&unit);
            }
        }
        Ok(())
    }

    fn bind_shader(&mut self, shader: Option<ShaderHandle>) -> BackendResult<()> {
        if let Some(handle) = shader {
            if !self.shaders.contains_key(handle) {
                return Err(RenderError::InvalidHandle { kind: "shader" });
            }
        }
        self.bound_shader = shader;
        self.uploads_since_bind.clear();
        Ok(())
    }

    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue) -> BackendResult<()> {
        let handle = self
            .bound_shader
            .ok_or_else(|| RenderError::RenderingFailed(format!("uniform {slot} set with no shader bound")))?;
        let program = self.shaders.get_mut(handle).ok_or(RenderError::InvalidHandle { kind: "shader" })?;

        if !program.declared.contains(&slot) {
            log::trace!("Shader '{}' has no uniform {}", program.name, slot);
            return Ok(());
        }
        program.values.insert(slot, value);
        self.uploads_since_bind.push((slot, value));
        self.stats.uniform_uploads += 1;
        Ok(())
    }

    fn bind_geometry(&mut self, geometry: Option<GeometryHandle>) -> BackendResult<()> {
        if let Some(handle) = geometry {
            if !self.geometries.contains_key(handle) {
                return Err(RenderError::InvalidHandle { kind: "geometry" });
            }
        }
        self.bound_geometry = geometry;
        Ok(())
    }

    fn draw_indexed(&mut self) -> BackendResult<()> {
        let shader = self
            .bound_shader
            .ok_or_else(|| RenderError::RenderingFailed("draw with no shader bound".into()))?;
        let geometry_handle = self
            .bound_geometry
            .ok_or_else(|| RenderError::RenderingFailed("draw with no geometry bound".into()))?;
        let program = self.shaders.get(shader).ok_or(RenderError::InvalidHandle { kind: "shader" })?;
        let geometry = self
            .geometries
            .get(geometry_handle)
            .ok_or(RenderError::InvalidHandle { kind: "geometry" })?;

        let shadow = if program.kind == programs::ProgramKind::Surface {
            self.shadow_sampler(program)
        } else {
            None
        };
        let pipeline = Pipeline { viewport: self.viewport, depth_mask: self.depth_mask };
        let fragments = match self.bound_framebuffer.and_then(|h| self.framebuffers.get_mut(h)) {
            Some(target) => programs::execute(program.kind, &program.values, geometry, target, pipeline, shadow.as_ref()),
            None => 0,
        };

        let triangles = u32::try_from(geometry.indices.len() / 3).unwrap_or(u32::MAX);
        self.stats.draw_calls += 1;
        self.stats.triangles = self.stats.triangles.saturating_add(triangles);
        self.stats.fragments_written += fragments;
        log::trace!("Draw '{}': {} triangles, {} fragments", program.name, triangles, fragments);

        self.draw_log.push(DrawRecord {
            shader,
            shader_name: program.name.clone(),
            target: self.bound_framebuffer,
            uploads: self.uploads_since_bind.clone(),
            uniforms: program.values.clone(),
            depth_mask: self.depth_mask,
            triangles,
            fragments,
        });
        Ok(())
    }

    fn stats(&self) -> RenderStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
        self.draw_log.clear();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives::cube_mesh;
    use crate::render::shader::BUILTIN_SHADERS;

    fn builtin(name: &str) -> ShaderSource {
        let (_, text) = BUILTIN_SHADERS.iter().find(|(n, _)| *n == name).unwrap();
        ShaderSource::parse(name, text).unwrap()
    }

    fn upload_cube(device: &mut SoftwareBackend) -> GeometryHandle {
        let cube = cube_mesh(Vec4::repeat(1.0));
        device.create_geometry(&cube.vertices(), &cube.indices).unwrap()
    }

    fn device_with_target(width: u32, height: u32) -> (SoftwareBackend, FramebufferHandle) {
        let mut device = SoftwareBackend::new();
        device.init().unwrap();
        let fb = device.create_framebuffer(&FramebufferSpec::editor_viewport(width, height)).unwrap();
        (device, fb)
    }

    #[test]
    fn test_uniform_without_shader_fails() {
        let mut device = SoftwareBackend::new();
        let result = device.set_uniform(UniformSlot::EntityId, UniformValue::Int(1));
        assert!(matches!(result, Err(RenderError::RenderingFailed(_))));
    }

    #[test]
    fn test_undeclared_uniform_is_ignored() {
        let mut device = SoftwareBackend::new();
        let skybox = device.create_shader(&builtin("skybox")).unwrap();
        device.bind_shader(Some(skybox)).unwrap();

        device.set_uniform(UniformSlot::EntityId, UniformValue::Int(5)).unwrap();
        assert_eq!(device.stats().uniform_uploads, 0);

        device.set_uniform(UniformSlot::Cubemap, UniformValue::Int(0)).unwrap();
        assert_eq!(device.stats().uniform_uploads, 1);
    }

    #[test]
    fn test_destroying_bound_resources_unbinds() {
        let (mut device, fb) = device_with_target(4, 4);
        let shader = device.create_shader(&builtin("phong")).unwrap();
        let geometry = upload_cube(&mut device);

        device.bind_framebuffer(Some(fb)).unwrap();
        device.bind_shader(Some(shader)).unwrap();
        device.bind_geometry(Some(geometry)).unwrap();
        device.destroy_shader(shader).unwrap();
        device.destroy_geometry(geometry).unwrap();
        device.destroy_framebuffer(fb).unwrap();

        assert_eq!(device.bound_shader(), None);
        assert_eq!(device.bound_geometry(), None);
        assert_eq!(device.bound_framebuffer(), None);
        assert!(matches!(device.destroy_shader(shader), Err(RenderError::InvalidHandle { kind: "shader" })));
    }

    #[test]
    fn test_clear_attachment_int_checks_format() {
        let (mut device, fb) = device_with_target(4, 4);
        assert!(matches!(
            device.clear_attachment_int(1, -1),
            Err(RenderError::RenderingFailed(_))
        ));

        device.bind_framebuffer(Some(fb)).unwrap();
        device.clear_attachment_int(1, -1).unwrap();
        assert_eq!(device.read_pixel_int(fb, 1, 3, 3).unwrap(), -1);
        assert!(matches!(
            device.clear_attachment_int(0, -1),
            Err(RenderError::AttachmentFormatMismatch { index: 0, expected: "integer", .. })
        ));
        assert!(matches!(
            device.clear_attachment_int(7, -1),
            Err(RenderError::AttachmentIndexOutOfRange { index: 7, count: 3 })
        ));
    }

    #[test]
    fn test_clear_fills_color_and_depth() {
        let (mut device, fb) = device_with_target(2, 2);
        device.bind_framebuffer(Some(fb)).unwrap();
        device.set_clear_color(Vec4::new(1.0, 0.0, 0.0, 1.0));
        device.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        assert_eq!(device.read_pixel_rgba(fb, 0, 1, 1).unwrap(), [255, 0, 0, 255]);
        assert_eq!(device.read_depth(fb, 2, 0, 0, 0).unwrap(), 1.0);
        // Integer attachments keep their contents
        assert_eq!(device.read_pixel_int(fb, 1, 0, 0).unwrap(), 0);
    }

    #[test]
    fn test_resize_validation() {
        let (mut device, fb) = device_with_target(4, 4);
        assert!(matches!(device.resize_framebuffer(fb, 0, 4), Err(RenderError::InvalidArgument(_))));
        assert!(matches!(
            device.resize_framebuffer(fb, MAX_FRAMEBUFFER_SIZE + 1, 4),
            Err(RenderError::InvalidArgument(_))
        ));

        device.resize_framebuffer(fb, 10, 6).unwrap();
        assert_eq!(device.framebuffer_size(fb).unwrap(), (10, 6));
        assert_eq!(device.read_pixel_int(fb, 1, 9, 5).unwrap(), 0);
        assert!(matches!(
            device.read_pixel_int(fb, 1, 10, 5),
            Err(RenderError::PixelOutOfBounds { x: 10, y: 5, width: 10, height: 6 })
        ));
    }

    #[test]
    fn test_draw_is_logged_with_uploads_since_bind() {
        let (mut device, fb) = device_with_target(8, 8);
        let shader = device.create_shader(&builtin("phong")).unwrap();
        let geometry = upload_cube(&mut device);

        device.bind_framebuffer(Some(fb)).unwrap();
        device.set_viewport(0, 0, 8, 8);
        device.bind_shader(Some(shader)).unwrap();
        device.set_uniform(UniformSlot::EntityId, UniformValue::Int(3)).unwrap();
        device.bind_shader(None).unwrap();

        device.bind_geometry(Some(geometry)).unwrap();
        device.bind_shader(Some(shader)).unwrap();
        device.set_uniform(UniformSlot::PointLightCount, UniformValue::Int(0)).unwrap();
        device.draw_indexed().unwrap();

        let record = &device.draw_log()[0];
        assert_eq!(record.shader_name, "phong");
        assert_eq!(record.triangles, 12);
        assert_eq!(record.uploads.len(), 1);
        assert_eq!(record.uploaded(UniformSlot::EntityId), None);
        // Program state persists across binds
        assert_eq!(record.uniform(UniformSlot::EntityId), Some(UniformValue::Int(3)));
        assert!(record.fragments > 0);
        assert_eq!(device.read_pixel_int(fb, 1, 4, 4).unwrap(), 3);
    }

    #[test]
    fn test_default_target_draw_is_counted() {
        let mut device = SoftwareBackend::new();
        let shader = device.create_shader(&builtin("phong")).unwrap();
        let geometry = upload_cube(&mut device);

        device.bind_geometry(Some(geometry)).unwrap();
        device.bind_shader(Some(shader)).unwrap();
        device.draw_indexed().unwrap();

        assert_eq!(device.stats().draw_calls, 1);
        assert_eq!(device.draw_log()[0].target, None);
        assert_eq!(device.draw_log()[0].fragments, 0);
    }

    #[test]
    fn test_geometry_validation() {
        let mut device = SoftwareBackend::new();
        let vertex = Vertex { position: [0.0; 3], color: [1.0; 4], normal: [0.0, 1.0, 0.0] };
        assert!(device.create_geometry(&[vertex], &[0, 0]).is_err());
        assert!(device.create_geometry(&[vertex], &[0, 0, 1]).is_err());
        assert!(device.create_geometry(&[vertex], &[0, 0, 0]).is_ok());
    }

    #[test]
    fn test_save_attachment_png() {
        let (mut device, fb) = device_with_target(3, 2);
        device.bind_framebuffer(Some(fb)).unwrap();
        device.set_clear_color(Vec4::new(0.0, 1.0, 0.0, 1.0));
        device.clear(ClearFlags::COLOR);

        let path = std::env::temp_dir().join(format!("light_engine_{}_attachment.png", std::process::id()));
        device.save_attachment_png(fb, 0, &path).unwrap();
        let saved = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).ok();

        assert_eq!(saved.dimensions(), (3, 2));
        assert_eq!(saved.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert!(matches!(
            device.save_attachment_png(fb, 1, &path),
            Err(RenderError::AttachmentFormatMismatch { .. })
        ));
    }
}
