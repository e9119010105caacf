//! Frame-scoped scene submission
//!
//! [`Renderer::begin_scene`] returns a [`SceneFrame`] that mutably borrows
//! the renderer for the duration of the scene. Every submission is a method
//! on the frame, so drawing outside a scene or opening a nested scene does
//! not compile. [`SceneFrame::end`] closes the scene.
//!
//! Each submit binds geometry then shader, uploads the per-draw uniform set
//! through typed slots, issues one indexed draw, then unbinds shader then
//! geometry.

use crate::foundation::collections::{GeometryHandle, ShaderHandle};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
use crate::render::api::{RenderBackend, RenderCommand, RendererConfig};
use crate::render::lighting::{
    DirectionalLight, PointLight, SpotLight, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
    POINT_SHADOW_FAR_PLANE,
};
use crate::render::picking::PickId;
use crate::render::primitives::Projection;
use crate::render::shader::{DirectionalLightField, PointLightField, SpotLightField, UniformSlot};
use crate::render::{RenderError, RenderResult};

/// Texture unit the directional shadow map is sampled from by default
///
/// Unit 0 is reserved for the skybox cubemap.
pub const DEFAULT_SHADOW_MAP_UNIT: i32 = 1;

/// Per-scene state shared by every submission in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SceneData {
    /// Projection times view
    pub view_projection_matrix: Mat4,
    /// Projection times view with the translation removed
    pub view_projection_skybox_matrix: Mat4,
    /// Camera position in world space
    pub camera_position: Vec3,
    /// Point lights, in submission order
    pub point_lights: Vec<PointLight>,
    /// Spot lights, in submission order
    pub spot_lights: Vec<SpotLight>,
    /// Directional lights, in submission order
    pub directional_lights: Vec<DirectionalLight>,
}

impl SceneData {
    fn new(view_projection: Mat4, skybox: Mat4, camera_position: Vec3) -> Self {
        Self {
            view_projection_matrix: view_projection,
            view_projection_skybox_matrix: skybox,
            camera_position,
            point_lights: Vec::new(),
            spot_lights: Vec::new(),
            directional_lights: Vec::new(),
        }
    }
}

/// Light kinds that can be submitted to a scene
///
/// Submitting a slice replaces the list of that kind wholesale.
pub trait SceneLight: Sized + Clone {
    /// Replace this kind's list in the scene data
    fn replace_in(lights: &[Self], data: &mut SceneData);
}

impl SceneLight for PointLight {
    fn replace_in(lights: &[Self], data: &mut SceneData) {
        data.point_lights = lights.to_vec();
    }
}

impl SceneLight for SpotLight {
    fn replace_in(lights: &[Self], data: &mut SceneData) {
        data.spot_lights = lights.to_vec();
    }
}

impl SceneLight for DirectionalLight {
    fn replace_in(lights: &[Self], data: &mut SceneData) {
        data.directional_lights = lights.to_vec();
    }
}

/// Scene submission front end
#[derive(Debug)]
pub struct Renderer {
    command: RenderCommand,
    config: RendererConfig,
    initialized: bool,
}

impl Renderer {
    /// Create a renderer over a backend; call [`init`](Self::init) before use
    pub fn new(backend: Box<dyn RenderBackend>, config: RendererConfig) -> Self {
        Self {
            command: RenderCommand::new(backend),
            config,
            initialized: false,
        }
    }

    /// One-time device setup
    ///
    /// Calling it again is a no-op.
    pub fn init(&mut self) -> RenderResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.command.init()?;
        self.command.set_clear_color(Vec4::from(self.config.clear_color));
        self.initialized = true;
        log::info!("Renderer initialized for '{}'", self.config.application_name);
        Ok(())
    }

    /// Whether [`init`](Self::init) has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Forward a window resize to the viewport
    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        log::info!("Window resized to {}x{}", width, height);
        self.command.set_viewport(0, 0, width, height);
    }

    /// Open a scene from a camera projection and a view matrix
    ///
    /// The skybox matrix uses the view with its translation removed, and the
    /// camera position is recovered from the view as `-(R^T * t)`.
    pub fn begin_scene(&mut self, camera: &impl Projection, view: &Mat4) -> RenderResult<SceneFrame<'_>> {
        self.ensure_initialized()?;

        let projection = camera.projection_matrix();
        let rotation = view.fixed_view::<3, 3>(0, 0).into_owned();
        let camera_position = -(rotation.transpose() * view.translation_part());

        let data = SceneData::new(projection * view, projection * view.without_translation(), camera_position);
        log::trace!("Begin scene at camera {:?}", camera_position);
        Ok(SceneFrame::new(self, data))
    }

    /// Open a scene from a ready-made view-projection and camera position
    ///
    /// The skybox matrix is set to the supplied matrix as well.
    pub fn begin_scene_with_matrix(&mut self, view_projection: &Mat4, position: Vec3) -> RenderResult<SceneFrame<'_>> {
        self.ensure_initialized()?;
        let data = SceneData::new(*view_projection, *view_projection, position);
        Ok(SceneFrame::new(self, data))
    }

    /// Device command façade
    pub fn command(&self) -> &RenderCommand {
        &self.command
    }

    /// Mutable device command façade
    pub fn command_mut(&mut self) -> &mut RenderCommand {
        &mut self.command
    }

    /// Renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn ensure_initialized(&self) -> RenderResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(RenderError::NotInitialized("begin_scene called before Renderer::init".into()))
        }
    }
}

/// One open scene
///
/// Dropping a frame without calling [`end`](Self::end) logs a warning.
#[derive(Debug)]
pub struct SceneFrame<'r> {
    renderer: &'r mut Renderer,
    data: SceneData,
    ended: bool,
}

impl<'r> SceneFrame<'r> {
    fn new(renderer: &'r mut Renderer, data: SceneData) -> Self {
        Self { renderer, data, ended: false }
    }

    /// Scene state as currently submitted
    pub fn data(&self) -> &SceneData {
        &self.data
    }

    /// Replace the list of lights of one kind
    pub fn submit_light<L: SceneLight>(&mut self, lights: &[L]) {
        L::replace_in(lights, &mut self.data);
    }

    /// Draw with no pick id and the default shadow-map unit
    pub fn submit(&mut self, shader: ShaderHandle, geometry: GeometryHandle, transform: &Mat4) -> RenderResult<()> {
        self.submit_id(shader, geometry, transform, PickId::NONE, DEFAULT_SHADOW_MAP_UNIT)
    }

    /// Draw a lit surface, writing `id` to the pick attachment
    pub fn submit_id(
        &mut self,
        shader: ShaderHandle,
        geometry: GeometryHandle,
        transform: &Mat4,
        id: PickId,
        shadow_map_unit: i32,
    ) -> RenderResult<()> {
        let data = &self.data;
        scoped_draw(&mut self.renderer.command, shader, geometry, |cmd| {
            cmd.set_uniform_mat4(UniformSlot::ViewProjection, &data.view_projection_matrix)?;
            cmd.set_uniform_int(UniformSlot::DepthMap, shadow_map_unit)?;
            cmd.set_uniform_vec3(UniformSlot::CameraPosition, &data.camera_position)?;
            upload_lights(cmd, data)?;
            cmd.set_uniform_int(UniformSlot::EntityId, id.raw())?;
            cmd.set_uniform_mat4(UniformSlot::Transform, transform)?;
            cmd.draw_indexed()
        })
    }

    /// Draw the skybox with depth writes disabled
    pub fn submit_skybox(&mut self, shader: ShaderHandle, geometry: GeometryHandle) -> RenderResult<()> {
        let data = &self.data;
        scoped_draw(&mut self.renderer.command, shader, geometry, |cmd| {
            cmd.set_uniform_mat4(UniformSlot::ViewProjection, &data.view_projection_skybox_matrix)?;
            cmd.set_uniform_int(UniformSlot::Cubemap, 0)?;

            cmd.depth_mask(false);
            let result = cmd.draw_indexed();
            cmd.depth_mask(true);
            result
        })
    }

    /// Draw into a directional shadow map
    pub fn submit_for_directional_shadow(
        &mut self,
        shader: ShaderHandle,
        geometry: GeometryHandle,
        light_space: &Mat4,
        transform: &Mat4,
    ) -> RenderResult<()> {
        scoped_draw(&mut self.renderer.command, shader, geometry, |cmd| {
            cmd.set_uniform_mat4(UniformSlot::ShadowLightSpace, light_space)?;
            cmd.set_uniform_mat4(UniformSlot::Transform, transform)?;
            cmd.draw_indexed()
        })
    }

    /// Draw into an omnidirectional shadow cube
    ///
    /// `light_space` must hold exactly six matrices, one per cube face.
    pub fn submit_for_point_shadow(
        &mut self,
        shader: ShaderHandle,
        geometry: GeometryHandle,
        light_space: &[Mat4],
        transform: &Mat4,
    ) -> RenderResult<()> {
        if light_space.len() != 6 {
            log::error!("Point shadow needs 6 face matrices, got {}", light_space.len());
            return Err(RenderError::InvalidArgument(format!(
                "point shadow needs 6 face matrices, got {}",
                light_space.len()
            )));
        }

        scoped_draw(&mut self.renderer.command, shader, geometry, |cmd| {
            for (face, matrix) in (0u8..).zip(light_space) {
                cmd.set_uniform_mat4(UniformSlot::ShadowMatrix(face), matrix)?;
            }
            cmd.set_uniform_mat4(UniformSlot::Transform, transform)?;
            cmd.set_uniform_float(UniformSlot::FarPlane, POINT_SHADOW_FAR_PLANE)?;
            cmd.draw_indexed()
        })
    }

    /// Draw a selection outline around the geometry
    pub fn submit_outline(
        &mut self,
        shader: ShaderHandle,
        geometry: GeometryHandle,
        transform: &Mat4,
        color: &Vec4,
        width: f32,
    ) -> RenderResult<()> {
        let data = &self.data;
        scoped_draw(&mut self.renderer.command, shader, geometry, |cmd| {
            cmd.set_uniform_mat4(UniformSlot::ViewProjection, &data.view_projection_matrix)?;
            cmd.set_uniform_mat4(UniformSlot::Transform, transform)?;
            cmd.set_uniform_vec4(UniformSlot::OutlineColor, color)?;
            cmd.set_uniform_float(UniformSlot::OutlineWidth, width)?;
            cmd.draw_indexed()
        })
    }

    /// Device command façade, for state changes inside the scene
    pub fn command_mut(&mut self) -> &mut RenderCommand {
        &mut self.renderer.command
    }

    /// Close the scene
    pub fn end(mut self) {
        self.ended = true;
        log::trace!("End scene");
    }
}

impl Drop for SceneFrame<'_> {
    fn drop(&mut self) {
        if !self.ended {
            log::warn!("Scene frame dropped without end()");
        }
    }
}

/// Bind geometry then shader, run `draw`, then unbind shader then geometry
///
/// The unbinds run even when `draw` fails; the first error wins.
fn scoped_draw<F>(cmd: &mut RenderCommand, shader: ShaderHandle, geometry: GeometryHandle, draw: F) -> RenderResult<()>
where
    F: FnOnce(&mut RenderCommand) -> RenderResult<()>,
{
    cmd.bind_geometry(Some(geometry))?;
    if let Err(e) = cmd.bind_shader(Some(shader)) {
        cmd.bind_geometry(None)?;
        return Err(e);
    }

    let result = draw(cmd);
    let unbind_shader = cmd.bind_shader(None);
    let unbind_geometry = cmd.bind_geometry(None);
    result.and(unbind_shader).and(unbind_geometry)
}

/// Upload every light list, capped at the shader's array sizes
fn upload_lights(cmd: &mut RenderCommand, data: &SceneData) -> RenderResult<()> {
    let points = capped(&data.point_lights, MAX_POINT_LIGHTS, "point");
    let spots = capped(&data.spot_lights, MAX_SPOT_LIGHTS, "spot");
    let directionals = capped(&data.directional_lights, MAX_DIRECTIONAL_LIGHTS, "directional");

    cmd.set_uniform_int(UniformSlot::PointLightCount, count_i32(points.len()))?;
    cmd.set_uniform_int(UniformSlot::SpotLightCount, count_i32(spots.len()))?;
    cmd.set_uniform_int(UniformSlot::DirectionalLightCount, count_i32(directionals.len()))?;

    for (i, light) in (0u8..).zip(points) {
        cmd.set_uniform_vec3(UniformSlot::PointLight(i, PointLightField::Position), &light.position)?;
        cmd.set_uniform_vec3(UniformSlot::PointLight(i, PointLightField::Color), &light.color)?;
        cmd.set_uniform_float(UniformSlot::PointLight(i, PointLightField::Intensity), light.intensity)?;
        cmd.set_uniform_float(UniformSlot::PointLight(i, PointLightField::Range), light.range)?;
    }

    for (i, light) in (0u8..).zip(spots) {
        cmd.set_uniform_vec3(UniformSlot::SpotLight(i, SpotLightField::Position), &light.position)?;
        cmd.set_uniform_vec3(UniformSlot::SpotLight(i, SpotLightField::Direction), &light.direction)?;
        cmd.set_uniform_vec3(UniformSlot::SpotLight(i, SpotLightField::Color), &light.color)?;
        cmd.set_uniform_float(UniformSlot::SpotLight(i, SpotLightField::Intensity), light.intensity)?;
        cmd.set_uniform_float(UniformSlot::SpotLight(i, SpotLightField::CutOff), light.cos_inner())?;
        cmd.set_uniform_float(UniformSlot::SpotLight(i, SpotLightField::OuterCutOff), light.cos_outer())?;
    }

    for (i, light) in (0u8..).zip(directionals) {
        let space = light.space_matrix();
        cmd.set_uniform_vec3(UniformSlot::DirectionalLight(i, DirectionalLightField::Direction), &light.direction)?;
        cmd.set_uniform_vec3(UniformSlot::DirectionalLight(i, DirectionalLightField::Color), &light.color)?;
        cmd.set_uniform_float(UniformSlot::DirectionalLight(i, DirectionalLightField::Intensity), light.intensity)?;
        cmd.set_uniform_mat4(UniformSlot::DirectionalLight(i, DirectionalLightField::LightSpaceMatrix), &space)?;
    }

    // The surface shader's shadow lookup uses the first directional light
    if let Some(first) = directionals.first() {
        cmd.set_uniform_mat4(UniformSlot::LightSpaceMatrix, &first.space_matrix())?;
    }
    Ok(())
}

fn capped<'a, T>(lights: &'a [T], max: usize, kind: &str) -> &'a [T] {
    if lights.len() > max {
        log::debug!("{} {} lights submitted, uploading the first {}", lights.len(), kind, max);
        &lights[..max]
    } else {
        lights
    }
}

fn count_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{DrawRecord, SoftwareBackend};
    use crate::render::framebuffer::{Framebuffer, FramebufferSpec};
    use crate::render::primitives::{Camera, MeshLibrary};
    use crate::render::shader::{ShaderLibrary, UniformValue};
    use crate::render::ClearFlags;
    use approx::assert_relative_eq;

    struct Fixture {
        renderer: Renderer,
        shaders: ShaderLibrary,
        cube: GeometryHandle,
    }

    fn fixture() -> Fixture {
        let mut renderer = Renderer::new(Box::new(SoftwareBackend::new()), RendererConfig::default());
        renderer.init().unwrap();
        let shaders = ShaderLibrary::with_builtins(renderer.command_mut()).unwrap();
        let mut meshes = MeshLibrary::new();
        meshes.add_default_meshes(renderer.command_mut()).unwrap();
        let cube = meshes.get("Cube").unwrap();
        Fixture { renderer, shaders, cube }
    }

    fn device(renderer: &Renderer) -> &SoftwareBackend {
        renderer.command().backend::<SoftwareBackend>().unwrap()
    }

    fn last_draw(renderer: &Renderer) -> DrawRecord {
        device(renderer).draw_log().last().cloned().unwrap()
    }

    fn picking_target(renderer: &mut Renderer, width: u32, height: u32) -> Framebuffer {
        let mut fb = Framebuffer::create(renderer.command_mut(), FramebufferSpec::editor_viewport(width, height)).unwrap();
        fb.bind(renderer.command_mut()).unwrap();
        renderer.command_mut().clear(ClearFlags::all());
        renderer.command_mut().clear_attachment_int(1, PickId::NONE.raw()).unwrap();
        fb
    }

    #[test]
    fn test_begin_scene_requires_init() {
        let mut renderer = Renderer::new(Box::new(SoftwareBackend::new()), RendererConfig::default());
        let result = renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros());
        assert!(matches!(result, Err(RenderError::NotInitialized(_))));
    }

    #[test]
    fn test_skybox_matrix_drops_translation() {
        let mut f = fixture();
        let skybox = f.shaders.require("skybox").unwrap();
        let camera = Camera::default();
        let eye = Vec3::new(3.0, 2.0, 5.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());

        let mut frame = f.renderer.begin_scene(&camera, &view).unwrap();
        assert_relative_eq!(frame.data().camera_position, eye, epsilon = 1e-4);
        frame.submit_skybox(skybox, f.cube).unwrap();
        frame.end();

        let record = last_draw(&f.renderer);
        let expected = camera.projection_matrix() * view.without_translation();
        assert_eq!(record.uploaded(UniformSlot::ViewProjection), Some(UniformValue::Mat4(expected)));
        assert!(!record.depth_mask);
        assert!(device(&f.renderer).depth_mask());
    }

    #[test]
    fn test_skybox_matrix_ignores_camera_translation() {
        let mut f = fixture();
        let camera = Camera::default();
        let near = Mat4::look_at(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 1.0, 0.0), Vec3::y());
        let far = Mat4::look_at(Vec3::new(40.0, -3.0, 5.0), Vec3::new(40.0, -3.0, 0.0), Vec3::y());

        let frame = f.renderer.begin_scene(&camera, &near).unwrap();
        let a = frame.data().view_projection_skybox_matrix;
        frame.end();
        let frame = f.renderer.begin_scene(&camera, &far).unwrap();
        let b = frame.data().view_projection_skybox_matrix;
        frame.end();

        assert_relative_eq!(a, b, epsilon = 1e-5);
        assert_relative_eq!(a, camera.projection_matrix(), epsilon = 1e-5);
    }

    #[test]
    fn test_empty_light_list_uploads_zero_counts() {
        let mut f = fixture();
        let phong = f.shaders.require("phong").unwrap();
        let light = PointLight::new(Vec3::new(0.0, 2.0, 0.0));

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame.submit_light(&[light]);
        frame.submit(phong, f.cube, &Mat4::identity()).unwrap();
        frame.end();
        assert_eq!(last_draw(&f.renderer).uploaded(UniformSlot::PointLightCount), Some(UniformValue::Int(1)));

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame.submit(phong, f.cube, &Mat4::identity()).unwrap();
        frame.end();

        let record = last_draw(&f.renderer);
        assert_eq!(record.uploaded(UniformSlot::PointLightCount), Some(UniformValue::Int(0)));
        assert_eq!(record.uploaded(UniformSlot::SpotLightCount), Some(UniformValue::Int(0)));
        assert_eq!(record.uploaded(UniformSlot::DirectionalLightCount), Some(UniformValue::Int(0)));
        assert_eq!(record.uploaded(UniformSlot::PointLight(0, PointLightField::Position)), None);
    }

    #[test]
    fn test_light_lists_are_capped() {
        let mut f = fixture();
        let phong = f.shaders.require("phong").unwrap();
        let lights: Vec<PointLight> = (0..10)
            .map(|i| PointLight::new(Vec3::new(i as f32, 1.0, 0.0)))
            .collect();

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame.submit_light(&lights);
        frame.submit(phong, f.cube, &Mat4::identity()).unwrap();
        frame.end();

        let record = last_draw(&f.renderer);
        assert_eq!(record.uploaded(UniformSlot::PointLightCount), Some(UniformValue::Int(8)));
        assert_eq!(
            record.uploaded(UniformSlot::PointLight(7, PointLightField::Position)),
            Some(UniformValue::Vec3(Vec3::new(7.0, 1.0, 0.0)))
        );
    }

    #[test]
    fn test_first_directional_light_drives_shadow_lookup() {
        let mut f = fixture();
        let phong = f.shaders.require("phong").unwrap();
        let sun = DirectionalLight::new(Vec3::new(-0.2, -1.0, -0.3));
        let moon = DirectionalLight { intensity: 0.5, ..DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0)) };

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame.submit_light(&[sun, moon]);
        frame.submit(phong, f.cube, &Mat4::identity()).unwrap();
        frame.end();

        let record = last_draw(&f.renderer);
        assert_eq!(record.uploaded(UniformSlot::LightSpaceMatrix), Some(UniformValue::Mat4(sun.space_matrix())));
        assert_eq!(record.uploaded(UniformSlot::DepthMap), Some(UniformValue::Int(DEFAULT_SHADOW_MAP_UNIT)));
    }

    #[test]
    fn test_pick_id_readback() {
        let mut f = fixture();
        let phong = f.shaders.require("phong").unwrap();
        let mut target = picking_target(&mut f.renderer, 32, 32);

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame
            .submit_id(phong, f.cube, &Mat4::identity(), PickId(42), DEFAULT_SHADOW_MAP_UNIT)
            .unwrap();
        frame.end();
        target.unbind(f.renderer.command_mut()).unwrap();

        let cmd = f.renderer.command();
        assert_eq!(target.read_pixel_int(cmd, 1, 16, 16).unwrap(), 42);
        assert_eq!(target.read_pixel_int(cmd, 1, 0, 0).unwrap(), -1);
        assert_eq!(target.read_pixel_int(cmd, 1, 31, 31).unwrap(), -1);
    }

    #[test]
    fn test_background_only_frame_reads_none() {
        let mut f = fixture();
        let target = picking_target(&mut f.renderer, 8, 8);
        f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap().end();

        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(target.read_pixel_int(f.renderer.command(), 1, x, y).unwrap(), -1);
            }
        }
    }

    #[test]
    fn test_pick_after_resize() {
        let mut f = fixture();
        let phong = f.shaders.require("phong").unwrap();
        let mut target = picking_target(&mut f.renderer, 16, 16);
        target.unbind(f.renderer.command_mut()).unwrap();

        target.resize(f.renderer.command_mut(), 64, 48).unwrap();
        target.bind(f.renderer.command_mut()).unwrap();
        f.renderer.command_mut().clear(ClearFlags::all());
        f.renderer.command_mut().clear_attachment_int(1, -1).unwrap();

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame.submit_id(phong, f.cube, &Mat4::identity(), PickId(7), DEFAULT_SHADOW_MAP_UNIT).unwrap();
        frame.end();

        let cmd = f.renderer.command();
        assert_eq!(target.read_pixel_int(cmd, 1, 32, 24).unwrap(), 7);
        assert_eq!(target.read_pixel_int(cmd, 1, 63, 47).unwrap(), -1);
        assert!(matches!(
            target.read_pixel_int(cmd, 1, 64, 47),
            Err(RenderError::PixelOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_point_shadow_uploads_six_faces() {
        let mut f = fixture();
        let shader = f.shaders.require("shadow_point").unwrap();
        let light = PointLight::new(Vec3::new(0.0, 3.0, 0.0));
        let matrices = light.shadow_matrices();

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame.submit_for_point_shadow(shader, f.cube, &matrices, &Mat4::identity()).unwrap();
        frame.end();

        let record = last_draw(&f.renderer);
        for (face, matrix) in (0u8..).zip(&matrices) {
            assert_eq!(record.uploaded(UniformSlot::ShadowMatrix(face)), Some(UniformValue::Mat4(*matrix)));
        }
        assert_eq!(record.uploaded(UniformSlot::FarPlane), Some(UniformValue::Float(POINT_SHADOW_FAR_PLANE)));
    }

    #[test]
    fn test_point_shadow_rejects_wrong_matrix_count() {
        let mut f = fixture();
        let shader = f.shaders.require("shadow_point").unwrap();
        let matrices = [Mat4::identity(); 5];

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        let result = frame.submit_for_point_shadow(shader, f.cube, &matrices, &Mat4::identity());
        frame.end();

        assert!(matches!(result, Err(RenderError::InvalidArgument(_))));
        assert!(device(&f.renderer).draw_log().is_empty());
    }

    #[test]
    fn test_failed_submit_unbinds() {
        let mut f = fixture();
        let phong = f.shaders.require("phong").unwrap();
        f.renderer.command_mut().destroy_shader(phong).unwrap();

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        let result = frame.submit(phong, f.cube, &Mat4::identity());
        frame.end();

        assert!(matches!(result, Err(RenderError::InvalidHandle { kind: "shader" })));
        assert_eq!(device(&f.renderer).bound_geometry(), None);
        assert_eq!(device(&f.renderer).bound_shader(), None);
    }

    #[test]
    fn test_outline_uploads_color_and_width() {
        let mut f = fixture();
        let outline = f.shaders.require("outline").unwrap();
        let color = Vec4::new(1.0, 0.5, 0.0, 1.0);

        let mut frame = f.renderer.begin_scene_with_matrix(&Mat4::identity(), Vec3::zeros()).unwrap();
        frame.submit_outline(outline, f.cube, &Mat4::identity(), &color, 3.0).unwrap();
        frame.end();

        let record = last_draw(&f.renderer);
        assert_eq!(record.uploaded(UniformSlot::OutlineColor), Some(UniformValue::Vec4(color)));
        assert_eq!(record.uploaded(UniformSlot::OutlineWidth), Some(UniformValue::Float(3.0)));
        assert_eq!(record.uploaded(UniformSlot::EntityId), None);
    }
}
