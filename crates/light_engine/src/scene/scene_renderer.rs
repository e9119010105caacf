//! Scene Renderer - drives the editor's render passes over a [`Scene`]
//!
//! One editor frame is, in order:
//! 1. directional shadow pass into a depth-only map (first directional light)
//! 2. point shadow pass into a depth cube (first shadow-casting point light)
//! 3. main pass into the target framebuffer: clear, lights, every drawable
//!    with its pick id, then the skybox behind everything
//!
//! The selection outline is a separate call after the frame so the editor
//! can pick against the main pass before the outline is drawn.

use serde::{Deserialize, Serialize};

use super::{Drawable, Scene, SceneLights};
use crate::config::Config;
use crate::ecs::Entity;
use crate::foundation::collections::{GeometryHandle, ShaderHandle};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::primitives::{cube_mesh, EditorCamera};
use crate::render::renderer::DEFAULT_SHADOW_MAP_UNIT;
use crate::render::shader::UniformSlot;
use crate::render::{
    ClearFlags, Framebuffer, FramebufferSpec, FramebufferTextureFormat, PickId, RenderError, RenderResult, Renderer,
    ShaderLibrary,
};

/// Scene renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneRendererConfig {
    /// Color the target is cleared to
    pub background_color: [f32; 4],
    /// Selection outline color
    pub outline_color: [f32; 4],
    /// Selection outline width in pixels
    pub outline_width: f32,
    /// Render the directional shadow map
    pub directional_shadows: bool,
    /// Render the point shadow cube
    pub point_shadows: bool,
    /// Directional shadow map resolution
    pub directional_shadow_size: u32,
    /// Point shadow cube face resolution
    pub point_shadow_size: u32,
    /// Draw the skybox behind the scene
    pub skybox: bool,
}

impl Default for SceneRendererConfig {
    fn default() -> Self {
        Self {
            background_color: [0.1, 0.1, 0.1, 1.0],
            outline_color: [1.0, 0.5, 0.0, 1.0],
            outline_width: 2.0,
            directional_shadows: true,
            point_shadows: true,
            directional_shadow_size: 1024,
            point_shadow_size: 512,
            skybox: true,
        }
    }
}

impl Config for SceneRendererConfig {}

/// Built-in program handles
#[derive(Debug, Clone, Copy)]
struct PassShaders {
    skybox: ShaderHandle,
    outline: ShaderHandle,
    shadow_directional: ShaderHandle,
    shadow_point: ShaderHandle,
}

/// Camera state of the last main pass, reused by the outline
#[derive(Debug, Clone, Copy)]
struct CachedCamera {
    view_projection: Mat4,
    position: Vec3,
}

/// Walks a scene and renders it into the editor's target framebuffer
#[derive(Debug)]
pub struct SceneRenderer {
    renderer: Renderer,
    config: SceneRendererConfig,
    shaders: ShaderLibrary,
    pass_shaders: PassShaders,
    skybox_geometry: GeometryHandle,
    target: Option<Framebuffer>,
    directional_shadow: Option<Framebuffer>,
    point_shadow: Option<Framebuffer>,
    last_camera: Option<CachedCamera>,
    viewport_size: (u32, u32),
}

impl SceneRenderer {
    /// Initialize the renderer and create the built-in passes' resources
    ///
    /// Any resource failure is returned; the editor treats it as fatal.
    pub fn new(mut renderer: Renderer, config: SceneRendererConfig) -> RenderResult<Self> {
        renderer.init()?;
        let command = renderer.command_mut();

        let shaders = ShaderLibrary::with_builtins(command)?;
        let pass_shaders = PassShaders {
            skybox: shaders.require("skybox")?,
            outline: shaders.require("outline")?,
            shadow_directional: shaders.require("shadow_directional")?,
            shadow_point: shaders.require("shadow_point")?,
        };

        let sky = cube_mesh(Vec4::new(1.0, 1.0, 1.0, 1.0));
        let skybox_geometry = command.create_geometry(&sky.vertices(), &sky.indices)?;

        let directional_shadow = if config.directional_shadows {
            let size = config.directional_shadow_size;
            let spec = FramebufferSpec::new([FramebufferTextureFormat::Depth24Stencil8.into()], size, size);
            Some(Framebuffer::create(command, spec)?)
        } else {
            None
        };
        let point_shadow = if config.point_shadows {
            let size = config.point_shadow_size;
            let spec = FramebufferSpec::new([FramebufferTextureFormat::DepthCubemap.into()], size, size);
            Some(Framebuffer::create(command, spec)?)
        } else {
            None
        };

        log::info!("Scene renderer ready ({} shaders)", shaders.len());
        Ok(Self {
            renderer,
            config,
            shaders,
            pass_shaders,
            skybox_geometry,
            target: None,
            directional_shadow,
            point_shadow,
            last_camera: None,
            viewport_size: (0, 0),
        })
    }

    /// Render the scene from the editor camera into the target framebuffer
    pub fn render_editor(&mut self, scene: &Scene, camera: &EditorCamera) -> RenderResult<()> {
        if self.target.is_none() {
            return Err(RenderError::NotInitialized("render_editor called with no target framebuffer".into()));
        }
        self.renderer.command_mut().reset_stats();

        let lights = scene.collect_lights();
        let drawables: Vec<Drawable> = scene.drawables().collect();
        log::debug!("Rendering {} drawables", drawables.len());

        let shadowed = self.directional_shadow_pass(&lights, &drawables)?;
        self.point_shadow_pass(&lights, &drawables)?;
        self.main_pass(scene, camera, &lights, &drawables, shadowed)
    }

    /// Draw the selection outline over the last rendered frame
    ///
    /// Nothing happens when there is no selection, the entity is dead or not
    /// drawable, or no frame has been rendered yet.
    pub fn render_outline(&mut self, scene: &Scene, selection: Option<Entity>) -> RenderResult<()> {
        let Some(entity) = selection else {
            return Ok(());
        };
        let Some(drawable) = scene.drawable(entity) else {
            log::trace!("Selection {:?} is not drawable", entity);
            return Ok(());
        };
        let (Some(camera), Some(target)) = (self.last_camera, self.target.as_mut()) else {
            return Ok(());
        };

        let color = Vec4::from(self.config.outline_color);
        let width = self.config.outline_width;
        let shader = self.pass_shaders.outline;

        target.bind(self.renderer.command_mut())?;
        let result = self
            .renderer
            .begin_scene_with_matrix(&camera.view_projection, camera.position)
            .and_then(|mut frame| {
                let submitted = frame.submit_outline(shader, drawable.geometry, &drawable.transform, &color, width);
                frame.end();
                submitted
            });
        target.unbind(self.renderer.command_mut())?;
        result
    }

    /// Resize the target framebuffer; zero sizes are ignored
    pub fn on_viewport_resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            log::debug!("Ignoring viewport resize to {}x{}", width, height);
            return Ok(());
        }
        self.viewport_size = (width, height);
        if let Some(target) = self.target.as_mut() {
            target.resize(self.renderer.command_mut(), width, height)?;
        }
        Ok(())
    }

    /// Read the pick id under a pixel of the target, origin bottom-left
    pub fn pick(&self, x: i32, y: i32) -> RenderResult<PickId> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| RenderError::NotInitialized("pick called with no target framebuffer".into()))?;
        let attachment = target
            .attachment_index(FramebufferTextureFormat::RedInteger)
            .ok_or_else(|| RenderError::InvalidArgument("target framebuffer has no integer attachment".into()))?;
        target.read_pixel_int(self.renderer.command(), attachment, x, y).map(PickId)
    }

    /// Replace the render target; returns the previous one
    pub fn set_target_framebuffer(&mut self, framebuffer: Framebuffer) -> Option<Framebuffer> {
        self.viewport_size = (framebuffer.width(), framebuffer.height());
        self.target.replace(framebuffer)
    }

    /// Current render target
    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.target.as_ref()
    }

    /// Current render target, mutably
    pub fn framebuffer_mut(&mut self) -> Option<&mut Framebuffer> {
        self.target.as_mut()
    }

    /// Last size passed to [`on_viewport_resize`](Self::on_viewport_resize)
    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport_size
    }

    /// Underlying renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Underlying renderer, mutably
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Shader library holding the built-in programs
    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// Configuration
    pub fn config(&self) -> &SceneRendererConfig {
        &self.config
    }

    /// Returns whether a shadow map was rendered for the main pass
    fn directional_shadow_pass(&mut self, lights: &SceneLights, drawables: &[Drawable]) -> RenderResult<bool> {
        let (Some(map), Some(light)) = (self.directional_shadow.as_mut(), lights.shadow_directional) else {
            return Ok(false);
        };
        let shader = self.pass_shaders.shadow_directional;
        let light_space = light.space_matrix();

        map.bind(self.renderer.command_mut())?;
        self.renderer.command_mut().clear(ClearFlags::DEPTH);
        let result = self
            .renderer
            .begin_scene_with_matrix(&light_space, light.position)
            .and_then(|mut frame| {
                let submitted = drawables.iter().try_for_each(|d| {
                    frame.submit_for_directional_shadow(shader, d.geometry, &light_space, &d.transform)
                });
                frame.end();
                submitted
            });
        map.unbind(self.renderer.command_mut())?;
        result.map(|()| true)
    }

    fn point_shadow_pass(&mut self, lights: &SceneLights, drawables: &[Drawable]) -> RenderResult<()> {
        let (Some(cube), Some(light)) = (self.point_shadow.as_mut(), lights.shadow_point) else {
            return Ok(());
        };
        let shader = self.pass_shaders.shadow_point;
        let matrices = light.shadow_matrices();

        // lightPos is not part of the submission; it persists on the program
        let command = self.renderer.command_mut();
        command.bind_shader(Some(shader))?;
        let uploaded = command.set_uniform_vec3(UniformSlot::LightPosition, &light.position);
        command.bind_shader(None)?;
        uploaded?;

        cube.bind(self.renderer.command_mut())?;
        self.renderer.command_mut().clear(ClearFlags::DEPTH);
        let result = self
            .renderer
            .begin_scene_with_matrix(&Mat4::identity(), light.position)
            .and_then(|mut frame| {
                let submitted = drawables.iter().try_for_each(|d| {
                    frame.submit_for_point_shadow(shader, d.geometry, &matrices, &d.transform)
                });
                frame.end();
                submitted
            });
        cube.unbind(self.renderer.command_mut())?;
        result
    }

    fn main_pass(
        &mut self,
        scene: &Scene,
        camera: &EditorCamera,
        lights: &SceneLights,
        drawables: &[Drawable],
        shadowed: bool,
    ) -> RenderResult<()> {
        let Some(target) = self.target.as_mut() else {
            return Ok(());
        };
        let command = self.renderer.command_mut();

        if let Some(map) = self.directional_shadow.as_ref().filter(|_| shadowed) {
            if let Some(depth) = map.depth_attachment_index() {
                map.bind_attachment_texture(command, depth, DEFAULT_SHADOW_MAP_UNIT.unsigned_abs())?;
            }
        }

        target.bind(command)?;
        command.set_clear_color(Vec4::from(self.config.background_color));
        command.clear(ClearFlags::all());
        if let Some(ids) = target.attachment_index(FramebufferTextureFormat::RedInteger) {
            command.clear_attachment_int(ids, PickId::NONE.raw())?;
        }

        let skybox = self.config.skybox.then_some((self.pass_shaders.skybox, self.skybox_geometry));
        let result = self.renderer.begin_scene(camera, &camera.view_matrix()).and_then(|mut frame| {
            frame.submit_light(&lights.points);
            frame.submit_light(&lights.spots);
            frame.submit_light(&lights.directionals);

            let submitted = drawables
                .iter()
                .try_for_each(|d| {
                    frame.submit_id(d.shader, d.geometry, &d.transform, scene.pick_id(d.entity), DEFAULT_SHADOW_MAP_UNIT)
                })
                .and_then(|()| match skybox {
                    Some((shader, geometry)) => frame.submit_skybox(shader, geometry),
                    None => Ok(()),
                });

            let data = frame.data();
            let cached = CachedCamera {
                view_projection: data.view_projection_matrix,
                position: data.camera_position,
            };
            frame.end();
            submitted.map(|()| cached)
        });

        target.unbind(self.renderer.command_mut())?;
        self.last_camera = Some(result?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{LightComponent, MeshComponent, MeshRendererComponent, TransformComponent};
    use crate::foundation::math::Mat4Ext;
    use crate::render::backends::SoftwareBackend;
    use crate::render::{MeshLibrary, RendererConfig};

    const SIZE: u32 = 64;

    fn small_config() -> SceneRendererConfig {
        SceneRendererConfig {
            directional_shadow_size: 64,
            point_shadow_size: 16,
            ..SceneRendererConfig::default()
        }
    }

    struct Editor {
        scene_renderer: SceneRenderer,
        scene: Scene,
        cube: Entity,
        floor: Entity,
    }

    fn editor(config: SceneRendererConfig) -> Editor {
        let renderer = Renderer::new(Box::new(SoftwareBackend::new()), RendererConfig::default());
        let mut scene_renderer = SceneRenderer::new(renderer, config).unwrap();

        let command = scene_renderer.renderer_mut().command_mut();
        let target = Framebuffer::create(command, FramebufferSpec::editor_viewport(SIZE, SIZE)).unwrap();
        let mut meshes = MeshLibrary::new();
        meshes.add_default_meshes(command).unwrap();
        let geometry = meshes.get("Cube").unwrap();
        scene_renderer.set_target_framebuffer(target);
        let phong = scene_renderer.shaders().require("phong").unwrap();

        let mut scene = Scene::new();
        let cube = scene.add_entity("Cube");
        scene.world_mut().insert(cube, MeshComponent::new(geometry));
        scene.world_mut().insert(cube, MeshRendererComponent::new(phong));

        let floor = scene.add_entity("Floor");
        scene.world_mut().insert(
            floor,
            TransformComponent::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::new(2.0, 0.1, 2.0)),
        );
        scene.world_mut().insert(floor, MeshComponent::new(geometry));
        scene.world_mut().insert(floor, MeshRendererComponent::new(phong));

        let light = scene.add_entity("Light");
        scene
            .world_mut()
            .insert(light, TransformComponent::from_position(Vec3::new(-1.0, 2.0, 1.5)));
        scene.world_mut().insert(light, LightComponent::default());
        let sun = scene.add_entity("Sun");
        scene.world_mut().insert(
            sun,
            LightComponent::directional(Vec3::new(-0.3, -1.0, -0.2), Vec3::new(1.0, 1.0, 1.0), 0.6),
        );

        Editor { scene_renderer, scene, cube, floor }
    }

    fn top_down_camera() -> EditorCamera {
        let mut camera = EditorCamera::new(45.0, 1.0, 0.1, 100.0);
        camera.set_view_matrix(&Mat4::look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::zeros(), -Vec3::z()));
        camera
    }

    fn device(scene_renderer: &SceneRenderer) -> &SoftwareBackend {
        scene_renderer.renderer().command().backend::<SoftwareBackend>().unwrap()
    }

    #[test]
    fn test_render_without_target_fails() {
        let renderer = Renderer::new(Box::new(SoftwareBackend::new()), RendererConfig::default());
        let mut scene_renderer = SceneRenderer::new(renderer, small_config()).unwrap();
        let result = scene_renderer.render_editor(&Scene::new(), &top_down_camera());
        assert!(matches!(result, Err(RenderError::NotInitialized(_))));
    }

    #[test]
    fn test_top_down_center_picks_cube() {
        let mut e = editor(small_config());
        e.scene_renderer.render_editor(&e.scene, &top_down_camera()).unwrap();

        let center = e.scene_renderer.pick(32, 32).unwrap();
        assert_eq!(e.scene.entity_from_pick_id(center), Some(e.cube));

        // Past the cube but over the floor
        let floor_px = e.scene_renderer.pick(32, 32 + 6).unwrap();
        assert_eq!(e.scene.entity_from_pick_id(floor_px), Some(e.floor));

        assert_eq!(e.scene_renderer.pick(0, 0).unwrap(), PickId::NONE);
    }

    #[test]
    fn test_passes_run_in_order() {
        let mut e = editor(small_config());
        e.scene_renderer.render_editor(&e.scene, &top_down_camera()).unwrap();

        let names: Vec<&str> = device(&e.scene_renderer)
            .draw_log()
            .iter()
            .map(|d| d.shader_name.as_str())
            .collect();
        assert_eq!(
            names,
            ["shadow_directional", "shadow_directional", "shadow_point", "shadow_point", "phong", "phong", "skybox"]
        );

        let point_pass = &device(&e.scene_renderer).draw_log()[2];
        assert_eq!(
            point_pass.uniform(UniformSlot::LightPosition),
            Some(crate::render::UniformValue::Vec3(Vec3::new(-1.0, 2.0, 1.5)))
        );
    }

    #[test]
    fn test_shadow_map_bound_for_main_pass() {
        let mut e = editor(small_config());
        e.scene_renderer.render_editor(&e.scene, &top_down_camera()).unwrap();

        let binding = device(&e.scene_renderer).texture_unit(DEFAULT_SHADOW_MAP_UNIT.unsigned_abs());
        assert!(binding.is_some());

        let mut unshadowed = editor(SceneRendererConfig { directional_shadows: false, ..small_config() });
        unshadowed
            .scene_renderer
            .render_editor(&unshadowed.scene, &top_down_camera())
            .unwrap();
        assert!(device(&unshadowed.scene_renderer).texture_unit(1).is_none());
    }

    #[test]
    fn test_outline_keeps_pick_ids() {
        let mut e = editor(small_config());
        let camera = top_down_camera();
        e.scene_renderer.render_editor(&e.scene, &camera).unwrap();
        let before: Vec<PickId> = (0..SIZE as i32).map(|x| e.scene_renderer.pick(x, 32).unwrap()).collect();

        e.scene_renderer.render_outline(&e.scene, Some(e.cube)).unwrap();
        let after: Vec<PickId> = (0..SIZE as i32).map(|x| e.scene_renderer.pick(x, 32).unwrap()).collect();

        assert_eq!(before, after);
        let outline = device(&e.scene_renderer).draw_log().last().cloned().unwrap();
        assert_eq!(outline.shader_name, "outline");
        assert!(outline.fragments > 0);
    }

    #[test]
    fn test_outline_ignores_missing_selection() {
        let mut e = editor(small_config());
        e.scene_renderer.render_editor(&e.scene, &top_down_camera()).unwrap();
        let draws = device(&e.scene_renderer).draw_log().len();

        e.scene_renderer.render_outline(&e.scene, None).unwrap();
        let light = e.scene.find_by_name("Light").unwrap();
        e.scene_renderer.render_outline(&e.scene, Some(light)).unwrap();
        let cube = e.cube;
        e.scene.destroy_entity(cube);
        e.scene_renderer.render_outline(&e.scene, Some(cube)).unwrap();

        assert_eq!(device(&e.scene_renderer).draw_log().len(), draws);
    }

    #[test]
    fn test_viewport_resize() {
        let mut e = editor(small_config());
        e.scene_renderer.on_viewport_resize(0, 10).unwrap();
        assert_eq!(e.scene_renderer.framebuffer().unwrap().width(), SIZE);

        e.scene_renderer.on_viewport_resize(80, 40).unwrap();
        let target = e.scene_renderer.framebuffer().unwrap();
        assert_eq!((target.width(), target.height()), (80, 40));
        assert_eq!(e.scene_renderer.viewport_size(), (80, 40));

        let mut camera = top_down_camera();
        camera.set_viewport_size(80, 40);
        e.scene_renderer.render_editor(&e.scene, &camera).unwrap();
        assert_eq!(e.scene_renderer.pick(79, 39).unwrap(), PickId::NONE);
        assert_eq!(e.scene.entity_from_pick_id(e.scene_renderer.pick(40, 20).unwrap()), Some(e.cube));
    }
}
