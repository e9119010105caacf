//! Editor layer
//!
//! Owns the scene, the scene renderer and the editor camera, and ties them
//! to the viewport panel: resizes, camera input, per-frame rendering,
//! hover picking under the cursor, click selection, gizmo shortcuts and
//! the selection outline.

use std::path::{Path, PathBuf};

use light_engine::ecs::{Entity, LightComponent, MeshComponent, MeshRendererComponent, TransformComponent};
use light_engine::events::{Event, EventDispatcher, EventKind};
use light_engine::foundation::math::{Mat4, Vec2, Vec3};
use light_engine::foundation::time::Timestep;
use light_engine::input::{InputState, KeyCode, MouseButton};
use light_engine::render::backends::SoftwareBackend;
use light_engine::render::{
    EditorCamera, Framebuffer, FramebufferSpec, MeshLibrary, RenderError, Renderer,
};
use light_engine::scene::{Scene, SceneRenderer, SceneRendererConfig};

use crate::editor_config::{EditorConfig, PROJECT_PATH_KEY};
use crate::gizmo::{GizmoOperation, GizmoState};
use crate::perf_stats::PerfStats;
use crate::project_prompt::ProjectPrompt;
use crate::viewport::ViewportPanel;
use crate::{EditorError, EditorResult};

/// Initial editor framebuffer size, replaced on the first viewport resize
pub const INITIAL_VIEWPORT: (u32, u32) = (1280, 720);

const SURFACE_SHADER: &str = "phong";
const DEFAULT_MESH: &str = "Cube";

/// Main editor layer
pub struct EditorLayer {
    scene_renderer: SceneRenderer,
    scene: Scene,
    meshes: MeshLibrary,
    camera: EditorCamera,

    viewport: ViewportPanel,
    gizmo: GizmoState,
    perf: PerfStats,
    input: InputState,

    config: EditorConfig,
    prompt: ProjectPrompt,

    selection: Option<Entity>,
    hovered: Option<Entity>,
    /// Selected transform when the current gizmo drag began
    drag_start: Option<TransformComponent>,
}

impl EditorLayer {
    /// Create the editor with default scene renderer settings
    pub fn new(renderer: Renderer, config_path: impl Into<PathBuf>) -> EditorResult<Self> {
        Self::with_scene_config(renderer, SceneRendererConfig::default(), config_path)
    }

    /// Create the editor
    ///
    /// Loads the editor config when the file exists and opens the project
    /// prompt when no project path is set. Any resource failure here aborts
    /// start-up.
    pub fn with_scene_config(
        renderer: Renderer,
        scene_config: SceneRendererConfig,
        config_path: impl Into<PathBuf>,
    ) -> EditorResult<Self> {
        let config_path = config_path.into();
        let mut config = EditorConfig::new();
        if config_path.exists() {
            config.load(&config_path)?;
        }

        let mut prompt = ProjectPrompt::new(&config_path);
        if !config.has(PROJECT_PATH_KEY) {
            prompt.open();
        }

        let mut scene_renderer = SceneRenderer::new(renderer, scene_config)?;
        let command = scene_renderer.renderer_mut().command_mut();

        let (width, height) = INITIAL_VIEWPORT;
        let framebuffer = Framebuffer::create(command, FramebufferSpec::editor_viewport(width, height))?;

        let mut meshes = MeshLibrary::new();
        meshes.add_default_meshes(command)?;
        scene_renderer.set_target_framebuffer(framebuffer);

        let scene = default_scene(&scene_renderer, &meshes)?;
        let camera = EditorCamera::new(45.0, 1.6 / 0.9, 0.001, 100.0);

        log::info!("Editor ready ({}x{} viewport)", width, height);
        Ok(Self {
            scene_renderer,
            scene,
            meshes,
            camera,
            viewport: ViewportPanel::new(),
            gizmo: GizmoState::new(),
            perf: PerfStats::new(),
            input: InputState::new(),
            config,
            prompt,
            selection: None,
            hovered: None,
            drag_start: None,
        })
    }

    /// Run one editor frame
    pub fn on_update(&mut self, ts: Timestep) -> EditorResult<()> {
        if let Some((width, height)) = self.viewport.take_resize() {
            self.camera.set_viewport_size(width, height);
            self.scene_renderer.on_viewport_resize(width, height)?;
        }

        self.perf.on_frame(ts);

        let camera_active = self.viewport.is_focused() && !self.gizmo.is_active();
        self.camera.set_input_enabled(camera_active);
        if camera_active {
            self.camera.on_update(ts);
        }

        self.scene_renderer.render_editor(&self.scene, &self.camera)?;
        self.hovered = self.pick_under_cursor()?;

        if self.selection.is_some_and(|e| !self.scene.world().is_alive(e)) {
            self.set_selection(None);
        }
        self.scene_renderer.render_outline(&self.scene, self.selection)?;
        Ok(())
    }

    /// Handle a window/input event; returns true when it was consumed
    pub fn on_event(&mut self, event: &Event) -> bool {
        self.input.on_event(event);

        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch(EventKind::WindowResize, |e| {
            if let Event::WindowResize { width, height } = *e {
                // Minimized windows report zero sizes
                if width > 0 && height > 0 {
                    self.camera.set_viewport_size(width, height);
                }
            }
            false
        });
        dispatcher.dispatch(EventKind::MouseButtonPressed, |e| {
            if matches!(e, Event::MouseButtonPressed(MouseButton::Left)) && !self.gizmo.is_hovered() {
                self.set_selection(self.hovered);
                log::debug!("Selected {:?}", self.selection);
            }
            false
        });
        dispatcher.dispatch(EventKind::KeyPressed, |e| match *e {
            Event::KeyPressed { key, .. } => self.on_key_pressed(key),
            _ => false,
        });

        let consumed = dispatcher.handled();
        self.camera.on_event(event) || consumed
    }

    fn on_key_pressed(&mut self, key: KeyCode) -> bool {
        if key == KeyCode::O && self.input.is_control_pressed() {
            self.prompt.open();
        }

        if self.selection.is_none() {
            return false;
        }
        match GizmoOperation::from_key(key) {
            Some(operation) => {
                self.gizmo.set_operation(operation);
                true
            }
            None => false,
        }
    }

    fn pick_under_cursor(&self) -> EditorResult<Option<Entity>> {
        let Some((x, y)) = self.viewport.to_framebuffer_coords(self.input.mouse_position()) else {
            return Ok(None);
        };
        match self.scene_renderer.pick(x, y) {
            Ok(id) => Ok(self.scene.entity_from_pick_id(id)),
            // Panel and framebuffer can disagree by a pixel while a resize is latched
            Err(RenderError::PixelOutOfBounds { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Record the viewport panel's state for the next frame
    pub fn set_viewport_state(&mut self, position: Vec2, size: Vec2, focused: bool, hovered: bool) {
        self.viewport.set_state(position, size, focused, hovered);
    }

    /// Record what the gizmo widget reported this frame
    ///
    /// Releasing the gizmo ends the current drag.
    pub fn set_gizmo_interaction(&mut self, hovered: bool, using: bool) {
        self.gizmo.set_interaction(hovered, using);
        if !using {
            self.drag_start = None;
        }
    }

    /// Write a gizmo-manipulated matrix into the selected entity's transform
    ///
    /// The first call of a drag records the transform it starts from; snapping
    /// (held control key) rounds the change relative to that start. Returns
    /// false with no selection.
    pub fn manipulate_selection(&mut self, matrix: &Mat4) -> bool {
        let snap = self.input.is_control_pressed();
        let Some(entity) = self.selection else {
            return false;
        };
        let gizmo = self.gizmo;
        let Some(transform) = self.scene.world_mut().get_mut::<TransformComponent>(entity) else {
            return false;
        };
        let start = *self.drag_start.get_or_insert(*transform);
        gizmo.apply_manipulation(transform, &start, matrix, snap)
    }

    /// Adopt a view matrix from the view-cube widget
    pub fn set_camera_view(&mut self, view: &Mat4) {
        self.camera.set_view_matrix(view);
    }

    /// Store the project path entered in the prompt
    pub fn submit_project_path(&mut self, path: &str) -> EditorResult<()> {
        self.prompt.submit(path, &mut self.config)
    }

    /// Write the viewport's color attachment to a PNG file
    pub fn save_viewport_png(&self, path: impl AsRef<Path>) -> EditorResult<()> {
        let framebuffer = self
            .scene_renderer
            .framebuffer()
            .ok_or_else(|| EditorError::MissingResource("editor framebuffer".into()))?;
        let device = self
            .scene_renderer
            .renderer()
            .command()
            .backend::<SoftwareBackend>()
            .ok_or_else(|| EditorError::MissingResource("software device".into()))?;
        let color = framebuffer
            .color_attachment_index(0)
            .ok_or_else(|| EditorError::MissingResource("viewport color attachment".into()))?;

        device.save_attachment_png(framebuffer.handle(), color, path)?;
        Ok(())
    }

    /// Scene being edited
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Scene being edited, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Mesh library
    pub fn meshes(&self) -> &MeshLibrary {
        &self.meshes
    }

    /// Viewport camera
    pub fn camera(&self) -> &EditorCamera {
        &self.camera
    }

    /// Scene renderer
    pub fn scene_renderer(&self) -> &SceneRenderer {
        &self.scene_renderer
    }

    /// Selected entity
    pub fn selection(&self) -> Option<Entity> {
        self.selection
    }

    /// Select an entity, or clear with `None`
    pub fn set_selection(&mut self, entity: Option<Entity>) {
        if entity != self.selection {
            self.drag_start = None;
        }
        self.selection = entity;
    }

    /// Entity under the cursor as of the last frame
    pub fn hovered_entity(&self) -> Option<Entity> {
        self.hovered
    }

    /// Gizmo state
    pub fn gizmo(&self) -> &GizmoState {
        &self.gizmo
    }

    /// Frame statistics
    pub fn perf_stats(&self) -> &PerfStats {
        &self.perf
    }

    /// Frame statistics, mutably (HUD corner menu)
    pub fn perf_stats_mut(&mut self) -> &mut PerfStats {
        &mut self.perf
    }

    /// Editor config
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Project prompt
    pub fn prompt(&self) -> &ProjectPrompt {
        &self.prompt
    }

    /// Viewport panel
    pub fn viewport(&self) -> &ViewportPanel {
        &self.viewport
    }
}

/// Cube at the origin, a flat floor under it and a point light
fn default_scene(scene_renderer: &SceneRenderer, meshes: &MeshLibrary) -> EditorResult<Scene> {
    let cube_mesh = meshes
        .get(DEFAULT_MESH)
        .ok_or_else(|| EditorError::MissingResource(format!("mesh {DEFAULT_MESH:?}")))?;
    let phong = scene_renderer.shaders().require(SURFACE_SHADER)?;

    let mut scene = Scene::new();

    let cube = scene.add_entity("Cube");
    scene.world_mut().insert(cube, MeshComponent::new(cube_mesh));
    scene.world_mut().insert(cube, MeshRendererComponent::new(phong));

    let floor = scene.add_entity("Floor");
    scene.world_mut().insert(
        floor,
        TransformComponent::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::new(2.0, 0.1, 2.0)),
    );
    scene.world_mut().insert(floor, MeshComponent::new(cube_mesh));
    scene.world_mut().insert(floor, MeshRendererComponent::new(phong));

    let light = scene.add_entity("Light");
    scene
        .world_mut()
        .insert(light, TransformComponent::from_position(Vec3::new(-1.0, 2.0, 1.5)));
    scene.world_mut().insert(light, LightComponent::default());

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use light_engine::render::RendererConfig;

    const VIEWPORT: (f32, f32) = (160.0, 90.0);

    fn config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("light_editor_layer_{}_{}.toml", std::process::id(), name))
    }

    fn small_scene_config() -> SceneRendererConfig {
        SceneRendererConfig {
            directional_shadow_size: 64,
            point_shadow_size: 16,
            ..SceneRendererConfig::default()
        }
    }

    fn editor(name: &str) -> EditorLayer {
        let renderer = Renderer::new(Box::new(SoftwareBackend::new()), RendererConfig::default());
        let mut layer = EditorLayer::with_scene_config(renderer, small_scene_config(), config_path(name)).unwrap();
        layer.set_viewport_state(Vec2::zeros(), Vec2::new(VIEWPORT.0, VIEWPORT.1), true, true);
        layer
    }

    fn hover_center(layer: &mut EditorLayer) {
        layer.on_event(&Event::MouseMoved { x: 80.5, y: 45.5 });
        layer.on_update(Timestep::from_millis(16.0)).unwrap();
    }

    fn cube(layer: &EditorLayer) -> Entity {
        layer.scene().find_by_name("Cube").unwrap()
    }

    #[test]
    fn test_default_scene() {
        let layer = editor("default_scene");
        let scene = layer.scene();

        for name in ["Cube", "Floor", "Light"] {
            assert!(scene.find_by_name(name).is_some(), "missing {name}");
        }
        assert_eq!(scene.drawables().count(), 2);
        assert_eq!(scene.collect_lights().points.len(), 1);
        assert!(layer.meshes().get("None").is_some());
    }

    #[test]
    fn test_prompt_opens_without_project() {
        let layer = editor("no_project");
        assert!(layer.prompt().is_open());

        let path = config_path("with_project");
        let mut config = EditorConfig::new();
        config.set_string(PROJECT_PATH_KEY, "projects/demo");
        config.save(&path).unwrap();
        let renderer = Renderer::new(Box::new(SoftwareBackend::new()), RendererConfig::default());
        let layer = EditorLayer::with_scene_config(renderer, small_scene_config(), &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!layer.prompt().is_open());
        assert_eq!(layer.config().get_string(PROJECT_PATH_KEY), Some("projects/demo"));
    }

    #[test]
    fn test_first_frame_resizes_framebuffer() {
        let mut layer = editor("resize");
        layer.on_update(Timestep::from_millis(16.0)).unwrap();

        let framebuffer = layer.scene_renderer().framebuffer().unwrap();
        assert_eq!((framebuffer.width(), framebuffer.height()), (160, 90));
    }

    #[test]
    fn test_hover_and_click_select() {
        let mut layer = editor("select");
        hover_center(&mut layer);
        assert_eq!(layer.hovered_entity(), Some(cube(&layer)));

        layer.on_event(&Event::MouseButtonPressed(MouseButton::Left));
        assert_eq!(layer.selection(), Some(cube(&layer)));

        // Clicking empty space clears the selection
        layer.on_event(&Event::MouseMoved { x: 1.0, y: 1.0 });
        layer.on_update(Timestep::from_millis(16.0)).unwrap();
        assert_eq!(layer.hovered_entity(), None);
        layer.on_event(&Event::MouseButtonPressed(MouseButton::Left));
        assert_eq!(layer.selection(), None);
    }

    #[test]
    fn test_click_over_gizmo_keeps_selection() {
        let mut layer = editor("gizmo_click");
        hover_center(&mut layer);
        let floor = layer.scene().find_by_name("Floor").unwrap();
        layer.set_selection(Some(floor));

        layer.set_gizmo_interaction(true, false);
        layer.on_event(&Event::MouseButtonPressed(MouseButton::Left));
        assert_eq!(layer.selection(), Some(floor));
    }

    #[test]
    fn test_gizmo_shortcuts_need_selection() {
        let mut layer = editor("shortcuts");
        assert!(!layer.on_event(&Event::KeyPressed { key: KeyCode::E, repeat: false }));
        assert_eq!(layer.gizmo().operation(), GizmoOperation::Translate);

        layer.set_selection(Some(cube(&layer)));
        assert!(layer.on_event(&Event::KeyPressed { key: KeyCode::E, repeat: false }));
        assert_eq!(layer.gizmo().operation(), GizmoOperation::Rotate);
        assert!(layer.on_event(&Event::KeyPressed { key: KeyCode::T, repeat: false }));
        assert_eq!(layer.gizmo().operation(), GizmoOperation::Universal);
    }

    #[test]
    fn test_ctrl_o_opens_prompt() {
        let mut layer = editor("ctrl_o");
        layer.submit_project_path("projects/demo").unwrap();
        std::fs::remove_file(config_path("ctrl_o")).ok();
        assert!(!layer.prompt().is_open());

        layer.on_event(&Event::KeyPressed { key: KeyCode::O, repeat: false });
        assert!(!layer.prompt().is_open());

        layer.on_event(&Event::KeyPressed { key: KeyCode::LeftControl, repeat: false });
        layer.on_event(&Event::KeyPressed { key: KeyCode::O, repeat: false });
        assert!(layer.prompt().is_open());
    }

    #[test]
    fn test_selection_outline_drawn_last() {
        let mut layer = editor("outline");
        layer.set_selection(Some(cube(&layer)));
        layer.on_update(Timestep::from_millis(16.0)).unwrap();

        let device = layer.scene_renderer().renderer().command().backend::<SoftwareBackend>().unwrap();
        let last = device.draw_log().last().unwrap();
        assert_eq!(last.shader_name, "outline");
    }

    #[test]
    fn test_despawned_selection_is_cleared() {
        let mut layer = editor("despawn");
        let cube = cube(&layer);
        layer.set_selection(Some(cube));
        layer.scene_mut().destroy_entity(cube);

        layer.on_update(Timestep::from_millis(16.0)).unwrap();
        assert_eq!(layer.selection(), None);
    }

    #[test]
    fn test_manipulate_selection_with_snap() {
        let mut layer = editor("manipulate");
        assert!(!layer.manipulate_selection(&Mat4::identity()));

        let cube = cube(&layer);
        layer.set_selection(Some(cube));
        layer.on_event(&Event::KeyPressed { key: KeyCode::LeftControl, repeat: false });
        assert!(layer.manipulate_selection(&Mat4::new_translation(&Vec3::new(1.2, 0.0, -0.4))));

        let transform = layer.scene().world().get::<TransformComponent>(cube).unwrap();
        approx::assert_relative_eq!(transform.position, Vec3::new(1.0, 0.0, -0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_snapped_drag_is_relative_to_drag_start() {
        let mut layer = editor("drag_start");
        let floor = layer.scene().find_by_name("Floor").unwrap();
        let original = *layer.scene().world().get::<TransformComponent>(floor).unwrap();
        layer.set_selection(Some(floor));
        layer.on_event(&Event::KeyPressed { key: KeyCode::LeftControl, repeat: false });

        // Scaling in place never collapses the thin axis
        layer.on_event(&Event::KeyPressed { key: KeyCode::R, repeat: false });
        layer.set_gizmo_interaction(true, true);
        assert!(layer.manipulate_selection(&original.to_matrix()));
        assert!(layer.manipulate_selection(&original.to_matrix()));
        let transform = *layer.scene().world().get::<TransformComponent>(floor).unwrap();
        approx::assert_relative_eq!(transform.scale, original.scale, epsilon = 1e-5);
        layer.set_gizmo_interaction(false, false);

        // Each update of one drag snaps against where the drag began
        layer.on_event(&Event::KeyPressed { key: KeyCode::W, repeat: false });
        layer.set_gizmo_interaction(true, true);
        let lifted = |dy: f32| Mat4::new_translation(&Vec3::new(0.0, dy, 0.0)) * original.to_matrix();
        layer.manipulate_selection(&lifted(0.2));
        layer.manipulate_selection(&lifted(0.8));
        let transform = *layer.scene().world().get::<TransformComponent>(floor).unwrap();
        approx::assert_relative_eq!(transform.position.y, original.position.y + 1.0, epsilon = 1e-5);
        approx::assert_relative_eq!(transform.scale, original.scale, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_window_resize_ignored() {
        let mut layer = editor("window_resize");
        let aspect = layer.camera().aspect();
        assert!(!layer.on_event(&Event::WindowResize { width: 0, height: 0 }));
        approx::assert_relative_eq!(layer.camera().aspect(), aspect);
    }
}
