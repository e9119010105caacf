//! # Editor Orbit Camera
//!
//! Orbits a focal point at a distance. Input arrives as events and is
//! accumulated; [`EditorCamera::on_update`] applies the accumulated orbit,
//! pan and zoom once per frame.
//!
//! ## Controls
//! - Right drag, or Alt + left drag: orbit
//! - Middle drag: pan the focal point
//! - Scroll: zoom (dolly towards the focal point)

use approx::relative_eq;

use crate::events::Event;
use crate::foundation::math::{quat_from_euler, utils, Mat4, Mat4Ext, Quat, Vec2, Vec3};
use crate::foundation::time::Timestep;
use crate::input::{KeyCode, MouseButton};
use crate::render::primitives::camera::Projection;

/// Mouse movement in pixels is scaled by this before use
const MOUSE_DELTA_SCALE: f32 = 0.003;
const ROTATION_SPEED: f32 = 0.8;
const SCROLL_ZOOM_SCALE: f32 = 0.1;
const MIN_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
struct HeldInput {
    left: bool,
    middle: bool,
    right: bool,
    alt: bool,
}

/// Orbit camera used by the editor viewport
#[derive(Debug, Clone)]
pub struct EditorCamera {
    fov_deg: f32,
    aspect: f32,
    near: f32,
    far: f32,

    focal_point: Vec3,
    distance: f32,
    pitch: f32,
    yaw: f32,

    viewport_width: f32,
    viewport_height: f32,

    position: Vec3,
    view: Mat4,
    projection: Mat4,

    input_enabled: bool,
    held: HeldInput,
    last_mouse: Option<Vec2>,
    pending_orbit: Vec2,
    pending_pan: Vec2,
    pending_zoom: f32,
}

impl EditorCamera {
    /// Create a camera ten units in front of the origin looking down -Z
    ///
    /// # Arguments
    /// * `fov_deg` - Vertical field of view in degrees
    /// * `aspect` - Initial aspect ratio
    /// * `near`, `far` - Clip plane distances
    pub fn new(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_deg,
            aspect,
            near,
            far,
            focal_point: Vec3::zeros(),
            distance: 10.0,
            pitch: 0.0,
            yaw: 0.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            position: Vec3::zeros(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            input_enabled: true,
            held: HeldInput::default(),
            last_mouse: None,
            pending_orbit: Vec2::zeros(),
            pending_pan: Vec2::zeros(),
            pending_zoom: 0.0,
        };
        camera.update_projection();
        camera.update_view();
        camera
    }

    /// Apply input accumulated since the last update
    pub fn on_update(&mut self, ts: Timestep) {
        let orbit = std::mem::take(&mut self.pending_orbit);
        let pan = std::mem::take(&mut self.pending_pan);
        let zoom = std::mem::take(&mut self.pending_zoom);

        if pan != Vec2::zeros() {
            self.mouse_pan(pan);
        }
        if orbit != Vec2::zeros() {
            self.mouse_rotate(orbit);
        }
        if zoom != 0.0 {
            self.mouse_zoom(zoom);
        }

        log::trace!("Editor camera update ({:.2} ms)", ts.millis());
        self.update_view();
    }

    /// Feed a window/input event; returns true when it moved the camera
    ///
    /// Button and modifier state is always tracked; motion is only
    /// accumulated while input is enabled.
    pub fn on_event(&mut self, event: &Event) -> bool {
        match *event {
            Event::MouseScrolled { y_offset, .. } => {
                if !self.input_enabled {
                    return false;
                }
                self.pending_zoom += y_offset * SCROLL_ZOOM_SCALE;
                true
            }
            Event::MouseButtonPressed(button) => {
                self.set_button(button, true);
                false
            }
            Event::MouseButtonReleased(button) => {
                self.set_button(button, false);
                false
            }
            Event::KeyPressed { key: KeyCode::LeftAlt, .. } => {
                self.held.alt = true;
                false
            }
            Event::KeyReleased { key: KeyCode::LeftAlt } => {
                self.held.alt = false;
                false
            }
            Event::MouseMoved { x, y } => {
                let mouse = Vec2::new(x, y);
                let delta = self.last_mouse.map_or(Vec2::zeros(), |last| (mouse - last) * MOUSE_DELTA_SCALE);
                self.last_mouse = Some(mouse);

                if !self.input_enabled {
                    return false;
                }
                if self.held.middle {
                    self.pending_pan += delta;
                    true
                } else if self.held.right || (self.held.left && self.held.alt) {
                    self.pending_orbit += delta;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Update aspect ratio and projection; zero sizes are ignored
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport_width = width as f32;
        self.viewport_height = height as f32;

        let aspect = self.viewport_width / self.viewport_height;
        if relative_eq!(aspect, self.aspect) {
            return;
        }
        self.aspect = aspect;
        self.update_projection();
    }

    /// Adopt an externally manipulated view (view-cube widget)
    ///
    /// Position, pitch and yaw are derived from the matrix; the orbit
    /// distance is kept, so the focal point moves. Roll is discarded.
    pub fn set_view_matrix(&mut self, view: &Mat4) {
        let Some(inverse) = view.try_inverse() else {
            log::warn!("Ignoring non-invertible view matrix");
            return;
        };

        let position = inverse.translation_part();
        let right = Vec3::new(inverse[(0, 0)], inverse[(1, 0)], inverse[(2, 0)]).normalize();
        let forward = -Vec3::new(inverse[(0, 2)], inverse[(1, 2)], inverse[(2, 2)]).normalize();

        // Yaw from the right vector stays defined when looking straight up or down
        self.pitch = (-forward.y).clamp(-1.0, 1.0).asin();
        self.yaw = right.z.atan2(right.x);
        self.focal_point = position + forward * self.distance;
        self.update_view();
    }

    /// Enable or disable accumulation of mouse input
    ///
    /// Disabling also drops any input accumulated but not yet applied.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        if !enabled {
            self.pending_orbit = Vec2::zeros();
            self.pending_pan = Vec2::zeros();
            self.pending_zoom = 0.0;
        }
    }

    /// Whether mouse input is accumulated
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Projection times view
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Orbit center
    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    /// Distance from the focal point
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Set the orbit distance (clamped to the minimum)
    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.max(MIN_DISTANCE);
        self.update_view();
    }

    /// Pitch in radians; positive looks down
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Yaw in radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Aspect ratio
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Camera orientation
    pub fn orientation(&self) -> Quat {
        quat_from_euler(Vec3::new(-self.pitch, -self.yaw, 0.0))
    }

    /// Direction the camera looks in
    pub fn forward_direction(&self) -> Vec3 {
        self.orientation() * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Camera right vector
    pub fn right_direction(&self) -> Vec3 {
        self.orientation() * Vec3::new(1.0, 0.0, 0.0)
    }

    /// Camera up vector
    pub fn up_direction(&self) -> Vec3 {
        self.orientation() * Vec3::new(0.0, 1.0, 0.0)
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.held.left = down,
            MouseButton::Middle => self.held.middle = down,
            MouseButton::Right => self.held.right = down,
            MouseButton::Other(_) => {}
        }
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective_gl(utils::deg_to_rad(self.fov_deg), self.aspect, self.near, self.far);
    }

    fn update_view(&mut self) {
        let orientation = self.orientation();
        self.position = self.focal_point - self.forward_direction() * self.distance;
        self.view = orientation.inverse().to_homogeneous() * Mat4::new_translation(&-self.position);
    }

    fn pan_speed(&self) -> (f32, f32) {
        // Quadratic fit that keeps panning roughly glued to the cursor
        let factor = |extent: f32| {
            let v = (extent / 1000.0).min(2.4);
            0.0366 * v * v - 0.1778 * v + 0.3021
        };
        (factor(self.viewport_width), factor(self.viewport_height))
    }

    fn zoom_speed(&self) -> f32 {
        let distance = (self.distance * 0.2).max(0.0);
        (distance * distance).min(100.0)
    }

    fn mouse_pan(&mut self, delta: Vec2) {
        let (x_speed, y_speed) = self.pan_speed();
        self.focal_point += -self.right_direction() * delta.x * x_speed * self.distance;
        self.focal_point += self.up_direction() * delta.y * y_speed * self.distance;
    }

    fn mouse_rotate(&mut self, delta: Vec2) {
        let yaw_sign = if self.up_direction().y < 0.0 { -1.0 } else { 1.0 };
        self.yaw += yaw_sign * delta.x * ROTATION_SPEED;
        self.pitch += delta.y * ROTATION_SPEED;
    }

    fn mouse_zoom(&mut self, delta: f32) {
        self.distance -= delta * self.zoom_speed();
        if self.distance < MIN_DISTANCE {
            self.focal_point += self.forward_direction();
            self.distance = MIN_DISTANCE;
        }
    }
}

impl Projection for EditorCamera {
    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn camera() -> EditorCamera {
        EditorCamera::new(45.0, 1.6 / 0.9, 0.001, 100.0)
    }

    #[test]
    fn test_default_pose_looks_down_negative_z() {
        let camera = camera();
        assert_relative_eq!(camera.position(), Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-5);
        assert_relative_eq!(camera.forward_direction(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);

        let origin = camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vec4::new(0.0, 0.0, -10.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_set_view_matrix_from_look_at() {
        let mut camera = camera();
        let eye = Vec3::new(0.0, 5.0, 0.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0));

        camera.set_view_matrix(&view);

        assert_relative_eq!(camera.position(), eye, epsilon = 1e-4);
        assert_relative_eq!(camera.pitch(), utils::deg_to_rad(90.0), epsilon = 1e-3);
        assert_relative_eq!(camera.view_matrix(), view, epsilon = 1e-3);
        assert_relative_eq!(camera.distance(), 10.0);
    }

    #[test]
    fn test_view_roundtrip_after_orbit() {
        let mut camera = camera();
        camera.on_event(&Event::MouseButtonPressed(MouseButton::Right));
        camera.on_event(&Event::MouseMoved { x: 100.0, y: 100.0 });
        camera.on_event(&Event::MouseMoved { x: 220.0, y: 160.0 });
        camera.on_update(Timestep::from_millis(16.0));

        let (pitch, yaw) = (camera.pitch(), camera.yaw());
        assert!(yaw > 0.0 && pitch > 0.0);

        let view = camera.view_matrix();
        let mut copy = EditorCamera::new(45.0, 1.0, 0.1, 100.0);
        copy.set_view_matrix(&view);
        assert_relative_eq!(copy.pitch(), pitch, epsilon = 1e-4);
        assert_relative_eq!(copy.yaw(), yaw, epsilon = 1e-4);
    }

    #[test]
    fn test_disabled_input_is_not_accumulated() {
        let mut camera = camera();
        camera.set_input_enabled(false);
        camera.on_event(&Event::MouseButtonPressed(MouseButton::Middle));
        camera.on_event(&Event::MouseMoved { x: 0.0, y: 0.0 });
        assert!(!camera.on_event(&Event::MouseMoved { x: 300.0, y: 0.0 }));
        assert!(!camera.on_event(&Event::MouseScrolled { x_offset: 0.0, y_offset: 3.0 }));

        let before = camera.view_matrix();
        camera.on_update(Timestep::from_millis(16.0));
        assert_relative_eq!(camera.view_matrix(), before);
    }

    #[test]
    fn test_zoom_clamps_to_minimum_distance() {
        let mut camera = camera();
        camera.on_event(&Event::MouseScrolled { x_offset: 0.0, y_offset: 100.0 });
        camera.on_update(Timestep::from_millis(16.0));

        assert_relative_eq!(camera.distance(), MIN_DISTANCE);
        assert!(camera.focal_point().z < 0.0);
    }

    #[test]
    fn test_viewport_size_updates_aspect() {
        let mut camera = camera();
        camera.set_viewport_size(0, 100);
        assert_relative_eq!(camera.aspect(), 1.6 / 0.9);

        camera.set_viewport_size(400, 400);
        assert_relative_eq!(camera.aspect(), 1.0);
    }
}
