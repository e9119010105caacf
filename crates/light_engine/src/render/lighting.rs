//! Light records submitted to the renderer
//!
//! Three kinds, each with the light-space matrices its shadow pass needs.
//! Upload caps match the array sizes declared by the surface shader.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Maximum point lights uploaded per draw
pub const MAX_POINT_LIGHTS: usize = 8;
/// Maximum spot lights uploaded per draw
pub const MAX_SPOT_LIGHTS: usize = 4;
/// Maximum directional lights uploaded per draw
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Far plane of the omnidirectional shadow cube, also uploaded as `far_plane`
pub const POINT_SHADOW_FAR_PLANE: f32 = 25.0;
/// Near plane of the omnidirectional shadow cube
pub const POINT_SHADOW_NEAR_PLANE: f32 = 0.1;

/// Half extent of the directional shadow frustum
const DIRECTIONAL_SHADOW_EXTENT: f32 = 10.0;
/// Distance from the shadow focus back to the virtual light eye
const DIRECTIONAL_SHADOW_DISTANCE: f32 = 15.0;

/// Omnidirectional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World position
    pub position: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Distance at which the light fades to zero
    pub range: f32,
}

impl PointLight {
    /// White light at `position`
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            range: 20.0,
        }
    }

    /// View-projection for each cube face, in +X, -X, +Y, -Y, +Z, -Z order
    pub fn shadow_matrices(&self) -> [Mat4; 6] {
        let projection = Mat4::perspective_gl(
            utils::deg_to_rad(90.0),
            1.0,
            POINT_SHADOW_NEAR_PLANE,
            POINT_SHADOW_FAR_PLANE,
        );
        let p = self.position;
        let faces = [
            (Vec3::x(), -Vec3::y()),
            (-Vec3::x(), -Vec3::y()),
            (Vec3::y(), Vec3::z()),
            (-Vec3::y(), -Vec3::z()),
            (Vec3::z(), -Vec3::y()),
            (-Vec3::z(), -Vec3::y()),
        ];
        faces.map(|(dir, up)| projection * Mat4::look_at(p, p + dir, up))
    }
}

/// Cone light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    /// World position
    pub position: Vec3,
    /// Direction the cone points in
    pub direction: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Far distance of the shadow frustum
    pub range: f32,
    /// Full-intensity half angle in degrees
    pub inner_cutoff: f32,
    /// Zero-intensity half angle in degrees
    pub outer_cutoff: f32,
}

impl SpotLight {
    /// Cosine of the inner half angle, as the shader expects
    pub fn cos_inner(&self) -> f32 {
        utils::deg_to_rad(self.inner_cutoff).cos()
    }

    /// Cosine of the outer half angle, as the shader expects
    pub fn cos_outer(&self) -> f32 {
        utils::deg_to_rad(self.outer_cutoff).cos()
    }

    /// Perspective view-projection from the light along its cone
    pub fn space_matrix(&self) -> Mat4 {
        let direction = self.direction.normalize();
        let projection = Mat4::perspective_gl(
            utils::deg_to_rad(self.outer_cutoff * 2.0).clamp(0.01, 3.1),
            1.0,
            0.1,
            self.range.max(0.2),
        );
        projection * Mat4::look_at(self.position, self.position + direction, up_for(direction))
    }
}

/// Parallel-ray light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Point the shadow frustum is centered on
    pub position: Vec3,
    /// Direction the light travels in
    pub direction: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl DirectionalLight {
    /// White light travelling along `direction`, shadow centered at the origin
    pub fn new(direction: Vec3) -> Self {
        Self {
            position: Vec3::zeros(),
            direction,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }

    /// Orthographic projection times look-at from a virtual eye up-light
    pub fn space_matrix(&self) -> Mat4 {
        let direction = self.direction.normalize();
        let eye = self.position - direction * DIRECTIONAL_SHADOW_DISTANCE;
        let e = DIRECTIONAL_SHADOW_EXTENT;
        let projection = Mat4::orthographic_gl(-e, e, -e, e, 0.1, DIRECTIONAL_SHADOW_DISTANCE * 2.0);
        projection * Mat4::look_at(eye, self.position, up_for(direction))
    }
}

/// World up, unless the direction is (nearly) vertical
fn up_for(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 {
        Vec3::z()
    } else {
        Vec3::y()
    }
}
