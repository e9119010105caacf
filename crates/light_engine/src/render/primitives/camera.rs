//! # Scene Camera
//!
//! Projection-only camera used to open a scene. The view matrix is supplied
//! separately to [`crate::render::Renderer::begin_scene`], so any pose source
//! (editor orbit, entity transform, gizmo view cube) can drive it.
//!
//! ## Conventions
//! - Right-handed, Y-up view space looking down -Z
//! - Projections map depth to NDC [-1, 1] (OpenGL convention)

use crate::foundation::math::{utils, Mat4, Mat4Ext};

/// Anything that can provide a projection matrix to the renderer
pub trait Projection {
    /// Projection matrix (view space to clip space)
    fn projection_matrix(&self) -> Mat4;
}

/// How a [`Camera`] projects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionKind {
    /// Perspective with a vertical field of view in radians
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
    },
    /// Orthographic with a vertical extent in world units
    Orthographic {
        /// Visible height in world units
        size: f32,
    },
}

/// Camera projection parameters
///
/// # Performance Notes
/// The projection is recomputed on demand; it is cheap next to a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Projection type and its shape parameter
    pub kind: ProjectionKind,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            kind: ProjectionKind::Perspective { fov_y: utils::deg_to_rad(fov_degrees) },
            aspect,
            near,
            far,
        }
    }

    /// Create an orthographic camera showing `size` world units vertically
    pub fn orthographic(size: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            kind: ProjectionKind::Orthographic { size },
            aspect,
            near,
            far,
        }
    }

    /// Update the aspect ratio from a viewport size; zero sizes are ignored
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }
}

impl Projection for Camera {
    fn projection_matrix(&self) -> Mat4 {
        match self.kind {
            ProjectionKind::Perspective { fov_y } => Mat4::perspective_gl(fov_y, self.aspect, self.near, self.far),
            ProjectionKind::Orthographic { size } => {
                let half_h = size * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_gl(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(45.0, 16.0 / 9.0, 0.1, 100.0)
    }
}
