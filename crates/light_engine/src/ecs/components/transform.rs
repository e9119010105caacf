//! Transform component for the ECS system
//!
//! Rotation is stored as XYZ Euler angles in radians because that is what
//! the gizmo decomposes into and what the inspector edits.

use crate::ecs::Component;
use crate::foundation::math::{decompose_transform, quat_from_euler, Mat4, Vec3};

/// ECS Transform component
///
/// Local-to-world transform of a scene entity (there is no hierarchy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    /// World space position (Y-up right-handed)
    pub position: Vec3,

    /// XYZ Euler rotation in radians
    pub rotation: Vec3,

    /// Per-axis scale factors
    pub scale: Vec3,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder pattern: Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder pattern: Set rotation from Euler angles (radians, XYZ order)
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Convert to transformation matrix (T * R * S)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * quat_from_euler(self.rotation).to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Overwrite position, rotation and scale from an affine matrix
    ///
    /// Returns false (leaving the component untouched) when the matrix has a
    /// degenerate scale axis.
    pub fn set_from_matrix(&mut self, matrix: &Mat4) -> bool {
        match decompose_transform(matrix) {
            Some((position, rotation, scale)) => {
                self.position = position;
                self.rotation = rotation;
                self.scale = scale;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    #[test]
    fn test_to_matrix_applies_scale_then_translation() {
        let t = TransformComponent::from_position(Vec3::new(0.0, -1.0, 0.0))
            .with_scale(Vec3::new(2.0, 0.1, 2.0));

        let corner = t.to_matrix() * Vec4::new(0.5, 0.5, 0.5, 1.0);
        assert_relative_eq!(corner, Vec4::new(1.0, -0.95, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_set_from_matrix_roundtrip() {
        let source = TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Vec3::new(0.0, 0.5, 0.0))
            .with_scale(Vec3::new(1.5, 1.5, 1.5));

        let mut target = TransformComponent::default();
        assert!(target.set_from_matrix(&source.to_matrix()));

        assert_relative_eq!(target.position, source.position, epsilon = 1e-5);
        assert_relative_eq!(target.rotation, source.rotation, epsilon = 1e-4);
        assert_relative_eq!(target.scale, source.scale, epsilon = 1e-5);
    }
}
