//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics. All matrices are
//! column-major and follow OpenGL clip-space conventions: right-handed view
//! space looking down -Z, NDC depth in [-1, 1], Y up.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with the projection and view helpers the renderer needs
pub trait Mat4Ext {
    /// Right-handed perspective projection, depth mapped to NDC [-1, 1]
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed orthographic projection, depth mapped to NDC [-1, 1]
    fn orthographic_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Copy of the matrix with its translation column cleared
    ///
    /// Equivalent to `mat4(mat3(m))`: the upper 3x3 block is kept and the
    /// last column becomes (0, 0, 0, 1).
    fn without_translation(&self) -> Mat4;

    /// Translation column as a 3-vector
    fn translation_part(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // nalgebra's Perspective3 already follows the OpenGL convention
        nalgebra::Perspective3::new(aspect, fov_y, near, far).to_homogeneous()
    }

    fn orthographic_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        nalgebra::Orthographic3::new(left, right, bottom, top, near, far).to_homogeneous()
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(
            &nalgebra::Point3::from(eye),
            &nalgebra::Point3::from(target),
            &up,
        )
    }

    fn without_translation(&self) -> Mat4 {
        let rotation: Mat3 = self.fixed_view::<3, 3>(0, 0).into_owned();
        rotation.to_homogeneous()
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }
}

/// Build a rotation quaternion from XYZ Euler angles in radians
///
/// The resulting rotation applies X first, then Y, then Z, matching
/// `quat(vec3(x, y, z))` semantics of the editor's transform component.
pub fn quat_from_euler(euler: Vec3) -> Quat {
    let qx = Quat::from_axis_angle(&Vec3::x_axis(), euler.x);
    let qy = Quat::from_axis_angle(&Vec3::y_axis(), euler.y);
    let qz = Quat::from_axis_angle(&Vec3::z_axis(), euler.z);
    qz * qy * qx
}

/// Decompose an affine matrix into translation, XYZ Euler rotation (radians) and scale
///
/// Returns `None` when any scale axis is degenerate.
pub fn decompose_transform(matrix: &Mat4) -> Option<(Vec3, Vec3, Vec3)> {
    let translation = matrix.translation_part();

    let columns = [
        Vec3::new(matrix[(0, 0)], matrix[(1, 0)], matrix[(2, 0)]),
        Vec3::new(matrix[(0, 1)], matrix[(1, 1)], matrix[(2, 1)]),
        Vec3::new(matrix[(0, 2)], matrix[(1, 2)], matrix[(2, 2)]),
    ];
    let scale = Vec3::new(columns[0].norm(), columns[1].norm(), columns[2].norm());
    if scale.iter().any(|s| *s <= f32::EPSILON) {
        return None;
    }

    let rotation = Mat3::from_columns(&[
        columns[0] / scale.x,
        columns[1] / scale.y,
        columns[2] / scale.z,
    ]);
    let rotation = nalgebra::Rotation3::from_matrix_unchecked(rotation);
    let (roll, pitch, yaw) = rotation.euler_angles();

    Some((translation, Vec3::new(roll, pitch, yaw), scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_without_translation_clears_last_column() {
        let m = Mat4::new_translation(&Vec3::new(3.0, -2.0, 7.0))
            * Mat4::from_axis_angle(&Vec3::y_axis(), 0.4);
        let stripped = m.without_translation();

        assert_relative_eq!(stripped.column(3).into_owned(), Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_relative_eq!(
            stripped.fixed_view::<3, 3>(0, 0).into_owned(),
            m.fixed_view::<3, 3>(0, 0).into_owned()
        );
    }

    #[test]
    fn test_perspective_maps_near_and_far_planes() {
        let p = Mat4::perspective_gl(utils::deg_to_rad(60.0), 1.5, 0.1, 50.0);

        let near = p * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -50.0, 1.0);

        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_decompose_roundtrip() {
        let position = Vec3::new(1.0, -1.0, 0.5);
        let euler = Vec3::new(0.3, -0.2, 0.1);
        let scale = Vec3::new(2.0, 0.1, 2.0);

        let m = Mat4::new_translation(&position)
            * quat_from_euler(euler).to_homogeneous()
            * Mat4::new_nonuniform_scaling(&scale);

        let (t, r, s) = decompose_transform(&m).expect("non-degenerate");
        assert_relative_eq!(t, position, epsilon = 1e-5);
        assert_relative_eq!(r, euler, epsilon = 1e-4);
        assert_relative_eq!(s, scale, epsilon = 1e-5);
    }

    #[test]
    fn test_decompose_rejects_zero_scale() {
        let m = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 0.0, 1.0));
        assert!(decompose_transform(&m).is_none());
    }
}
