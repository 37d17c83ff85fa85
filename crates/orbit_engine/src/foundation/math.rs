//! Mathematical types and matrix helpers
//!
//! Thin aliases over nalgebra plus the handful of matrix constructors the
//! renderer needs. Projection math targets Vulkan clip space (depth in [0, 1],
//! Y down) through the `P * X * V` chain described on [`Mat4Ext`].

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type (column-major storage, matching GLSL)
pub type Mat4 = Matrix4<f32>;

/// Mathematical constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Utility functions
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

/// Matrix constructors used by the camera and frame renderer
pub trait Mat4Ext {
    /// Rotation of `angle` radians about the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Translation by `offset`
    fn translation(offset: Vec3) -> Mat4;

    /// Uniform scale by `factor`
    fn uniform_scale(factor: f32) -> Mat4;

    /// Perspective projection into Vulkan depth range
    ///
    /// `fov_y` is in radians. View space is expected to look down +Z with Y
    /// down, which is what [`Mat4Ext::vulkan_coordinate_transform`] produces
    /// from a right-handed, Y-up view matrix.
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Axis flip from right-handed Y-up view space into Vulkan's Y-down, Z-forward space
    fn vulkan_coordinate_transform() -> Mat4;

    /// Copy of the matrix with its translation column cleared
    fn without_translation(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn translation(offset: Vec3) -> Mat4 {
        Mat4::new_translation(&offset)
    }

    fn uniform_scale(factor: f32) -> Mat4 {
        Mat4::new_scaling(factor)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * Mat4::new_translation(&-eye)
    }

    fn vulkan_coordinate_transform() -> Mat4 {
        Mat4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, -1.0, 0.0, 0.0,
            0.0, 0.0, -1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn without_translation(&self) -> Mat4 {
        let mut result = *self;
        result[(0, 3)] = 0.0;
        result[(1, 3)] = 0.0;
        result[(2, 3)] = 0.0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_deg_rad_roundtrip() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI);
        assert_relative_eq!(utils::rad_to_deg(utils::deg_to_rad(45.0)), 45.0, epsilon = 1e-5);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(0.0, 0.0, -5.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());

        let eye_in_view = view.transform_point(&eye.into());
        assert_relative_eq!(eye_in_view.coords, Vec3::zeros(), epsilon = 1e-6);

        // The target ends up straight ahead, on -Z in right-handed view space
        let target_in_view = view.transform_point(&Vec3::zeros().into());
        assert_relative_eq!(target_in_view.coords, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_depth_range() {
        let near = 0.1;
        let far = 100.0;
        let proj = Mat4::perspective(utils::deg_to_rad(60.0), 1.0, near, far);

        let at_near = proj * Vec4::new(0.0, 0.0, near, 1.0);
        let at_far = proj * Vec4::new(0.0, 0.0, far, 1.0);

        assert_relative_eq!(at_near.z / at_near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(at_far.z / at_far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_model_composition_order() {
        // rotate * translate * scale: the offset is rotated, the scale is not
        let model = Mat4::rotation_y(utils::deg_to_rad(90.0))
            * Mat4::translation(Vec3::new(10.0, 0.0, 0.0))
            * Mat4::uniform_scale(0.5);

        let origin = model.transform_point(&Vec3::zeros().into());
        assert_relative_eq!(origin.coords, Vec3::new(0.0, 0.0, -10.0), epsilon = 1e-4);

        let unit_x = model.transform_vector(&Vec3::x());
        assert_relative_eq!(unit_x.norm(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_without_translation_keeps_rotation() {
        let m = Mat4::rotation_y(0.3) * Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        let stripped = m.without_translation();

        assert_relative_eq!(
            stripped.transform_point(&Vec3::zeros().into()).coords,
            Vec3::zeros()
        );
        assert_relative_eq!(
            stripped.fixed_view::<3, 3>(0, 0).into_owned(),
            m.fixed_view::<3, 3>(0, 0).into_owned()
        );
    }
}
