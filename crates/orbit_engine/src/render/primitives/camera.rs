//! # First-person camera
//!
//! Orientation is stored as yaw and pitch in degrees; the facing direction is
//! derived from them after every change, so it is always unit length and never
//! drifts out of sync.
//!
//! ## Coordinate System
//! World space is right-handed with Y up. Yaw 0 faces +X and yaw 90 faces +Z.
//! [`Camera::view_matrix`] is a standard right-handed look-at, and
//! [`Camera::projection_matrix`] maps that view space straight to Vulkan clip
//! space (Y down, depth in `[0, 1]`).

use crate::config::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Pitch limit in degrees, short of straight up or down
pub const PITCH_LIMIT: f32 = 89.0;

/// Movement directions relative to the camera's facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    /// Along the facing direction
    Forward,
    /// Against the facing direction
    Backward,
    /// Strafe left
    Left,
    /// Strafe right
    Right,
}

/// First-person perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clipping plane distance
    pub near: f32,
    /// Far clipping plane distance
    pub far: f32,
    /// World units per movement step
    pub move_speed: f32,
    /// Degrees of rotation per unit of mouse movement
    pub mouse_sensitivity: f32,
}

impl Camera {
    /// Create a camera from configuration
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            position: config.start_position,
            front: Vec3::z(),
            up: Vec3::y(),
            yaw: config.yaw,
            pitch: config.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov: config.fov,
            aspect,
            near: config.near,
            far: config.far,
            move_speed: config.speed,
            mouse_sensitivity: config.sensitivity,
        };
        camera.update_front();
        camera
    }

    /// Unit facing direction
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// World up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Yaw in degrees
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees, always within `[-89, 89]`
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Unit vector pointing to the camera's right
    pub fn right(&self) -> Vec3 {
        self.front.cross(&self.up).normalize()
    }

    /// Step one `move_speed` in `direction`
    pub fn apply_movement(&mut self, direction: Movement) {
        let step = match direction {
            Movement::Forward => self.front * self.move_speed,
            Movement::Backward => -self.front * self.move_speed,
            Movement::Right => self.right() * self.move_speed,
            Movement::Left => -self.right() * self.move_speed,
        };
        self.position += step;
        log::trace!("Camera moved {:?} to {:?}", direction, self.position);
    }

    /// Turn by mouse offsets scaled by `sensitivity`
    ///
    /// Positive `dx` turns right, positive `dy` looks up.
    pub fn apply_look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.pitch = (self.pitch + dy * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_front();
        log::trace!("Camera yaw {:.2} pitch {:.2}", self.yaw, self.pitch);
    }

    /// Update the aspect ratio after a resize
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Right-handed view matrix looking along `front`
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection into Vulkan clip space
    ///
    /// Includes the Y and Z flip from right-handed view space, so shaders use
    /// `projection * view * model` with no further correction.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(self.fov), self.aspect, self.near, self.far)
            * Mat4::vulkan_coordinate_transform()
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (utils::deg_to_rad(self.yaw), utils::deg_to_rad(self.pitch));
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn start_camera() -> Camera {
        Camera::from_config(&CameraConfig::default(), 800.0 / 600.0)
    }

    #[test]
    fn test_initial_state_faces_origin() {
        let camera = start_camera();
        assert_relative_eq!(camera.yaw(), 90.0);
        assert_relative_eq!(camera.pitch(), 0.0);
        assert_relative_eq!(camera.up(), Vec3::y());
        assert_relative_eq!(camera.front(), Vec3::z(), epsilon = 1e-6);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn test_forward_step() {
        let mut camera = start_camera();
        camera.apply_movement(Movement::Forward);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -4.9), epsilon = 1e-6);

        camera.apply_movement(Movement::Backward);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_strafe_directions() {
        // Facing +Z with +Y up, cross(front, up) is -X
        let mut camera = start_camera();
        camera.apply_movement(Movement::Right);
        assert_relative_eq!(camera.position, Vec3::new(-0.1, 0.0, -5.0), epsilon = 1e-6);

        camera.apply_movement(Movement::Left);
        camera.apply_movement(Movement::Left);
        assert_relative_eq!(camera.position, Vec3::new(0.1, 0.0, -5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_clamps() {
        let mut camera = start_camera();
        camera.apply_look(0.0, 100.0, 1.0);
        assert_relative_eq!(camera.pitch(), 89.0);

        camera.apply_look(0.0, -1000.0, 1.0);
        assert_relative_eq!(camera.pitch(), -89.0);
    }

    #[test]
    fn test_front_stays_unit_length() {
        let mut camera = start_camera();
        let offsets = [(13.0, 7.5), (-250.0, 40.0), (0.3, -0.2), (720.0, 1000.0), (-1.0, -3000.0)];
        for (dx, dy) in offsets {
            camera.apply_look(dx, dy, 0.1);
            assert_relative_eq!(camera.front().norm(), 1.0, epsilon = 1e-6);
            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&camera.pitch()));
        }
    }

    #[test]
    fn test_look_right_turns_toward_positive_yaw() {
        let mut camera = start_camera();
        camera.apply_look(900.0, 0.0, 0.1);
        // Yaw 180 faces -X
        assert_relative_eq!(camera.front(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_matrices_are_idempotent() {
        let mut camera = start_camera();
        camera.apply_look(12.0, -4.0, 0.1);
        assert_eq!(camera.view_matrix(), camera.view_matrix());
        assert_eq!(camera.projection_matrix(), camera.projection_matrix());
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let camera = start_camera();
        let clip = camera.projection_matrix() * camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.xyz() / clip.w;

        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_world_up_maps_to_screen_top() {
        let camera = start_camera();
        let clip = camera.projection_matrix() * camera.view_matrix() * Vec4::new(0.0, 1.0, 0.0, 1.0);
        // Vulkan NDC has Y pointing down
        assert!(clip.y / clip.w < 0.0);
    }

    #[test]
    fn test_aspect_update() {
        let mut camera = start_camera();
        let before = camera.projection_matrix();
        camera.set_aspect_ratio(2.0);
        assert_ne!(before, camera.projection_matrix());
        assert_relative_eq!(camera.aspect, 2.0);
    }
}
