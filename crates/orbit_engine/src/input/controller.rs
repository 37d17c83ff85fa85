//! Keyboard and mouse camera control

use super::{InputProvider, KeyCode, MouseTracker};
use crate::render::{Camera, Movement};

/// Maps a held key to a camera movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// Key to watch
    pub key: KeyCode,
    /// Movement applied once per frame while held
    pub movement: Movement,
}

/// WASD: W forward, S backward, A strafe left, D strafe right
pub fn default_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding { key: KeyCode::W, movement: Movement::Forward },
        KeyBinding { key: KeyCode::S, movement: Movement::Backward },
        KeyBinding { key: KeyCode::A, movement: Movement::Left },
        KeyBinding { key: KeyCode::D, movement: Movement::Right },
    ]
}

/// First-person controller driven once per rendered frame
#[derive(Debug, Clone)]
pub struct CameraController {
    bindings: Vec<KeyBinding>,
    mouse: MouseTracker,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(default_bindings())
    }
}

impl CameraController {
    /// Controller with custom key bindings
    pub fn new(bindings: Vec<KeyBinding>) -> Self {
        Self {
            bindings,
            mouse: MouseTracker::new(),
        }
    }

    /// Apply held keys, then mouse look
    ///
    /// Movement is per frame rather than per second, so speed scales with
    /// the frame rate cap.
    pub fn update<I: InputProvider + ?Sized>(&mut self, camera: &mut Camera, input: &I) {
        for binding in &self.bindings {
            if input.is_key_pressed(binding.key) {
                camera.apply_movement(binding.movement);
            }
        }

        let (x, y) = input.cursor_position();
        let (dx, dy) = self.mouse.update(x, y);
        if dx != 0.0 || dy != 0.0 {
            let sensitivity = camera.mouse_sensitivity;
            camera.apply_look(dx, dy, sensitivity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    #[derive(Default)]
    struct ScriptedInput {
        held: HashSet<KeyCode>,
        cursor: (f64, f64),
    }

    impl InputProvider for ScriptedInput {
        fn is_key_pressed(&self, key: KeyCode) -> bool {
            self.held.contains(&key)
        }

        fn cursor_position(&self) -> (f64, f64) {
            self.cursor
        }

        fn elapsed_seconds(&self) -> f64 {
            0.0
        }
    }

    fn camera() -> Camera {
        Camera::from_config(&CameraConfig::default(), 1.0)
    }

    #[test]
    fn test_w_moves_forward() {
        let mut camera = camera();
        let mut input = ScriptedInput::default();
        input.held.insert(KeyCode::W);

        CameraController::default().update(&mut camera, &input);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -4.9), epsilon = 1e-6);
    }

    #[test]
    fn test_a_and_d_strafe_opposite_ways() {
        let mut left = camera();
        let mut right = camera();
        let mut input = ScriptedInput::default();

        input.held.insert(KeyCode::A);
        CameraController::default().update(&mut left, &input);

        input.held.clear();
        input.held.insert(KeyCode::D);
        CameraController::default().update(&mut right, &input);

        let start = camera().position;
        assert_relative_eq!(left.position - start, -(right.position - start), epsilon = 1e-6);
        assert_relative_eq!((right.position - start).dot(&camera().right()), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut camera = camera();
        let mut input = ScriptedInput::default();
        input.held.extend([KeyCode::W, KeyCode::S]);

        CameraController::default().update(&mut camera, &input);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_mouse_look_uses_camera_sensitivity() {
        let mut camera = camera();
        let mut controller = CameraController::default();
        let mut input = ScriptedInput { cursor: (400.0, 300.0), ..Default::default() };

        controller.update(&mut camera, &input);
        assert_relative_eq!(camera.yaw(), 90.0);

        input.cursor = (500.0, 250.0);
        controller.update(&mut camera, &input);
        assert_relative_eq!(camera.yaw(), 100.0, epsilon = 1e-4);
        assert_relative_eq!(camera.pitch(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_escape_is_not_a_movement() {
        assert!(default_bindings().iter().all(|b| b.key != KeyCode::Escape));
        assert_eq!(default_bindings().len(), 4);
    }
}
