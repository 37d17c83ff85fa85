//! Main loop
//!
//! One [`MainLoop::step`] pumps window events and, when the frame pacer says a
//! frame is due, updates the camera from input and renders the scene. Camera
//! update, spin angle and drawing always happen together in the same tick.

use std::time::Duration;

use crate::foundation::time::{FramePacer, Timer};
use crate::input::{CameraController, KeyCode, WindowBackend, WindowEvent};
use crate::render::{Camera, FrameRenderer, FrameStatus, RenderBackend, RenderResult, Scene};

/// Longest the loop sleeps while waiting for the next frame
const MAX_IDLE_SLEEP: Duration = Duration::from_millis(2);
/// Back-off after the backend refused a frame (e.g. while minimized)
const SKIPPED_FRAME_SLEEP: Duration = Duration::from_millis(16);

/// Whether the loop should keep going after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Keep running
    Continue,
    /// Keep running; the due frame could not be drawn and is retried
    Skipped,
    /// The window is closing
    Exit,
}

/// Fixed-rate viewer loop
pub struct MainLoop {
    pacer: FramePacer,
    controller: CameraController,
    timer: Timer,
    frame_renderer: FrameRenderer,
}

impl MainLoop {
    /// Loop capped at `target_fps` with default WASD bindings
    pub fn new(target_fps: f64) -> Self {
        Self::with_controller(target_fps, CameraController::default())
    }

    /// Loop with a custom camera controller
    pub fn with_controller(target_fps: f64, controller: CameraController) -> Self {
        Self {
            pacer: FramePacer::new(target_fps),
            controller,
            timer: Timer::new(),
            frame_renderer: FrameRenderer::new(),
        }
    }

    /// Frame statistics
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Run one iteration
    pub fn step(
        &mut self,
        window: &mut dyn WindowBackend,
        backend: &mut dyn RenderBackend,
        camera: &mut Camera,
        scene: &Scene,
    ) -> RenderResult<LoopControl> {
        for event in window.poll_events() {
            match event {
                WindowEvent::Resized(width, height) => Self::resize(backend, camera, width, height)?,
                WindowEvent::CloseRequested => window.request_close(),
            }
        }

        if window.is_key_pressed(KeyCode::Escape) {
            log::info!("Escape pressed, closing");
            window.request_close();
        }
        if window.should_close() {
            return Ok(LoopControl::Exit);
        }

        let now = window.elapsed_seconds();
        if !self.pacer.ready(now) {
            return Ok(LoopControl::Continue);
        }

        let controller = &mut self.controller;
        let input = &*window;
        let status = self.frame_renderer.render_with_update(backend, camera, now, scene, |camera| {
            controller.update(camera, input);
        })?;
        if status == FrameStatus::SwapchainOutOfDate {
            // Nothing was drawn, so the frame is still due
            let (width, height) = window.framebuffer_size();
            Self::resize(backend, camera, width, height)?;
            return Ok(LoopControl::Skipped);
        }

        self.pacer.mark(now);
        self.timer.record_frame(now);
        Ok(LoopControl::Continue)
    }

    /// Step until the window closes, then wait for the GPU to go idle
    pub fn run(
        &mut self,
        window: &mut dyn WindowBackend,
        backend: &mut dyn RenderBackend,
        camera: &mut Camera,
        scene: &Scene,
    ) -> RenderResult<()> {
        log::info!(
            "Entering main loop at {:.0} fps",
            1.0 / self.pacer.frame_interval()
        );

        let result = loop {
            match self.step(window, backend, camera, scene) {
                Ok(LoopControl::Continue) => {
                    let idle = self.pacer.time_until_ready(window.elapsed_seconds());
                    if !idle.is_zero() {
                        std::thread::sleep(idle.min(MAX_IDLE_SLEEP));
                    }
                }
                Ok(LoopControl::Skipped) => std::thread::sleep(SKIPPED_FRAME_SLEEP),
                Ok(LoopControl::Exit) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        backend.wait_idle()?;
        log::info!(
            "Main loop finished after {} frames ({:.1} fps average)",
            self.timer.frame_count(),
            self.timer.average_fps()
        );
        result
    }

    fn resize(
        backend: &mut dyn RenderBackend,
        camera: &mut Camera,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return Ok(());
        }
        log::info!("Resizing to {}x{}", width, height);
        backend.resize(width, height)?;
        camera.set_aspect_ratio(width as f32 / height as f32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::foundation::math::Vec3;
    use crate::input::InputProvider;
    use crate::render::test_support::{Call, RecordingBackend};
    use crate::render::{MeshHandle, ModelTransform, ProgramHandle, SceneObject, TextureHandle};
    use approx::assert_relative_eq;
    use std::collections::{HashSet, VecDeque};

    #[derive(Default)]
    struct ScriptedWindow {
        held: HashSet<KeyCode>,
        cursor: (f64, f64),
        now: f64,
        pending: VecDeque<WindowEvent>,
        closing: bool,
        size: (u32, u32),
        /// Advance the clock by this much on every poll
        tick: f64,
        /// Request close once the clock passes this time
        close_at: Option<f64>,
    }

    impl InputProvider for ScriptedWindow {
        fn is_key_pressed(&self, key: KeyCode) -> bool {
            self.held.contains(&key)
        }

        fn cursor_position(&self) -> (f64, f64) {
            self.cursor
        }

        fn elapsed_seconds(&self) -> f64 {
            self.now
        }
    }

    impl WindowBackend for ScriptedWindow {
        fn poll_events(&mut self) -> Vec<WindowEvent> {
            self.now += self.tick;
            if self.close_at.is_some_and(|t| self.now > t) {
                self.pending.push_back(WindowEvent::CloseRequested);
            }
            self.pending.drain(..).collect()
        }

        fn should_close(&self) -> bool {
            self.closing
        }

        fn request_close(&mut self) {
            self.closing = true;
        }

        fn framebuffer_size(&self) -> (u32, u32) {
            self.size
        }
    }

    fn scene() -> Scene {
        Scene {
            program: ProgramHandle(0),
            objects: vec![SceneObject {
                name: "earth".to_string(),
                mesh: MeshHandle(0),
                texture: TextureHandle(0),
                transform: ModelTransform::spinning(45.0),
            }],
            skybox: None,
            clear_color: [0.0; 4],
        }
    }

    fn camera() -> Camera {
        Camera::from_config(&CameraConfig::default(), 800.0 / 600.0)
    }

    fn draw_count(backend: &RecordingBackend) -> usize {
        backend.calls.iter().filter(|c| matches!(c, Call::Draw(_))).count()
    }

    #[test]
    fn test_frame_waits_for_pacer() {
        let mut window = ScriptedWindow { now: 0.01, ..Default::default() };
        let mut backend = RecordingBackend::new();
        let mut camera = camera();
        let mut main_loop = MainLoop::new(60.0);

        let control = main_loop
            .step(&mut window, &mut backend, &mut camera, &scene())
            .expect("step succeeds");
        assert_eq!(control, LoopControl::Continue);
        assert!(backend.calls.is_empty(), "no frame is due yet");

        window.now = 0.02;
        main_loop
            .step(&mut window, &mut backend, &mut camera, &scene())
            .expect("step succeeds");
        assert_eq!(draw_count(&backend), 1);
        assert_eq!(main_loop.timer().frame_count(), 1);
    }

    #[test]
    fn test_camera_moves_only_on_rendered_frames() {
        let mut window = ScriptedWindow { now: 1.0, ..Default::default() };
        window.held.insert(KeyCode::W);
        let mut backend = RecordingBackend::new();
        let mut camera = camera();
        let mut main_loop = MainLoop::new(10.0);

        main_loop.step(&mut window, &mut backend, &mut camera, &scene()).expect("step");
        // Same timestamp: not due again
        main_loop.step(&mut window, &mut backend, &mut camera, &scene()).expect("step");

        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -4.9), epsilon = 1e-6);
        assert_eq!(draw_count(&backend), 1);
    }

    #[test]
    fn test_escape_exits() {
        let mut window = ScriptedWindow { now: 1.0, ..Default::default() };
        window.held.insert(KeyCode::Escape);
        let mut backend = RecordingBackend::new();

        let control = MainLoop::new(60.0)
            .step(&mut window, &mut backend, &mut camera(), &scene())
            .expect("step succeeds");

        assert_eq!(control, LoopControl::Exit);
        assert!(window.closing);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_resize_event_updates_backend_and_aspect() {
        let mut window = ScriptedWindow::default();
        window.pending.push_back(WindowEvent::Resized(1000, 500));
        let mut backend = RecordingBackend::new();
        let mut camera = camera();

        MainLoop::new(60.0)
            .step(&mut window, &mut backend, &mut camera, &scene())
            .expect("step succeeds");

        assert_eq!(backend.calls.first(), Some(&Call::Resize(1000, 500)));
        assert_relative_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_minimized_resize_ignored() {
        let mut window = ScriptedWindow::default();
        window.pending.push_back(WindowEvent::Resized(0, 0));
        let mut backend = RecordingBackend::new();
        let mut camera = camera();
        let aspect = camera.aspect;

        MainLoop::new(60.0)
            .step(&mut window, &mut backend, &mut camera, &scene())
            .expect("step succeeds");

        assert!(backend.calls.is_empty());
        assert_relative_eq!(camera.aspect, aspect);
    }

    #[test]
    fn test_out_of_date_frame_triggers_resize() {
        let mut window = ScriptedWindow { now: 1.0, size: (640, 480), ..Default::default() };
        let mut backend = RecordingBackend::new();
        backend.out_of_date_frames = 1;

        MainLoop::new(60.0)
            .step(&mut window, &mut backend, &mut camera(), &scene())
            .expect("step succeeds");

        assert_eq!(backend.calls, vec![Call::BeginFrame, Call::Resize(640, 480)]);
    }

    #[test]
    fn test_out_of_date_frame_leaves_camera_and_pacer() {
        let mut window = ScriptedWindow { now: 1.0, ..Default::default() };
        window.held.insert(KeyCode::W);
        let mut backend = RecordingBackend::new();
        backend.out_of_date_frames = 1;
        let mut camera = camera();
        let mut main_loop = MainLoop::new(10.0);

        let control = main_loop.step(&mut window, &mut backend, &mut camera, &scene()).expect("step");
        assert_eq!(control, LoopControl::Skipped);
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-6);
        assert_eq!(main_loop.timer().frame_count(), 0);

        // Same timestamp: the skipped frame is still due and now draws
        main_loop.step(&mut window, &mut backend, &mut camera, &scene()).expect("step");
        assert_relative_eq!(camera.position, Vec3::new(0.0, 0.0, -4.9), epsilon = 1e-6);
        assert_eq!(draw_count(&backend), 1);
        assert_eq!(main_loop.timer().frame_count(), 1);
    }

    #[test]
    fn test_run_until_close_then_wait_idle() {
        let mut window = ScriptedWindow {
            tick: 0.125,
            close_at: Some(1.0),
            ..Default::default()
        };
        let mut backend = RecordingBackend::new();
        let mut main_loop = MainLoop::new(30.0);

        main_loop
            .run(&mut window, &mut backend, &mut camera(), &scene())
            .expect("run succeeds");

        // Ticks at 0.125, 0.25, ... 1.0 are all more than 1/30 s apart
        assert_eq!(draw_count(&backend), 8);
        assert_eq!(backend.wait_idle_calls.get(), 1);
    }
}
