//! Per-frame scene drawing
//!
//! [`FrameRenderer`] turns the camera, the elapsed time and a [`Scene`] into
//! backend calls for one frame. It holds no GPU state of its own.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::backend::{FrameStatus, MeshHandle, ProgramHandle, RenderBackend, TextureHandle};
use crate::render::primitives::Camera;
use crate::render::RenderResult;

/// Wall-clock driven model transform
///
/// `model = rotate_y(spin * t) * translate(orbit_offset) * scale(scale)`.
/// The offset is applied before the spin, so an offset body circles the origin
/// at the spin rate while always showing it the same face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    /// Degrees of rotation about +Y per second
    pub spin_degrees_per_second: f32,
    /// Translation applied inside the spin
    pub orbit_offset: Option<Vec3>,
    /// Uniform scale applied innermost
    pub scale: Option<f32>,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            spin_degrees_per_second: 45.0,
            orbit_offset: None,
            scale: None,
        }
    }
}

impl ModelTransform {
    /// Spin in place
    pub fn spinning(spin_degrees_per_second: f32) -> Self {
        Self {
            spin_degrees_per_second,
            ..Self::default()
        }
    }

    /// Circle the origin at `offset`, scaled by `scale`
    pub fn orbiting(spin_degrees_per_second: f32, offset: Vec3, scale: f32) -> Self {
        Self {
            spin_degrees_per_second,
            orbit_offset: Some(offset),
            scale: Some(scale),
        }
    }

    /// Model matrix at `elapsed_seconds`
    pub fn matrix(&self, elapsed_seconds: f64) -> Mat4 {
        let angle = utils::deg_to_rad((f64::from(self.spin_degrees_per_second) * elapsed_seconds) as f32);
        let mut model = Mat4::rotation_y(angle);
        if let Some(offset) = self.orbit_offset {
            model *= Mat4::translation(offset);
        }
        if let Some(factor) = self.scale {
            model *= Mat4::uniform_scale(factor);
        }
        model
    }
}

/// A textured mesh instance
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Name used in logs
    pub name: String,
    /// Geometry
    pub mesh: MeshHandle,
    /// Surface texture
    pub texture: TextureHandle,
    /// Motion
    pub transform: ModelTransform,
}

/// Cube-mapped background
#[derive(Debug, Clone, Copy)]
pub struct Skybox {
    /// Program with sky box raster state
    pub program: ProgramHandle,
    /// Inward-facing cube
    pub mesh: MeshHandle,
    /// Cube map texture
    pub texture: TextureHandle,
}

/// Everything drawn each frame
#[derive(Debug, Clone)]
pub struct Scene {
    /// Program used for all objects
    pub program: ProgramHandle,
    /// Objects in draw order
    pub objects: Vec<SceneObject>,
    /// Optional background, drawn after the objects
    pub skybox: Option<Skybox>,
    /// Background clear color
    pub clear_color: [f32; 4],
}

/// Records one frame of a [`Scene`]
#[derive(Debug, Default)]
pub struct FrameRenderer {
    frames_rendered: u64,
}

impl FrameRenderer {
    /// Create a frame renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames submitted so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Draw `scene` as seen by `camera` at `elapsed_seconds`
    ///
    /// Returns `SwapchainOutOfDate` when the backend could not start or
    /// present the frame; the caller should resize and try again next tick.
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        camera: &Camera,
        elapsed_seconds: f64,
        scene: &Scene,
    ) -> RenderResult<FrameStatus> {
        if !Self::begin(backend, scene)? {
            return Ok(FrameStatus::SwapchainOutOfDate);
        }
        self.draw(backend, camera, elapsed_seconds, scene)
    }

    /// Like [`render`](Self::render), but runs `update` on the camera once
    /// the backend has accepted the frame
    ///
    /// A frame the backend refuses leaves the camera untouched.
    pub fn render_with_update(
        &mut self,
        backend: &mut dyn RenderBackend,
        camera: &mut Camera,
        elapsed_seconds: f64,
        scene: &Scene,
        update: impl FnOnce(&mut Camera),
    ) -> RenderResult<FrameStatus> {
        if !Self::begin(backend, scene)? {
            return Ok(FrameStatus::SwapchainOutOfDate);
        }
        update(camera);
        self.draw(backend, camera, elapsed_seconds, scene)
    }

    fn begin(backend: &mut dyn RenderBackend, scene: &Scene) -> RenderResult<bool> {
        if backend.begin_frame(scene.clear_color)? == FrameStatus::SwapchainOutOfDate {
            log::warn!("Swapchain out of date, skipping frame");
            return Ok(false);
        }
        Ok(true)
    }

    fn draw(
        &mut self,
        backend: &mut dyn RenderBackend,
        camera: &Camera,
        elapsed_seconds: f64,
        scene: &Scene,
    ) -> RenderResult<FrameStatus> {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();

        backend.use_program(scene.program)?;
        {
            let program = backend.program()?;
            program.set_mat4("view", &view)?;
            program.set_mat4("projection", &projection)?;
        }

        for object in &scene.objects {
            let model = object.transform.matrix(elapsed_seconds);
            backend.program()?.set_mat4("model", &model)?;
            backend.bind_texture(object.texture)?;
            backend.draw_mesh(object.mesh)?;
        }

        if let Some(skybox) = &scene.skybox {
            backend.use_program(skybox.program)?;
            {
                let program = backend.program()?;
                program.set_mat4("model", &Mat4::identity())?;
                program.set_mat4("view", &view.without_translation())?;
                program.set_mat4("projection", &projection)?;
            }
            backend.bind_texture(skybox.texture)?;
            backend.draw_mesh(skybox.mesh)?;
        }

        let status = backend.end_frame()?;
        self.frames_rendered += 1;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::render::primitives::Movement;
    use crate::render::test_support::{Call, RecordingBackend};
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::from_config(&CameraConfig::default(), 4.0 / 3.0)
    }

    fn earth_and_moon() -> Scene {
        Scene {
            program: ProgramHandle(0),
            objects: vec![
                SceneObject {
                    name: "earth".to_string(),
                    mesh: MeshHandle(0),
                    texture: TextureHandle(0),
                    transform: ModelTransform::spinning(45.0),
                },
                SceneObject {
                    name: "moon".to_string(),
                    mesh: MeshHandle(0),
                    texture: TextureHandle(1),
                    transform: ModelTransform::orbiting(45.0, Vec3::new(10.0, 0.0, 0.0), 0.3),
                },
            ],
            skybox: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_spin_angle_follows_wall_clock() {
        let transform = ModelTransform::spinning(45.0);
        assert_relative_eq!(transform.matrix(0.0), Mat4::identity());
        assert_relative_eq!(
            transform.matrix(2.0),
            Mat4::rotation_y(utils::deg_to_rad(90.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_orbit_transform_order() {
        let transform = ModelTransform::orbiting(45.0, Vec3::new(10.0, 0.0, 0.0), 0.3);
        let expected = Mat4::rotation_y(utils::deg_to_rad(45.0))
            * Mat4::translation(Vec3::new(10.0, 0.0, 0.0))
            * Mat4::uniform_scale(0.3);
        assert_relative_eq!(transform.matrix(1.0), expected, epsilon = 1e-6);

        // The moon's center sits on a radius-10 circle
        let center = transform.matrix(1.0).transform_point(&Vec3::zeros().into());
        assert_relative_eq!(center.coords.norm(), 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_render_call_sequence() {
        let mut backend = RecordingBackend::new();
        let mut renderer = FrameRenderer::new();
        let status = renderer
            .render(&mut backend, &camera(), 0.0, &earth_and_moon())
            .expect("render succeeds");

        assert_eq!(status, FrameStatus::Ready);
        assert_eq!(
            backend.calls,
            vec![
                Call::BeginFrame,
                Call::UseProgram(ProgramHandle(0)),
                Call::BindTexture(TextureHandle(0)),
                Call::Draw(MeshHandle(0)),
                Call::BindTexture(TextureHandle(1)),
                Call::Draw(MeshHandle(0)),
                Call::EndFrame,
            ]
        );
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn test_each_draw_sees_its_own_model() {
        let mut backend = RecordingBackend::new();
        let cam = camera();
        FrameRenderer::new()
            .render(&mut backend, &cam, 1.0, &earth_and_moon())
            .expect("render succeeds");

        assert_eq!(backend.draws.len(), 2);
        let scene = earth_and_moon();
        for (draw, object) in backend.draws.iter().zip(&scene.objects) {
            assert_relative_eq!(draw.model, object.transform.matrix(1.0), epsilon = 1e-6);
            assert_relative_eq!(draw.view, cam.view_matrix());
            assert_relative_eq!(draw.projection, cam.projection_matrix());
        }
    }

    #[test]
    fn test_out_of_date_skips_drawing() {
        let mut backend = RecordingBackend::new();
        backend.out_of_date_frames = 1;

        let status = FrameRenderer::new()
            .render(&mut backend, &camera(), 0.0, &earth_and_moon())
            .expect("out of date is not an error");

        assert_eq!(status, FrameStatus::SwapchainOutOfDate);
        assert_eq!(backend.calls, vec![Call::BeginFrame]);
    }

    #[test]
    fn test_update_runs_only_for_accepted_frames() {
        let mut backend = RecordingBackend::new();
        backend.out_of_date_frames = 1;
        let mut renderer = FrameRenderer::new();
        let mut cam = camera();
        let start = cam.position;

        let status = renderer
            .render_with_update(&mut backend, &mut cam, 0.0, &earth_and_moon(), |c| {
                c.apply_movement(Movement::Forward);
            })
            .expect("out of date is not an error");
        assert_eq!(status, FrameStatus::SwapchainOutOfDate);
        assert_relative_eq!(cam.position, start);

        renderer
            .render_with_update(&mut backend, &mut cam, 0.0, &earth_and_moon(), |c| {
                c.apply_movement(Movement::Forward);
            })
            .expect("render succeeds");
        assert_relative_eq!(cam.position, start + cam.front() * cam.move_speed, epsilon = 1e-6);
        // The draw saw the moved camera
        assert_relative_eq!(backend.draws[0].view, cam.view_matrix());
    }

    #[test]
    fn test_skybox_drawn_last_without_translation() {
        let mut backend = RecordingBackend::new();
        let mut scene = earth_and_moon();
        scene.skybox = Some(Skybox {
            program: ProgramHandle(1),
            mesh: MeshHandle(1),
            texture: TextureHandle(2),
        });
        let cam = camera();

        FrameRenderer::new()
            .render(&mut backend, &cam, 0.5, &scene)
            .expect("render succeeds");

        assert_eq!(&backend.calls[backend.calls.len() - 4..], &[
            Call::UseProgram(ProgramHandle(1)),
            Call::BindTexture(TextureHandle(2)),
            Call::Draw(MeshHandle(1)),
            Call::EndFrame,
        ]);
        let sky = backend.draws.last().expect("sky box drawn");
        assert_relative_eq!(sky.model, Mat4::identity());
        assert_relative_eq!(sky.view, cam.view_matrix().without_translation());
    }

    #[test]
    fn test_missing_uniform_propagates() {
        let mut backend = RecordingBackend::with_layout(crate::render::shader::UniformLayout::new(&[(
            "model",
            crate::render::shader::UniformType::Mat4,
        )]));

        let result = FrameRenderer::new().render(&mut backend, &camera(), 0.0, &earth_and_moon());
        assert!(matches!(result, Err(crate::render::RenderError::UnknownUniform(name)) if name == "view"));
    }
}
