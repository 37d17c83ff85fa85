//! Render backend abstraction
//!
//! The frame renderer and main loop talk to the GPU only through
//! [`RenderBackend`]. Resources are created up front and referred to by small
//! copyable handles; the backend owns the GPU objects and releases them when it
//! is dropped.

use crate::assets::{CubeMapImages, ImageData};
use crate::render::primitives::Mesh;
use crate::render::shader::{ProgramDescriptor, ShaderProgram};
use crate::render::texture::SamplerSettings;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Uploaded 2D texture or cube map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Outcome of starting or finishing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame proceeded normally
    Ready,
    /// The surface changed; the frame was skipped or presented suboptimally
    /// and the swapchain must be recreated
    SwapchainOutOfDate,
}

/// GPU operations needed to draw a frame
pub trait RenderBackend {
    /// Upload vertex and index data
    fn create_mesh(&mut self, mesh: &Mesh) -> BackendResult<MeshHandle>;

    /// Upload a 2D image with the given sampler
    fn create_texture(
        &mut self,
        image: &ImageData,
        sampler: &SamplerSettings,
    ) -> BackendResult<TextureHandle>;

    /// Upload six cube faces with the given sampler
    fn create_cube_map(
        &mut self,
        faces: &CubeMapImages,
        sampler: &SamplerSettings,
    ) -> BackendResult<TextureHandle>;

    /// Compile and link a program
    fn create_program(&mut self, descriptor: &ProgramDescriptor) -> BackendResult<ProgramHandle>;

    /// Acquire the next image and start recording, clearing to `clear_color`
    ///
    /// On `SwapchainOutOfDate` nothing was started and the caller must not
    /// record draws or call [`RenderBackend::end_frame`].
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> BackendResult<FrameStatus>;

    /// Bind a program for subsequent draws
    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()>;

    /// Uniform setters of the bound program
    ///
    /// Values set here apply to every following draw until changed.
    fn program(&mut self) -> BackendResult<&mut dyn ShaderProgram>;

    /// Bind a texture for subsequent draws
    fn bind_texture(&mut self, texture: TextureHandle) -> BackendResult<()>;

    /// Draw a mesh with the current program, uniforms and texture
    fn draw_mesh(&mut self, mesh: MeshHandle) -> BackendResult<()>;

    /// Finish recording, submit and present
    fn end_frame(&mut self) -> BackendResult<FrameStatus>;

    /// Rebuild size-dependent resources for a new framebuffer size
    fn resize(&mut self, width: u32, height: u32) -> BackendResult<()>;

    /// Block until the GPU has finished all submitted work
    fn wait_idle(&self) -> BackendResult<()>;
}
