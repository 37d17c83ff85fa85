//! Rendering
//!
//! The API-independent half lives at this level: geometry and the camera in
//! [`primitives`], uniform packing and program descriptions in [`shader`], the
//! [`RenderBackend`] trait and the per-frame [`FrameRenderer`]. The Vulkan
//! implementation of the backend is in [`vulkan`].

pub mod backend;
pub mod error;
pub mod frame;
pub mod primitives;
pub mod shader;
pub mod texture;
pub mod vulkan;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{
    BackendResult, FrameStatus, MeshHandle, ProgramHandle, RenderBackend, TextureHandle,
};
pub use error::{RenderError, RenderResult};
pub use frame::{FrameRenderer, ModelTransform, Scene, SceneObject, Skybox};
pub use primitives::{generate_sphere, Camera, Mesh, Movement, Vertex};
pub use shader::{
    ProgramDescriptor, RasterState, ShaderProgram, ShaderSource, ShaderStage, UniformBlock,
    UniformLayout, UniformType, UniformValue,
};
pub use texture::{SamplerSettings, TextureFilter, TextureKind};
