//! Vulkan backend
//!
//! RAII wrappers over ash objects, composed by [`VulkanRenderer`] into a
//! [`RenderBackend`](crate::render::RenderBackend). Every wrapper holds a
//! clone of the `ash::Device` it was created from and destroys its object on
//! drop; owners declare dependent objects before the things they depend on.

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor_set;
pub mod framebuffer;
pub mod gpu_mesh;
pub mod image;
pub mod render_pass;
pub mod renderer;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod uniform_ring;
pub mod vertex_layout;
pub mod window;

pub use context::{VulkanContext, VulkanError, VulkanResult};
pub use renderer::VulkanRenderer;
pub use window::{Window, WindowError, WindowResult};

use crate::render::RenderError;

impl From<VulkanError> for RenderError {
    fn from(err: VulkanError) -> Self {
        match err {
            VulkanError::InitializationFailed(reason) => Self::Initialization(reason),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<WindowError> for RenderError {
    fn from(err: WindowError) -> Self {
        Self::Initialization(err.to_string())
    }
}
