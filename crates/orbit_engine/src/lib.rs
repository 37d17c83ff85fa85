//! # Orbit Engine
//!
//! A small Vulkan rendering core that draws textured UV spheres under a
//! first-person camera.
//!
//! ## Features
//!
//! - **Procedural meshes**: UV-sphere generation with bounds-checked indices
//! - **First-person camera**: yaw/pitch look, strafe movement, Vulkan-ready matrices
//! - **Shader programs**: named, typed uniforms packed with std140 rules
//! - **Vulkan backend**: RAII wrappers over swapchain, pipelines, buffers and textures
//! - **Frame pacing**: a fixed-rate main loop that keeps update and draw together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orbit_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FileConfigProvider::new("config/earth.toml").load()?;
//!     let mut window = Window::new(&config.window)?;
//!     let mut renderer = VulkanRenderer::new(&mut window, &config.render)?;
//!
//!     let sphere = generate_sphere(config.scene.rings, config.scene.sectors)?;
//!     let mesh = renderer.create_mesh(&sphere)?;
//!     # let _ = mesh;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod engine;
pub mod foundation;
pub mod input;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, CubeMapImages, ImageData},
        config::{
            AppConfig, Config, ConfigError, ConfigurationProvider, DefaultConfigProvider,
            FileConfigProvider,
        },
        engine::{LoopControl, MainLoop},
        foundation::{
            math::{Mat4, Mat4Ext, Vec2, Vec3},
            time::{FramePacer, Timer},
        },
        input::{CameraController, InputProvider, KeyCode, WindowBackend, WindowEvent},
        render::{
            generate_sphere, BackendResult, Camera, FrameRenderer, FrameStatus, Mesh,
            MeshHandle, ModelTransform, Movement, ProgramDescriptor, ProgramHandle,
            RenderBackend, RenderError, RenderResult, Scene, SceneObject, ShaderProgram,
            TextureHandle,
            vulkan::{VulkanRenderer, Window},
        },
    };
}
