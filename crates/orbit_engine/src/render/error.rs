//! Rendering error types

use crate::assets::AssetError;

/// Errors produced by the renderer and its resources
///
/// Nothing in the render layer terminates the process; every failure comes
/// back as one of these and the application decides what to do.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Window, device or swapchain setup failed
    #[error("Renderer initialization failed: {0}")]
    Initialization(String),

    /// A shader stage failed to compile or its bytecode was rejected
    #[error("{stage} shader compilation failed: {message}")]
    Compile {
        /// Shader stage name ("vertex" or "fragment")
        stage: String,
        /// Compiler or validation output
        message: String,
    },

    /// Shader stages could not be linked into a pipeline
    #[error("Program link failed: {0}")]
    Link(String),

    /// A texture, mesh or shader file could not be loaded or uploaded
    #[error("Failed to load resource {path}: {reason}")]
    ResourceLoad {
        /// Resource path or name
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Caller passed an argument outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The bound program has no uniform with this name
    #[error("Unknown uniform: {0}")]
    UnknownUniform(String),

    /// A uniform was set with a value of the wrong type
    #[error("Uniform {name} expects {expected:?}, got {actual:?}")]
    UniformTypeMismatch {
        /// Uniform name
        name: String,
        /// Declared type
        expected: crate::render::shader::UniformType,
        /// Type of the supplied value
        actual: crate::render::shader::UniformType,
    },

    /// A handle does not refer to a live resource
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Any other backend failure during rendering
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<AssetError> for RenderError {
    fn from(err: AssetError) -> Self {
        Self::ResourceLoad {
            path: err.path().to_string(),
            reason: err.reason(),
        }
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
