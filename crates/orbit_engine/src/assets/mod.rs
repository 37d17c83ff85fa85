//! Asset loading
//!
//! Decodes image files into CPU pixel buffers ready for texture upload.
//! GPU resources are created elsewhere; nothing here touches the device.

pub mod image_loader;

pub use image_loader::{CubeMapImages, ImageData};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {path}")]
    NotFound {
        /// Requested path
        path: String,
    },

    /// File exists but could not be decoded
    #[error("Failed to load {path}: {reason}")]
    LoadFailed {
        /// Source path
        path: String,
        /// Decoder message
        reason: String,
    },

    /// Decoded data cannot be used as requested
    #[error("Invalid data in {path}: {reason}")]
    InvalidData {
        /// Source path
        path: String,
        /// What was wrong
        reason: String,
    },
}

impl AssetError {
    /// Path of the asset that failed
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::LoadFailed { path, .. }
            | Self::InvalidData { path, .. } => path,
        }
    }

    /// Human-readable cause without the path
    pub fn reason(&self) -> String {
        match self {
            Self::NotFound { .. } => "file not found".to_string(),
            Self::LoadFailed { reason, .. } | Self::InvalidData { reason, .. } => reason.clone(),
        }
    }
}
