//! Backend-agnostic texture settings

use serde::{Deserialize, Serialize};

/// Minification and magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFilter {
    /// Nearest texel, blocky when magnified
    #[default]
    Nearest,
    /// Bilinear between texels and mip levels
    Linear,
}

/// What a program samples at its texture binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Ordinary 2D image
    Texture2D,
    /// Six-face cube map sampled by direction
    CubeMap,
}

/// Sampler configuration for a texture
///
/// Addressing is always clamp-to-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Filter for minification, magnification and mip selection
    pub filter: TextureFilter,
    /// Build and sample a full mip chain
    pub mipmaps: bool,
}

impl SamplerSettings {
    /// Mipmapped 2D texture sampling
    pub const fn mipmapped(filter: TextureFilter) -> Self {
        Self {
            filter,
            mipmaps: true,
        }
    }

    /// Single-level sampling, used for cube maps
    pub const fn single_level(filter: TextureFilter) -> Self {
        Self {
            filter,
            mipmaps: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Wrapper {
        filter: TextureFilter,
    }

    #[test]
    fn test_filter_names_are_lowercase() {
        let parsed: Wrapper = toml::from_str("filter = \"linear\"").expect("valid filter");
        assert_eq!(parsed.filter, TextureFilter::Linear);

        let text = toml::to_string(&Wrapper { filter: TextureFilter::Nearest }).expect("serializable");
        assert_eq!(text.trim(), "filter = \"nearest\"");

        assert!(toml::from_str::<Wrapper>("filter = \"Bilinear\"").is_err());
    }
}
