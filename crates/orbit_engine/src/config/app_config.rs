//! Application configuration structures
//!
//! Every section carries `#[serde(default)]`, so a config file only needs the
//! keys it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::render::TextureFilter;

/// Complete startup configuration for the viewer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window creation settings
    pub window: WindowConfig,
    /// Camera tuning constants
    pub camera: CameraConfig,
    /// Renderer and frame pacing settings
    pub render: RenderConfig,
    /// Which bodies to draw and how they move
    pub scene: SceneConfig,
}

impl Config for AppConfig {}

impl AppConfig {
    /// Check values that deserialize fine but cannot drive the renderer
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.window.width == 0 || self.window.height == 0 {
            return invalid("window width and height must be non-zero");
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return invalid("camera fov must be between 0 and 180 degrees");
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return invalid("camera near plane must be positive and closer than the far plane");
        }
        if !(self.render.target_fps > 0.0) {
            return invalid("render target_fps must be positive");
        }
        if self.render.max_frames_in_flight == 0 {
            return invalid("render max_frames_in_flight must be at least 1");
        }
        if self.render.max_draws_per_frame == 0 {
            return invalid("render max_draws_per_frame must be at least 1");
        }
        if self.scene.rings < 2 || self.scene.sectors < 2 {
            return invalid("scene rings and sectors must both be at least 2");
        }
        if self.scene.moon.enabled && !(self.scene.moon.scale > 0.0) {
            return invalid("moon scale must be positive");
        }
        Ok(())
    }
}

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
    /// Draw OS decorations (title bar, borders)
    pub decorated: bool,
    /// Allow the user to resize the window
    pub resizable: bool,
    /// Center the window on the primary monitor
    pub centered: bool,
    /// Optional window icon image
    pub icon_path: Option<String>,
    /// Hide and capture the cursor for mouse look
    pub capture_cursor: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Earth".to_string(),
            decorated: false,
            resizable: false,
            centered: true,
            icon_path: Some("img/icon.bmp".to_string()),
            capture_cursor: true,
        }
    }
}

/// Camera tuning constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World units moved per frame while a movement key is held
    pub speed: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Degrees of rotation per pixel of mouse movement
    pub sensitivity: f32,
    /// Near clipping plane distance
    pub near: f32,
    /// Far clipping plane distance
    pub far: f32,
    /// Starting position in world space
    pub start_position: Vec3,
    /// Starting yaw in degrees
    pub yaw: f32,
    /// Starting pitch in degrees
    pub pitch: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: 0.1,
            fov: 60.0,
            sensitivity: 0.1,
            near: 0.001,
            far: 1000.0,
            start_position: Vec3::new(0.0, 0.0, -5.0),
            yaw: 90.0,
            pitch: 0.0,
        }
    }
}

/// Shader stage locations for one program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to vertex shader (SPIR-V, or GLSL with the `runtime-glsl` feature)
    pub vertex_shader_path: String,
    /// Path to fragment shader (SPIR-V, or GLSL with the `runtime-glsl` feature)
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a shader config with explicit paths
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Resolve file names against the usual shader directories
    ///
    /// The first directory containing each file wins. Unresolved names fall
    /// back to `target/shaders/`, where the build script writes SPIR-V.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        const SHADER_DIRS: [&str; 5] = [
            "target/shaders",
            "shaders",
            "resources/shaders",
            "../target/shaders",
            ".",
        ];

        let resolve = |name: &str| {
            SHADER_DIRS
                .iter()
                .map(|dir| Path::new(dir).join(name))
                .find(|candidate| candidate.exists())
                .map_or_else(
                    || format!("target/shaders/{name}"),
                    |found| found.to_string_lossy().into_owned(),
                )
        };

        Self {
            vertex_shader_path: resolve(base_vertex),
            fragment_shader_path: resolve(base_fragment),
        }
    }
}

/// Renderer and frame pacing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Application name reported to the Vulkan driver
    pub application_name: String,
    /// Frames per second cap for the main loop
    pub target_fps: f64,
    /// Frames the CPU may record ahead of the GPU
    pub max_frames_in_flight: usize,
    /// Upper bound on draw calls per frame (sizes the uniform ring)
    pub max_draws_per_frame: usize,
    /// Filtering for sphere textures
    pub texture_filter: TextureFilter,
    /// Background clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Force validation layers on or off; `None` enables them in debug builds
    pub enable_validation: Option<bool>,
    /// Textured sphere program
    pub sphere_shaders: ShaderConfig,
    /// Cube-mapped sky box program
    pub skybox_shaders: ShaderConfig,
}

impl RenderConfig {
    /// Whether validation layers should be requested
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            application_name: "Earth".to_string(),
            target_fps: 60.0,
            max_frames_in_flight: 2,
            max_draws_per_frame: 64,
            texture_filter: TextureFilter::Nearest,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            enable_validation: None,
            sphere_shaders: ShaderConfig::with_path_resolution("sphere.vert.spv", "sphere.frag.spv"),
            skybox_shaders: ShaderConfig::with_path_resolution("skybox.vert.spv", "skybox.frag.spv"),
        }
    }
}

/// An orbiting body drawn with the shared sphere mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatelliteConfig {
    /// Draw this body
    pub enabled: bool,
    /// Surface texture
    pub texture: String,
    /// Offset from the planet center before the spin rotation is applied
    pub orbit_offset: Vec3,
    /// Uniform scale relative to the planet
    pub scale: f32,
}

impl Default for SatelliteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            texture: "img/moon.bmp".to_string(),
            orbit_offset: Vec3::new(10.0, 0.0, 0.0),
            scale: 0.3,
        }
    }
}

/// Six cube-map faces in +X, -X, +Y, -Y, +Z, -Z order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyboxConfig {
    /// Face image paths
    pub faces: [String; 6],
}

/// Which bodies to draw and how they move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Planet surface texture
    pub earth_texture: String,
    /// Sphere latitude resolution
    pub rings: u32,
    /// Sphere longitude resolution
    pub sectors: u32,
    /// Spin rate in degrees per second of wall-clock time
    pub spin_degrees_per_second: f32,
    /// The moon
    pub moon: SatelliteConfig,
    /// Optional background sky box
    pub skybox: Option<SkyboxConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            earth_texture: "img/earth.bmp".to_string(),
            rings: 64,
            sectors: 64,
            spin_degrees_per_second: 45.0,
            moon: SatelliteConfig::default(),
            skybox: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("orbit_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_defaults_match_viewer_constants() {
        let config = AppConfig::default();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.window.title, "Earth");
        assert!((config.camera.speed - 0.1).abs() < f32::EPSILON);
        assert!((config.camera.fov - 60.0).abs() < f32::EPSILON);
        assert!((config.camera.sensitivity - 0.1).abs() < f32::EPSILON);
        assert!((config.render.target_fps - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.render.texture_filter, TextureFilter::Nearest);
        assert_eq!((config.scene.rings, config.scene.sectors), (64, 64));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.camera.near = 10.0;
        config.camera.far = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.scene.rings = 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.target_fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.camera.fov = 180.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut config = AppConfig::default();
        config.camera.near = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.camera.far = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.target_fps = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scene.moon.scale = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            [window]
            width = 1024
            title = "Blue Marble"

            [camera]
            speed = 0.25

            [scene.moon]
            enabled = false
        "#;
        let config: AppConfig = toml::from_str(text).expect("partial config should parse");

        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, "Blue Marble");
        assert!((config.camera.speed - 0.25).abs() < f32::EPSILON);
        assert!((config.camera.fov - 60.0).abs() < f32::EPSILON);
        assert!(!config.scene.moon.enabled);
        assert_eq!(config.scene.moon.texture, "img/moon.bmp");
    }

    #[test]
    fn test_toml_file_roundtrip() {
        let path = temp_path("roundtrip.toml");
        let mut config = AppConfig::default();
        config.window.title = "Roundtrip".to_string();
        config.render.texture_filter = TextureFilter::Linear;
        config.scene.skybox = Some(SkyboxConfig {
            faces: ["px", "nx", "py", "ny", "pz", "nz"].map(String::from),
        });

        config.save_to_file(&path).expect("save should succeed");
        let loaded = AppConfig::load_from_file(&path).expect("load should succeed");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_file_roundtrip() {
        let path = temp_path("roundtrip.ron");
        let mut config = AppConfig::default();
        config.camera.start_position = Vec3::new(1.0, 2.0, 3.0);

        config.save_to_file(&path).expect("save should succeed");
        let loaded = AppConfig::load_from_file(&path).expect("load should succeed");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.camera.start_position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_shipped_config_parses() {
        let text = include_str!("../../../../config/earth.toml");
        let config: AppConfig = toml::from_str(text).expect("shipped config should parse");
        assert!(config.validate().is_ok());
        assert!(config.scene.moon.enabled);
        assert!(config.scene.skybox.is_none());
        assert_eq!(config.render.sphere_shaders.vertex_shader_path, "target/shaders/sphere.vert.spv");
    }

    #[test]
    fn test_unsupported_extension() {
        let result = AppConfig::load_from_file("settings.lua");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
