//! Earth viewer
//!
//! Draws a spinning, textured Earth with an orbiting moon under a
//! first-person camera. Settings come from `config/earth.toml`, or from the
//! path given as the first argument.

use orbit_engine::assets::{AssetError, CubeMapImages, ImageData};
use orbit_engine::config::{AppConfig, ConfigError, ConfigurationProvider, FileConfigProvider, SkyboxConfig};
use orbit_engine::engine::MainLoop;
use orbit_engine::foundation::logging::{self, LevelFilter};
use orbit_engine::render::vulkan::{VulkanRenderer, Window, WindowError};
use orbit_engine::render::{
    generate_sphere, Camera, Mesh, ModelTransform, ProgramDescriptor, RenderBackend,
    RenderError, SamplerSettings, Scene, SceneObject, Skybox, TextureHandle,
};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config/earth.toml";

/// Startup and runtime failures
#[derive(Error, Debug)]
enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("window error: {0}")]
    Window(#[from] WindowError),

    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

type AppResult<T> = Result<T, AppError>;

/// Window, renderer and the scene drawn into them
struct EarthApp {
    // Declared first so GPU objects are released before the window surface
    renderer: VulkanRenderer,
    window: Window,
    camera: Camera,
    scene: Scene,
    target_fps: f64,
}

impl EarthApp {
    fn new(config: &AppConfig) -> AppResult<Self> {
        log::info!(
            "Creating {}x{} window \"{}\"",
            config.window.width,
            config.window.height,
            config.window.title
        );
        let mut window = Window::new(&config.window)?;
        let mut renderer = VulkanRenderer::new(&mut window, &config.render)?;

        let scene = build_scene(&mut renderer, config)?;

        let (width, height) = window.framebuffer_size_pixels();
        let aspect = width as f32 / height.max(1) as f32;
        let camera = Camera::from_config(&config.camera, aspect);

        Ok(Self {
            renderer,
            window,
            camera,
            scene,
            target_fps: config.render.target_fps,
        })
    }

    fn run(&mut self) -> AppResult<()> {
        MainLoop::new(self.target_fps).run(
            &mut self.window,
            &mut self.renderer,
            &mut self.camera,
            &self.scene,
        )?;
        Ok(())
    }
}

fn build_scene(renderer: &mut VulkanRenderer, config: &AppConfig) -> AppResult<Scene> {
    let scene_config = &config.scene;
    let program = renderer.create_program(&ProgramDescriptor::sphere(&config.render.sphere_shaders)?)?;

    let sphere = generate_sphere(scene_config.rings, scene_config.sectors)?;
    let sphere_mesh = renderer.create_mesh(&sphere)?;

    let sampler = SamplerSettings::mipmapped(config.render.texture_filter);
    let mut objects = vec![SceneObject {
        name: "earth".to_string(),
        mesh: sphere_mesh,
        texture: load_texture(renderer, &scene_config.earth_texture, &sampler)?,
        transform: ModelTransform::spinning(scene_config.spin_degrees_per_second),
    }];

    let moon = &scene_config.moon;
    if moon.enabled {
        objects.push(SceneObject {
            name: "moon".to_string(),
            mesh: sphere_mesh,
            texture: load_texture(renderer, &moon.texture, &sampler)?,
            transform: ModelTransform::orbiting(
                scene_config.spin_degrees_per_second,
                moon.orbit_offset,
                moon.scale,
            ),
        });
    }

    let skybox = scene_config
        .skybox
        .as_ref()
        .map(|sky| build_skybox(renderer, config, sky))
        .transpose()?;

    Ok(Scene {
        program,
        objects,
        skybox,
        clear_color: config.render.clear_color,
    })
}

/// Image files store rows top-down; texture coordinates start at the bottom
fn load_texture(
    renderer: &mut VulkanRenderer,
    path: &str,
    sampler: &SamplerSettings,
) -> AppResult<TextureHandle> {
    let image = ImageData::from_file(path)?.flip_vertically();
    log::info!("Loaded texture {} ({}x{})", path, image.width, image.height);
    Ok(renderer.create_texture(&image, sampler)?)
}

fn build_skybox(
    renderer: &mut VulkanRenderer,
    config: &AppConfig,
    sky: &SkyboxConfig,
) -> AppResult<Skybox> {
    let faces = CubeMapImages::from_files(&sky.faces)?;
    let texture = renderer.create_cube_map(
        &faces,
        &SamplerSettings::single_level(config.render.texture_filter),
    )?;
    let mesh = renderer.create_mesh(&Mesh::skybox_cube())?;
    let program = renderer.create_program(&ProgramDescriptor::skybox(&config.render.skybox_shaders)?)?;

    log::info!("Sky box enabled ({}px faces)", faces.face_size());
    Ok(Skybox {
        program,
        mesh,
        texture,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC occurred: {panic_info}");
        if let Some(location) = panic_info.location() {
            eprintln!("Panic location: {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    logging::init(LevelFilter::Info);
    log::info!("Starting Earth viewer");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = FileConfigProvider::new(config_path).load()?;

    let result = EarthApp::new(&config).and_then(|mut app| app.run());
    match result {
        Ok(()) => {
            log::info!("Earth viewer exited cleanly");
            Ok(())
        }
        Err(e) => {
            log::error!("Earth viewer failed: {e}");
            Err(e.into())
        }
    }
}
