//! Window management using GLFW
//!
//! Creates a Vulkan-ready (no client API) window from [`WindowConfig`] and
//! exposes it to the main loop through [`WindowBackend`].

use thiserror::Error;

use crate::assets::ImageData;
use crate::config::WindowConfig;
use crate::input::{InputProvider, KeyCode, WindowBackend, WindowEvent};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Create and show a window
    ///
    /// A missing or unreadable icon is logged and skipped.
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::InitializationFailed(
                "Vulkan loader not found".to_string(),
            ));
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));
        glfw.window_hint(glfw::WindowHint::Decorated(config.decorated));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        if config.centered {
            let video_mode = glfw.with_primary_monitor(|_, monitor| monitor.and_then(|m| m.get_video_mode()));
            match video_mode {
                Some(mode) => {
                    let x = (mode.width as i32 - config.width as i32) / 2;
                    let y = (mode.height as i32 - config.height as i32) / 2;
                    window.set_pos(x.max(0), y.max(0));
                }
                None => log::warn!("No primary monitor video mode, window not centered"),
            }
        }

        if let Some(icon_path) = &config.icon_path {
            match ImageData::from_file(icon_path) {
                Ok(icon) => window.set_icon_from_pixels(vec![to_pixel_image(&icon)]),
                Err(err) => log::warn!("Window icon not set: {}", err),
            }
        }

        if config.capture_cursor {
            window.set_cursor_mode(glfw::CursorMode::Disabled);
        }

        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!("Created {}x{} window \"{}\"", config.width, config.height, config.title);

        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    /// Vulkan instance extensions GLFW needs for surface creation
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create a Vulkan surface for this window
    pub fn create_vulkan_surface(&mut self, instance: ash::vk::Instance) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!("Failed to create Vulkan surface: {result:?}")))
        }
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size_pixels(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }
}

fn to_pixel_image(image: &ImageData) -> glfw::PixelImage {
    glfw::PixelImage {
        width: image.width,
        height: image.height,
        pixels: image
            .data
            .chunks_exact(4)
            .map(|px| u32::from_ne_bytes([px[0], px[1], px[2], px[3]]))
            .collect(),
    }
}

fn to_glfw_key(key: KeyCode) -> glfw::Key {
    match key {
        KeyCode::W => glfw::Key::W,
        KeyCode::A => glfw::Key::A,
        KeyCode::S => glfw::Key::S,
        KeyCode::D => glfw::Key::D,
        KeyCode::Escape => glfw::Key::Escape,
    }
}

impl InputProvider for Window {
    fn is_key_pressed(&self, key: KeyCode) -> bool {
        matches!(
            self.window.get_key(to_glfw_key(key)),
            glfw::Action::Press | glfw::Action::Repeat
        )
    }

    fn cursor_position(&self) -> (f64, f64) {
        self.window.get_cursor_pos()
    }

    fn elapsed_seconds(&self) -> f64 {
        self.glfw.get_time()
    }
}

impl WindowBackend for Window {
    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| match event {
                glfw::WindowEvent::FramebufferSize(width, height) => {
                    Some(WindowEvent::Resized(width.max(0) as u32, height.max(0) as u32))
                }
                glfw::WindowEvent::Close => Some(WindowEvent::CloseRequested),
                _ => None,
            })
            .collect()
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn request_close(&mut self) {
        self.window.set_should_close(true);
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.framebuffer_size_pixels()
    }
}
