//! Input handling
//!
//! The window layer reports raw key state and cursor positions through
//! [`InputProvider`]; [`CameraController`] turns them into camera movement and
//! look. Both traits exist so the main loop can run against a scripted window
//! in tests.

pub mod controller;
pub mod mouse;

pub use controller::{default_bindings, CameraController, KeyBinding};
pub use mouse::MouseTracker;

/// Keys the viewer responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// Escape key
    Escape,
}

/// Window events the main loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Framebuffer resized to width x height pixels
    Resized(u32, u32),
    /// The user asked to close the window
    CloseRequested,
}

/// Polled input state
pub trait InputProvider {
    /// Whether `key` is currently held
    fn is_key_pressed(&self, key: KeyCode) -> bool;

    /// Cursor position in window coordinates, origin top-left
    fn cursor_position(&self) -> (f64, f64);

    /// Seconds since the window was created
    fn elapsed_seconds(&self) -> f64;
}

/// Window operations needed by the main loop
pub trait WindowBackend: InputProvider {
    /// Pump the OS event queue and return what happened since the last call
    fn poll_events(&mut self) -> Vec<WindowEvent>;

    /// Whether a close has been requested
    fn should_close(&self) -> bool;

    /// Ask the window to close at the end of this iteration
    fn request_close(&mut self);

    /// Current framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);
}
