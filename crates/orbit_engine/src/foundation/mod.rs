//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and matrix helpers
//! - Time management and frame pacing
//! - Logging setup

pub mod logging;
pub mod math;
pub mod time;
