//! Configuration sources
//!
//! The viewer asks a [`ConfigurationProvider`] for its settings once at
//! startup; the provider decides where they come from.

use std::path::PathBuf;

use super::{AppConfig, Config, ConfigError};

/// Source of application settings
pub trait ConfigurationProvider {
    /// Produce a validated configuration
    fn load(&self) -> Result<AppConfig, ConfigError>;
}

/// Compiled-in defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfigProvider;

impl ConfigurationProvider for DefaultConfigProvider {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig::default();
        config.validate()?;
        Ok(config)
    }
}

/// TOML or RON file on disk
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
    fallback_to_defaults: bool,
}

impl FileConfigProvider {
    /// Read from `path`, using defaults when the file does not exist
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback_to_defaults: true,
        }
    }

    /// Treat a missing file as an error instead of falling back to defaults
    pub fn required(mut self) -> Self {
        self.fallback_to_defaults = false;
        self
    }
}

impl ConfigurationProvider for FileConfigProvider {
    fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() && self.fallback_to_defaults {
            log::info!(
                "Config file {} not found, using defaults",
                self.path.display()
            );
            return DefaultConfigProvider.load();
        }

        let config = AppConfig::load_from_file(&self.path)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", self.path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let provider = FileConfigProvider::new("definitely/not/here.toml");
        let config = provider.load().expect("missing file should use defaults");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_required_missing_file_is_io_error() {
        let provider = FileConfigProvider::new("definitely/not/here.toml").required();
        assert!(matches!(provider.load(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_file_contents_rejected() {
        let path = std::env::temp_dir().join(format!(
            "orbit_engine_{}_invalid.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[window]\nwidth = 0\n").expect("write temp config");

        let result = FileConfigProvider::new(&path).load();
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!(
            "orbit_engine_{}_override.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[render]\ntarget_fps = 30.0\n").expect("write temp config");

        let result = FileConfigProvider::new(&path).load();
        let _ = std::fs::remove_file(&path);

        let config = result.expect("valid file should load");
        assert!((config.render.target_fps - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.window.width, 800);
    }
}
