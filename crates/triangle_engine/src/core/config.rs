//! # Application Configuration
//!
//! All tunables of the triangle sample in one serializable tree. Defaults are
//! the sample's fixed values (800x600 "Hello Triangle" window, OpenGL 3.3 core,
//! black clear colour, back-face culling with counter-clockwise fronts), so a
//! missing config file changes nothing.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging
//! - **Window Config**: title, size, vsync
//! - **Context Config**: requested OpenGL version and profile
//! - **Render Config**: clear colour and fixed-function state

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::render::api::Winding;

// Re-export from the file-format module for convenience
pub use crate::config::{Config, ConfigError};

/// OpenGL version the context is created with
pub const GL_VERSION: (u32, u32) = (3, 3);

/// # Engine Configuration
///
/// Process-wide behaviour not tied to a subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter (`error`, `warn`, `info`, `debug`, `trace`); `RUST_LOG` overrides it
    pub log_level: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Parse the log level into a filter
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Whether presenting waits for vertical sync
    pub vsync: bool,
}

impl WindowConfig {
    /// Create a window configuration
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            vsync: true,
        }
    }

    /// Enable or disable vsync
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("Hello Triangle", 800, 600)
    }
}

/// OpenGL context profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlProfile {
    /// Core profile, no deprecated functionality
    Core,
    /// Compatibility profile
    Compatibility,
}

/// # Context Configuration
///
/// Hints applied before window creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Requested major version
    pub major: u32,
    /// Requested minor version
    pub minor: u32,
    /// Requested profile
    pub profile: GlProfile,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            major: GL_VERSION.0,
            minor: GL_VERSION.1,
            profile: GlProfile::Core,
        }
    }
}

/// # Render Configuration
///
/// Fixed-function state set once during startup and the per-frame clear colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// RGBA colour the framebuffer is cleared to each frame
    pub clear_color: [f32; 4],
    /// Whether back faces are culled
    pub cull_back_faces: bool,
    /// Winding that counts as front-facing
    pub front_face: Winding,
}

impl RenderConfig {
    /// Set the clear colour
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 0.0],
            cull_back_faces: true,
            front_face: Winding::CounterClockwise,
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration handed to the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Window configuration
    pub window: WindowConfig,
    /// Context configuration
    pub context: ContextConfig,
    /// Render state configuration
    pub render: RenderConfig,
}

impl AppConfig {
    /// Load `path` if it exists, otherwise fall back to defaults
    ///
    /// A file that exists but cannot be parsed, or that fails validation, is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.level_filter()?;

        if self.window.title.is_empty() {
            return Err(ConfigError::Invalid("window title cannot be empty".to_string()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        if (self.context.major, self.context.minor) != GL_VERSION {
            return Err(ConfigError::Invalid(format!(
                "OpenGL {}.{} requested; only {}.{} is supported",
                self.context.major, self.context.minor, GL_VERSION.0, GL_VERSION.1
            )));
        }
        if self.context.profile != GlProfile::Core {
            return Err(ConfigError::Invalid(format!(
                "{:?} profile requested; only the core profile is supported",
                self.context.profile
            )));
        }

        if let Some(c) = self.render.clear_color.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(ConfigError::Invalid(format!(
                "clear colour component {c} is outside [0, 1]"
            )));
        }

        Ok(())
    }
}

impl Config for AppConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_match_fixed_sample_values() {
        let config = AppConfig::default();
        assert_eq!(config.window.title, "Hello Triangle");
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!((config.context.major, config.context.minor), (3, 3));
        assert_eq!(config.context.profile, GlProfile::Core);
        assert!(config.render.cull_back_faces);
        assert_eq!(config.render.front_face, Winding::CounterClockwise);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [window]
            title = "Custom"

            [render]
            clear_color = [0.2, 0.3, 0.3, 1.0]
        "#;
        let config = AppConfig::from_str_as(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.window.title, "Custom");
        assert_eq!(config.window.width, 800);
        assert_relative_eq!(config.render.clear_color[1], 0.3);
        assert_eq!(config.render.front_face, Winding::CounterClockwise);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = AppConfig::default();
        let text = config.to_string_as(ConfigFormat::Ron).unwrap();
        let parsed = AppConfig::from_str_as(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_rejects_other_context_versions() {
        let mut config = AppConfig::default();
        config.context.minor = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.context.major = 4;
        config.context.minor = 6;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_compatibility_profile_from_file_is_rejected() {
        let text = r#"
            [context]
            profile = "compatibility"
        "#;
        let config = AppConfig::from_str_as(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.context.profile, GlProfile::Compatibility);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_reload_through_file() {
        let config = AppConfig {
            window: WindowConfig::new("Saved", 640, 480).with_vsync(false),
            render: RenderConfig::default().with_clear_color([0.2, 0.3, 0.3, 1.0]),
            ..AppConfig::default()
        };

        for extension in ["toml", "ron"] {
            let path = std::env::temp_dir().join(format!(
                "triangle_engine_config_{}.{extension}",
                std::process::id()
            ));
            config.save_to_file(&path).unwrap();
            let loaded = AppConfig::load_or_default(&path).unwrap();
            std::fs::remove_file(&path).unwrap();

            assert_eq!(loaded.window, config.window);
            assert_relative_eq!(loaded.render.clear_color[3], 1.0);
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_validation_rejects_zero_size_and_bad_level() {
        let mut config = AppConfig::default();
        config.window.height = 0;
        assert!(config.validate().is_err());

        let config = AppConfig {
            engine: EngineConfig::new().with_log_level("loud"),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
