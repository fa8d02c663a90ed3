//! # Core Engine Module
//!
//! Configuration shared by every subsystem.

pub mod config;

// Re-export commonly used config types
pub use config::{
    AppConfig, Config, ConfigError, ContextConfig, EngineConfig, GlProfile, RenderConfig,
    WindowConfig,
};
