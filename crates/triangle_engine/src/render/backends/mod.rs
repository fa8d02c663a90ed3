//! Backend implementations for the render module
//!
//! `opengl` drives a real context through glow; `recording` keeps the same
//! state in memory for tests and headless runs.

/// OpenGL backend over a loaded glow context
pub mod opengl;

/// In-memory backend that records calls
pub mod recording;

pub use opengl::GlowBackend;
pub use recording::{GlCall, RecordingBackend};
