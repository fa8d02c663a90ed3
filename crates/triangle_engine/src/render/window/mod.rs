//! Window management subsystem
//!
//! # Module Organization
//!
//! - **`backend`**: the `Surface` trait the frame loop renders into, and input events
//! - **`handle`**: `GlfwSurface`, a GLFW window owning an OpenGL context
//! - **`scripted`**: `ScriptedSurface`, a headless surface replaying input for tests

pub mod backend;
pub mod handle;
pub mod scripted;

pub use backend::{InputEvent, Key, Surface};
pub use handle::{GlfwSurface, SurfaceError, SurfaceResult};
pub use scripted::ScriptedSurface;
