//! # Rendering System
//!
//! The pieces of the triangle sample, leaf first:
//!
//! - **`api`**: the `GraphicsApi` trait over the OpenGL state machine
//! - **`backends`**: glow-backed and recording implementations of it
//! - **`window`**: surfaces (window + context) and input events
//! - **`shader`**: shader compilation and program linking
//! - **`geometry`**: static vertex buffer upload and attribute layout
//! - **`frame`**: the clear/poll/draw/present loop

pub mod api;
pub mod backends;
pub mod frame;
pub mod geometry;
pub mod shader;
pub mod window;

pub use api::{GraphicsApi, GraphicsError};
pub use backends::{GlowBackend, RecordingBackend};
pub use frame::{FrameSequencer, FrameStats, LoopState};
pub use geometry::{AttributeLayout, Drawable, GeometryError, TRIANGLE_VERTICES};
pub use shader::{ShaderError, ShaderProgram, TRIANGLE_FRAGMENT_SHADER, TRIANGLE_VERTEX_SHADER};
pub use window::{GlfwSurface, InputEvent, Key, ScriptedSurface, Surface, SurfaceError};
