//! # Triangle Engine
//!
//! A minimal OpenGL 3.3 render sequencer: open a window with a core-profile
//! context, build a shader program, upload a static triangle, and draw it
//! every frame until the window is closed or Escape is pressed.
//!
//! ## Features
//!
//! - **Explicit GL State**: every GL call goes through the `GraphicsApi` trait
//! - **Ordered Lifecycle**: setup aborts on the first failure and releases what it created
//! - **Headless Testing**: a recording backend and scripted surface stand in for the driver
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use triangle_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let stats = triangle_engine::run(&config)?;
//!     println!("rendered {} frames", stats.frames);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

mod engine;

pub use engine::{configure_render_state, run, run_with, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{AppConfig, Config, ContextConfig, EngineConfig, RenderConfig, WindowConfig},
        render::{
            api::{BufferUsage, GraphicsApi, ShaderStage},
            frame::{FrameSequencer, FrameStats, LoopState},
            geometry::{AttributeLayout, Drawable, TRIANGLE_VERTICES},
            shader::{ShaderProgram, TRIANGLE_FRAGMENT_SHADER, TRIANGLE_VERTEX_SHADER},
            window::{InputEvent, Key, Surface},
        },
        EngineError,
    };
}
