//! Public rendering API
//!
//! This module contains the graphics API trait the render sequencer is written
//! against, along with the typed handles and enums it exchanges with backends.

pub mod graphics_api;

// Re-export commonly used types
pub use graphics_api::{
    BufferHandle, BufferUsage, Capability, Face, GraphicsApi, GraphicsError, GraphicsResult,
    Primitive, ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, Viewport, Winding,
};
