//! Graphics API abstraction for the OpenGL state machine
//!
//! This module defines the trait every graphics backend implements. The methods
//! map one-to-one onto the OpenGL entry points the sequencer needs, so the
//! ordering of calls made by the higher layers is exactly the ordering the
//! driver sees.
//!
//! ## Design Goals
//!
//! - **Explicit State**: GL's "currently bound" slots are an external dependency;
//!   the trait mirrors them instead of hiding them
//! - **Typed Handles**: Opaque, non-zero object names instead of raw integers
//! - **Testable**: A recording backend implements the same trait for tests

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use thiserror::Error;

/// Errors reported by a graphics backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// The driver refused to create an object
    #[error("Failed to create {kind}: {reason}")]
    ResourceCreation {
        /// Kind of object that was requested
        kind: &'static str,
        /// Driver-provided reason
        reason: String,
    },

    /// A read-back was requested for a buffer that holds fewer bytes
    #[error("Buffer read of {requested} bytes exceeds buffer size of {available} bytes")]
    ReadOutOfRange {
        /// Bytes requested
        requested: usize,
        /// Bytes stored in the buffer
        available: usize,
    },

    /// A buffer offset does not fit the driver's signed offset type
    #[error("Buffer offset {offset} exceeds the largest offset the driver accepts")]
    OffsetOverflow {
        /// Requested offset in bytes
        offset: usize,
    },
}

/// Result type for graphics backend operations
pub type GraphicsResult<T> = Result<T, GraphicsError>;

macro_rules! gl_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Raw GL object name
            pub fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gl_handle!(
    /// Handle to a shader object
    ShaderHandle
);
gl_handle!(
    /// Handle to a linked (or linking) program object
    ProgramHandle
);
gl_handle!(
    /// Handle to a vertex array object
    VertexArrayHandle
);
gl_handle!(
    /// Handle to a buffer object
    BufferHandle
);

/// Programmable pipeline stage a shader is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Buffer usage hint passed to the driver on upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Data set once, drawn a few times
    StreamDraw,
    /// Data set once, drawn many times
    StaticDraw,
    /// Data set many times, drawn many times
    DynamicDraw,
}

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Independent triangles, three vertices each
    Triangles,
}

/// Fixed-function capabilities toggled with `enable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Face culling
    CullFace,
}

/// Face selection for culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Front-facing polygons
    Front,
    /// Back-facing polygons
    Back,
}

/// Vertex winding that defines a front face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    /// Clockwise
    Clockwise,
    /// Counter-clockwise
    CounterClockwise,
}

/// Rectangle in window coordinates passed to `viewport`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    /// Left edge
    pub x: i32,
    /// Bottom edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Viewport {
    /// Viewport covering a whole framebuffer of the given size
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: i32::try_from(width).unwrap_or(i32::MAX),
            height: i32::try_from(height).unwrap_or(i32::MAX),
        }
    }
}

/// # Graphics API Trait
///
/// The subset of OpenGL used by the render sequencer.
///
/// ## Implementation Notes
///
/// Implementors forward each call to the driver (or a recorder) in the order it
/// is made. Binding calls change global "current" slots, so callers are
/// responsible for ordering; the geometry and shader modules wrap those calls
/// in binding tokens to make the order explicit.
pub trait GraphicsApi {
    // --- shaders ---

    /// Create an empty shader object for `stage`
    fn create_shader(&self, stage: ShaderStage) -> GraphicsResult<ShaderHandle>;
    /// Replace the source code of a shader
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    /// Compile a shader's current source
    fn compile_shader(&self, shader: ShaderHandle);
    /// Whether the last compilation succeeded
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    /// Driver diagnostics for the last compilation
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    /// Delete a shader object
    fn delete_shader(&self, shader: ShaderHandle);

    // --- programs ---

    /// Create an empty program object
    fn create_program(&self) -> GraphicsResult<ProgramHandle>;
    /// Attach a shader to a program
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    /// Detach a shader from a program
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    /// Link the attached shaders
    fn link_program(&self, program: ProgramHandle);
    /// Whether the last link succeeded
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    /// Driver diagnostics for the last link
    fn program_info_log(&self, program: ProgramHandle) -> String;
    /// Make `program` the current program, or clear it with `None`
    fn use_program(&self, program: Option<ProgramHandle>);
    /// Delete a program object
    fn delete_program(&self, program: ProgramHandle);

    // --- vertex arrays and buffers ---

    /// Create a vertex array object
    fn create_vertex_array(&self) -> GraphicsResult<VertexArrayHandle>;
    /// Bind a vertex array, or unbind with `None`
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    /// Delete a vertex array object
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    /// Create a buffer object
    fn create_buffer(&self) -> GraphicsResult<BufferHandle>;
    /// Bind a buffer to the array-buffer target, or unbind with `None`
    fn bind_array_buffer(&self, buffer: Option<BufferHandle>);
    /// Upload bytes into the buffer bound to the array-buffer target
    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage);
    /// Read bytes back from the buffer bound to the array-buffer target
    fn array_buffer_sub_data(&self, offset: usize, dst: &mut [u8]) -> GraphicsResult<()>;
    /// Delete a buffer object
    fn delete_buffer(&self, buffer: BufferHandle);
    /// Describe a float attribute sourced from the bound array buffer
    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32);
    /// Enable an attribute on the bound vertex array
    fn enable_vertex_attrib_array(&self, index: u32);

    // --- fixed-function state and drawing ---

    /// Set the viewport transform
    fn viewport(&self, viewport: Viewport);
    /// Enable a fixed-function capability
    fn enable(&self, capability: Capability);
    /// Select which faces are culled
    fn cull_face(&self, face: Face);
    /// Select the winding of front faces
    fn front_face(&self, winding: Winding);
    /// Set the colour used by `clear`
    fn clear_color(&self, color: [f32; 4]);
    /// Clear the colour buffer
    fn clear_color_buffer(&self);
    /// Draw `count` vertices starting at `first`
    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32);

    /// Human-readable driver identification, if available
    fn driver_info(&self) -> Option<String> {
        None
    }
}
