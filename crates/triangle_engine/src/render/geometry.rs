//! Static geometry upload
//!
//! Uploads a fixed array of vertex positions into a GPU buffer and records its
//! layout in a vertex array object.
//!
//! GL reads attribute layouts from whatever vertex array and array buffer are
//! bound at the time of the call. The free functions here make that explicit:
//! binding returns a token, and describing or enabling an attribute requires
//! the tokens for both bindings. The order "bind array, bind buffer, upload,
//! describe, enable" therefore falls out of the signatures.

use std::mem::size_of;

use thiserror::Error;

use crate::render::api::{
    BufferHandle, BufferUsage, GraphicsApi, GraphicsError, Primitive, VertexArrayHandle,
};

/// Positions of the sample triangle, three vertices of (x, y, z)
pub const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.0, 0.5, 0.0,
];

/// Geometry upload errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// The vertex slice does not describe whole vertices
    #[error("{len} floats cannot be split into vertices of {components} components")]
    InvalidVertexData {
        /// Number of floats supplied
        len: usize,
        /// Components per vertex in the layout
        components: i32,
    },

    /// The backend could not create or read an object
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

/// How one float attribute is laid out in the array buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    /// Shader attribute location
    pub index: u32,
    /// Floats per vertex
    pub components: i32,
    /// Bytes between consecutive vertices
    pub stride: i32,
    /// Byte offset of the first component
    pub offset: i32,
}

impl AttributeLayout {
    /// Three floats per vertex with nothing in between
    pub fn tightly_packed_vec3(index: u32) -> Self {
        Self {
            index,
            components: 3,
            stride: (3 * size_of::<f32>()) as i32,
            offset: 0,
        }
    }
}

/// Proof that a vertex array is bound
#[derive(Debug)]
pub struct VertexArrayBinding {
    vertex_array: VertexArrayHandle,
}

impl VertexArrayBinding {
    /// The bound vertex array
    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }
}

/// Proof that a buffer is bound to the array-buffer target
#[derive(Debug)]
pub struct ArrayBufferBinding {
    buffer: BufferHandle,
}

impl ArrayBufferBinding {
    /// The bound buffer
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }
}

/// Create a vertex array object
pub fn create_vertex_array<G: GraphicsApi + ?Sized>(gl: &G) -> Result<VertexArrayHandle, GeometryError> {
    Ok(gl.create_vertex_array()?)
}

/// Bind a vertex array
pub fn bind_vertex_array<G: GraphicsApi + ?Sized>(
    gl: &G,
    vertex_array: VertexArrayHandle,
) -> VertexArrayBinding {
    gl.bind_vertex_array(Some(vertex_array));
    VertexArrayBinding { vertex_array }
}

/// Create a buffer object
pub fn create_buffer<G: GraphicsApi + ?Sized>(gl: &G) -> Result<BufferHandle, GeometryError> {
    Ok(gl.create_buffer()?)
}

/// Bind a buffer to the array-buffer target
pub fn bind_array_buffer<G: GraphicsApi + ?Sized>(gl: &G, buffer: BufferHandle) -> ArrayBufferBinding {
    gl.bind_array_buffer(Some(buffer));
    ArrayBufferBinding { buffer }
}

/// Copy `data` into the bound array buffer
pub fn upload<G: GraphicsApi + ?Sized>(
    gl: &G,
    _buffer: &ArrayBufferBinding,
    data: &[f32],
    usage: BufferUsage,
) {
    gl.array_buffer_data(bytemuck::cast_slice(data), usage);
}

/// Describe where the bound vertex array finds `layout` in the bound buffer
pub fn describe_attribute<G: GraphicsApi + ?Sized>(
    gl: &G,
    _vertex_array: &VertexArrayBinding,
    _buffer: &ArrayBufferBinding,
    layout: AttributeLayout,
) {
    gl.vertex_attrib_pointer_f32(layout.index, layout.components, layout.stride, layout.offset);
}

/// Enable attribute `index` on the bound vertex array
pub fn enable_attribute<G: GraphicsApi + ?Sized>(gl: &G, _vertex_array: &VertexArrayBinding, index: u32) {
    gl.enable_vertex_attrib_array(index);
}

/// Uploaded vertex buffer plus the vertex array describing it
#[derive(Debug, PartialEq, Eq)]
pub struct Drawable {
    vertex_array: VertexArrayHandle,
    buffer: BufferHandle,
    layout: AttributeLayout,
    float_count: usize,
    vertex_count: i32,
}

impl Drawable {
    /// Create, bind, fill and describe the buffers for `vertices`
    pub fn upload<G: GraphicsApi + ?Sized>(
        gl: &G,
        vertices: &[f32],
        usage: BufferUsage,
        layout: AttributeLayout,
    ) -> Result<Self, GeometryError> {
        let invalid = || GeometryError::InvalidVertexData {
            len: vertices.len(),
            components: layout.components,
        };
        let components = usize::try_from(layout.components).map_err(|_| invalid())?;
        if vertices.is_empty() || components == 0 || vertices.len() % components != 0 {
            return Err(invalid());
        }
        let vertex_count = i32::try_from(vertices.len() / components).map_err(|_| invalid())?;

        let vertex_array = create_vertex_array(gl)?;
        let buffer = match create_buffer(gl) {
            Ok(buffer) => buffer,
            Err(e) => {
                gl.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };

        let vao_binding = bind_vertex_array(gl, vertex_array);
        let buffer_binding = bind_array_buffer(gl, buffer);
        upload(gl, &buffer_binding, vertices, usage);
        describe_attribute(gl, &vao_binding, &buffer_binding, layout);
        enable_attribute(gl, &vao_binding, layout.index);

        log::debug!(
            "Uploaded {vertex_count} vertices ({} bytes) into buffer {} / vertex array {}",
            std::mem::size_of_val(vertices),
            buffer.raw(),
            vertex_array.raw()
        );

        Ok(Self {
            vertex_array,
            buffer,
            layout,
            float_count: vertices.len(),
            vertex_count,
        })
    }

    /// Vertex array handle
    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }

    /// Buffer handle
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Attribute layout the buffer was described with
    pub fn layout(&self) -> AttributeLayout {
        self.layout
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    /// Bind the vertex array for drawing
    pub fn bind<G: GraphicsApi + ?Sized>(&self, gl: &G) -> VertexArrayBinding {
        bind_vertex_array(gl, self.vertex_array)
    }

    /// Draw every vertex as a triangle list
    pub fn draw<G: GraphicsApi + ?Sized>(&self, gl: &G, _binding: &VertexArrayBinding) {
        gl.draw_arrays(Primitive::Triangles, 0, self.vertex_count);
    }

    /// Read the buffer contents back from the GPU
    pub fn read_back<G: GraphicsApi + ?Sized>(&self, gl: &G) -> Result<Vec<f32>, GeometryError> {
        let _binding = bind_array_buffer(gl, self.buffer);
        let mut floats = vec![0.0_f32; self.float_count];
        gl.array_buffer_sub_data(0, bytemuck::cast_slice_mut(&mut floats))?;
        Ok(floats)
    }

    /// Delete the vertex array and buffer
    pub fn destroy<G: GraphicsApi + ?Sized>(self, gl: &G) {
        log::debug!(
            "Deleting vertex array {} and buffer {}",
            self.vertex_array.raw(),
            self.buffer.raw()
        );
        gl.delete_vertex_array(self.vertex_array);
        gl.delete_buffer(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{GlCall, RecordingBackend};

    fn upload_triangle(gl: &RecordingBackend) -> Drawable {
        Drawable::upload(
            gl,
            &TRIANGLE_VERTICES,
            BufferUsage::StaticDraw,
            AttributeLayout::tightly_packed_vec3(0),
        )
        .unwrap()
    }

    #[test]
    fn test_tightly_packed_layout() {
        let layout = AttributeLayout::tightly_packed_vec3(0);
        assert_eq!(layout.components, 3);
        assert_eq!(layout.stride, 12);
        assert_eq!(layout.offset, 0);
    }

    #[test]
    fn test_upload_follows_binding_protocol() {
        let gl = RecordingBackend::new();
        let drawable = upload_triangle(&gl);
        assert_eq!(drawable.vertex_count(), 3);
        assert_eq!(drawable.layout(), AttributeLayout::tightly_packed_vec3(0));
        assert!(gl.errors().is_empty());

        let vao = Some(drawable.vertex_array());
        let vbo = Some(drawable.buffer());
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::CreateVertexArray(drawable.vertex_array()),
                GlCall::CreateBuffer(drawable.buffer()),
                GlCall::BindVertexArray(vao),
                GlCall::BindArrayBuffer(vbo),
                GlCall::BufferData {
                    buffer: vbo,
                    len: 36,
                    usage: BufferUsage::StaticDraw
                },
                GlCall::VertexAttribPointer {
                    index: 0,
                    components: 3,
                    stride: 12,
                    offset: 0,
                    vertex_array: vao,
                    buffer: vbo
                },
                GlCall::EnableVertexAttribArray {
                    index: 0,
                    vertex_array: vao
                },
            ]
        );
    }

    #[test]
    fn test_read_back_is_byte_exact() {
        let gl = RecordingBackend::new();
        let drawable = upload_triangle(&gl);
        let floats = drawable.read_back(&gl).unwrap();
        assert_eq!(
            bytemuck::cast_slice::<f32, u8>(&floats),
            bytemuck::cast_slice::<f32, u8>(&TRIANGLE_VERTICES)
        );
        assert_eq!(
            gl.buffer_contents(drawable.buffer()).unwrap(),
            bytemuck::cast_slice::<f32, u8>(&TRIANGLE_VERTICES)
        );
    }

    #[test]
    fn test_rejects_partial_vertices() {
        let gl = RecordingBackend::new();
        let layout = AttributeLayout::tightly_packed_vec3(0);
        let err = Drawable::upload(&gl, &[0.0; 7], BufferUsage::StaticDraw, layout).unwrap_err();
        assert_eq!(err, GeometryError::InvalidVertexData { len: 7, components: 3 });
        assert!(Drawable::upload(&gl, &[], BufferUsage::StaticDraw, layout).is_err());
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn test_buffer_failure_releases_vertex_array() {
        let gl = RecordingBackend::new().refuse_creation("buffer");
        let err = Drawable::upload(
            &gl,
            &TRIANGLE_VERTICES,
            BufferUsage::StaticDraw,
            AttributeLayout::tightly_packed_vec3(0),
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::Graphics(_)));
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn test_destroy_releases_both_objects() {
        let gl = RecordingBackend::new();
        let drawable = upload_triangle(&gl);
        assert_eq!(gl.live_objects(), 2);
        drawable.destroy(&gl);
        assert_eq!(gl.live_objects(), 0);
        assert!(gl.errors().is_empty());
    }
}
