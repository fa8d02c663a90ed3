//! OpenGL backend on top of `glow`
//!
//! Forwards every `GraphicsApi` call to the driver through a loaded
//! `glow::Context`. All calls are `unsafe` in glow because they require a
//! current context on the calling thread; `GlowBackend` is only constructed by
//! the window that made its context current, and neither type is `Send`.

use glow::HasContext;

use crate::render::api::{
    BufferHandle, BufferUsage, Capability, Face, GraphicsApi, GraphicsError, GraphicsResult,
    Primitive, ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, Viewport, Winding,
};

/// Graphics backend driving a real OpenGL context
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Load GL entry points with the given resolver
    ///
    /// # Safety
    /// The context the loader resolves symbols for must be current on this
    /// thread for as long as the backend is used.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const std::os::raw::c_void,
    {
        Self {
            gl: glow::Context::from_loader_function(loader),
        }
    }
}

fn creation_error(kind: &'static str) -> impl FnOnce(String) -> GraphicsError {
    move |reason| GraphicsError::ResourceCreation { kind, reason }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn usage_enum(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
    }
}

fn driver_offset(offset: usize) -> GraphicsResult<i32> {
    i32::try_from(offset).map_err(|_| GraphicsError::OffsetOverflow { offset })
}

fn shader(handle: ShaderHandle) -> glow::NativeShader {
    glow::NativeShader(handle.0)
}

fn program(handle: ProgramHandle) -> glow::NativeProgram {
    glow::NativeProgram(handle.0)
}

impl GraphicsApi for GlowBackend {
    fn create_shader(&self, stage: ShaderStage) -> GraphicsResult<ShaderHandle> {
        let created = unsafe { self.gl.create_shader(stage_enum(stage)) };
        created
            .map(|s| ShaderHandle(s.0))
            .map_err(creation_error("shader"))
    }

    fn shader_source(&self, handle: ShaderHandle, source: &str) {
        unsafe { self.gl.shader_source(shader(handle), source) }
    }

    fn compile_shader(&self, handle: ShaderHandle) {
        unsafe { self.gl.compile_shader(shader(handle)) }
    }

    fn shader_compile_status(&self, handle: ShaderHandle) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader(handle)) }
    }

    fn shader_info_log(&self, handle: ShaderHandle) -> String {
        unsafe { self.gl.get_shader_info_log(shader(handle)) }
    }

    fn delete_shader(&self, handle: ShaderHandle) {
        unsafe { self.gl.delete_shader(shader(handle)) }
    }

    fn create_program(&self) -> GraphicsResult<ProgramHandle> {
        let created = unsafe { self.gl.create_program() };
        created
            .map(|p| ProgramHandle(p.0))
            .map_err(creation_error("program"))
    }

    fn attach_shader(&self, handle: ProgramHandle, shader_handle: ShaderHandle) {
        unsafe { self.gl.attach_shader(program(handle), shader(shader_handle)) }
    }

    fn detach_shader(&self, handle: ProgramHandle, shader_handle: ShaderHandle) {
        unsafe { self.gl.detach_shader(program(handle), shader(shader_handle)) }
    }

    fn link_program(&self, handle: ProgramHandle) {
        unsafe { self.gl.link_program(program(handle)) }
    }

    fn program_link_status(&self, handle: ProgramHandle) -> bool {
        unsafe { self.gl.get_program_link_status(program(handle)) }
    }

    fn program_info_log(&self, handle: ProgramHandle) -> String {
        unsafe { self.gl.get_program_info_log(program(handle)) }
    }

    fn use_program(&self, handle: Option<ProgramHandle>) {
        unsafe { self.gl.use_program(handle.map(program)) }
    }

    fn delete_program(&self, handle: ProgramHandle) {
        unsafe { self.gl.delete_program(program(handle)) }
    }

    fn create_vertex_array(&self) -> GraphicsResult<VertexArrayHandle> {
        let created = unsafe { self.gl.create_vertex_array() };
        created
            .map(|v| VertexArrayHandle(v.0))
            .map_err(creation_error("vertex array"))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe {
            self.gl
                .bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.0)))
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(vertex_array.0))
        }
    }

    fn create_buffer(&self) -> GraphicsResult<BufferHandle> {
        let created = unsafe { self.gl.create_buffer() };
        created
            .map(|b| BufferHandle(b.0))
            .map_err(creation_error("buffer"))
    }

    fn bind_array_buffer(&self, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl
                .bind_buffer(glow::ARRAY_BUFFER, buffer.map(|b| glow::NativeBuffer(b.0)))
        }
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, usage_enum(usage))
        }
    }

    fn array_buffer_sub_data(&self, offset: usize, dst: &mut [u8]) -> GraphicsResult<()> {
        let offset = driver_offset(offset)?;
        unsafe { self.gl.get_buffer_sub_data(glow::ARRAY_BUFFER, offset, dst) }
        Ok(())
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn viewport(&self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height)
        }
    }

    fn enable(&self, capability: Capability) {
        let cap = match capability {
            Capability::CullFace => glow::CULL_FACE,
        };
        unsafe { self.gl.enable(cap) }
    }

    fn cull_face(&self, face: Face) {
        let face = match face {
            Face::Front => glow::FRONT,
            Face::Back => glow::BACK,
        };
        unsafe { self.gl.cull_face(face) }
    }

    fn front_face(&self, winding: Winding) {
        let winding = match winding {
            Winding::Clockwise => glow::CW,
            Winding::CounterClockwise => glow::CCW,
        };
        unsafe { self.gl.front_face(winding) }
    }

    fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear_color_buffer(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT) }
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        let mode = match primitive {
            Primitive::Triangles => glow::TRIANGLES,
        };
        unsafe { self.gl.draw_arrays(mode, first, count) }
    }

    fn driver_info(&self) -> Option<String> {
        let (version, renderer) = unsafe {
            (
                self.gl.get_parameter_string(glow::VERSION),
                self.gl.get_parameter_string(glow::RENDERER),
            )
        };
        Some(format!("OpenGL {version} ({renderer})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_beyond_i32_are_rejected() {
        assert_eq!(driver_offset(0), Ok(0));
        assert_eq!(driver_offset(i32::MAX as usize), Ok(i32::MAX));

        let too_far = i32::MAX as usize + 1;
        assert_eq!(
            driver_offset(too_far),
            Err(GraphicsError::OffsetOverflow { offset: too_far })
        );
    }
}
