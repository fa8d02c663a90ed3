//! In-memory recording backend
//!
//! `RecordingBackend` implements `GraphicsApi` without a driver. It keeps the
//! same object tables and "current binding" slots a GL context would, records
//! every call in order, and notes protocol violations (calls GL would reject,
//! or deletes that would leave an object alive) instead of failing.
//!
//! Compilation fails for shaders whose source has no `main` entry point, or for
//! a stage scripted with [`RecordingBackend::fail_compile`]. Linking fails when
//! a stage is missing or not compiled, or when scripted with
//! [`RecordingBackend::fail_link`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use crate::render::api::{
    BufferHandle, BufferUsage, Capability, Face, GraphicsApi, GraphicsError, GraphicsResult,
    Primitive, ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, Viewport, Winding,
};

/// One recorded graphics call
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    /// `create_shader`
    CreateShader(ShaderStage, ShaderHandle),
    /// `shader_source`
    ShaderSource(ShaderHandle),
    /// `compile_shader`
    CompileShader(ShaderHandle),
    /// `delete_shader`
    DeleteShader(ShaderHandle),
    /// `create_program`
    CreateProgram(ProgramHandle),
    /// `attach_shader`
    AttachShader(ProgramHandle, ShaderHandle),
    /// `detach_shader`
    DetachShader(ProgramHandle, ShaderHandle),
    /// `link_program`
    LinkProgram(ProgramHandle),
    /// `use_program`
    UseProgram(Option<ProgramHandle>),
    /// `delete_program`
    DeleteProgram(ProgramHandle),
    /// `create_vertex_array`
    CreateVertexArray(VertexArrayHandle),
    /// `bind_vertex_array`
    BindVertexArray(Option<VertexArrayHandle>),
    /// `delete_vertex_array`
    DeleteVertexArray(VertexArrayHandle),
    /// `create_buffer`
    CreateBuffer(BufferHandle),
    /// `bind_array_buffer`
    BindArrayBuffer(Option<BufferHandle>),
    /// `delete_buffer`
    DeleteBuffer(BufferHandle),
    /// `array_buffer_data`, with the buffer that was bound at the time
    BufferData {
        /// Bound array buffer
        buffer: Option<BufferHandle>,
        /// Uploaded byte count
        len: usize,
        /// Usage hint
        usage: BufferUsage,
    },
    /// `vertex_attrib_pointer_f32`, with the bindings it captured
    VertexAttribPointer {
        /// Attribute index
        index: u32,
        /// Components per vertex
        components: i32,
        /// Byte stride
        stride: i32,
        /// Byte offset
        offset: i32,
        /// Bound vertex array
        vertex_array: Option<VertexArrayHandle>,
        /// Bound array buffer
        buffer: Option<BufferHandle>,
    },
    /// `enable_vertex_attrib_array`
    EnableVertexAttribArray {
        /// Attribute index
        index: u32,
        /// Bound vertex array
        vertex_array: Option<VertexArrayHandle>,
    },
    /// `viewport`
    Viewport(Viewport),
    /// `enable`
    Enable(Capability),
    /// `cull_face`
    CullFace(Face),
    /// `front_face`
    FrontFace(Winding),
    /// `clear_color`
    ClearColor([f32; 4]),
    /// `clear_color_buffer`
    Clear,
    /// `draw_arrays`, with the program and vertex array it drew with
    DrawArrays {
        /// Primitive topology
        primitive: Primitive,
        /// First vertex
        first: i32,
        /// Vertex count
        count: i32,
        /// Current program
        program: Option<ProgramHandle>,
        /// Bound vertex array
        vertex_array: Option<VertexArrayHandle>,
    },
}

#[derive(Debug)]
struct ShaderRecord {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<ShaderHandle>,
    linked: bool,
    log: String,
}

#[derive(Debug, Default)]
struct State {
    next_name: u32,
    calls: Vec<GlCall>,
    errors: Vec<String>,
    shaders: HashMap<ShaderHandle, ShaderRecord>,
    programs: HashMap<ProgramHandle, ProgramRecord>,
    vertex_arrays: HashSet<VertexArrayHandle>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    current_program: Option<ProgramHandle>,
    current_vertex_array: Option<VertexArrayHandle>,
    current_array_buffer: Option<BufferHandle>,
    compile_failures: HashMap<ShaderStage, String>,
    link_failure: Option<String>,
    refuse_creation: Option<&'static str>,
}

impl State {
    fn next_name(&mut self) -> NonZeroU32 {
        self.next_name += 1;
        NonZeroU32::new(self.next_name).unwrap_or(NonZeroU32::MIN)
    }

    fn check_creation(&self, kind: &'static str) -> GraphicsResult<()> {
        if self.refuse_creation == Some(kind) {
            return Err(GraphicsError::ResourceCreation {
                kind,
                reason: "out of memory".to_string(),
            });
        }
        Ok(())
    }

    fn violation(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("recorded GL protocol violation: {message}");
        self.errors.push(message);
    }
}

/// Graphics backend that records calls instead of issuing them
#[derive(Debug, Default)]
pub struct RecordingBackend {
    state: RefCell<State>,
}

impl RecordingBackend {
    /// Create a backend with no objects and nothing bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every compilation of `stage` fail with `log`
    pub fn fail_compile(self, stage: ShaderStage, log: impl Into<String>) -> Self {
        self.state
            .borrow_mut()
            .compile_failures
            .insert(stage, log.into());
        self
    }

    /// Make every link fail with `log`
    pub fn fail_link(self, log: impl Into<String>) -> Self {
        self.state.borrow_mut().link_failure = Some(log.into());
        self
    }

    /// Refuse to create objects of `kind` ("shader", "program", "vertex array", "buffer")
    pub fn refuse_creation(self, kind: &'static str) -> Self {
        self.state.borrow_mut().refuse_creation = Some(kind);
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    /// Only the draw calls made so far
    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, GlCall::DrawArrays { .. }))
            .cloned()
            .collect()
    }

    /// Protocol violations observed so far
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    /// Number of objects created and not yet deleted
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.shaders.len() + state.programs.len() + state.vertex_arrays.len() + state.buffers.len()
    }

    /// Number of live shader objects
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Bytes stored in `buffer`, if it exists
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    /// Currently active program
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().current_program
    }

    /// Currently bound vertex array
    pub fn current_vertex_array(&self) -> Option<VertexArrayHandle> {
        self.state.borrow().current_vertex_array
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GraphicsApi for RecordingBackend {
    fn create_shader(&self, stage: ShaderStage) -> GraphicsResult<ShaderHandle> {
        let mut state = self.state.borrow_mut();
        state.check_creation("shader")?;
        let handle = ShaderHandle(state.next_name());
        state.shaders.insert(
            handle,
            ShaderRecord {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(GlCall::CreateShader(stage, handle));
        Ok(handle)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::ShaderSource(shader));
        match state.shaders.get_mut(&shader) {
            Some(record) => record.source = source.to_string(),
            None => state.violation(format!("shader_source on unknown shader {}", shader.raw())),
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::CompileShader(shader));
        let scripted = state
            .shaders
            .get(&shader)
            .and_then(|record| state.compile_failures.get(&record.stage).cloned());
        match state.shaders.get_mut(&shader) {
            Some(record) => {
                let failure = scripted.or_else(|| {
                    (!record.source.contains("void main"))
                        .then(|| "0:1(1): error: no function with name 'main'".to_string())
                });
                record.compiled = failure.is_none();
                record.log = failure.unwrap_or_default();
            }
            None => state.violation(format!("compile_shader on unknown shader {}", shader.raw())),
        }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|record| record.compiled)
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteShader(shader));
        if state.programs.values().any(|p| p.attached.contains(&shader)) {
            state.violation(format!("shader {} deleted while still attached", shader.raw()));
        }
        if state.shaders.remove(&shader).is_none() {
            state.violation(format!("delete_shader on unknown shader {}", shader.raw()));
        }
    }

    fn create_program(&self) -> GraphicsResult<ProgramHandle> {
        let mut state = self.state.borrow_mut();
        state.check_creation("program")?;
        let handle = ProgramHandle(state.next_name());
        state.programs.insert(handle, ProgramRecord::default());
        state.calls.push(GlCall::CreateProgram(handle));
        Ok(handle)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::AttachShader(program, shader));
        if !state.shaders.contains_key(&shader) {
            state.violation(format!("attach of unknown shader {}", shader.raw()));
            return;
        }
        match state.programs.get_mut(&program) {
            Some(record) => record.attached.push(shader),
            None => state.violation(format!("attach to unknown program {}", program.raw())),
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DetachShader(program, shader));
        let detached = state.programs.get_mut(&program).is_some_and(|record| {
            let before = record.attached.len();
            record.attached.retain(|s| *s != shader);
            record.attached.len() != before
        });
        if !detached {
            state.violation(format!(
                "shader {} is not attached to program {}",
                shader.raw(),
                program.raw()
            ));
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::LinkProgram(program));
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            state.violation(format!("link of unknown program {}", program.raw()));
            return;
        };

        let compiled_stage = |stage: ShaderStage| {
            attached.iter().any(|s| {
                state
                    .shaders
                    .get(s)
                    .is_some_and(|r| r.stage == stage && r.compiled)
            })
        };
        let failure = if !compiled_stage(ShaderStage::Vertex) {
            Some("error: program lacks a compiled vertex shader".to_string())
        } else if !compiled_stage(ShaderStage::Fragment) {
            Some("error: program lacks a compiled fragment shader".to_string())
        } else {
            state.link_failure.clone()
        };

        if let Some(record) = state.programs.get_mut(&program) {
            record.linked = failure.is_none();
            record.log = failure.unwrap_or_default();
        }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|record| record.linked)
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::UseProgram(program));
        if let Some(handle) = program {
            if !state.programs.get(&handle).is_some_and(|p| p.linked) {
                state.violation(format!("use of unlinked program {}", handle.raw()));
                return;
            }
        }
        state.current_program = program;
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteProgram(program));
        if state.programs.remove(&program).is_none() {
            state.violation(format!("delete_program on unknown program {}", program.raw()));
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn create_vertex_array(&self) -> GraphicsResult<VertexArrayHandle> {
        let mut state = self.state.borrow_mut();
        state.check_creation("vertex array")?;
        let handle = VertexArrayHandle(state.next_name());
        state.vertex_arrays.insert(handle);
        state.calls.push(GlCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::BindVertexArray(vertex_array));
        if let Some(handle) = vertex_array {
            if !state.vertex_arrays.contains(&handle) {
                state.violation(format!("bind of unknown vertex array {}", handle.raw()));
                return;
            }
        }
        state.current_vertex_array = vertex_array;
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteVertexArray(vertex_array));
        if !state.vertex_arrays.remove(&vertex_array) {
            state.violation(format!("delete of unknown vertex array {}", vertex_array.raw()));
        }
        if state.current_vertex_array == Some(vertex_array) {
            state.current_vertex_array = None;
        }
    }

    fn create_buffer(&self) -> GraphicsResult<BufferHandle> {
        let mut state = self.state.borrow_mut();
        state.check_creation("buffer")?;
        let handle = BufferHandle(state.next_name());
        state.buffers.insert(handle, Vec::new());
        state.calls.push(GlCall::CreateBuffer(handle));
        Ok(handle)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferHandle>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::BindArrayBuffer(buffer));
        if let Some(handle) = buffer {
            if !state.buffers.contains_key(&handle) {
                state.violation(format!("bind of unknown buffer {}", handle.raw()));
                return;
            }
        }
        state.current_array_buffer = buffer;
    }

    fn array_buffer_data(&self, data: &[u8], usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        let buffer = state.current_array_buffer;
        state.calls.push(GlCall::BufferData {
            buffer,
            len: data.len(),
            usage,
        });
        match buffer.and_then(|handle| state.buffers.get_mut(&handle)) {
            Some(contents) => *contents = data.to_vec(),
            None => state.violation("buffer data with no array buffer bound"),
        }
    }

    fn array_buffer_sub_data(&self, offset: usize, dst: &mut [u8]) -> GraphicsResult<()> {
        let state = self.state.borrow();
        let contents = state
            .current_array_buffer
            .and_then(|handle| state.buffers.get(&handle))
            .map_or(&[][..], Vec::as_slice);
        let end = offset.saturating_add(dst.len());
        let src = contents
            .get(offset..end)
            .ok_or(GraphicsError::ReadOutOfRange {
                requested: end,
                available: contents.len(),
            })?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteBuffer(buffer));
        if state.buffers.remove(&buffer).is_none() {
            state.violation(format!("delete of unknown buffer {}", buffer.raw()));
        }
        if state.current_array_buffer == Some(buffer) {
            state.current_array_buffer = None;
        }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.current_vertex_array;
        let buffer = state.current_array_buffer;
        state.calls.push(GlCall::VertexAttribPointer {
            index,
            components,
            stride,
            offset,
            vertex_array,
            buffer,
        });
        if vertex_array.is_none() {
            state.violation("attribute described with no vertex array bound");
        }
        if buffer.is_none() {
            state.violation("attribute described with no array buffer bound");
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.current_vertex_array;
        state.calls.push(GlCall::EnableVertexAttribArray {
            index,
            vertex_array,
        });
        if vertex_array.is_none() {
            state.violation("attribute enabled with no vertex array bound");
        }
    }

    fn viewport(&self, viewport: Viewport) {
        self.record(GlCall::Viewport(viewport));
    }

    fn enable(&self, capability: Capability) {
        self.record(GlCall::Enable(capability));
    }

    fn cull_face(&self, face: Face) {
        self.record(GlCall::CullFace(face));
    }

    fn front_face(&self, winding: Winding) {
        self.record(GlCall::FrontFace(winding));
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.record(GlCall::ClearColor(color));
    }

    fn clear_color_buffer(&self) {
        self.record(GlCall::Clear);
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        let program = state.current_program;
        let vertex_array = state.current_vertex_array;
        state.calls.push(GlCall::DrawArrays {
            primitive,
            first,
            count,
            program,
            vertex_array,
        });
        if program.is_none() {
            state.violation("draw with no program in use");
        }
        if vertex_array.is_none() {
            state.violation("draw with no vertex array bound");
        }
    }

    fn driver_info(&self) -> Option<String> {
        Some("recording backend".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique_and_tracked() {
        let gl = RecordingBackend::new();
        let vao = gl.create_vertex_array().unwrap();
        let vbo = gl.create_buffer().unwrap();
        assert_ne!(vao.raw(), vbo.raw());
        assert_eq!(gl.live_objects(), 2);

        gl.delete_vertex_array(vao);
        gl.delete_buffer(vbo);
        assert_eq!(gl.live_objects(), 0);
        assert!(gl.errors().is_empty());
    }

    #[test]
    fn test_attribute_without_bindings_is_a_violation() {
        let gl = RecordingBackend::new();
        gl.vertex_attrib_pointer_f32(0, 3, 12, 0);
        assert_eq!(gl.errors().len(), 2);
    }

    #[test]
    fn test_refused_creation_reports_kind() {
        let gl = RecordingBackend::new().refuse_creation("buffer");
        let err = gl.create_buffer().unwrap_err();
        assert!(matches!(err, GraphicsError::ResourceCreation { kind: "buffer", .. }));
        assert!(gl.create_vertex_array().is_ok());
    }

    #[test]
    fn test_draw_captures_current_bindings() {
        let gl = RecordingBackend::new();
        gl.draw_arrays(Primitive::Triangles, 0, 3);
        assert_eq!(
            gl.draw_calls(),
            vec![GlCall::DrawArrays {
                primitive: Primitive::Triangles,
                first: 0,
                count: 3,
                program: None,
                vertex_array: None,
            }]
        );
        assert_eq!(gl.errors().len(), 2);
    }
}
