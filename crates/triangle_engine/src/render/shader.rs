//! Shader compilation and program linking
//!
//! Compiles GLSL sources into shader objects and links a vertex/fragment pair
//! into a program. Diagnostics from the driver are surfaced as error values;
//! nothing here panics on bad GLSL.
//!
//! Shader objects only live between compilation and linking: `link` detaches
//! and deletes both of them whether or not linking succeeds, so the only
//! object that survives is the program.

use thiserror::Error;

use crate::render::api::{GraphicsApi, GraphicsError, ProgramHandle, ShaderHandle, ShaderStage};

/// Upper bound on the diagnostic text kept from the driver, in bytes
pub const INFO_LOG_CAPACITY: usize = 512;

/// Pass-through vertex shader: attribute 0 is the clip-space position
pub const TRIANGLE_VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
";

/// Fragment shader filling every covered pixel with opaque orange
pub const TRIANGLE_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;
void main()
{
    FragColor = vec4(1.0, 0.5, 0.2, 1.0);
}
";

/// Shader build errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// A stage failed to compile
    #[error("{stage} shader compilation failed: {log}")]
    Compile {
        /// Stage that failed
        stage: ShaderStage,
        /// Driver diagnostics, at most `INFO_LOG_CAPACITY` bytes
        log: String,
    },

    /// The compiled stages failed to link
    #[error("Shader program linking failed: {log}")]
    Link {
        /// Driver diagnostics, at most `INFO_LOG_CAPACITY` bytes
        log: String,
    },

    /// A shader was passed in the wrong slot
    #[error("Expected a {expected} shader but got a {found} shader")]
    StageMismatch {
        /// Stage the slot requires
        expected: ShaderStage,
        /// Stage that was supplied
        found: ShaderStage,
    },

    /// The backend could not create an object
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

/// Trim driver diagnostics and bound them to `INFO_LOG_CAPACITY` bytes
fn bounded_log(log: String) -> String {
    let log = log.trim_end_matches(&['\0', '\n', '\r', ' '][..]);
    if log.len() <= INFO_LOG_CAPACITY {
        return log.to_string();
    }
    let mut end = INFO_LOG_CAPACITY;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_string()
}

/// A successfully compiled shader object waiting to be linked
#[derive(Debug, PartialEq, Eq)]
pub struct CompiledShader {
    handle: ShaderHandle,
    stage: ShaderStage,
}

impl CompiledShader {
    /// Shader object handle
    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }

    /// Stage it was compiled for
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Delete the shader without linking it
    pub fn delete<G: GraphicsApi + ?Sized>(self, gl: &G) {
        gl.delete_shader(self.handle);
    }

    fn expect_stage(&self, expected: ShaderStage) -> Result<(), ShaderError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ShaderError::StageMismatch {
                expected,
                found: self.stage,
            })
        }
    }
}

/// Compile `source` for `stage`
///
/// On failure the shader object is deleted and the driver's info log returned.
pub fn compile<G: GraphicsApi + ?Sized>(
    gl: &G,
    source: &str,
    stage: ShaderStage,
) -> Result<CompiledShader, ShaderError> {
    let handle = gl.create_shader(stage)?;
    gl.shader_source(handle, source);
    gl.compile_shader(handle);

    if !gl.shader_compile_status(handle) {
        let log = bounded_log(gl.shader_info_log(handle));
        gl.delete_shader(handle);
        return Err(ShaderError::Compile { stage, log });
    }

    log::debug!("Compiled {stage} shader {}", handle.raw());
    Ok(CompiledShader { handle, stage })
}

/// Link a vertex and a fragment shader into a program
///
/// Both shaders are consumed: they are detached and deleted after the link
/// attempt. On failure the program is deleted as well.
pub fn link<G: GraphicsApi + ?Sized>(
    gl: &G,
    vertex: CompiledShader,
    fragment: CompiledShader,
) -> Result<ShaderProgram, ShaderError> {
    let stages = vertex
        .expect_stage(ShaderStage::Vertex)
        .and_then(|()| fragment.expect_stage(ShaderStage::Fragment));
    if let Err(e) = stages {
        vertex.delete(gl);
        fragment.delete(gl);
        return Err(e);
    }

    let program = match gl.create_program() {
        Ok(program) => program,
        Err(e) => {
            vertex.delete(gl);
            fragment.delete(gl);
            return Err(e.into());
        }
    };

    gl.attach_shader(program, vertex.handle);
    gl.attach_shader(program, fragment.handle);
    gl.link_program(program);
    let linked = gl.program_link_status(program);

    for shader in [vertex, fragment] {
        gl.detach_shader(program, shader.handle);
        shader.delete(gl);
    }

    if !linked {
        let log = bounded_log(gl.program_info_log(program));
        gl.delete_program(program);
        return Err(ShaderError::Link { log });
    }

    log::debug!("Linked shader program {}", program.raw());
    Ok(ShaderProgram { handle: program })
}

/// A linked, usable shader program
#[derive(Debug, PartialEq, Eq)]
pub struct ShaderProgram {
    handle: ProgramHandle,
}

impl ShaderProgram {
    /// Compile both stages and link them
    pub fn build<G: GraphicsApi + ?Sized>(
        gl: &G,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = compile(gl, vertex_source, ShaderStage::Vertex)?;
        let fragment = match compile(gl, fragment_source, ShaderStage::Fragment) {
            Ok(fragment) => fragment,
            Err(e) => {
                vertex.delete(gl);
                return Err(e);
            }
        };
        link(gl, vertex, fragment)
    }

    /// Program object handle
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Make this the current program for subsequent draws
    pub fn activate<G: GraphicsApi + ?Sized>(&self, gl: &G) {
        gl.use_program(Some(self.handle));
    }

    /// Delete the program
    pub fn destroy<G: GraphicsApi + ?Sized>(self, gl: &G) {
        log::debug!("Deleting shader program {}", self.handle.raw());
        gl.delete_program(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{GlCall, RecordingBackend};

    #[test]
    fn test_valid_sources_compile() {
        let gl = RecordingBackend::new();
        for (source, stage) in [
            (TRIANGLE_VERTEX_SHADER, ShaderStage::Vertex),
            (TRIANGLE_FRAGMENT_SHADER, ShaderStage::Fragment),
        ] {
            let shader = compile(&gl, source, stage).unwrap();
            assert_eq!(shader.stage(), stage);
            assert!(gl.shader_info_log(shader.handle()).is_empty());
            shader.delete(&gl);
        }
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn test_malformed_source_reports_log() {
        let gl = RecordingBackend::new();
        let err = compile(&gl, "#version 330 core\nvoid mian() {}", ShaderStage::Vertex).unwrap_err();
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn test_link_deletes_intermediate_shaders() {
        let gl = RecordingBackend::new();
        let program =
            ShaderProgram::build(&gl, TRIANGLE_VERTEX_SHADER, TRIANGLE_FRAGMENT_SHADER).unwrap();
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_objects(), 1);
        assert!(gl.errors().is_empty());

        let calls = gl.calls();
        let link_at = calls
            .iter()
            .position(|c| matches!(c, GlCall::LinkProgram(_)))
            .unwrap();
        let deletes: Vec<_> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, GlCall::DeleteShader(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(deletes.len(), 2);
        assert!(deletes.iter().all(|i| *i > link_at));

        program.destroy(&gl);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn test_link_failure_reports_log_and_cleans_up() {
        let gl = RecordingBackend::new()
            .fail_link("error: fragment input 'vColor' has no matching vertex output");
        let err = ShaderProgram::build(&gl, TRIANGLE_VERTEX_SHADER, TRIANGLE_FRAGMENT_SHADER)
            .unwrap_err();
        assert!(matches!(err, ShaderError::Link { ref log } if log.contains("vColor")));
        assert_eq!(gl.live_objects(), 0);
        assert!(gl.errors().is_empty());
    }

    #[test]
    fn test_fragment_failure_releases_vertex_shader() {
        let gl = RecordingBackend::new().fail_compile(ShaderStage::Fragment, "0:3(1): syntax error");
        let err = ShaderProgram::build(&gl, TRIANGLE_VERTEX_SHADER, TRIANGLE_FRAGMENT_SHADER)
            .unwrap_err();
        assert_eq!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                log: "0:3(1): syntax error".to_string()
            }
        );
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn test_swapped_stages_are_rejected() {
        let gl = RecordingBackend::new();
        let vertex = compile(&gl, TRIANGLE_VERTEX_SHADER, ShaderStage::Vertex).unwrap();
        let fragment = compile(&gl, TRIANGLE_FRAGMENT_SHADER, ShaderStage::Fragment).unwrap();
        let err = link(&gl, fragment, vertex).unwrap_err();
        assert!(matches!(err, ShaderError::StageMismatch { .. }));
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn test_log_is_bounded() {
        let long = "é".repeat(INFO_LOG_CAPACITY);
        let bounded = bounded_log(long);
        assert!(bounded.len() <= INFO_LOG_CAPACITY);
        assert!(bounded.chars().all(|c| c == 'é'));
        assert_eq!(bounded_log("error\n\0".to_string()), "error");
    }
}
