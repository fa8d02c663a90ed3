//! Lifecycle controller
//!
//! Sequences startup, hands over to the frame loop, and tears down in reverse
//! order of acquisition. Any setup failure aborts the sequence: objects that
//! were already created are released and the error is returned, so no GL call
//! is ever made against a handle that failed to materialise.

use thiserror::Error;

use crate::core::config::{AppConfig, ConfigError, RenderConfig};
use crate::render::api::{BufferUsage, Capability, Face, GraphicsApi, Viewport};
use crate::render::frame::{FrameSequencer, FrameStats};
use crate::render::geometry::{AttributeLayout, Drawable, GeometryError, TRIANGLE_VERTICES};
use crate::render::shader::{ShaderError, ShaderProgram, TRIANGLE_FRAGMENT_SHADER, TRIANGLE_VERTEX_SHADER};
use crate::render::window::{GlfwSurface, Surface, SurfaceError};

/// Errors that abort startup
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Window or context creation failed
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// Shader compilation or linking failed
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderError),

    /// Vertex upload failed
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Set viewport-independent fixed-function state
pub fn configure_render_state<G: GraphicsApi + ?Sized>(gl: &G, render: &RenderConfig) {
    if render.cull_back_faces {
        gl.enable(Capability::CullFace);
        gl.cull_face(Face::Back);
    }
    gl.front_face(render.front_face);
}

/// Run the whole sample against an existing surface and graphics backend
///
/// Order: viewport, fixed-function state, shader program, geometry, frame
/// loop, then geometry and program are released. The surface itself belongs
/// to the caller.
pub fn run_with<G, S>(surface: &mut S, gl: &G, config: &AppConfig) -> Result<FrameStats, EngineError>
where
    G: GraphicsApi + ?Sized,
    S: Surface + ?Sized,
{
    let (width, height) = surface.framebuffer_size();
    gl.viewport(Viewport::covering(width, height));
    configure_render_state(gl, &config.render);

    log::info!("Building shader program");
    let program = ShaderProgram::build(gl, TRIANGLE_VERTEX_SHADER, TRIANGLE_FRAGMENT_SHADER)?;
    program.activate(gl);

    log::info!("Uploading triangle geometry");
    let drawable = match Drawable::upload(
        gl,
        &TRIANGLE_VERTICES,
        BufferUsage::StaticDraw,
        AttributeLayout::tightly_packed_vec3(0),
    ) {
        Ok(drawable) => drawable,
        Err(e) => {
            program.destroy(gl);
            return Err(e.into());
        }
    };

    let stats = FrameSequencer::new()
        .with_clear_color(config.render.clear_color)
        .run(gl, surface, &program, &drawable);

    drawable.destroy(gl);
    program.destroy(gl);
    log::info!("Released GPU resources");

    Ok(stats)
}

/// Open the window, run the sample until it is closed, and shut down
pub fn run(config: &AppConfig) -> Result<FrameStats, EngineError> {
    config.validate()?;

    log::info!("Initializing surface...");
    let (mut surface, gl) = GlfwSurface::initialize(&config.window, &config.context)?;
    if let Some(info) = gl.driver_info() {
        log::info!("Using {info}");
    }

    let result = run_with(&mut surface, &gl, config);
    surface.shutdown();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::Winding;
    use crate::render::backends::{GlCall, RecordingBackend};

    #[test]
    fn test_render_state_culls_back_faces_ccw() {
        let gl = RecordingBackend::new();
        configure_render_state(&gl, &RenderConfig::default());
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::Enable(Capability::CullFace),
                GlCall::CullFace(Face::Back),
                GlCall::FrontFace(Winding::CounterClockwise),
            ]
        );
    }

    #[test]
    fn test_render_state_without_culling() {
        let gl = RecordingBackend::new();
        let render = RenderConfig {
            cull_back_faces: false,
            front_face: Winding::Clockwise,
            ..RenderConfig::default()
        };
        configure_render_state(&gl, &render);
        assert_eq!(gl.calls(), vec![GlCall::FrontFace(Winding::Clockwise)]);
    }
}
