//! GLFW window with an OpenGL context
//!
//! `GlfwSurface` owns the GLFW instance, the window, and its event receiver.
//! Nothing about the window lives in globals; the surface is created once by
//! the lifecycle controller and dropped once at shutdown, which destroys the
//! window and terminates GLFW.

use glfw::Context;
use thiserror::Error;

use super::backend::{InputEvent, Key, Surface};
use crate::core::config::{ContextConfig, GlProfile, WindowConfig};
use crate::render::backends::GlowBackend;

/// Surface creation errors
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// GLFW itself could not be initialised
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window (and with it the context) could not be created
    #[error("Failed to create a {width}x{height} window with an OpenGL {major}.{minor} context")]
    WindowCreationFailed {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Requested major version
        major: u32,
        /// Requested minor version
        minor: u32,
    },
}

/// Result type for surface operations
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Map a GLFW window event onto the events the frame loop handles
pub fn translate_event(event: &glfw::WindowEvent) -> InputEvent {
    match event {
        glfw::WindowEvent::Close => InputEvent::CloseRequested,
        glfw::WindowEvent::Key(key, _, action, _) => {
            let key = match key {
                glfw::Key::Escape => Key::Escape,
                other => Key::Other(*other as i32),
            };
            match action {
                glfw::Action::Press => InputEvent::KeyPressed(key),
                glfw::Action::Release => InputEvent::KeyReleased(key),
                glfw::Action::Repeat => InputEvent::Other,
            }
        }
        _ => InputEvent::Other,
    }
}

/// GLFW window wrapper owning the current OpenGL context
pub struct GlfwSurface {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl GlfwSurface {
    /// Create the window and context, make it current, and load GL
    ///
    /// Context hints are applied before the window is created; GLFW reads
    /// them at creation time.
    pub fn initialize(
        window_config: &WindowConfig,
        context: &ContextConfig,
    ) -> SurfaceResult<(Self, GlowBackend)> {
        let mut glfw = glfw::init(glfw::log_errors)
            .map_err(|e| SurfaceError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::OpenGl));
        glfw.window_hint(glfw::WindowHint::ContextVersion(context.major, context.minor));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(match context.profile {
            GlProfile::Core => glfw::OpenGlProfileHint::Core,
            GlProfile::Compatibility => glfw::OpenGlProfileHint::Compat,
        }));
        // macOS only hands out 3.2+ core contexts when forward-compatible
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(
            context.profile == GlProfile::Core,
        ));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let (mut window, events) = glfw
            .create_window(
                window_config.width,
                window_config.height,
                &window_config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or(SurfaceError::WindowCreationFailed {
                width: window_config.width,
                height: window_config.height,
                major: context.major,
                minor: context.minor,
            })?;

        window.make_current();
        window.set_key_polling(true);
        window.set_close_polling(true);
        glfw.set_swap_interval(if window_config.vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });

        let gl = unsafe { GlowBackend::from_loader(|symbol| window.get_proc_address(symbol) as *const _) };

        log::info!(
            "Created {}x{} window '{}' with OpenGL {}.{} context",
            window_config.width,
            window_config.height,
            window_config.title,
            context.major,
            context.minor
        );

        Ok((
            Self {
                glfw,
                window,
                events,
            },
            gl,
        ))
    }

    /// Destroy the window and its context
    pub fn shutdown(self) {
        log::info!("Destroying window");
        drop(self);
    }
}

impl Surface for GlfwSurface {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .map(|(_, event)| translate_event(&event))
            .collect()
    }

    fn present(&mut self) {
        self.window.swap_buffers();
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_close_and_escape() {
        assert_eq!(translate_event(&glfw::WindowEvent::Close), InputEvent::CloseRequested);

        let escape = glfw::WindowEvent::Key(
            glfw::Key::Escape,
            0,
            glfw::Action::Press,
            glfw::Modifiers::empty(),
        );
        assert_eq!(translate_event(&escape), InputEvent::KeyPressed(Key::Escape));
    }

    #[test]
    fn test_translate_other_keys_and_actions() {
        let release = glfw::WindowEvent::Key(
            glfw::Key::Escape,
            0,
            glfw::Action::Release,
            glfw::Modifiers::empty(),
        );
        assert_eq!(translate_event(&release), InputEvent::KeyReleased(Key::Escape));

        let space = glfw::WindowEvent::Key(
            glfw::Key::Space,
            0,
            glfw::Action::Press,
            glfw::Modifiers::empty(),
        );
        assert_eq!(
            translate_event(&space),
            InputEvent::KeyPressed(Key::Other(glfw::Key::Space as i32))
        );

        let repeat = glfw::WindowEvent::Key(
            glfw::Key::Escape,
            0,
            glfw::Action::Repeat,
            glfw::Modifiers::empty(),
        );
        assert_eq!(translate_event(&repeat), InputEvent::Other);
        assert_eq!(translate_event(&glfw::WindowEvent::Focus(true)), InputEvent::Other);
    }
}
