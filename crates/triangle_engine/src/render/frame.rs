//! Frame loop
//!
//! Two states, `Running` and `Stopped`. Each iteration clears, drains input,
//! draws (only while still running) and presents. `Stopped` is terminal.
//!
//! There is no frame pacing: the loop runs as fast as event polling and
//! `present` allow, and `present` may block on vsync.

use crate::render::api::GraphicsApi;
use crate::render::geometry::Drawable;
use crate::render::shader::ShaderProgram;
use crate::render::window::{InputEvent, Surface};

/// Whether the frame loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Frames are being produced
    Running,
    /// An exit was requested; no further frames
    Stopped,
}

/// Counters gathered while the loop ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames presented
    pub frames: u64,
    /// Draw calls issued
    pub draws: u64,
}

/// Drives clear, poll, draw and present until an exit is requested
#[derive(Debug)]
pub struct FrameSequencer {
    state: LoopState,
    clear_color: [f32; 4],
    stats: FrameStats,
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSequencer {
    /// Running sequencer clearing to transparent black
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            stats: FrameStats::default(),
        }
    }

    /// Set the per-frame clear colour
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Counters so far
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Apply one batch of input
    ///
    /// The whole batch is consumed before the state changes, so an exit
    /// request anywhere in it takes effect only after the batch is drained.
    pub fn handle_events<I>(&mut self, events: I) -> LoopState
    where
        I: IntoIterator<Item = InputEvent>,
    {
        let exit_requested = events
            .into_iter()
            .fold(false, |exit, event| exit | event.requests_exit());

        if exit_requested && self.state == LoopState::Running {
            log::info!("Exit requested, stopping frame loop");
            self.state = LoopState::Stopped;
        }
        self.state
    }

    /// Produce one frame
    pub fn run_frame<G, S>(
        &mut self,
        gl: &G,
        surface: &mut S,
        program: &ShaderProgram,
        drawable: &Drawable,
    ) -> LoopState
    where
        G: GraphicsApi + ?Sized,
        S: Surface + ?Sized,
    {
        if self.state == LoopState::Stopped {
            return self.state;
        }

        gl.clear_color(self.clear_color);
        gl.clear_color_buffer();

        let events = surface.poll_events();
        if self.handle_events(events) == LoopState::Running {
            // Other code may have changed the current program or vertex array
            program.activate(gl);
            let binding = drawable.bind(gl);
            drawable.draw(gl, &binding);
            self.stats.draws += 1;
        }

        surface.present();
        self.stats.frames += 1;
        self.state
    }

    /// Produce frames until an exit is requested
    pub fn run<G, S>(
        &mut self,
        gl: &G,
        surface: &mut S,
        program: &ShaderProgram,
        drawable: &Drawable,
    ) -> FrameStats
    where
        G: GraphicsApi + ?Sized,
        S: Surface + ?Sized,
    {
        log::info!("Starting frame loop");
        while self.run_frame(gl, surface, program, drawable) == LoopState::Running {}
        log::info!(
            "Frame loop stopped after {} frames ({} draws)",
            self.stats.frames,
            self.stats.draws
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::BufferUsage;
    use crate::render::backends::RecordingBackend;
    use crate::render::geometry::{AttributeLayout, TRIANGLE_VERTICES};
    use crate::render::shader::{TRIANGLE_FRAGMENT_SHADER, TRIANGLE_VERTEX_SHADER};
    use crate::render::window::{Key, ScriptedSurface};

    #[test]
    fn test_benign_events_keep_running() {
        let mut sequencer = FrameSequencer::new();
        let state = sequencer.handle_events([
            InputEvent::Other,
            InputEvent::KeyPressed(Key::Other(32)),
            InputEvent::KeyReleased(Key::Escape),
        ]);
        assert_eq!(state, LoopState::Running);
    }

    #[test]
    fn test_close_anywhere_in_batch_stops_after_drain() {
        let mut drained = 0;
        let batch = [
            InputEvent::Other,
            InputEvent::CloseRequested,
            InputEvent::Other,
            InputEvent::KeyPressed(Key::Other(65)),
        ];
        let mut sequencer = FrameSequencer::new();
        let state = sequencer.handle_events(batch.iter().copied().inspect(|_| drained += 1));
        assert_eq!(state, LoopState::Stopped);
        assert_eq!(drained, batch.len());
    }

    #[test]
    fn test_escape_press_stops_other_keys_do_not() {
        let mut sequencer = FrameSequencer::new();
        assert_eq!(
            sequencer.handle_events([InputEvent::KeyPressed(Key::Other(81))]),
            LoopState::Running
        );
        assert_eq!(
            sequencer.handle_events([InputEvent::KeyPressed(Key::Escape)]),
            LoopState::Stopped
        );
    }

    #[test]
    fn test_stopped_is_terminal() {
        let mut sequencer = FrameSequencer::new();
        sequencer.handle_events([InputEvent::CloseRequested]);
        assert_eq!(sequencer.handle_events(Vec::new()), LoopState::Stopped);
        assert_eq!(sequencer.state(), LoopState::Stopped);
    }

    #[test]
    fn test_stats_count_frames_and_draws() {
        let gl = RecordingBackend::new();
        let program =
            ShaderProgram::build(&gl, TRIANGLE_VERTEX_SHADER, TRIANGLE_FRAGMENT_SHADER).unwrap();
        let drawable = Drawable::upload(
            &gl,
            &TRIANGLE_VERTICES,
            BufferUsage::StaticDraw,
            AttributeLayout::tightly_packed_vec3(0),
        )
        .unwrap();
        let mut surface = ScriptedSurface::closing_after(2);
        let mut sequencer = FrameSequencer::new();
        assert_eq!(sequencer.stats(), FrameStats::default());

        assert_eq!(
            sequencer.run_frame(&gl, &mut surface, &program, &drawable),
            LoopState::Running
        );
        assert_eq!(sequencer.stats(), FrameStats { frames: 1, draws: 1 });

        let stats = sequencer.run(&gl, &mut surface, &program, &drawable);
        assert_eq!(stats, FrameStats { frames: 3, draws: 2 });
        assert_eq!(sequencer.stats(), stats);

        // Stopped frames neither draw nor present
        sequencer.run_frame(&gl, &mut surface, &program, &drawable);
        assert_eq!(sequencer.stats(), stats);
        assert_eq!(surface.presents(), 3);

        drawable.destroy(&gl);
        program.destroy(&gl);
    }
}
