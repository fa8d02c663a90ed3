//! Surface that replays scripted input
//!
//! Each call to `poll_events` returns the next batch from the script. Once the
//! script runs out the surface reports `CloseRequested`, so a loop driven by
//! it always terminates.

use std::collections::VecDeque;

use super::backend::{InputEvent, Surface};

/// Headless surface fed from a list of event batches
#[derive(Debug, Clone)]
pub struct ScriptedSurface {
    batches: VecDeque<Vec<InputEvent>>,
    size: (u32, u32),
    polls: usize,
    presents: usize,
}

impl ScriptedSurface {
    /// Surface that yields `batches` in order, one per poll
    pub fn new<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Vec<InputEvent>>,
    {
        Self {
            batches: batches.into_iter().collect(),
            size: (800, 600),
            polls: 0,
            presents: 0,
        }
    }

    /// Surface that stays quiet for `frames` polls and then requests close
    pub fn closing_after(frames: usize) -> Self {
        Self::new(std::iter::repeat_with(Vec::new).take(frames))
    }

    /// Override the reported framebuffer size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Number of times events were polled
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Number of frames presented
    pub fn presents(&self) -> usize {
        self.presents
    }
}

impl Surface for ScriptedSurface {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.polls += 1;
        self.batches
            .pop_front()
            .unwrap_or_else(|| vec![InputEvent::CloseRequested])
    }

    fn present(&mut self) {
        self.presents += 1;
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_close() {
        let mut surface = ScriptedSurface::new([vec![InputEvent::Other], vec![]]);
        assert_eq!(surface.poll_events(), vec![InputEvent::Other]);
        assert!(surface.poll_events().is_empty());
        assert_eq!(surface.poll_events(), vec![InputEvent::CloseRequested]);
        assert_eq!(surface.polls(), 3);
    }

    #[test]
    fn test_closing_after() {
        let mut surface = ScriptedSurface::closing_after(2).with_size(320, 240);
        assert!(surface.poll_events().is_empty());
        assert!(surface.poll_events().is_empty());
        assert_eq!(surface.poll_events(), vec![InputEvent::CloseRequested]);
        assert_eq!(surface.framebuffer_size(), (320, 240));
    }
}
