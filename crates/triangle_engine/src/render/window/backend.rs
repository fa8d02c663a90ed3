//! Backend-agnostic surface trait and input events
//!
//! A surface is the window plus the graphics context bound to it. The frame
//! loop only needs three things from it: drain pending input, present the back
//! buffer, and report the framebuffer size.

/// Keys the sequencer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape key
    Escape,
    /// Any other key, by platform key code
    Other(i32),
}

/// Input events delivered to the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The user asked to close the window
    CloseRequested,
    /// A key went down
    KeyPressed(Key),
    /// A key went up
    KeyReleased(Key),
    /// Anything the sequencer does not react to
    Other,
}

impl InputEvent {
    /// Whether this event ends the frame loop
    pub fn requests_exit(self) -> bool {
        matches!(self, Self::CloseRequested | Self::KeyPressed(Key::Escape))
    }
}

/// Window and context pair the frame loop renders into
pub trait Surface {
    /// Drain every pending event without blocking
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// Swap the back buffer to the front; may block on vsync
    fn present(&mut self);

    /// Current framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_events() {
        assert!(InputEvent::CloseRequested.requests_exit());
        assert!(InputEvent::KeyPressed(Key::Escape).requests_exit());
        assert!(!InputEvent::KeyReleased(Key::Escape).requests_exit());
        assert!(!InputEvent::KeyPressed(Key::Other(65)).requests_exit());
        assert!(!InputEvent::Other.requests_exit());
    }
}
