//! Presentation layer.
//!
//! A [`ChatView`] is whatever surface shows the conversation: bubbles in a
//! scrolling container, an input that can be cleared or locked, and a status
//! line echoing the last question. Views own no transcript state.
//!
//! - [`TerminalView`]: writes bubbles to a terminal
//! - [`RecordingView`]: keeps everything in memory, for tests and embedding

mod recording;
mod terminal;

pub use recording::{Bubble, RecordingView};
pub use terminal::TerminalView;

use crate::session::Role;

/// Reference to a rendered bubble, valid for the view that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BubbleHandle(usize);

impl BubbleHandle {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Visual tag of a bubble. Anything that is not the user renders as the
/// assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    User,
    Assistant,
}

impl From<Role> for BubbleKind {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::System | Role::Assistant => Self::Assistant,
        }
    }
}

/// Surface the session renders into.
pub trait ChatView {
    /// Append a bubble and return a handle to it.
    fn append_bubble(&mut self, kind: BubbleKind, text: &str) -> BubbleHandle;

    /// Replace the content of an existing bubble.
    fn replace_bubble(&mut self, handle: BubbleHandle, text: &str);

    /// Bring the newest bubble into view.
    fn scroll_to_latest(&mut self);

    /// Empty the input field.
    fn clear_input(&mut self);

    /// Allow or block new submissions.
    fn set_input_enabled(&mut self, enabled: bool);

    /// Show a one-line status, e.g. the last question asked.
    fn set_status(&mut self, text: &str);
}
