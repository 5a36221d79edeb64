//! In-memory view.

use super::{BubbleHandle, BubbleKind, ChatView};

/// A bubble as currently displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub kind: BubbleKind,
    pub text: String,
}

/// Records everything a session renders.
///
/// Besides the current screen state it keeps the input history (clears and
/// lock toggles) so callers can check what happened in which order.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    bubbles: Vec<Bubble>,
    status: Option<String>,
    input: String,
    input_enabled: bool,
    input_toggles: Vec<bool>,
    input_clears: usize,
    scrolls: usize,
}

impl RecordingView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the user typed into the input field.
    pub fn type_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Current contents of the input field.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    #[must_use]
    pub fn bubble(&self, handle: BubbleHandle) -> Option<&Bubble> {
        self.bubbles.get(handle.index())
    }

    #[must_use]
    pub fn last_bubble(&self) -> Option<&Bubble> {
        self.bubbles.last()
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Every value passed to [`ChatView::set_input_enabled`], in order.
    #[must_use]
    pub fn input_toggles(&self) -> &[bool] {
        &self.input_toggles
    }

    #[must_use]
    pub fn input_clears(&self) -> usize {
        self.input_clears
    }

    #[must_use]
    pub fn scrolls(&self) -> usize {
        self.scrolls
    }
}

impl ChatView for RecordingView {
    fn append_bubble(&mut self, kind: BubbleKind, text: &str) -> BubbleHandle {
        self.bubbles.push(Bubble {
            kind,
            text: text.to_string(),
        });
        BubbleHandle::new(self.bubbles.len() - 1)
    }

    fn replace_bubble(&mut self, handle: BubbleHandle, text: &str) {
        if let Some(bubble) = self.bubbles.get_mut(handle.index()) {
            bubble.text = text.to_string();
        }
    }

    fn scroll_to_latest(&mut self) {
        self.scrolls += 1;
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.input_clears += 1;
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        self.input_toggles.push(enabled);
    }

    fn set_status(&mut self, text: &str) {
        self.status = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_replace() {
        let mut view = RecordingView::new();
        let first = view.append_bubble(BubbleKind::User, "hello");
        let second = view.append_bubble(BubbleKind::Assistant, "…");

        view.replace_bubble(second, "hi!");

        assert_eq!(view.bubble(first).unwrap().text, "hello");
        assert_eq!(view.bubble(second).unwrap().text, "hi!");
        assert_eq!(view.bubbles().len(), 2);
        assert_eq!(view.scrolls(), 0);
    }

    #[test]
    fn test_input_tracking() {
        let mut view = RecordingView::new();
        view.type_input("draft");
        view.set_input_enabled(false);
        view.clear_input();
        view.set_input_enabled(true);

        assert_eq!(view.input(), "");
        assert_eq!(view.input_clears(), 1);
        assert_eq!(view.input_toggles(), &[false, true]);
        assert!(view.input_enabled());
    }
}
