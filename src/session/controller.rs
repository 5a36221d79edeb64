//! The chat session controller.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::transcript::{Role, Transcript};
use crate::proxy::{ProxyReply, ProxyTransport};
use crate::ui::{BubbleHandle, ChatView};

/// Interim content of the assistant bubble while a reply is awaited.
pub const THINKING_PLACEHOLDER: &str = "…thinking…";

/// Shown in place of a reply when the round-trip fails.
pub const APOLOGY: &str = "Sorry — I couldn't reach the service. Please try again later.";

/// Policy sent as the system message when none is configured.
pub const DEFAULT_POLICY: &str = "You are an assistant specialized in L'Oréal products, routines, and recommendations. Answer only questions about L'Oréal brands, products, skin/hair care routines, application tips, product ingredients as publicly documented, and recommendations within the L'Oréal portfolio. If a user asks about topics outside L'Oréal products, beauty routines or related topics (for example politics, unrelated technical help, personal medical diagnosis beyond general skincare guidance), politely refuse and say you can only help with L'Oréal product and routine questions. Be concise, helpful, and cite product names where appropriate.";

/// First assistant bubble of a session. Not part of the transcript.
pub const DEFAULT_GREETING: &str = "👋 Bonjour! I'm the L'Oréal Smart Advisor. Ask me about L'Oréal products, routines, or recommendations.";

/// What a session starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// System message seeding the transcript.
    pub policy: String,
    /// Greeting bubble; `None` skips it.
    pub greeting: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            policy: DEFAULT_POLICY.to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
        }
    }
}

/// How a submitted turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A reply was shown and recorded.
    Replied(ProxyReply),
    /// The apology was shown; nothing was recorded for the reply.
    Failed,
}

/// Owns the transcript of one conversation and drives a view and a proxy.
///
/// Turns are serialized: [`ChatSession::submit`] borrows the session
/// mutably for the whole round-trip, and input stays disabled on the view
/// until the reply (or apology) is shown.
pub struct ChatSession<V: ChatView> {
    view: V,
    transport: Arc<dyn ProxyTransport>,
    transcript: Transcript,
}

impl<V: ChatView + std::fmt::Debug> std::fmt::Debug for ChatSession<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("view", &self.view)
            .field("transcript", &self.transcript)
            .finish_non_exhaustive()
    }
}

impl<V: ChatView> ChatSession<V> {
    /// Start a session: seed the transcript, greet, and open the input.
    pub fn start(view: V, transport: Arc<dyn ProxyTransport>, settings: SessionSettings) -> Self {
        let mut session = Self {
            view,
            transport,
            transcript: Transcript::new(settings.policy),
        };

        if let Some(greeting) = &settings.greeting {
            session.render(Role::Assistant, greeting);
        }
        session.view.set_input_enabled(true);

        info!(name: "session.started", "Chat session started");
        session
    }

    /// Submit one user turn.
    ///
    /// Returns `None` when the text is blank after trimming; nothing is
    /// rendered or sent in that case.
    pub async fn submit(&mut self, text: &str) -> Option<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.view.set_status(&format!("Your question: {text}"));
        self.render(Role::User, text);
        self.transcript.push_user(text);

        let placeholder = self.render(Role::Assistant, THINKING_PLACEHOLDER);
        self.view.clear_input();
        self.view.set_input_enabled(false);

        let started = Instant::now();
        let result = self.transport.exchange(self.transcript.messages()).await;

        let outcome = match result {
            Ok(reply) => {
                self.view.replace_bubble(placeholder, reply.text());
                self.transcript.push_assistant(reply.text());
                info!(
                    name: "session.turn.replied",
                    shape = reply.shape(),
                    latency_ms = started.elapsed().as_millis(),
                    transcript_len = self.transcript.len(),
                    "Assistant reply received"
                );
                TurnOutcome::Replied(reply)
            }
            Err(err) => {
                self.view.replace_bubble(placeholder, APOLOGY);
                warn!(
                    name: "session.turn.failed",
                    error = %err,
                    latency_ms = started.elapsed().as_millis(),
                    "Proxy round-trip failed"
                );
                TurnOutcome::Failed
            }
        };

        self.view.scroll_to_latest();
        self.view.set_input_enabled(true);

        Some(outcome)
    }

    /// Append a bubble for `role` and scroll to it.
    pub fn render(&mut self, role: Role, text: &str) -> BubbleHandle {
        let handle = self.view.append_bubble(role.into(), text);
        self.view.scroll_to_latest();
        handle
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// End the session, handing back the view.
    pub fn finish(self) -> V {
        info!(
            name: "session.finished",
            transcript_len = self.transcript.len(),
            "Chat session finished"
        );
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyError;
    use crate::session::Message;
    use crate::ui::{BubbleKind, RecordingView};
    use crate::ui::{BubbleHandle, ChatView};
    use std::sync::Mutex;

    /// Replays canned results and records every transcript it was sent.
    struct ScriptedTransport {
        replies: Mutex<Vec<Result<ProxyReply, ProxyError>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedTransport {
        fn new(mut replies: Vec<Result<ProxyReply, ProxyError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<Message>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ProxyTransport for ScriptedTransport {
        async fn exchange(&self, messages: &[Message]) -> Result<ProxyReply, ProxyError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ProxyError::Status { status: 599 }))
        }
    }

    fn session(transport: &Arc<ScriptedTransport>) -> ChatSession<RecordingView> {
        let transport: Arc<dyn ProxyTransport> = Arc::<ScriptedTransport>::clone(transport);
        ChatSession::start(RecordingView::new(), transport, SessionSettings::default())
    }

    #[test]
    fn test_start_greets_without_recording() {
        let transport = ScriptedTransport::new(vec![]);
        let session = session(&transport);

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript().policy().content(), DEFAULT_POLICY);
        assert_eq!(session.view().bubbles().len(), 1);
        assert_eq!(session.view().bubbles()[0].kind, BubbleKind::Assistant);
        assert_eq!(session.view().bubbles()[0].text, DEFAULT_GREETING);
        assert!(session.view().input_enabled());
    }

    #[test]
    fn test_start_without_greeting() {
        let transport: Arc<dyn ProxyTransport> = ScriptedTransport::new(vec![]);
        let settings = SessionSettings {
            policy: "Only hair care.".to_string(),
            greeting: None,
        };
        let session = ChatSession::start(RecordingView::new(), transport, settings);

        assert!(session.view().bubbles().is_empty());
        assert_eq!(session.transcript().policy().content(), "Only hair care.");
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let transport = ScriptedTransport::new(vec![]);
        let mut session = session(&transport);

        assert_eq!(session.submit("").await, None);
        assert_eq!(session.submit("   \n\t").await, None);

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.view().bubbles().len(), 1);
        assert_eq!(session.view().input_clears(), 0);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_successful_turn() {
        let transport = ScriptedTransport::new(vec![Ok(ProxyReply::ChatCompletion("X".into()))]);
        let mut session = session(&transport);
        session.view_mut().type_input("  best shampoo?  ");

        let outcome = session.submit("  best shampoo?  ").await;

        assert_eq!(
            outcome,
            Some(TurnOutcome::Replied(ProxyReply::ChatCompletion("X".into())))
        );
        let messages = session.transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user("best shampoo?"));
        assert_eq!(messages[2], Message::assistant("X"));

        let bubbles = session.view().bubbles();
        assert_eq!(bubbles.len(), 3);
        assert_eq!(bubbles[1].kind, BubbleKind::User);
        assert_eq!(bubbles[1].text, "best shampoo?");
        assert_eq!(bubbles[2].kind, BubbleKind::Assistant);
        assert_eq!(bubbles[2].text, "X");

        assert_eq!(session.view().input(), "");
        assert_eq!(session.view().status(), Some("Your question: best shampoo?"));
        // Greeting, user bubble, placeholder, then once more after the reply.
        assert_eq!(session.view().scrolls(), 4);
    }

    #[tokio::test]
    async fn test_transport_sees_user_message_last() {
        let transport = ScriptedTransport::new(vec![Ok(ProxyReply::Message("Y".into()))]);
        let mut session = session(&transport);

        session.submit("hello").await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0].role(), Role::System);
        assert_eq!(calls[0][1], Message::user("hello"));
    }

    #[tokio::test]
    async fn test_unrecognized_reply_records_sentinel() {
        let transport = ScriptedTransport::new(vec![Ok(ProxyReply::Unrecognized)]);
        let mut session = session(&transport);

        session.submit("anything?").await;

        assert_eq!(session.view().last_bubble().unwrap().text, "(No response)");
        assert_eq!(
            session.transcript().last().unwrap(),
            &Message::assistant("(No response)")
        );
    }

    #[tokio::test]
    async fn test_failed_turn_shows_apology() {
        let transport = ScriptedTransport::new(vec![Err(ProxyError::Status { status: 502 })]);
        let mut session = session(&transport);
        session.view_mut().type_input("hi");

        let outcome = session.submit("hi").await;

        assert_eq!(outcome, Some(TurnOutcome::Failed));
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript().last().unwrap(), &Message::user("hi"));
        assert_eq!(session.view().last_bubble().unwrap().text, APOLOGY);
        assert_eq!(session.view().input(), "");
        assert!(session.view().input_enabled());
    }

    #[tokio::test]
    async fn test_input_locked_during_each_turn() {
        let transport = ScriptedTransport::new(vec![
            Ok(ProxyReply::Response("a".into())),
            Err(ProxyError::Status { status: 500 }),
        ]);
        let mut session = session(&transport);

        session.submit("one").await;
        session.submit("two").await;

        assert_eq!(session.view().input_toggles(), &[true, false, true, false, true]);
    }

    #[tokio::test]
    async fn test_sequential_turns_alternate() {
        let transport = ScriptedTransport::new(vec![
            Ok(ProxyReply::Message("first".into())),
            Ok(ProxyReply::Message("second".into())),
        ]);
        let mut session = session(&transport);

        session.submit("q1").await;
        session.submit("q2").await;

        let roles: Vec<Role> = session.transcript().messages().iter().map(Message::role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(session.transcript().messages()[2].content(), "first");
        assert_eq!(session.transcript().messages()[4].content(), "second");

        // Second call carried the whole conversation so far.
        assert_eq!(transport.calls()[1].len(), 4);
    }

    #[tokio::test]
    async fn test_retry_after_failure_keeps_dangling_user_turn() {
        let transport = ScriptedTransport::new(vec![
            Err(ProxyError::Status { status: 503 }),
            Ok(ProxyReply::Message("ok".into())),
        ]);
        let mut session = session(&transport);

        session.submit("q").await;
        session.submit("q").await;

        let roles: Vec<Role> = session.transcript().messages().iter().map(Message::role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::User, Role::Assistant]);
    }

    /// View shared with [`PeekingTransport`] so the screen can be inspected
    /// while a request is in flight.
    #[derive(Clone, Default)]
    struct SharedView(Arc<Mutex<RecordingView>>);

    impl SharedView {
        fn snapshot(&self) -> RecordingView {
            self.0.lock().unwrap().clone()
        }
    }

    impl ChatView for SharedView {
        fn append_bubble(&mut self, kind: BubbleKind, text: &str) -> BubbleHandle {
            self.0.lock().unwrap().append_bubble(kind, text)
        }

        fn replace_bubble(&mut self, handle: BubbleHandle, text: &str) {
            self.0.lock().unwrap().replace_bubble(handle, text);
        }

        fn scroll_to_latest(&mut self) {
            self.0.lock().unwrap().scroll_to_latest();
        }

        fn clear_input(&mut self) {
            self.0.lock().unwrap().clear_input();
        }

        fn set_input_enabled(&mut self, enabled: bool) {
            self.0.lock().unwrap().set_input_enabled(enabled);
        }

        fn set_status(&mut self, text: &str) {
            self.0.lock().unwrap().set_status(text);
        }
    }

    /// Captures the view as it looks when the request goes out.
    struct PeekingTransport {
        view: SharedView,
        reply: Mutex<Option<Result<ProxyReply, ProxyError>>>,
        in_flight: Mutex<Option<RecordingView>>,
    }

    impl PeekingTransport {
        fn new(view: &SharedView, reply: Result<ProxyReply, ProxyError>) -> Arc<Self> {
            Arc::new(Self {
                view: view.clone(),
                reply: Mutex::new(Some(reply)),
                in_flight: Mutex::new(None),
            })
        }

        fn in_flight(&self) -> RecordingView {
            self.in_flight.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ProxyTransport for PeekingTransport {
        async fn exchange(&self, _messages: &[Message]) -> Result<ProxyReply, ProxyError> {
            *self.in_flight.lock().unwrap() = Some(self.view.snapshot());
            self.reply.lock().unwrap().take().unwrap()
        }
    }

    async fn run_peeked_turn(
        reply: Result<ProxyReply, ProxyError>,
    ) -> (RecordingView, RecordingView) {
        let view = SharedView::default();
        view.0.lock().unwrap().type_input("which primer?");
        let transport = PeekingTransport::new(&view, reply);
        let dyn_transport: Arc<dyn ProxyTransport> = Arc::<PeekingTransport>::clone(&transport);
        let mut session =
            ChatSession::start(view.clone(), dyn_transport, SessionSettings::default());

        session.submit("which primer?").await;

        (transport.in_flight(), view.snapshot())
    }

    #[tokio::test]
    async fn test_placeholder_shown_while_awaiting_reply() {
        let (during, after) = run_peeked_turn(Ok(ProxyReply::Message("Infaillible".into()))).await;

        // Greeting, user bubble, placeholder.
        assert_eq!(during.bubbles().len(), 3);
        let placeholder = during.last_bubble().unwrap();
        assert_eq!(placeholder.kind, BubbleKind::Assistant);
        assert_eq!(placeholder.text, THINKING_PLACEHOLDER);
        assert!(!during.input_enabled());
        assert_eq!(during.input(), "");
        assert_eq!(during.input_clears(), 1);

        // Same slot now holds the reply; no extra bubble was added.
        assert_eq!(after.bubbles().len(), 3);
        assert_eq!(after.bubbles()[2].kind, BubbleKind::Assistant);
        assert_eq!(after.bubbles()[2].text, "Infaillible");
        assert!(after.input_enabled());
    }

    #[tokio::test]
    async fn test_placeholder_replaced_by_apology() {
        let (during, after) = run_peeked_turn(Err(ProxyError::Status { status: 504 })).await;

        assert_eq!(during.last_bubble().unwrap().text, THINKING_PLACEHOLDER);
        assert!(!during.input_enabled());

        assert_eq!(after.bubbles().len(), 3);
        assert_eq!(after.bubbles()[2].text, APOLOGY);
        assert!(after.bubbles().iter().all(|b| b.text != THINKING_PLACEHOLDER));
    }

    #[test]
    fn test_finish_returns_view() {
        let transport = ScriptedTransport::new(vec![]);
        let view = session(&transport).finish();
        assert_eq!(view.bubbles().len(), 1);
    }
}
