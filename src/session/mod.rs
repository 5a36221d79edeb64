//! Chat session and transcript.
//!
//! A session owns exactly one transcript for as long as it lives. Nothing is
//! persisted; dropping the session drops the conversation.
//!
//! # Architecture
//!
//! - [`Transcript`]: append-only message log seeded with the policy message
//! - [`ChatSession`]: runs user turns against a view and a proxy
//!
//! # Example
//!
//! ```rust
//! use advisor_chat::session::{Message, Role, Transcript};
//!
//! let mut transcript = Transcript::new("Only answer questions about hair care.");
//! transcript.push_user("Hello!");
//!
//! assert_eq!(transcript.len(), 2);
//! assert_eq!(transcript.messages()[1], Message::new(Role::User, "Hello!"));
//! ```

mod controller;
mod transcript;

pub use controller::{
    APOLOGY, ChatSession, DEFAULT_GREETING, DEFAULT_POLICY, SessionSettings, THINKING_PLACEHOLDER,
    TurnOutcome,
};
pub use transcript::{Message, Role, Transcript};
