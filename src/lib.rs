//! Advisor chat
//!
//! A chat client that forwards each user turn, together with the whole
//! conversation so far, to a remote proxy and shows the assistant's reply.
//!
//! # Architecture
//!
//! - **Session**: owns the transcript and runs one round-trip per turn
//! - **Proxy**: JSON over HTTP, with a permissive reply decoder
//! - **UI**: a small view trait with terminal and in-memory renderers
//!
//! # Modules
//!
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`proxy`]: outbound transport and reply decoding
//! - [`session`]: transcript and session controller
//! - [`telemetry`]: logging setup
//! - [`ui`]: views the session renders into

pub mod config;
pub mod proxy;
pub mod session;
pub mod telemetry;
pub mod ui;
