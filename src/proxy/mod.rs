//! Outbound calls to the chat proxy.
//!
//! The proxy is an HTTP endpoint that forwards the transcript to a model
//! backend and returns the reply as JSON. This module owns the wire format
//! on both sides.
//!
//! - [`ProxyTransport`]: the seam the session talks through
//! - [`HttpProxyClient`]: the `reqwest` implementation
//! - [`ProxyReply`]: decoded reply shapes

mod http;
pub mod reply;

pub use http::HttpProxyClient;
pub use reply::{NO_RESPONSE, ProxyReply};

use serde::Serialize;
use thiserror::Error;

use crate::session::Message;

/// Request body sent to the proxy.
#[derive(Debug, Serialize)]
pub struct ProxyRequest<'a> {
    /// Full transcript, policy message first.
    pub messages: &'a [Message],
}

/// Why a round-trip produced no reply.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, or body transfer failed.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The proxy answered with a non-2xx status.
    #[error("proxy returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The body was not JSON.
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single request/reply exchange with the proxy.
#[async_trait::async_trait]
pub trait ProxyTransport: Send + Sync {
    /// Send the transcript and wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a body
    /// that is not JSON.
    async fn exchange(&self, messages: &[Message]) -> Result<ProxyReply, ProxyError>;
}
