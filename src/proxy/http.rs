//! `reqwest` implementation of [`ProxyTransport`].

use std::time::Duration;

use tracing::debug;
use url::Url;

use super::{ProxyError, ProxyReply, ProxyRequest, ProxyTransport};
use crate::session::Message;

/// Posts the transcript as JSON to a fixed endpoint.
#[derive(Clone)]
pub struct HttpProxyClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl std::fmt::Debug for HttpProxyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProxyClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl HttpProxyClient {
    /// Create a client without a request timeout.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Create a client, optionally bounding each request.
    pub fn with_timeout(endpoint: Url, timeout: Option<Duration>) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ProxyError::Client)?;
        Ok(Self { http, endpoint })
    }

    /// The endpoint every request is posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ProxyTransport for HttpProxyClient {
    async fn exchange(&self, messages: &[Message]) -> Result<ProxyReply, ProxyError> {
        debug!(
            name: "proxy.request.sent",
            endpoint = %self.endpoint,
            messages = messages.len(),
            "Posting transcript to proxy"
        );

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&ProxyRequest { messages })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProxyError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        let reply = ProxyReply::from_value(&value);

        debug!(
            name: "proxy.reply.decoded",
            status = status.as_u16(),
            shape = reply.shape(),
            "Proxy reply decoded"
        );

        Ok(reply)
    }
}
