//! Decoding of proxy reply bodies.
//!
//! The proxy may hand back a raw chat-completion object or one of two
//! simplified envelopes. Decoding walks those shapes in a fixed order and
//! settles on the first non-empty string; anything else is
//! [`ProxyReply::Unrecognized`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text shown when a reply carries none of the known fields.
pub const NO_RESPONSE: &str = "(No response)";

/// A successfully received reply, classified by the shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyReply {
    /// `choices[0].message.content`
    ChatCompletion(String),
    /// Top-level `message`.
    Message(String),
    /// Top-level `response`.
    Response(String),
    /// None of the above carried usable text.
    Unrecognized,
}

impl ProxyReply {
    /// Classify a decoded JSON body.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::Unrecognized;
        }
        let Ok(envelope) = ReplyEnvelope::deserialize(value) else {
            return Self::Unrecognized;
        };

        let completion = envelope
            .choices
            .as_deref()
            .and_then(<[Value]>::first)
            .filter(|choice| choice.is_object())
            .and_then(|choice| Choice::deserialize(choice).ok())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        if let Some(text) = non_empty(completion) {
            Self::ChatCompletion(text)
        } else if let Some(text) = non_empty(envelope.message) {
            Self::Message(text)
        } else if let Some(text) = non_empty(envelope.response) {
            Self::Response(text)
        } else {
            Self::Unrecognized
        }
    }

    /// The text to show and record for this reply.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::ChatCompletion(text) | Self::Message(text) | Self::Response(text) => text,
            Self::Unrecognized => NO_RESPONSE,
        }
    }

    /// Short label of the matched shape, for logs.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::ChatCompletion(_) => "chat_completion",
            Self::Message(_) => "message",
            Self::Response(_) => "response",
            Self::Unrecognized => "unrecognized",
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::ChatCompletion(text) | Self::Message(text) | Self::Response(text) => text,
            Self::Unrecognized => NO_RESPONSE.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReplyEnvelope {
    #[serde(default, deserialize_with = "lenient")]
    choices: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default, deserialize_with = "lenient_object")]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default, deserialize_with = "lenient")]
    content: Option<String>,
}

/// Treat a field of the wrong type as absent instead of failing the body.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], but only objects may populate a nested struct.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}
