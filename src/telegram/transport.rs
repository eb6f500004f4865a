//! Transport seam between the dispatch engine and the messaging service.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Opaque identifier of the chat a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A text message received from the messaging service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Full message text, command prefix included.
    pub text: String,

    /// Sender username. Empty when the sender has none.
    pub sender_id: String,

    /// Chat to reply into.
    pub chat_id: ChatId,
}

impl InboundMessage {
    /// Creates a new inbound message.
    #[must_use]
    pub fn new(text: impl Into<String>, sender_id: impl Into<String>, chat_id: ChatId) -> Self {
        Self {
            text: text.into(),
            sender_id: sender_id.into(),
            chat_id,
        }
    }
}

/// Wire-level access to the messaging service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-polls for the next batch of messages, waiting at most `timeout`.
    async fn poll(&self, timeout: Duration) -> Result<Vec<InboundMessage>, TransportError>;

    /// Sends a text reply into a chat.
    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError>;
}
