//! Messaging service transport module.
//!
//! Defines the [`Transport`] seam used by the dispatch engine and the
//! Telegram Bot API implementation of it.

mod api;
#[cfg(test)]
pub(crate) mod mock;
mod transport;
mod types;

pub use api::{BotApi, DEFAULT_API_URL};
pub use transport::{ChatId, InboundMessage, Transport, TransportError};
