//! Telegram Bot API transport.
//!
//! Implements [`Transport`] on top of `getUpdates` long-polling and
//! `sendMessage`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use super::types::{ApiResponse, Update};
use super::{ChatId, InboundMessage, Transport, TransportError};

/// Default Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Maximum message length Telegram accepts, in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Extra time granted to the HTTP request on top of the long-poll timeout.
const HTTP_GRACE: Duration = Duration::from_secs(10);

/// Time allowed to establish a connection to the API.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed for one `sendMessage` request, response included.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Bot API client authenticated by a bot token.
pub struct BotApi {
    client: Client,
    base_url: String,
    send_timeout: Duration,

    /// Next `getUpdates` offset; zero until the first update is seen.
    offset: AtomicI64,
}

impl BotApi {
    /// Creates a client for the given bot token.
    ///
    /// `base_url` is normally [`DEFAULT_API_URL`]; a local Bot API server or a
    /// test stub can be used instead.
    #[must_use]
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
            send_timeout: SEND_TIMEOUT,
            offset: AtomicI64::new(0),
        }
    }

    async fn get_updates(&self, timeout: Duration) -> Result<Vec<Update>, TransportError> {
        let mut body = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });

        let offset = self.offset.load(Ordering::Acquire);
        if offset > 0 {
            body["offset"] = json!(offset);
        }

        let resp = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .timeout(timeout + HTTP_GRACE)
            .json(&body)
            .send()
            .await?;

        let api_resp: ApiResponse<Vec<Update>> = resp.json().await?;
        if !api_resp.ok {
            let desc = api_resp.description.unwrap_or_default();
            warn!("getUpdates failed: {desc}");
            return Err(TransportError::Api(desc));
        }

        Ok(api_resp.result.unwrap_or_default())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        let body = json!({
            "chat_id": chat_id.0,
            "text": text,
        });

        let resp = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .timeout(self.send_timeout)
            .json(&body)
            .send()
            .await?;

        let api_resp: ApiResponse<serde_json::Value> = resp.json().await?;
        if !api_resp.ok {
            let desc = api_resp.description.unwrap_or_default();
            warn!("sendMessage failed: {desc}");
            return Err(TransportError::Api(desc));
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for BotApi {
    async fn poll(&self, timeout: Duration) -> Result<Vec<InboundMessage>, TransportError> {
        let updates = self.get_updates(timeout).await?;
        let mut messages = Vec::with_capacity(updates.len());

        for update in updates {
            // Acknowledge every update, including the ones we skip.
            self.offset.fetch_max(update.update_id + 1, Ordering::AcqRel);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                debug!(update_id = update.update_id, "skipping non-text message");
                continue;
            };

            let sender_id = message
                .from
                .and_then(|user| user.username)
                .unwrap_or_default();

            debug!(
                chat_id = message.chat.id,
                sender = %sender_id,
                "received: {}",
                truncate_for_log(&text, 40)
            );
            messages.push(InboundMessage::new(text, sender_id, ChatId(message.chat.id)));
        }

        Ok(messages)
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        if text.is_empty() {
            debug!(%chat_id, "not sending empty reply");
            return Ok(());
        }

        let chunks = split_message(text, MAX_MESSAGE_LEN);
        if chunks.len() > 1 {
            info!(%chat_id, parts = chunks.len(), "splitting long reply");
        }

        for chunk in &chunks {
            self.send_message(chat_id, chunk).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // base_url embeds the token
        f.debug_struct("BotApi")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Splits text into chunks of at most `max_units` UTF-16 code units.
///
/// Chunks break on character boundaries, so a surrogate pair is never cut.
fn split_message(text: &str, max_units: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut units = 0;

    for c in text.chars() {
        let width = c.len_utf16();
        if units + width > max_units && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            units = 0;
        }
        current.push(c);
        units += width;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
