//! Test doubles shared by the command tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CommandContext, CommandError, Handler};
use crate::telegram::{ChatId, InboundMessage};

/// Builds a message in chat 1.
pub fn message(text: &str, sender: &str) -> InboundMessage {
    InboundMessage::new(text, sender, ChatId(1))
}

/// Handler that records the text of every message it receives.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Handler for Recorder {
    async fn handle(
        &self,
        _ctx: &CommandContext<'_>,
        message: &InboundMessage,
    ) -> Result<(), CommandError> {
        self.calls.lock().unwrap().push(message.text.clone());
        Ok(())
    }
}
