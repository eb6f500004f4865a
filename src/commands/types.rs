//! Command descriptors, handler trait and invocation context.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::guard::{AdminGuard, Guard, Guarded};
use super::registry::CommandRegistry;
use crate::config::BotIdentity;
use crate::telegram::{InboundMessage, Transport, TransportError};

/// Errors a handler can return to the dispatcher.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to send reply: {0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Execution(String),
}

/// Everything a handler may touch while processing one message.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    /// Transport used for replies.
    pub transport: &'a dyn Transport,

    /// The bot's command registry.
    pub registry: &'a CommandRegistry,

    /// Token and admin allow-list of the bot.
    pub identity: &'a BotIdentity,

    /// Command prefix character.
    pub prefix: char,
}

impl CommandContext<'_> {
    /// Replies into the chat the message came from.
    pub async fn reply(&self, message: &InboundMessage, text: &str) -> Result<(), TransportError> {
        self.transport.reply(message.chat_id, text).await
    }

    /// Returns the message text with the command prefix removed.
    pub fn invocation<'m>(&self, message: &'m InboundMessage) -> &'m str {
        let text = message.text.trim();
        text.strip_prefix(self.prefix).unwrap_or(text)
    }

    /// Returns everything after the command token, trimmed.
    pub fn arguments<'m>(&self, message: &'m InboundMessage) -> &'m str {
        self.invocation(message)
            .split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest.trim())
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("commands", &self.registry.len())
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// A command body.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles one message addressed to this command.
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        message: &InboundMessage,
    ) -> Result<(), CommandError>;
}

/// Metadata binding a command name to its handler.
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    description: String,
    requires_admin: bool,
    handler: Arc<dyn Handler>,
}

impl CommandDescriptor {
    /// Declares an ungated command.
    ///
    /// `name` is stored without the command prefix.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            requires_admin: false,
            handler: Arc::new(handler),
        }
    }

    /// Restricts the command to senders in the admin allow-list.
    #[must_use]
    pub fn admin_required(mut self) -> Self {
        self.requires_admin = true;
        self.guarded(AdminGuard)
    }

    /// Wraps the handler in a guard.
    ///
    /// The guard applied last is checked first.
    #[must_use]
    pub fn guarded(mut self, guard: impl Guard + 'static) -> Self {
        self.handler = Arc::new(Guarded::new(guard, self.handler));
        self
    }

    /// Returns the command name, without prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the one-line description shown by `/help`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns `true` if the command was declared admin-only.
    pub const fn requires_admin(&self) -> bool {
        self.requires_admin
    }

    /// Returns the handler with all guards applied.
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Runs the (guarded) handler for a message.
    pub async fn invoke(
        &self,
        ctx: &CommandContext<'_>,
        message: &InboundMessage,
    ) -> Result<(), CommandError> {
        self.handler.handle(ctx, message).await
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("requires_admin", &self.requires_admin)
            .finish_non_exhaustive()
    }
}
