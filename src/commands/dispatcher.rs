//! Maps one inbound message to at most one handler invocation.

use tracing::{debug, error, info, warn};

use super::{CommandContext, CommandError, CommandRegistry};
use crate::config::BotIdentity;
use crate::telegram::{InboundMessage, Transport};

/// What the dispatcher did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The text does not start with the command prefix.
    NotACommand,

    /// The token matched no registered command.
    Unknown(String),

    /// The command ran (a guard denial counts as handled).
    Handled(String),

    /// The command's handler returned an error.
    Failed(String),
}

/// Extracts the command token from a message text.
///
/// `"/exec ls -la"` yields `exec`; a `@botname` suffix is dropped.
pub fn parse_command_token(text: &str, prefix: char) -> Option<&str> {
    let first_word = text.split_whitespace().next()?;
    let token = first_word.strip_prefix(prefix)?;
    let token = token.split_once('@').map_or(token, |(name, _)| name);
    (!token.is_empty()).then_some(token)
}

/// Routes messages to registered commands.
#[derive(Debug)]
pub struct Dispatcher {
    registry: CommandRegistry,
    identity: BotIdentity,
    prefix: char,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: CommandRegistry, identity: BotIdentity, prefix: char) -> Self {
        Self {
            registry,
            identity,
            prefix,
        }
    }

    /// Returns the commands this dispatcher routes to.
    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Dispatches one message. Handler errors never escape.
    pub async fn dispatch(
        &self,
        transport: &dyn Transport,
        message: &InboundMessage,
    ) -> DispatchOutcome {
        let Some(token) = parse_command_token(&message.text, self.prefix) else {
            return DispatchOutcome::NotACommand;
        };

        let Some(descriptor) = self.registry.lookup(token) else {
            debug!(command = token, sender = %message.sender_id, "ignoring unknown command");
            return DispatchOutcome::Unknown(token.to_owned());
        };

        info!(
            command = token,
            sender = %message.sender_id,
            chat_id = %message.chat_id,
            "dispatching command"
        );

        let ctx = CommandContext {
            transport,
            registry: &self.registry,
            identity: &self.identity,
            prefix: self.prefix,
        };

        match descriptor.invoke(&ctx, message).await {
            Ok(()) => DispatchOutcome::Handled(token.to_owned()),
            Err(CommandError::Execution(reason)) => {
                error!(command = token, "command failed: {reason}");
                let diagnostic = format!("Command {}{token} failed: {reason}", self.prefix);
                if let Err(e) = ctx.reply(message, &diagnostic).await {
                    warn!(command = token, "failed to report command failure: {e}");
                }
                DispatchOutcome::Failed(token.to_owned())
            }
            Err(CommandError::Transport(e)) => {
                warn!(command = token, "failed to send reply: {e}");
                DispatchOutcome::Failed(token.to_owned())
            }
        }
    }
}
