//! Bot assembly.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::commands::{
    CommandDescriptor, CommandRegistry, Dispatcher, RegistryError, builtin_commands,
};
use crate::config::{BotIdentity, BotSettings};
use crate::poller::UpdatePoller;
use crate::telegram::Transport;

/// One bot instance: its own registry, identity and settings.
#[derive(Debug)]
pub struct Bot {
    dispatcher: Arc<Dispatcher>,
    settings: BotSettings,
}

impl Bot {
    /// Builds a bot with the built-in commands.
    pub fn new(identity: BotIdentity, settings: BotSettings) -> Result<Self, RegistryError> {
        let commands = builtin_commands(&settings);
        Self::with_commands(identity, settings, commands)
    }

    /// Builds a bot from an explicit command table.
    ///
    /// Fails on the first duplicate or invalid command name.
    pub fn with_commands(
        identity: BotIdentity,
        settings: BotSettings,
        commands: impl IntoIterator<Item = CommandDescriptor>,
    ) -> Result<Self, RegistryError> {
        let registry = CommandRegistry::from_descriptors(commands)?;
        info!(
            commands = registry.len(),
            admins = identity.admins().len(),
            "bot constructed"
        );

        let dispatcher = Dispatcher::new(registry, identity, settings.command_prefix);
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            settings,
        })
    }

    /// Returns this bot's command registry.
    pub fn registry(&self) -> &CommandRegistry {
        self.dispatcher.registry()
    }

    /// Returns the settings the bot was built with.
    pub const fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Creates the update poller feeding this bot from `transport`.
    #[must_use]
    pub fn poller(&self, transport: Arc<dyn Transport>) -> UpdatePoller {
        UpdatePoller::new(
            transport,
            Arc::clone(&self.dispatcher),
            Duration::from_secs(self.settings.poll_timeout_secs),
        )
    }
}
