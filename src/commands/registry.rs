//! Name to descriptor registry.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::CommandDescriptor;

/// A command with the same name is already registered.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Command '{name}' is already registered")]
pub struct DuplicateCommandError {
    pub name: String,
}

/// Errors raised while building the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Duplicate(#[from] DuplicateCommandError),

    #[error("Command name cannot be empty")]
    EmptyName,

    #[error("Command name '{0}' cannot contain whitespace")]
    InvalidName(String),
}

/// Registered commands, in registration order.
///
/// Filled while the bot is being built and only read afterwards.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    descriptors: Vec<CommandDescriptor>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from descriptors, failing on the first invalid one.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = CommandDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Adds a command. The registry is left untouched on error.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        let name = descriptor.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if name.contains(char::is_whitespace) {
            return Err(RegistryError::InvalidName(name.to_owned()));
        }
        if self.index.contains_key(name) {
            return Err(DuplicateCommandError {
                name: name.to_owned(),
            }
            .into());
        }

        debug!(
            command = name,
            admin = descriptor.requires_admin(),
            "registered command"
        );
        self.index.insert(name.to_owned(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&CommandDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Lists `(name, description)` pairs in registration order.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.descriptors
            .iter()
            .map(|d| (d.name(), d.description()))
            .collect()
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` when no command is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
