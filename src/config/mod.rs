//! Configuration module for the bot.
//!
//! Loads the bot identity (token and admin allow-list) and runtime
//! settings from environment variables with named fallbacks.

mod identity;
mod settings;

pub use identity::{BotIdentity, DEFAULT_ADMINS, DEFAULT_API_TOKEN, parse_admins};
pub use settings::BotSettings;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing bot token: set API_TOKEN_KEY")]
    MissingToken,
}
