//! Runtime settings for the bot.

use serde::{Deserialize, Serialize};

use crate::telegram::DEFAULT_API_URL;

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Character that starts a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,

    /// Long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Maximum run time of an `exec` command in seconds.
    #[serde(default = "default_exec_timeout")]
    pub exec_timeout_secs: u64,

    /// Rate-limited commands allowed per sender per window. Zero disables limiting.
    #[serde(default = "default_rate_limit_commands")]
    pub rate_limit_commands: u32,

    /// Rate limit window in seconds. Must be non-zero.
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,

    /// Bot API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

const fn default_command_prefix() -> char {
    '/'
}

const fn default_poll_timeout() -> u64 {
    30
}

const fn default_exec_timeout() -> u64 {
    60
}

const fn default_rate_limit_commands() -> u32 {
    10
}

const fn default_rate_limit_window() -> u64 {
    60
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            poll_timeout_secs: default_poll_timeout(),
            exec_timeout_secs: default_exec_timeout(),
            rate_limit_commands: default_rate_limit_commands(),
            rate_limit_window_secs: default_rate_limit_window(),
            api_url: default_api_url(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates bot settings from a variable lookup, falling back to defaults
    /// for anything missing or unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| -> Option<u64> {
            lookup(key).and_then(|s| s.trim().parse().ok())
        };

        Self {
            command_prefix: lookup("COMMAND_PREFIX")
                .and_then(|s| s.trim().chars().next())
                .unwrap_or_else(default_command_prefix),
            poll_timeout_secs: parsed("POLL_TIMEOUT").unwrap_or_else(default_poll_timeout),
            exec_timeout_secs: parsed("EXEC_TIMEOUT")
                .filter(|&secs| secs > 0)
                .unwrap_or_else(default_exec_timeout),
            rate_limit_commands: lookup("RATE_LIMIT_COMMANDS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_rate_limit_commands),
            rate_limit_window_secs: parsed("RATE_LIMIT_WINDOW")
                .filter(|&secs| secs > 0)
                .unwrap_or_else(default_rate_limit_window),
            api_url: lookup("TELEGRAM_API_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(default_api_url),
        }
    }
}
