//! Bot identity: authentication token and admin allow-list.

use std::collections::HashSet;
use std::fmt;

use super::ConfigError;

/// Fallback bot token when `API_TOKEN_KEY` is unset.
pub const DEFAULT_API_TOKEN: &str = "";

/// Fallback admin list when `ADMINS` is unset.
pub const DEFAULT_ADMINS: &str = "";

/// Token and admin usernames of one bot instance.
#[derive(Clone, PartialEq, Eq)]
pub struct BotIdentity {
    token: String,
    admins: HashSet<String>,
}

impl BotIdentity {
    /// Creates an identity from a token and admin usernames.
    #[must_use]
    pub fn new<I, S>(token: impl Into<String>, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            token: token.into(),
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads the identity from `API_TOKEN_KEY` and `ADMINS`.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var("API_TOKEN_KEY").ok(),
            std::env::var("ADMINS").ok(),
        )
    }

    /// Builds the identity from raw variable values, applying fallbacks.
    pub fn from_vars(token: Option<String>, admins: Option<String>) -> Result<Self, ConfigError> {
        let token = token.unwrap_or_else(|| DEFAULT_API_TOKEN.to_owned());
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let admins = admins.as_deref().unwrap_or(DEFAULT_ADMINS);
        Ok(Self::new(token, parse_admins(admins)))
    }

    /// Returns the Bot API token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the usernames allowed to run admin-only commands.
    pub const fn admins(&self) -> &HashSet<String> {
        &self.admins
    }

    /// Case-sensitive exact membership test.
    pub fn is_admin(&self, sender_id: &str) -> bool {
        self.admins.contains(sender_id)
    }
}

impl fmt::Debug for BotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotIdentity")
            .field("token", &"<redacted>")
            .field("admins", &self.admins)
            .finish()
    }
}

/// Parses an admin list.
///
/// Accepts `alice,bob` as well as a literal list such as `["alice", "bob"]`.
/// A leading `@` on a username is dropped.
pub fn parse_admins(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw);

    raw.split(',')
        .map(|item| item.trim().trim_matches(|c: char| c == '"' || c == '\''))
        .map(|item| item.trim().trim_start_matches('@'))
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
