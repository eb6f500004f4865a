//! Per-sender command rate limiter.
//!
//! Each sender gets a fixed window in which at most `max_commands`
//! commands are accepted. The window restarts on the first command after
//! it expires.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct SenderWindow {
    commands: u32,
    started_at: Instant,
}

/// Rate limiter keyed by sender id.
#[derive(Debug)]
pub struct CommandRateLimiter {
    /// Maximum commands per sender per window.
    max_commands: u32,

    /// Length of one window.
    window: Duration,

    windows: Mutex<HashMap<String, SenderWindow>>,
}

impl CommandRateLimiter {
    /// Creates a limiter allowing `max_commands` per `window`.
    #[must_use]
    pub fn new(max_commands: u32, window: Duration) -> Self {
        Self {
            max_commands,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a limiter from a window length in seconds.
    #[must_use]
    pub fn from_secs(max_commands: u32, window_secs: u64) -> Self {
        Self::new(max_commands, Duration::from_secs(window_secs))
    }

    /// Counts a command for `sender`. Returns `false` when over the limit.
    pub async fn try_acquire(&self, sender: &str) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let entry = windows.entry(sender.to_owned()).or_insert(SenderWindow {
            commands: 0,
            started_at: now,
        });

        if now.duration_since(entry.started_at) >= self.window {
            debug!(sender, "rate limit window reset");
            *entry = SenderWindow {
                commands: 0,
                started_at: now,
            };
        }

        if entry.commands >= self.max_commands {
            return false;
        }

        entry.commands += 1;
        debug!(
            sender,
            "rate limit: {}/{} commands",
            entry.commands,
            self.max_commands
        );
        true
    }

    /// Returns the time until `sender`'s current window expires.
    pub async fn time_until_reset(&self, sender: &str) -> Duration {
        let windows = self.windows.lock().await;
        windows.get(sender).map_or(Duration::ZERO, |w| {
            self.window.saturating_sub(w.started_at.elapsed())
        })
    }
}
