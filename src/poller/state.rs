//! Poller lifecycle state and retry backoff.

use std::fmt;
use std::time::Duration;

/// Lifecycle of the update poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    /// Constructed, not yet running.
    #[default]
    Idle,

    /// Waiting on the transport for the next batch.
    Polling,

    /// Handing a batch to the dispatcher.
    Dispatching,

    /// Stop signal observed; no further fetches.
    Stopped,
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Dispatching => "dispatching",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Exponential backoff between failed polls.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

impl Backoff {
    /// Creates a backoff starting at `initial` and doubling up to `max`.
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Returns the delay to wait now and doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Resets after a successful poll.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Counters reported when the poller stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    /// Successful polls.
    pub batches: u64,

    /// Messages handed to the dispatcher.
    pub messages: u64,

    /// Polls that failed with a transport error.
    pub transport_failures: u64,
}
