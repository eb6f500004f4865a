//! Update polling module.
//!
//! Drives the bot by pulling batches of messages from the transport and
//! feeding them to the dispatcher in arrival order.

mod runner;
mod state;

pub use runner::UpdatePoller;
pub use state::{Backoff, PollerState, PollerStats};
