//! Command registration and dispatch.
//!
//! Commands are declared as [`CommandDescriptor`]s, collected into a
//! [`CommandRegistry`] when the bot is built, and routed by the
//! [`Dispatcher`]. Access checks are [`Guard`]s composed into the
//! descriptor's handler.

mod builtin;
mod dispatcher;
mod guard;
mod rate_limiter;
mod registry;
#[cfg(test)]
pub(crate) mod test_support;
mod types;

pub use builtin::{ExecCommand, HELP_HEADER, HelpCommand, StatusCommand, builtin_commands};
pub use dispatcher::{DispatchOutcome, Dispatcher, parse_command_token};
pub use guard::{
    ACCESS_DENIED_REPLY, AdminGuard, Guard, GuardDecision, Guarded, RATE_LIMITED_REPLY,
    RateLimitGuard,
};
pub use rate_limiter::CommandRateLimiter;
pub use registry::{CommandRegistry, DuplicateCommandError, RegistryError};
pub use types::{CommandContext, CommandDescriptor, CommandError, Handler};
