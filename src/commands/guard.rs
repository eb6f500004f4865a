//! Guards that decide whether a handler may run.
//!
//! A [`Guard`] inspects the message before the handler sees it and either
//! lets it through or short-circuits with a reply. [`Guarded`] composes a
//! guard with a handler, so descriptors can stack checks without the
//! dispatcher knowing about them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::rate_limiter::CommandRateLimiter;
use super::{CommandContext, CommandError, Handler};
use crate::telegram::InboundMessage;

/// Reply sent to senders outside the admin allow-list.
pub const ACCESS_DENIED_REPLY: &str = "You don't have access to run this command";

/// Reply sent to senders over their rate limit.
pub const RATE_LIMITED_REPLY: &str =
    "Rate limit exceeded. Please wait before sending more commands.";

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Run the wrapped handler.
    Proceed,

    /// Skip the handler and send this reply instead.
    Deny(String),
}

/// A pre-invocation check.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn check(&self, ctx: &CommandContext<'_>, message: &InboundMessage) -> GuardDecision;
}

/// Admits only senders listed in the bot's admin set.
///
/// An empty admin set denies everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminGuard;

#[async_trait]
impl Guard for AdminGuard {
    async fn check(&self, ctx: &CommandContext<'_>, message: &InboundMessage) -> GuardDecision {
        if ctx.identity.is_admin(&message.sender_id) {
            return GuardDecision::Proceed;
        }

        warn!(
            sender = %message.sender_id,
            chat_id = %message.chat_id,
            command = ctx.invocation(message).split_whitespace().next().unwrap_or(""),
            "access denied"
        );
        GuardDecision::Deny(ACCESS_DENIED_REPLY.to_owned())
    }
}

/// Limits how many guarded commands each sender may run per window.
#[derive(Debug, Clone)]
pub struct RateLimitGuard {
    limiter: Arc<CommandRateLimiter>,
}

impl RateLimitGuard {
    #[must_use]
    pub fn new(limiter: Arc<CommandRateLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl Guard for RateLimitGuard {
    async fn check(&self, _ctx: &CommandContext<'_>, message: &InboundMessage) -> GuardDecision {
        if self.limiter.try_acquire(&message.sender_id).await {
            return GuardDecision::Proceed;
        }

        let retry_in = self.limiter.time_until_reset(&message.sender_id).await;
        warn!(
            sender = %message.sender_id,
            retry_in_secs = retry_in.as_secs(),
            "rate limit exceeded"
        );
        GuardDecision::Deny(RATE_LIMITED_REPLY.to_owned())
    }
}

/// A handler wrapped in a guard.
pub struct Guarded {
    guard: Box<dyn Guard>,
    inner: Arc<dyn Handler>,
}

impl Guarded {
    pub fn new(guard: impl Guard + 'static, inner: Arc<dyn Handler>) -> Self {
        Self {
            guard: Box::new(guard),
            inner,
        }
    }
}

#[async_trait]
impl Handler for Guarded {
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        message: &InboundMessage,
    ) -> Result<(), CommandError> {
        match self.guard.check(ctx, message).await {
            GuardDecision::Proceed => self.inner.handle(ctx, message).await,
            GuardDecision::Deny(reply) => {
                ctx.reply(message, &reply).await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::commands::test_support::{Recorder, message};
    use crate::commands::{CommandDescriptor, CommandRegistry};
    use crate::config::BotIdentity;
    use crate::telegram::mock::MockTransport;

    fn ctx<'a>(
        transport: &'a MockTransport,
        registry: &'a CommandRegistry,
        identity: &'a BotIdentity,
    ) -> CommandContext<'a> {
        CommandContext {
            transport,
            registry,
            identity,
            prefix: '/',
        }
    }

    #[tokio::test]
    async fn test_admin_reaches_handler() {
        let transport = MockTransport::new();
        let registry = CommandRegistry::new();
        let identity = BotIdentity::new("token", ["alice"]);
        let recorder = Recorder::default();
        let descriptor = CommandDescriptor::new("exec", "", recorder.clone()).admin_required();

        descriptor
            .invoke(&ctx(&transport, &registry, &identity), &message("/exec ls", "alice"))
            .await
            .unwrap();

        assert_eq!(recorder.calls(), vec!["/exec ls".to_owned()]);
        assert!(transport.replies().is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_gets_denial() {
        let transport = MockTransport::new();
        let registry = CommandRegistry::new();
        let identity = BotIdentity::new("token", ["alice"]);
        let recorder = Recorder::default();
        let descriptor = CommandDescriptor::new("exec", "", recorder.clone()).admin_required();

        descriptor
            .invoke(&ctx(&transport, &registry, &identity), &message("/exec ls", "bob"))
            .await
            .unwrap();

        assert!(recorder.calls().is_empty());
        assert_eq!(transport.reply_texts(), vec![ACCESS_DENIED_REPLY.to_owned()]);
    }

    #[tokio::test]
    async fn test_admin_match_is_case_sensitive() {
        let transport = MockTransport::new();
        let registry = CommandRegistry::new();
        let identity = BotIdentity::new("token", ["alice"]);
        let guard = AdminGuard;

        let decision = guard
            .check(&ctx(&transport, &registry, &identity), &message("/exec ls", "Alice"))
            .await;
        assert_eq!(decision, GuardDecision::Deny(ACCESS_DENIED_REPLY.to_owned()));
    }

    #[tokio::test]
    async fn test_empty_admin_set_locks_out_everyone() {
        let transport = MockTransport::new();
        let registry = CommandRegistry::new();
        let identity = BotIdentity::new("token", Vec::<String>::new());
        let recorder = Recorder::default();
        let descriptor = CommandDescriptor::new("exec", "", recorder.clone()).admin_required();
        let context = ctx(&transport, &registry, &identity);

        for sender in ["alice", "bob", ""] {
            descriptor.invoke(&context, &message("/exec ls", sender)).await.unwrap();
        }

        assert!(recorder.calls().is_empty());
        assert_eq!(transport.replies().len(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_guard() {
        let transport = MockTransport::new();
        let registry = CommandRegistry::new();
        let identity = BotIdentity::new("token", ["alice"]);
        let recorder = Recorder::default();
        let limiter = Arc::new(CommandRateLimiter::from_secs(1, 60));
        let descriptor = CommandDescriptor::new("exec", "", recorder.clone())
            .guarded(RateLimitGuard::new(limiter))
            .admin_required();
        let context = ctx(&transport, &registry, &identity);

        descriptor.invoke(&context, &message("/exec a", "alice")).await.unwrap();
        descriptor.invoke(&context, &message("/exec b", "alice")).await.unwrap();

        assert_eq!(recorder.calls(), vec!["/exec a".to_owned()]);
        assert_eq!(transport.reply_texts(), vec![RATE_LIMITED_REPLY.to_owned()]);
    }

    #[tokio::test]
    async fn test_denied_sender_does_not_consume_rate_limit() {
        let transport = MockTransport::new();
        let registry = CommandRegistry::new();
        let identity = BotIdentity::new("token", ["alice"]);
        let recorder = Recorder::default();
        let limiter = Arc::new(CommandRateLimiter::from_secs(1, 60));
        let descriptor = CommandDescriptor::new("exec", "", recorder.clone())
            .guarded(RateLimitGuard::new(Arc::clone(&limiter)))
            .admin_required();
        let context = ctx(&transport, &registry, &identity);

        descriptor.invoke(&context, &message("/exec a", "bob")).await.unwrap();
        assert_eq!(limiter.time_until_reset("bob").await, Duration::ZERO);
    }
}
