//! Built-in commands.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{info, warn};

use super::guard::RateLimitGuard;
use super::rate_limiter::CommandRateLimiter;
use super::{CommandContext, CommandDescriptor, CommandError, Handler};
use crate::config::BotSettings;
use crate::system::{HostStatus, format_duration};
use crate::telegram::InboundMessage;

/// First line of the `/help` reply.
pub const HELP_HEADER: &str = "The commands you can execute are: \n\n";

/// Longest `exec` output sent back, in characters.
const MAX_EXEC_OUTPUT_CHARS: usize = 16_000;

/// Appended to `exec` output cut at [`MAX_EXEC_OUTPUT_CHARS`].
const TRUNCATED_MARKER: &str = "\n...(truncated)";

/// Returns the built-in command table, in declaration order.
#[must_use]
pub fn builtin_commands(settings: &BotSettings) -> Vec<CommandDescriptor> {
    let mut exec = CommandDescriptor::new(
        "exec",
        "Execute a bash command",
        ExecCommand::new(Duration::from_secs(settings.exec_timeout_secs)),
    );
    if settings.rate_limit_commands > 0 {
        let limiter = CommandRateLimiter::from_secs(
            settings.rate_limit_commands,
            settings.rate_limit_window_secs,
        );
        exec = exec.guarded(RateLimitGuard::new(Arc::new(limiter)));
    }

    vec![
        CommandDescriptor::new("help", "List all commands", HelpCommand),
        exec.admin_required(),
        CommandDescriptor::new(
            "status",
            "Show host and bot status",
            StatusCommand::new(Utc::now()),
        )
        .admin_required(),
    ]
}

/// Lists every registered command.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelpCommand;

#[async_trait]
impl Handler for HelpCommand {
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        message: &InboundMessage,
    ) -> Result<(), CommandError> {
        let commands = ctx
            .registry
            .list()
            .into_iter()
            .map(|(name, description)| format!("{}{name} - {description}", ctx.prefix))
            .collect::<Vec<_>>()
            .join("\n");

        ctx.reply(message, &format!("{HELP_HEADER}{commands}")).await?;
        Ok(())
    }
}

/// Runs the message arguments through the host shell.
///
/// Anyone who passes the guards gets arbitrary command execution as the
/// bot's OS user.
#[derive(Debug, Clone)]
pub struct ExecCommand {
    timeout: Duration,
}

impl ExecCommand {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Handler for ExecCommand {
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        message: &InboundMessage,
    ) -> Result<(), CommandError> {
        let command_line = ctx.arguments(message);
        if command_line.is_empty() {
            ctx.reply(message, &format!("Usage: {}exec <command>", ctx.prefix))
                .await?;
            return Ok(());
        }

        warn!(sender = %message.sender_id, "exec: {command_line}");
        let output = run_shell(command_line, self.timeout).await?;

        ctx.reply(message, &format!("$ {}\n{output}", ctx.invocation(message)))
            .await?;
        Ok(())
    }
}

/// Runs a command line through the platform shell and returns its
/// combined stdout and stderr.
///
/// A non-zero exit is reported inside the output, not as an error.
async fn run_shell(command_line: &str, timeout: Duration) -> Result<String, CommandError> {
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C");
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c");
        c
    };
    command
        .arg(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|e| CommandError::Execution(format!("failed to start shell: {e}")))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(CommandError::Execution(format!(
                "failed to read command output: {e}"
            )));
        }
        Err(_) => {
            return Err(CommandError::Execution(format!(
                "timed out after {}",
                format_duration(timeout.as_secs())
            )));
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    truncate_output(&mut text, MAX_EXEC_OUTPUT_CHARS);

    if !output.status.success() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        match output.status.code() {
            Some(code) => text.push_str(&format!("[exit status: {code}]")),
            None => text.push_str("[terminated by signal]"),
        }
    }

    info!(status = %output.status, bytes = text.len(), "exec finished");
    Ok(text)
}

/// Cuts `text` to `max_chars` characters, marking the cut.
fn truncate_output(text: &mut String, max_chars: usize) {
    if let Some((cut, _)) = text.char_indices().nth(max_chars) {
        warn!(bytes = text.len(), "exec output truncated");
        text.truncate(cut);
        text.push_str(TRUNCATED_MARKER);
    }
}

/// Reports host status plus when the bot started.
#[derive(Debug, Clone)]
pub struct StatusCommand {
    started_at: DateTime<Utc>,
}

impl StatusCommand {
    #[must_use]
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }
}

#[async_trait]
impl Handler for StatusCommand {
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        message: &InboundMessage,
    ) -> Result<(), CommandError> {
        let host = tokio::task::spawn_blocking(HostStatus::collect)
            .await
            .map_err(|e| CommandError::Execution(format!("failed to read host status: {e}")))?;

        let uptime = (Utc::now() - self.started_at).num_seconds().max(0);
        let text = format!(
            "{}\n\nBot running since {}\nBot uptime: {}\nCommands: {}",
            host.render(),
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_duration(uptime.unsigned_abs()),
            ctx.registry.len()
        );
        ctx.reply(message, &text).await?;
        Ok(())
    }
}
