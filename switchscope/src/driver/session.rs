//! One interactive shell and the command state machine that drives it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::response::CommandOutput;
use crate::channel::{Mode, PromptMatcher, PtyChannel};
use crate::error::Result;
use crate::platform::PlatformDefinition;

/// A live shell on one host.
///
/// Commands run one at a time. For each command the session sends the
/// command and its terminator, skips lines until the prompt echoes that exact
/// command back, then collects output until the next prompt. A pagination
/// banner is answered with a space instead of being collected. After every
/// command one blank line is sent so the device prints a fresh prompt.
pub struct Session {
    host: String,
    channel: PtyChannel,
    prompt: Regex,
    platform: Arc<PlatformDefinition>,
    mode: Option<Mode>,
}

impl Session {
    pub(crate) fn new(
        host: impl Into<String>,
        channel: PtyChannel,
        prompt: Regex,
        platform: Arc<PlatformDefinition>,
    ) -> Self {
        Self {
            host: host.into(),
            channel,
            prompt,
            platform,
            mode: None,
        }
    }

    /// Host this session is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Mode shown by the most recent prompt.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// The platform driving this session.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Run a command and collect its output.
    pub async fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        self.exec_inner(command, command).await
    }

    /// Run `command` followed by a secret argument, masking it in logs and
    /// in the returned output record.
    pub async fn exec_secret(
        &mut self,
        command: &str,
        secret: &SecretString,
    ) -> Result<CommandOutput> {
        let wire = format!("{} {}", command, secret.expose_secret());
        let shown = format!("{command} ********");
        self.exec_inner(&wire, &shown).await
    }

    async fn exec_inner(&mut self, wire: &str, shown: &str) -> Result<CommandOutput> {
        let start = Instant::now();
        let terminator = self.platform.terminator.clone();
        debug!("{} >>> {}", self.host, shown);
        self.channel.send_line(wire, &terminator).await?;

        loop {
            let line = self.channel.read_line().await?;
            if let Some(prompt) = self.prompt.parse(line.trim_end()) {
                if prompt.command == wire {
                    self.mode = Some(prompt.mode);
                    break;
                }
            }
        }

        let mut output = String::new();
        loop {
            let line = self.channel.read_line().await?;
            if self.platform.is_pagination(&line) {
                trace!("{} continuing paged output", self.host);
                self.channel.send_line(" ", &terminator).await?;
                continue;
            }
            if let Some(prompt) = self.prompt.parse(line.trim_end()) {
                self.mode = Some(prompt.mode);
                break;
            }
            output.push_str(&line);
        }

        self.channel.send_line(" ", &terminator).await?;

        let elapsed = start.elapsed();
        match self.platform.detect_failure(&output) {
            Some(marker) => {
                debug!("{} '{}' failed: {}", self.host, shown, marker);
                Ok(CommandOutput::failed(shown, output, self.mode, elapsed, marker))
            }
            None => Ok(CommandOutput::new(shown, output, self.mode, elapsed)),
        }
    }

    /// Send a line without waiting for a prompt (used for logout).
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let terminator = self.platform.terminator.clone();
        debug!("{} >>> {}", self.host, line);
        self.channel.send_line(line, &terminator).await
    }

    /// Wait up to `grace` for the shell to exit.
    pub async fn wait_for_exit(&mut self, grace: Duration) -> Result<bool> {
        self.channel.wait_for_exit(grace).await
    }

    /// Drain and close the connection, returning the shell's exit status.
    pub(crate) async fn finish(mut self) -> Option<u32> {
        let drained = self.channel.drain().await;
        trace!("{} drained {} bytes after logout", self.host, drained);
        let status = self.channel.exit_status();
        if let Err(e) = self.channel.close().await {
            debug!("{} close failed: {}", self.host, e);
        }
        status
    }
}
