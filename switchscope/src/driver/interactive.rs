//! Expect/send scripts for terminal servers.
//!
//! Terminal servers (Digi PortServer, ConnectPort) have no prompt grammar
//! worth matching: they print `login: `, `password: ` and then a fixed
//! `#> ` prompt. A [`TerminalScript`] is the list of strings to wait for and
//! what to type after each one; [`TerminalServerRunner`] plays it over a
//! Telnet connection.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::response::{CommandOutput, RunOutput};
use super::runner::connect_with_retry;
use super::{CommandRunner, CommandSpec};
use crate::channel::{Backoff, PtyChannel, PtyConfig};
use crate::error::{DriverError, Result};
use crate::transport::Connector;

/// Prompt printed by the terminal server shell.
pub const TERMINAL_PROMPT: &str = "#> ";

/// Text typed in response to a prompt.
#[derive(Debug, Clone)]
pub enum Input {
    /// Logged as typed.
    Line(String),

    /// Masked in logs (passwords).
    Secret(SecretString),
}

impl Input {
    fn logged(&self) -> &str {
        match self {
            Input::Line(line) => line,
            Input::Secret(_) => "********",
        }
    }

    fn wire(&self) -> &str {
        match self {
            Input::Line(line) => line,
            Input::Secret(secret) => secret.expose_secret(),
        }
    }
}

/// One step of a terminal script: wait for `expect`, then type `input`.
#[derive(Debug, Clone)]
pub struct TerminalEvent {
    /// Literal text to wait for.
    pub expect: String,

    /// What to type once `expect` is seen.
    pub input: Option<Input>,

    /// Keep the text read while waiting as command output.
    pub capture: bool,

    /// Fail the run if `expect` never appears.
    pub required: bool,

    /// Optional timeout override for this event.
    pub timeout: Option<Duration>,
}

impl TerminalEvent {
    /// Wait for `expect`, then type `input`.
    pub fn new(expect: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            expect: expect.into(),
            input: Some(Input::Line(input.into())),
            capture: false,
            required: true,
            timeout: None,
        }
    }

    /// Wait for `expect`, then type a secret.
    pub fn hidden(expect: impl Into<String>, secret: SecretString) -> Self {
        Self {
            input: Some(Input::Secret(secret)),
            ..Self::new(expect, "")
        }
    }

    /// Only wait for `expect`.
    pub fn wait(expect: impl Into<String>) -> Self {
        Self {
            input: None,
            ..Self::new(expect, "")
        }
    }

    /// Keep what was read as output.
    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Carry on if `expect` does not show up.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set a custom timeout for this event.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// An ordered list of [`TerminalEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct TerminalScript {
    events: Vec<TerminalEvent>,
}

impl TerminalScript {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(mut self, event: TerminalEvent) -> Self {
        self.events.push(event);
        self
    }

    /// The script for logging in, running `spec` and logging out.
    ///
    /// Each command's echo is awaited for at most a second; the text between
    /// the echo and the next prompt is that command's output.
    pub fn login(username: &str, password: &SecretString, spec: &CommandSpec) -> Self {
        let mut script = Self::new()
            .push(TerminalEvent::new("login: ", username))
            .push(TerminalEvent::hidden("password: ", password.clone()));

        let mut after_command = false;
        for command in spec.iter() {
            let prompt = TerminalEvent::new(TERMINAL_PROMPT, command);
            script = script.push(if after_command { prompt.captured() } else { prompt });
            script = script.push(
                TerminalEvent::wait(format!("{command}\r\n"))
                    .optional()
                    .with_timeout(Duration::from_secs(1)),
            );
            after_command = true;
        }

        let logout = TerminalEvent::new(TERMINAL_PROMPT, "exit");
        script.push(if after_command { logout.captured() } else { logout })
    }

    /// The events in order.
    pub fn events(&self) -> &[TerminalEvent] {
        &self.events
    }
}

/// Runs commands on terminal servers over Telnet.
#[derive(Clone)]
pub struct TerminalServerRunner {
    connector: Arc<dyn Connector>,
    username: String,
    password: SecretString,
    pty: PtyConfig,
    connect_retry: Backoff,
}

impl TerminalServerRunner {
    /// Create a runner that logs in as `username`.
    pub fn new(connector: Arc<dyn Connector>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            connector,
            username: username.into(),
            password,
            pty: PtyConfig::default(),
            connect_retry: Backoff::connect(),
        }
    }

    /// Set the read timeout applied to events without their own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.pty.timeout = timeout;
        self
    }

    /// Play `script` against `host`, returning the captured sections.
    ///
    /// Connecting is retried the same way [`SessionRunner`](super::SessionRunner)
    /// retries it.
    pub async fn play(&self, host: &str, script: &TerminalScript) -> Result<Vec<String>> {
        let transport = connect_with_retry(self.connector.as_ref(), &self.connect_retry, host).await?;
        let mut channel = PtyChannel::new(transport, self.pty.clone());

        let result = self.drive(&mut channel, host, script).await;

        let drained = channel.drain().await;
        trace!("{} drained {} bytes after logout", host, drained);
        if let Err(e) = channel.close().await {
            debug!("{} close failed: {}", host, e);
        }
        result
    }

    async fn drive(
        &self,
        channel: &mut PtyChannel,
        host: &str,
        script: &TerminalScript,
    ) -> Result<Vec<String>> {
        let mut captured = Vec::new();
        for event in script.events() {
            let timeout = event.timeout.unwrap_or(self.pty.timeout);
            let read = channel.read_until(&event.expect, timeout).await?;
            if !read.matched && event.required {
                return Err(DriverError::UnexpectedOutput {
                    host: host.to_string(),
                    expected: event.expect.clone(),
                }
                .into());
            }

            if event.capture {
                let text = read.text.strip_suffix(&event.expect).unwrap_or(&read.text);
                captured.push(text.trim_end_matches('\r').to_string());
            }

            if let Some(input) = &event.input {
                debug!("{} >>> {}", host, input.logged());
                channel.send_line(input.wire(), "\n").await?;
            }
        }
        Ok(captured)
    }
}

impl CommandRunner for TerminalServerRunner {
    async fn run(&self, host: &str, spec: &CommandSpec) -> Result<RunOutput> {
        let start = Instant::now();
        let script = TerminalScript::login(&self.username, &self.password, spec);
        let captured = self.play(host, &script).await?;
        let elapsed = start.elapsed();

        let commands = spec
            .iter()
            .zip(captured)
            .map(|(command, output)| CommandOutput::new(command, output, None, elapsed))
            .collect();
        Ok(RunOutput {
            host: host.to_string(),
            exit_status: None,
            commands,
            mode: None,
        })
    }
}
