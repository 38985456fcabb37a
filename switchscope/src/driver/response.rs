//! Results of command execution.

use std::fmt;
use std::time::Duration;

use crate::channel::Mode;

/// Output of one command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// The command as shown in logs (secrets masked).
    pub command: String,

    /// Lines printed between the echo and the next prompt.
    pub output: String,

    /// Prompt mode once the command completed.
    pub mode: Option<Mode>,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure marker found in the output, if any.
    pub failure_message: Option<String>,
}

impl CommandOutput {
    /// Create a successful output.
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        mode: Option<Mode>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            mode,
            elapsed,
            failure_message: None,
        }
    }

    /// Create an output that tripped a failure marker.
    pub fn failed(
        command: impl Into<String>,
        output: impl Into<String>,
        mode: Option<Mode>,
        elapsed: Duration,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            failure_message: Some(failure_message.into()),
            ..Self::new(command, output, mode, elapsed)
        }
    }

    /// Check if the command output carries no failure marker.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output)
    }
}

/// Result of running a [`CommandSpec`](super::CommandSpec) against one host.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Host the commands ran on.
    pub host: String,

    /// Exit status reported by the remote shell, if it reported one.
    pub exit_status: Option<u32>,

    /// Per-command output, in submission order.
    pub commands: Vec<CommandOutput>,

    /// Prompt mode when the last command completed.
    pub mode: Option<Mode>,
}

impl RunOutput {
    /// All command output concatenated in order.
    pub fn output(&self) -> String {
        self.commands.iter().map(|c| c.output.as_str()).collect()
    }

    /// Numeric status: the shell's exit status, or 0 if it reported none.
    pub fn status(&self) -> u32 {
        self.exit_status.unwrap_or(0)
    }

    /// First command that tripped a failure marker.
    pub fn failure(&self) -> Option<&CommandOutput> {
        self.commands.iter().find(|c| !c.is_success())
    }

    /// True when the shell exited cleanly and no command failed.
    pub fn is_success(&self) -> bool {
        self.status() == 0 && self.failure().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_output_accessors() {
        let run = RunOutput {
            host: "sw1".to_string(),
            exit_status: None,
            commands: vec![
                CommandOutput::new("show clock", "12:00\r\n", Some(Mode::Privileged), Duration::ZERO),
                CommandOutput::failed(
                    "vlan 99",
                    "Error - invalid vlan\r\n",
                    Some(Mode::Privileged),
                    Duration::ZERO,
                    "Error",
                ),
            ],
            mode: Some(Mode::Privileged),
        };

        assert_eq!(run.output(), "12:00\r\nError - invalid vlan\r\n");
        assert_eq!(run.status(), 0);
        assert_eq!(run.failure().map(|c| c.command.as_str()), Some("vlan 99"));
        assert!(!run.is_success());
    }
}
