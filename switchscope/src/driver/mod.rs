//! Session runners for device interaction.
//!
//! The driver layer opens one shell per command list, runs the commands
//! through the [`Session`] state machine and always cleans the connection up
//! afterwards.

mod builder;
mod interactive;
mod privilege;
pub(crate) mod response;
mod runner;
mod session;

pub use builder::RunnerBuilder;
pub use interactive::{Input, TERMINAL_PROMPT, TerminalEvent, TerminalScript, TerminalServerRunner};
pub use privilege::escalate;
pub use response::{CommandOutput, RunOutput};
pub use runner::{OpenContext, SessionRunner};
pub use session::Session;

use std::future::Future;

use crate::error::Result;

/// An ordered, immutable list of commands to run in one session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSpec {
    commands: Vec<String>,
}

impl CommandSpec {
    /// Create a command list.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// The commands in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl From<Vec<String>> for CommandSpec {
    fn from(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

/// Trait for anything that can run a [`CommandSpec`] against a host.
pub trait CommandRunner: Send + Sync {
    /// Connect, run every command in order, log out and close.
    fn run(&self, host: &str, spec: &CommandSpec)
    -> impl Future<Output = Result<RunOutput>> + Send;

    /// Run commands on several hosts one after another, collecting each
    /// host's result.
    fn run_each<'a>(
        &'a self,
        hosts: &'a [String],
        spec: &'a CommandSpec,
    ) -> impl Future<Output = Vec<(String, Result<RunOutput>)>> + Send + 'a {
        async move {
            let mut results = Vec::with_capacity(hosts.len());
            for host in hosts {
                results.push((host.clone(), self.run(host, spec).await));
            }
            results
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_order() {
        let spec = CommandSpec::new(["show vlan", "show mac-address"]);
        assert_eq!(spec.len(), 2);
        assert_eq!(
            spec.iter().collect::<Vec<_>>(),
            vec!["show vlan", "show mac-address"]
        );
        assert!(CommandSpec::default().is_empty());
    }
}
