//! Transport layer: SSH via russh and Telnet for terminal servers.
//!
//! A [`Connector`] opens one interactive shell per call and hands back a
//! [`Transport`]. Sessions never share a transport; each command sequence
//! gets its own connection and closes it when done.

pub mod config;
#[cfg(test)]
pub(crate) mod scripted;
mod ssh;
mod telnet;

pub use config::{AuthMethod, HostKeyVerification, SshConfig, TelnetConfig};
pub use ssh::{SshConnector, SshTransport};
pub use telnet::{TelnetConnector, TelnetTransport};

use async_trait::async_trait;

use crate::error::Result;

/// A byte stream to an interactive shell on a remote device.
#[async_trait]
pub trait Transport: Send {
    /// Write raw bytes to the shell.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Wait for the next chunk of output.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream. Implementations
    /// must be cancel safe: callers bound every call with a timeout.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>>;

    /// Exit status reported by the remote shell, if any.
    fn exit_status(&self) -> Option<u32>;

    /// Whether the peer has closed the stream.
    fn is_closed(&self) -> bool;

    /// Release the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens transports to named hosts.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and authenticate, returning a shell ready for commands.
    async fn connect(&self, host: &str) -> Result<Box<dyn Transport>>;
}
