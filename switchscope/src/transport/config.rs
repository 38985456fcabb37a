//! Connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For lab use only.
    Disabled,
}

/// SSH connection settings shared by every host a connector talks to.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file. `None` uses the user's default.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Settings for `username` with password authentication.
    pub fn with_password(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            auth: AuthMethod::Password(password),
            ..Self::default()
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: 22,
            username: "admin".to_string(),
            auth: AuthMethod::None,
            timeout: Duration::from_secs(5),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication.
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

/// Telnet settings for terminal servers.
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    /// TCP port (default: 23).
    pub port: u16,

    /// Connection timeout.
    pub timeout: Duration,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            port: 23,
            timeout: Duration::from_secs(5),
        }
    }
}
