//! Error types for switchscope.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for switchscope operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH or Telnet transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session runner errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Output parsing errors
    #[error("Survey error: {0}")]
    Survey(#[from] SurveyError),

    /// Host directory errors
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Configuration snapshot errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Local configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// True when the failure happened before any command reached the device.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport(
                TransportError::ConnectionFailed { .. }
                    | TransportError::RetriesExhausted { .. }
                    | TransportError::AuthenticationFailed { .. }
                    | TransportError::HostKeyChanged { .. }
                    | TransportError::HostKeyUnknown { .. }
            )
        )
    }

    /// True when an enable password was rejected or is missing.
    pub fn is_escalation_failure(&self) -> bool {
        matches!(
            self,
            Error::Driver(DriverError::EnableFailed { .. } | DriverError::EnablePasswordRequired { .. })
        )
    }
}

/// Transport layer errors (connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Every connection attempt failed
    #[error("Giving up on {host} after {attempts} connection attempts: {last}")]
    RetriesExhausted {
        host: String,
        attempts: u32,
        last: String,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// The host presented a key different from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// The host is not in known_hosts and strict checking is on
    #[error("Host {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed by the peer
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (line assembly, prompt patterns).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No data arrived within the session timeout
    #[error("No data received within {0:?}")]
    ReadTimeout(Duration),

    /// Channel closed before the expected prompt
    #[error("Channel closed")]
    Closed,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session runner errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Command execution failed
    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    /// The enable password did not change the prompt mode
    #[error("Bad enable password for {host}")]
    EnableFailed { host: String },

    /// Privileged mode was requested without an enable password
    #[error("Enable password required for {host}")]
    EnablePasswordRequired { host: String },

    /// A terminal server script step never saw its prompt
    #[error("Expected {expected:?} from {host}")]
    UnexpectedOutput { host: String, expected: String },

    /// Invalid configuration in a builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The directory description names no supported switch type
    #[error(
        "Switch {name} is either an unsupported type or does not have the switch type in its \
         description. The description was \"{description}\", and the supported switch types are {supported}."
    )]
    UnknownVendor {
        name: String,
        description: String,
        supported: String,
    },

    /// A vendor name that does not parse
    #[error("Unknown switch type '{0}'")]
    UnknownType(String),

    /// The vendor has no command for the requested operation
    #[error("{vendor} switches do not support {operation}")]
    Unsupported {
        vendor: &'static str,
        operation: &'static str,
    },
}

/// Errors turning vendor output into tables.
#[derive(Error, Debug)]
pub enum SurveyError {
    /// A table that every switch has came back empty
    #[error("No {table} entries found in output from {host}")]
    EmptyTable { host: String, table: &'static str },

    /// Text that is not a MAC address
    #[error("Invalid MAC address '{0}'")]
    InvalidMac(String),

    /// A command exited with a failure marker in its output
    #[error("{host} rejected '{command}': {message}")]
    Rejected {
        host: String,
        command: String,
        message: String,
    },
}

/// Host directory errors.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// No host with this name
    #[error("No directory entry for '{0}'")]
    NotFound(String),

    /// Reading the directory file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The directory file is not valid JSON
    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A search pattern that does not compile
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration snapshot errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Reading or writing a snapshot failed
    #[error("{path} is not a valid configuration file: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot contents are not valid JSON
    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Local configuration errors (credentials file, subnet table).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a configuration file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line in a key=value file is malformed
    #[error("{path}:{line}: expected key=value")]
    Malformed { path: PathBuf, line: usize },

    /// A JSON configuration file does not parse
    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required value is absent
    #[error("Missing {0}")]
    Missing(&'static str),
}

/// Result type alias using switchscope's Error.
pub type Result<T> = std::result::Result<T, Error>;
