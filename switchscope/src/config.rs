//! Local configuration: the credentials file and where everything lives.
//!
//! ```text
//! config/
//!   credentials      # key=value login details
//!   hosts.json       # host directory
//!   subnets.json     # VLAN → subnet policy
//!   configs/         # saved configuration snapshots
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use crate::error::ConfigError;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "SWITCHSCOPE_CONFIG_DIR";

/// Login details read from a `key=value` file.
///
/// ```text
/// # lab switches
/// username = admin
/// password = hunter2
/// enable_password = hunter3
/// ```
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub enable_password: Option<SecretString>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("enable_password", &self.enable_password.as_ref().map(|_| "********"))
            .finish()
    }
}

impl Credentials {
    /// Read a credentials file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let mut credentials = Self::default();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Malformed {
                    path: path.to_path_buf(),
                    line: number + 1,
                });
            };
            let value = value.trim().to_string();
            match key.trim() {
                "username" => credentials.username = Some(value),
                "password" => credentials.password = Some(SecretString::from(value)),
                "enable_password" => credentials.enable_password = Some(SecretString::from(value)),
                other => log::debug!("{}: ignoring unknown key {}", path.display(), other),
            }
        }
        Ok(credentials)
    }
}

/// Paths of the files the CLI reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

impl Settings {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// `$SWITCHSCOPE_CONFIG_DIR`, or `./config`.
    pub fn default_dir() -> PathBuf {
        std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config"))
    }

    pub fn subnets(&self) -> PathBuf {
        self.config_dir.join("subnets.json")
    }

    pub fn hosts(&self) -> PathBuf {
        self.config_dir.join("hosts.json")
    }

    pub fn credentials(&self) -> PathBuf {
        self.config_dir.join("credentials")
    }

    /// Where configuration snapshots are saved.
    pub fn snapshots(&self) -> PathBuf {
        self.config_dir.join("configs")
    }

    /// The credentials file, or empty credentials when there is none.
    pub fn load_credentials(&self) -> Result<Credentials, ConfigError> {
        let path = self.credentials();
        if !path.exists() {
            return Ok(Credentials::default());
        }
        Credentials::from_file(path)
    }
}
