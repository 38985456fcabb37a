//! Builder for [`Switch`].

use std::sync::Arc;
use std::time::Duration;

use log::info;
use secrecy::SecretString;

use super::{SettleTimes, Switch};
use crate::channel::Backoff;
use crate::directory::{DirectoryCache, SubnetTable};
use crate::driver::RunnerBuilder;
use crate::error::{ConfigError, DirectoryError, Error, Result};
use crate::platform::Vendor;
use crate::survey::Surveyor;
use crate::transport::{AuthMethod, Connector, HostKeyVerification, SshConfig};

/// Builder for constructing a [`Switch`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use secrecy::SecretString;
/// use switchscope::directory::{DirectoryCache, StaticDirectory, SubnetTable};
/// use switchscope::switch::SwitchBuilder;
///
/// # async fn example() -> Result<(), switchscope::Error> {
/// let hosts = StaticDirectory::from_file("config/hosts.json")?;
/// let directory = Arc::new(DirectoryCache::new(Arc::new(hosts)));
///
/// let mut switch = SwitchBuilder::new("switch-b34-01")
///     .password(SecretString::from("secret".to_string()))
///     .directory(directory)
///     .subnets(SubnetTable::from_file("config/subnets.json")?)
///     .build()
///     .await?;
///
/// switch.update().await?;
/// for device in switch.survey().await? {
///     println!("{device} is on the wrong subnet");
/// }
/// # Ok(())
/// # }
/// ```
pub struct SwitchBuilder {
    name: String,
    vendor: Option<Vendor>,
    ssh: SshConfig,
    password: Option<SecretString>,
    enable_password: Option<SecretString>,
    command_timeout: Option<Duration>,
    connect_retry: Option<Backoff>,
    directory: Option<Arc<DirectoryCache>>,
    subnets: Arc<SubnetTable>,
    connector: Option<Arc<dyn Connector>>,
    settle: SettleTimes,
}

impl SwitchBuilder {
    /// Start building a switch known to the directory as `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vendor: None,
            ssh: SshConfig::default(),
            password: None,
            enable_password: None,
            command_timeout: None,
            connect_retry: None,
            directory: None,
            subnets: Arc::new(SubnetTable::default()),
            connector: None,
            settle: SettleTimes::default(),
        }
    }

    /// Skip the directory lookup and use this vendor.
    pub fn vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// Set the login user (default `admin`).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.ssh.username = username.into();
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Set the password for `enable`.
    pub fn enable_password(mut self, password: SecretString) -> Self {
        self.enable_password = Some(password);
        self
    }

    /// Set the SSH port (default 22).
    pub fn port(mut self, port: u16) -> Self {
        self.ssh.port = port;
        self
    }

    /// Set the SSH connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.ssh.timeout = timeout;
        self
    }

    /// How long a command may go without output.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Connection attempts before a session gives up.
    pub fn connect_retry(mut self, retry: Backoff) -> Self {
        self.connect_retry = Some(retry);
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.ssh.host_key_verification = mode;
        self
    }

    /// Directory used for vendor lookup, MAC resolution and subnets.
    pub fn directory(mut self, directory: Arc<DirectoryCache>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// VLAN → subnet policy used by surveys.
    pub fn subnets(mut self, subnets: impl Into<Arc<SubnetTable>>) -> Self {
        self.subnets = subnets.into();
        self
    }

    /// Connect through this connector instead of SSH.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Settle delays before single-port refreshes.
    pub fn settle(mut self, settle: SettleTimes) -> Self {
        self.settle = settle;
        self
    }

    /// Resolve the vendor and build the switch. Nothing connects yet.
    pub async fn build(self) -> Result<Switch> {
        let directory = self.directory.ok_or(ConfigError::Missing("host directory"))?;

        let vendor = match self.vendor {
            Some(vendor) => vendor,
            None => {
                let description = match directory.description(&self.name).await {
                    Ok(description) => description,
                    Err(Error::Directory(DirectoryError::NotFound(_))) => String::new(),
                    Err(e) => return Err(e),
                };
                let vendor = Vendor::from_description(&self.name, &description)?;
                info!("No switch type supplied, guessing that switch is type {}", vendor);
                vendor
            }
        };

        let mut runner = RunnerBuilder::new().vendor(vendor);
        runner = match self.connector {
            Some(connector) => runner.connector(connector),
            None => {
                let mut ssh = self.ssh;
                if let Some(password) = self.password {
                    ssh.auth = AuthMethod::Password(password);
                }
                runner.ssh(ssh)
            }
        };
        if let Some(timeout) = self.command_timeout {
            runner = runner.timeout(timeout);
        }
        if let Some(retry) = self.connect_retry {
            runner = runner.connect_retry(retry);
        }

        Ok(Switch::new(
            self.name,
            Surveyor::new(vendor, runner.build()?),
            directory,
            self.subnets,
            self.enable_password,
            self.settle,
        ))
    }
}
