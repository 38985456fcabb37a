//! Builder for session runners.

use std::sync::Arc;
use std::time::Duration;

use super::runner::SessionRunner;
use crate::channel::{Backoff, PtyConfig};
use crate::error::{DriverError, Result};
use crate::platform::{PlatformDefinition, Vendor};
use crate::transport::{Connector, SshConfig, SshConnector};

/// Builder for constructing a [`SessionRunner`].
///
/// # Example
///
/// ```rust,no_run
/// use secrecy::SecretString;
/// use switchscope::driver::{CommandRunner, CommandSpec, RunnerBuilder};
/// use switchscope::platform::Vendor;
/// use switchscope::transport::SshConfig;
///
/// # async fn example() -> Result<(), switchscope::Error> {
/// let runner = RunnerBuilder::new()
///     .ssh(SshConfig::with_password("admin", SecretString::from("secret".to_string())))
///     .vendor(Vendor::Ruckus)
///     .build()?;
///
/// let output = runner.run("sw-b34-01", &CommandSpec::new(["show version"])).await?;
/// print!("{}", output.output());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct RunnerBuilder {
    connector: Option<Arc<dyn Connector>>,
    platform: Option<PlatformDefinition>,
    pty: PtyConfig,
    connect_retry: Option<Backoff>,
}

impl RunnerBuilder {
    /// Create a new runner builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect over SSH with these settings.
    pub fn ssh(mut self, config: SshConfig) -> Self {
        self.connector = Some(Arc::new(SshConnector::new(config)));
        self
    }

    /// Connect with a custom connector.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Use a built-in vendor definition.
    pub fn vendor(mut self, vendor: Vendor) -> Self {
        self.platform = Some(vendor.platform());
        self
    }

    /// Set a custom platform definition.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// How long to wait for the first byte of each line.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.pty.timeout = timeout;
        self
    }

    /// Polls before a partial line is taken as a prompt.
    pub fn partial_read(mut self, backoff: Backoff) -> Self {
        self.pty.partial_read = backoff;
        self
    }

    /// How long the post-logout drain may take.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.pty.drain_timeout = timeout;
        self
    }

    /// Connection attempts before giving up.
    pub fn connect_retry(mut self, backoff: Backoff) -> Self {
        self.connect_retry = Some(backoff);
        self
    }

    /// Build the runner. Nothing connects until it runs.
    pub fn build(self) -> Result<SessionRunner> {
        let connector = self.connector.ok_or_else(|| DriverError::InvalidConfig {
            message: "a connector or SSH configuration is required".to_string(),
        })?;
        let platform = self.platform.ok_or_else(|| DriverError::InvalidConfig {
            message: "a vendor or platform must be specified".to_string(),
        })?;

        Ok(SessionRunner::new(connector, platform)
            .with_pty(self.pty)
            .with_connect_retry(self.connect_retry.unwrap_or_else(Backoff::connect)))
    }
}
