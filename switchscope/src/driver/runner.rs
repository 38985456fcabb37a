//! Session runner: one connection, one command list, guaranteed cleanup.

use std::sync::Arc;

use log::{debug, error, info};
use secrecy::SecretString;

use super::response::{CommandOutput, RunOutput};
use super::session::Session;
use super::{CommandRunner, CommandSpec};
use crate::channel::{Backoff, Mode, PtyChannel, PtyConfig, compile_prompt};
use crate::error::{ChannelError, Result, TransportError};
use crate::platform::{DefaultBehavior, PlatformDefinition, VendorBehavior};
use crate::transport::{Connector, Transport};

/// What the vendor's open hook should do before user commands run.
#[derive(Debug, Clone, Default)]
pub struct OpenContext {
    /// The caller needs privileged mode for its commands.
    pub privileged: bool,

    /// Password for `enable`, if the caller has one.
    pub enable_password: Option<SecretString>,
}

/// Runs command lists against hosts of one platform.
///
/// Every [`run`](CommandRunner::run) opens a fresh connection (retrying a
/// bounded number of times), lets the vendor hook prepare the shell, runs
/// each command, logs out, then drains and closes the connection whether or
/// not anything failed.
#[derive(Clone)]
pub struct SessionRunner {
    connector: Arc<dyn Connector>,
    platform: Arc<PlatformDefinition>,
    pty: PtyConfig,
    connect_retry: Backoff,
}

impl SessionRunner {
    /// Create a runner with default PTY settings and connect retries.
    pub fn new(connector: Arc<dyn Connector>, platform: PlatformDefinition) -> Self {
        Self {
            connector,
            platform: Arc::new(platform),
            pty: PtyConfig::default(),
            connect_retry: Backoff::connect(),
        }
    }

    pub(crate) fn with_pty(mut self, pty: PtyConfig) -> Self {
        self.pty = pty;
        self
    }

    pub(crate) fn with_connect_retry(mut self, retry: Backoff) -> Self {
        self.connect_retry = retry;
        self
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Run `spec` after entering privileged mode.
    pub async fn run_privileged(
        &self,
        host: &str,
        spec: &CommandSpec,
        enable_password: Option<&SecretString>,
    ) -> Result<RunOutput> {
        let ctx = OpenContext {
            privileged: true,
            enable_password: enable_password.cloned(),
        };
        self.run_with(host, spec, &ctx).await
    }

    /// Run `spec` with an explicit open context.
    pub async fn run_with(
        &self,
        host: &str,
        spec: &CommandSpec,
        ctx: &OpenContext,
    ) -> Result<RunOutput> {
        let prompt = compile_prompt(&self.platform.prompt_template, host)
            .map_err(ChannelError::InvalidPattern)?;
        let transport = self.connect(host).await?;

        let channel = PtyChannel::new(transport, self.pty.clone());
        let mut session = Session::new(host, channel, prompt, self.platform.clone());

        let result = self.drive(&mut session, spec, ctx).await;
        let mode = session.mode();
        let exit_status = session.finish().await;

        let commands = result?;
        debug!(
            "{}: {} commands finished, exit status {:?}",
            host,
            commands.len(),
            exit_status
        );
        Ok(RunOutput {
            host: host.to_string(),
            exit_status,
            commands,
            mode,
        })
    }

    /// Run only the mode probe and report the prompt mode it ended in.
    pub async fn probe_mode(&self, host: &str, probe: &str) -> Result<Option<Mode>> {
        let output = self.run(host, &CommandSpec::new([probe])).await?;
        Ok(output.mode)
    }

    fn behavior(&self) -> Arc<dyn VendorBehavior> {
        self.platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior))
    }

    async fn connect(&self, host: &str) -> Result<Box<dyn Transport>> {
        connect_with_retry(self.connector.as_ref(), &self.connect_retry, host).await
    }

    async fn drive(
        &self,
        session: &mut Session,
        spec: &CommandSpec,
        ctx: &OpenContext,
    ) -> Result<Vec<CommandOutput>> {
        let behavior = self.behavior();
        behavior.on_open(session, ctx).await?;

        let mut outputs = Vec::with_capacity(spec.len());
        for command in spec.iter() {
            let command = behavior.prepare_command(command);
            outputs.push(session.exec(&command).await?);
        }

        behavior.on_close(session).await?;
        Ok(outputs)
    }
}

/// Open a transport to `host`, retrying failed attempts per `retry`.
pub(crate) async fn connect_with_retry(
    connector: &dyn Connector,
    retry: &Backoff,
    host: &str,
) -> Result<Box<dyn Transport>> {
    let what = format!("connect to {host}");
    match retry.retry(&what, move |_| connector.connect(host)).await {
        Ok(transport) => {
            info!("Connected to {}", host);
            Ok(transport)
        }
        Err(last) => {
            error!("Connecting to {} failed, aborting: {}", host, last);
            Err(TransportError::RetriesExhausted {
                host: host.to_string(),
                attempts: retry.attempts(),
                last: last.to_string(),
            }
            .into())
        }
    }
}

impl CommandRunner for SessionRunner {
    async fn run(&self, host: &str, spec: &CommandSpec) -> Result<RunOutput> {
        self.run_with(host, spec, &OpenContext::default()).await
    }
}
