//! Entering privileged mode with an enable password.

use log::{debug, info};
use secrecy::SecretString;

use super::session::Session;
use crate::channel::Mode;
use crate::error::{DriverError, Result};

/// Bring `session` into privileged mode.
///
/// `probe` is any harmless command; its closing prompt tells us the current
/// mode. Escalation is only attempted from the unprivileged prompt, and fails
/// with [`DriverError::EnableFailed`] if the prompt is still not privileged
/// afterwards.
pub async fn escalate(
    session: &mut Session,
    probe: &str,
    enable_password: Option<&SecretString>,
) -> Result<()> {
    session.exec(probe).await?;
    if session.mode() != Some(Mode::Unprivileged) {
        debug!("{} already privileged", session.host());
        return Ok(());
    }

    let password = enable_password.ok_or_else(|| DriverError::EnablePasswordRequired {
        host: session.host().to_string(),
    })?;
    session.exec_secret("enable", password).await?;

    if session.mode() != Some(Mode::Privileged) {
        info!("Bad enable password for {}", session.host());
        return Err(DriverError::EnableFailed {
            host: session.host().to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::channel::{PtyChannel, PtyConfig, compile_prompt};
    use crate::platform::Vendor;
    use crate::transport::scripted::{ScriptedShell, reply};

    fn ruckus(start: &'static str, password: &'static str) -> Session {
        let mut prompt = start;
        let shell = ScriptedShell::new(
            start,
            Box::new(move |line| {
                if line == format!("enable {password}") {
                    prompt = "SSH@sw1#";
                }
                reply(line, "", prompt)
            }),
        );
        let platform = Arc::new(Vendor::Ruckus.platform());
        let matcher = compile_prompt(&platform.prompt_template, "sw1").unwrap();
        Session::new(
            "sw1",
            PtyChannel::new(Box::new(shell), PtyConfig::default()),
            matcher,
            platform,
        )
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalates_from_unprivileged() {
        let mut session = ruckus("SSH@sw1>", "hunter2");
        escalate(&mut session, "show clock", Some(&secret("hunter2")))
            .await
            .unwrap();
        assert_eq!(session.mode(), Some(Mode::Privileged));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_password_fails() {
        let mut session = ruckus("SSH@sw1>", "hunter2");
        let err = escalate(&mut session, "show clock", Some(&secret("wrong")))
            .await
            .unwrap_err();
        assert!(err.is_escalation_failure());
        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::EnableFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_password_reported() {
        let mut session = ruckus("SSH@sw1>", "hunter2");
        let err = escalate(&mut session, "show clock", None).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::EnablePasswordRequired { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_privileged_needs_no_password() {
        let mut session = ruckus("SSH@sw1#", "hunter2");
        escalate(&mut session, "show clock", None).await.unwrap();
        assert_eq!(session.mode(), Some(Mode::Privileged));
    }
}
