//! Platform definitions for multi-vendor support.
//!
//! This module defines vendor-specific configurations including prompt
//! templates, line terminators, logout handling and command vocabulary.

mod definition;
mod vendor;
pub mod vendors;
mod vocabulary;

pub use definition::PlatformDefinition;
pub use vendor::Vendor;
pub use vocabulary::{ChangeSyntax, PortGrammar, Vocabulary};

use async_trait::async_trait;
use log::debug;

use crate::driver::{OpenContext, Session, escalate};
use crate::error::Result;

/// Trait for vendor-specific behavior.
#[async_trait]
pub trait VendorBehavior: Send + Sync {
    /// Called once the shell is open, before any user command.
    async fn on_open(&self, session: &mut Session, ctx: &OpenContext) -> Result<()>;

    /// Called after the last user command to log out.
    async fn on_close(&self, session: &mut Session) -> Result<()>;

    /// Rewrite a user command before it is sent.
    fn prepare_command(&self, command: &str) -> String {
        command.to_string()
    }
}

/// Default vendor behavior: run the platform's on_open commands, enter
/// privileged mode when the caller asks for it, then log out with a single
/// `exit`.
pub struct DefaultBehavior;

#[async_trait]
impl VendorBehavior for DefaultBehavior {
    async fn on_open(&self, session: &mut Session, ctx: &OpenContext) -> Result<()> {
        run_on_open_commands(session).await?;
        if ctx.privileged {
            escalate(session, vendors::MODE_PROBE, ctx.enable_password.as_ref()).await?;
        }
        Ok(())
    }

    async fn on_close(&self, session: &mut Session) -> Result<()> {
        session.send_line("exit").await?;
        let grace = session.platform().logout_grace;
        if !session.wait_for_exit(grace).await? {
            debug!("{} did not acknowledge exit", session.host());
        }
        Ok(())
    }
}

pub(crate) async fn run_on_open_commands(session: &mut Session) -> Result<()> {
    let commands = session.platform().on_open_commands.clone();
    for command in &commands {
        session.exec(command).await?;
    }
    Ok(())
}
