//! Brocade and Ruckus (Foundry-derived FastIron) platform definitions.
//!
//! ```text
//! SSH@sw-b34-01>                          # unprivileged
//! SSH@sw-b34-01#show vlan                 # privileged, echoed command
//! SSH@sw-b34-01(config-vlan-10)#          # configuration context
//! ```
//!
//! Both families page with a `--More--` banner that is erased with
//! backspaces once continued, and neither reliably closes the shell on the
//! first `exit`.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::{DOTTED_MAC, MODE_PROBE, more_banner, pattern};
use crate::driver::{OpenContext, Session, escalate};
use crate::error::Result;
use crate::platform::{ChangeSyntax, PlatformDefinition, PortGrammar, VendorBehavior, Vocabulary};

fn base(name: &str, prompt_template: &str) -> PlatformDefinition {
    PlatformDefinition::new(name, prompt_template)
        .with_pagination(more_banner())
        .with_failure_pattern("Invalid input")
        .with_failure_pattern("Incomplete command")
        .with_failure_pattern("Ambiguous input")
        .with_failure_pattern("Error -")
}

/// Create the Brocade platform definition.
pub fn brocade_platform() -> PlatformDefinition {
    base("brocade", r"^SSH@{host}(?:\([\w-]*\))?{mode}(?P<cmd>.*)")
        .with_terminator("\r\n")
        .with_behavior(Arc::new(FoundryBehavior { escalate: false }))
}

/// Create the Ruckus platform definition.
pub fn ruckus_platform() -> PlatformDefinition {
    base("ruckus", r"^SSH@{host}(?:\([-/\w]*\))?{mode}(?P<cmd>.*)")
        .with_behavior(Arc::new(FoundryBehavior { escalate: true }))
}

fn vocabulary(power_and_labels: bool) -> Vocabulary {
    let optional = |command: &str| power_and_labels.then(|| command.to_string());
    Vocabulary {
        vlan_command: "show vlan".to_string(),
        vlan_scoped_command: "show vlan {vlan}".to_string(),
        mac_command: "show mac-address".to_string(),
        mac_scoped_command: "show mac-address vlan {vlan}".to_string(),
        mac_port_command: Some("show mac-address ethernet {port}".to_string()),
        power_command: optional("show inline power"),
        power_port_command: optional("show inline power {port}"),
        label_command: optional("show interfaces brief"),
        label_port_command: optional("show interfaces brief ethernet {port}"),
        mode_probe_command: power_and_labels.then(|| MODE_PROBE.to_string()),
        vlan_block: pattern(
            r"(?s)PORT-VLAN (?P<vlan>\d+), Name [^,]*,.+?\r\n(?P<ports>.+?)Monitoring",
        ),
        ports: PortGrammar::Stacked(pattern(
            r"Untagged Ports: \(U(?P<unit>\d+)/M(?P<module>\d+)\)(?P<ports>[^\r\n]+)",
        )),
        reflow_vlans: false,
        mac_entry: pattern(&format!(
            r"(?P<mac>{DOTTED_MAC})\s+(?P<port>\S+)\s+Dynamic"
        )),
        power_entry: power_and_labels.then(|| {
            pattern(
                r"(?m)^[ \t]*(?P<port>\d\S*)[ \t]+(?P<admin>On|Off)[ \t]+(?P<oper>On|Off|Non-PD)\b",
            )
        }),
        // Port Link State Dupl Speed Trunk Tag Pvid Pri MAC Name
        label_entry: power_and_labels.then(|| {
            pattern(r"(?m)^[ \t]*(?P<port>\d\S*)(?:[ \t]+\S+){9}[ \t]+(?P<label>\S+)")
        }),
        changes: ChangeSyntax::Foundry,
    }
}

/// Brocade surveys VLANs and MAC addresses only.
pub fn brocade_vocabulary() -> Vocabulary {
    vocabulary(false)
}

/// Ruckus adds PoE state, port names and a mode probe.
pub fn ruckus_vocabulary() -> Vocabulary {
    vocabulary(true)
}

/// Foundry-family behavior: optional enable on open, double `exit` on close.
pub struct FoundryBehavior {
    /// Probe the mode and send `enable` when the caller asks for privilege.
    pub escalate: bool,
}

#[async_trait]
impl VendorBehavior for FoundryBehavior {
    async fn on_open(&self, session: &mut Session, ctx: &OpenContext) -> Result<()> {
        if self.escalate && ctx.privileged {
            escalate(session, MODE_PROBE, ctx.enable_password.as_ref()).await?;
        }
        Ok(())
    }

    async fn on_close(&self, session: &mut Session) -> Result<()> {
        session.send_line("exit").await?;
        let grace = session.platform().logout_grace;
        if !session.wait_for_exit(grace).await? {
            debug!("{} still open after exit, sending another", session.host());
            if let Err(e) = session.send_line("exit").await {
                debug!("{} second exit not sent: {}", session.host(), e);
            }
        }
        Ok(())
    }
}
