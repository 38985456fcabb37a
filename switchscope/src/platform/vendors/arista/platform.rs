//! Arista EOS platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! core1>                            # unprivileged
//! core1.ARISTA#                     # privileged, domain suffix shown
//! core1#show vlan | no-more         # echoed command
//! core1(config-if-Et3)#             # configuration context
//! ```
//!
//! Instead of switching paging off for the session, every `show` command is
//! sent with `| no-more` appended.

use std::sync::Arc;

use async_trait::async_trait;

use crate::driver::{OpenContext, Session};
use crate::error::Result;
use crate::platform::vendors::{DOTTED_MAC, MODE_PROBE, more_banner, pattern};
use crate::platform::{
    ChangeSyntax, DefaultBehavior, PlatformDefinition, PortGrammar, VendorBehavior, Vocabulary,
};

/// Create the Arista EOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(
        "arista",
        r"^{host}(?:\.ARISTA)?(?:\([-/\w]*\))?{mode}(?P<cmd>.*)",
    )
        .with_pagination(more_banner())
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Error")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unavailable command")
        .with_behavior(Arc::new(AristaBehavior))
}

/// Survey commands and output grammar for Arista EOS.
pub fn vocabulary() -> Vocabulary {
    Vocabulary {
        vlan_command: "show vlan".to_string(),
        vlan_scoped_command: "show vlan {vlan}".to_string(),
        mac_command: "show mac address-table".to_string(),
        mac_scoped_command: "show mac address-table vlan {vlan}".to_string(),
        mac_port_command: Some("show mac address-table interface {port}".to_string()),
        power_command: None,
        power_port_command: None,
        label_command: None,
        label_port_command: None,
        mode_probe_command: Some(MODE_PROBE.to_string()),
        vlan_block: pattern(r"(?m)^(?P<vlan>\d+)\s+.*?\bactive\b(?P<ports>.*)$"),
        ports: PortGrammar::Plain(pattern(r"Et\d+(?:/\d+)*")),
        reflow_vlans: true,
        mac_entry: pattern(&format!(
            r"(?m)^\s*\d+\s+(?P<mac>{DOTTED_MAC})\s+DYNAMIC\s+(?P<port>\S+)"
        )),
        power_entry: None,
        label_entry: None,
        changes: ChangeSyntax::AccessPort,
    }
}

/// Arista EOS-specific behavior.
pub struct AristaBehavior;

#[async_trait]
impl VendorBehavior for AristaBehavior {
    async fn on_open(&self, session: &mut Session, ctx: &OpenContext) -> Result<()> {
        DefaultBehavior.on_open(session, ctx).await
    }

    async fn on_close(&self, session: &mut Session) -> Result<()> {
        DefaultBehavior.on_close(session).await
    }

    fn prepare_command(&self, command: &str) -> String {
        if command.starts_with("show ") {
            format!("{command} | no-more")
        } else {
            command.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arista_platform() {
        let platform = platform();
        assert_eq!(platform.name, "arista");
        assert!(platform.on_open_commands.is_empty());
        assert!(
            platform
                .failed_when_contains
                .contains(&"% Invalid input".to_string())
        );
    }

    #[test]
    fn test_no_more_appended() {
        assert_eq!(
            AristaBehavior.prepare_command("show vlan"),
            "show vlan | no-more"
        );
        assert_eq!(
            AristaBehavior.prepare_command("switchport access vlan 20"),
            "switchport access vlan 20"
        );
    }

    #[test]
    fn test_config_prompt() {
        use crate::channel::{PromptMatcher, compile_prompt};

        let prompt = compile_prompt(&platform().prompt_template, "core1").unwrap();
        let line = prompt.parse("core1(config-if-Et3)#switchport access vlan 20").unwrap();
        assert_eq!(line.command, "switchport access vlan 20");
        assert!(prompt.is_match("core1.ARISTA(config)#"));
    }

    #[test]
    fn test_vlan_row() {
        let vocab = vocabulary();
        let caps = vocab
            .vlan_block
            .captures("10    office                           active    Et1, Et2, Et3")
            .unwrap();
        assert_eq!(&caps["vlan"], "10");
        assert_eq!(caps["ports"].trim(), "Et1, Et2, Et3");
    }
}
