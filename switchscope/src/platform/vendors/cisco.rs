//! Cisco IOS platform definition.
//!
//! ```text
//! sw-core-02>                      # unprivileged
//! sw-core-02#show vlan             # privileged, echoed command
//! sw-core-02(config-if)#           # configuration context
//! ```
//!
//! Paging is switched off with `terminal length 0` as soon as the shell
//! opens. VLAN rows wrap onto indented continuation lines, so the listing is
//! reflowed before parsing.

use super::{DOTTED_MAC, MODE_PROBE, more_banner, pattern};
use crate::platform::{ChangeSyntax, PlatformDefinition, PortGrammar, Vocabulary};

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("cisco", r"^{host}(?:\([-/\w]*\))?{mode}(?P<cmd>.*)")
        .with_pagination(more_banner())
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Bad ")
        .with_on_open_command("terminal length 0")
}

/// Survey commands and output grammar for Cisco IOS.
pub fn vocabulary() -> Vocabulary {
    Vocabulary {
        vlan_command: "show vlan".to_string(),
        vlan_scoped_command: "show vlan id {vlan}".to_string(),
        mac_command: "show mac address-table".to_string(),
        mac_scoped_command: "show mac address-table vlan {vlan}".to_string(),
        mac_port_command: Some("show mac address-table interface {port}".to_string()),
        power_command: None,
        power_port_command: None,
        label_command: None,
        label_port_command: None,
        mode_probe_command: Some(MODE_PROBE.to_string()),
        vlan_block: pattern(r"(?m)^(?P<vlan>\d+)\s+.*?\bactive\b(?P<ports>.*)$"),
        ports: PortGrammar::Plain(pattern(r"(?:Fa|Gi|Te|Twe|Fo|Hu)\d+(?:/\d+)+")),
        reflow_vlans: true,
        mac_entry: pattern(&format!(
            r"(?m)^\s*\d+\s+(?P<mac>{DOTTED_MAC})\s+DYNAMIC\s+(?P<port>\S+)"
        )),
        power_entry: None,
        label_entry: None,
        changes: ChangeSyntax::AccessPort,
    }
}
