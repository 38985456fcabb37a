//! Per-vendor command strings and output grammar.
//!
//! A [`Vocabulary`] is what the surveyor needs to talk to one family of
//! switches: which commands list VLANs, MAC addresses, PoE state and port
//! names, the regexes that pull records out of their output, and the
//! configuration syntax used to change a port.

use regex::Regex;

/// How untagged ports are written inside a VLAN block.
#[derive(Debug, Clone)]
pub enum PortGrammar {
    /// `Untagged Ports: (U1/M1)   1   2   3` style lines. The regex captures
    /// `unit`, `module` and a `ports` list of bare numbers; each number
    /// becomes `unit/module/number`.
    Stacked(Regex),

    /// Port names appear verbatim; every match of the regex is one port.
    Plain(Regex),
}

/// Configuration command dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSyntax {
    /// Foundry/Ruckus `vlan N` / `untag ethernet P` syntax.
    Foundry,

    /// IOS/EOS `switchport access vlan N` syntax.
    AccessPort,
}

impl ChangeSyntax {
    /// Commands moving `port` from VLAN `origin` to VLAN `destination`.
    ///
    /// The default VLAN `1` never needs an explicit untag or tag.
    pub fn move_port(self, port: &str, origin: &str, destination: &str) -> Vec<String> {
        match self {
            ChangeSyntax::Foundry => {
                let mut commands = vec!["config terminal".to_string()];
                if origin != "1" {
                    commands.push(format!("vlan {origin}"));
                    commands.push(format!("no untag ethernet {port}"));
                    commands.push("exit".to_string());
                }
                if destination != "1" {
                    commands.push(format!("vlan {destination}"));
                    commands.push(format!("untag ethernet {port}"));
                    commands.push("exit".to_string());
                }
                commands.push("exit".to_string());
                commands
            }
            ChangeSyntax::AccessPort => vec![
                "configure terminal".to_string(),
                format!("interface {port}"),
                format!("switchport access vlan {destination}"),
                "exit".to_string(),
                "exit".to_string(),
            ],
        }
    }

    /// Commands switching PoE on or off for `port`.
    pub fn set_power(self, port: &str, on: bool) -> Vec<String> {
        let toggle = if on { "inline power" } else { "no inline power" };
        vec![
            self.configure().to_string(),
            self.interface(port),
            toggle.to_string(),
            "exit".to_string(),
            "exit".to_string(),
        ]
    }

    /// Commands naming `port`, or clearing its name when `label` is empty.
    pub fn set_label(self, port: &str, label: &str) -> Vec<String> {
        let (set, clear) = match self {
            ChangeSyntax::Foundry => ("port-name", "no port-name"),
            ChangeSyntax::AccessPort => ("description", "no description"),
        };
        let name = if label.is_empty() {
            clear.to_string()
        } else {
            format!("{set} {label}")
        };
        vec![
            self.configure().to_string(),
            self.interface(port),
            name,
            "exit".to_string(),
            "exit".to_string(),
        ]
    }

    /// Commands saving the running configuration.
    pub fn write_memory(self) -> Vec<String> {
        vec!["write memory".to_string()]
    }

    fn configure(self) -> &'static str {
        match self {
            ChangeSyntax::Foundry => "config terminal",
            ChangeSyntax::AccessPort => "configure terminal",
        }
    }

    fn interface(self, port: &str) -> String {
        match self {
            ChangeSyntax::Foundry => format!("interface ethernet {port}"),
            ChangeSyntax::AccessPort => format!("interface {port}"),
        }
    }
}

/// Commands and parsers for one switch family.
///
/// Command templates use `{vlan}` and `{port}` placeholders.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub vlan_command: String,
    pub vlan_scoped_command: String,
    pub mac_command: String,
    pub mac_scoped_command: String,
    pub mac_port_command: Option<String>,
    pub power_command: Option<String>,
    pub power_port_command: Option<String>,
    pub label_command: Option<String>,
    pub label_port_command: Option<String>,

    /// Command whose prompt reveals the current mode without side effects.
    pub mode_probe_command: Option<String>,

    /// VLAN record; must capture `vlan` and `ports`.
    pub vlan_block: Regex,

    /// Untagged port notation within `ports`.
    pub ports: PortGrammar,

    /// Rejoin wrapped VLAN rows before matching `vlan_block`.
    pub reflow_vlans: bool,

    /// Learned MAC entry; must capture `mac` and `port`.
    pub mac_entry: Regex,

    /// PoE row; must capture `port`, `admin` and `oper`.
    pub power_entry: Option<Regex>,

    /// Port name row; must capture `port` and `label`.
    pub label_entry: Option<Regex>,

    pub changes: ChangeSyntax,
}

impl Vocabulary {
    /// VLAN listing command, optionally scoped to one VLAN.
    pub fn vlan(&self, vlan: Option<&str>) -> String {
        match vlan {
            Some(vlan) => self.vlan_scoped_command.replace("{vlan}", vlan),
            None => self.vlan_command.clone(),
        }
    }

    /// MAC table command, optionally scoped to one VLAN.
    pub fn mac(&self, vlan: Option<&str>) -> String {
        match vlan {
            Some(vlan) => self.mac_scoped_command.replace("{vlan}", vlan),
            None => self.mac_command.clone(),
        }
    }

    /// The commands refreshing one port, in the order they should run.
    pub fn single_port(&self, port: &str) -> Vec<String> {
        [
            &self.mac_port_command,
            &self.label_port_command,
            &self.power_port_command,
        ]
        .into_iter()
        .flatten()
        .map(|template| template.replace("{port}", port))
        .collect()
    }

    /// Whether the switch reports PoE state.
    pub fn has_power(&self) -> bool {
        self.power_command.is_some() && self.power_entry.is_some()
    }

    /// Whether the switch reports port names.
    pub fn has_labels(&self) -> bool {
        self.label_command.is_some() && self.label_entry.is_some()
    }
}
