//! Turning vendor listings into tables.
//!
//! Every parser takes the raw text a command printed and the vendor's
//! [`Vocabulary`]; none of them talk to a device.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::mac::MacAddress;
use crate::platform::{PortGrammar, Vocabulary};

/// VLAN id → untagged ports, in listing order.
pub type VlanTable = IndexMap<String, Vec<String>>;

/// Learned MAC → port.
pub type MacTable = IndexMap<MacAddress, String>;

/// Port → PoE state.
pub type PowerTable = IndexMap<String, PowerState>;

/// Port → configured name.
pub type LabelTable = IndexMap<String, String>;

/// One PoE state column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoeStatus {
    On,
    Off,
    /// Nothing powered is attached.
    #[serde(rename = "Non-PD")]
    NonPd,
}

impl PoeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PoeStatus::On => "On",
            PoeStatus::Off => "Off",
            PoeStatus::NonPd => "Non-PD",
        }
    }
}

impl fmt::Display for PoeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "On" => Ok(PoeStatus::On),
            "Off" => Ok(PoeStatus::Off),
            "Non-PD" => Ok(PoeStatus::NonPd),
            other => Err(other.to_string()),
        }
    }
}

/// Administrative and operational PoE state of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerState {
    pub admin: PoeStatus,
    pub oper: PoeStatus,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.admin, self.oper)
    }
}

/// What a single-port refresh learned about one port.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortRefresh {
    /// PoE state, when the switch reports one for the port.
    pub power: Option<PowerState>,

    /// Port name; empty when unnamed or unsupported.
    pub label: String,

    /// MAC learned on the port, if any.
    pub mac: Option<MacAddress>,
}

impl PortRefresh {
    /// Operational PoE state, `Non-PD` when nothing was reported.
    pub fn oper_power(&self) -> PoeStatus {
        self.power.map_or(PoeStatus::NonPd, |p| p.oper)
    }
}

/// Rejoin VLAN rows that the terminal wrapped.
///
/// A line starting with a digit begins a new VLAN row; any other non-empty
/// line continues the current row and is appended after `", "`. Text before
/// the first row is dropped.
pub fn reflow(raw: &str) -> String {
    let mut rows: Vec<String> = Vec::new();
    for line in raw.split('\n') {
        let trimmed = line.trim();
        if line.starts_with(|c: char| c.is_ascii_digit()) {
            rows.push(trimmed.to_string());
        } else if let Some(row) = rows.last_mut()
            && !trimmed.is_empty()
        {
            row.push_str(", ");
            row.push_str(trimmed);
        }
    }
    rows.join("\n")
}

/// Parse a VLAN listing into VLAN → untagged ports.
pub fn vlans(vocab: &Vocabulary, raw: &str) -> VlanTable {
    let reflowed;
    let text = if vocab.reflow_vlans {
        reflowed = reflow(raw);
        reflowed.as_str()
    } else {
        raw
    };

    let mut table = VlanTable::new();
    for block in vocab.vlan_block.captures_iter(text) {
        let (Some(vlan), Some(ports)) = (block.name("vlan"), block.name("ports")) else {
            continue;
        };
        let entry = table.entry(vlan.as_str().to_string()).or_default();
        entry.extend(expand_ports(&vocab.ports, ports.as_str()));
    }
    trace!("parsed {} VLANs", table.len());
    table
}

/// Expand the port notation inside one VLAN block.
fn expand_ports(grammar: &PortGrammar, text: &str) -> Vec<String> {
    match grammar {
        PortGrammar::Plain(re) => re.find_iter(text).map(|m| m.as_str().to_string()).collect(),
        PortGrammar::Stacked(re) => {
            let mut ports = Vec::new();
            for line in re.captures_iter(text) {
                let (Some(unit), Some(module), Some(list)) =
                    (line.name("unit"), line.name("module"), line.name("ports"))
                else {
                    continue;
                };
                ports.extend(
                    list.as_str()
                        .split_whitespace()
                        .filter(|p| p.bytes().all(|b| b.is_ascii_digit()))
                        .map(|p| format!("{}/{}/{}", unit.as_str(), module.as_str(), p)),
                );
            }
            ports
        }
    }
}

/// Parse a MAC table, keeping dynamically learned entries only.
pub fn macs(vocab: &Vocabulary, raw: &str) -> MacTable {
    let mut table = MacTable::new();
    for entry in vocab.mac_entry.captures_iter(raw) {
        let (Some(mac), Some(port)) = (entry.name("mac"), entry.name("port")) else {
            continue;
        };
        match mac.as_str().parse::<MacAddress>() {
            Ok(mac) => {
                table.insert(mac, port.as_str().to_string());
            }
            Err(e) => debug!("skipping MAC entry: {}", e),
        }
    }
    table
}

/// Parse a PoE listing. Empty when the vendor has no PoE grammar.
pub fn power(vocab: &Vocabulary, raw: &str) -> PowerTable {
    let Some(re) = &vocab.power_entry else {
        return PowerTable::new();
    };
    let mut table = PowerTable::new();
    for row in re.captures_iter(raw) {
        let (Some(port), Some(admin), Some(oper)) = (row.name("port"), row.name("admin"), row.name("oper"))
        else {
            continue;
        };
        if let (Ok(admin), Ok(oper)) = (admin.as_str().parse(), oper.as_str().parse()) {
            table.insert(port.as_str().to_string(), PowerState { admin, oper });
        }
    }
    table
}

/// Parse a port name listing. Empty when the vendor has no label grammar.
pub fn labels(vocab: &Vocabulary, raw: &str) -> LabelTable {
    let Some(re) = &vocab.label_entry else {
        return LabelTable::new();
    };
    re.captures_iter(raw)
        .filter_map(|row| Some((row.name("port")?.as_str().to_string(), row.name("label")?.as_str().to_string())))
        .collect()
}

/// Pick out one port's MAC, name and PoE state from the concatenated output
/// of [`Vocabulary::single_port`].
pub fn port_refresh(vocab: &Vocabulary, port: &str, raw: &str) -> PortRefresh {
    let mac = macs(vocab, raw)
        .into_iter()
        .find(|(_, p)| p == port)
        .map(|(mac, _)| mac);
    let label = labels(vocab, raw).shift_remove(port).unwrap_or_default();
    let power = power(vocab, raw).shift_remove(port);
    PortRefresh { power, label, mac }
}
