//! One VLAN's ports and the devices learned on them.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::directory::{DirectoryCache, SubnetTable};
use crate::error::{DirectoryError, Error, Result};
use crate::survey::MacAddress;

/// A device the directory knows, found on a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub ethernet_address: MacAddress,
    pub port: String,
    pub vlan: String,
}

/// A MAC the directory does not know, found on a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownEntry {
    pub port: String,
    pub vlan: String,
}

/// One VLAN on a switch.
///
/// Only the owning [`Switch`](super::Switch) changes a `Vlan`, and only with
/// ports that are in [`ports`](Self::ports), so every device entry points at
/// one of this VLAN's ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vlan {
    id: String,
    ports: Vec<String>,
    devices: IndexMap<String, DeviceEntry>,
    unknown: IndexMap<MacAddress, UnknownEntry>,
}

impl Vlan {
    pub(crate) fn new(id: impl Into<String>, ports: Vec<String>) -> Self {
        Self {
            id: id.into(),
            ports,
            devices: IndexMap::new(),
            unknown: IndexMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn has_port(&self, port: &str) -> bool {
        self.ports.iter().any(|p| p == port)
    }

    /// Known devices by name.
    pub fn devices(&self) -> &IndexMap<String, DeviceEntry> {
        &self.devices
    }

    /// Known device names, sorted.
    pub fn device_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// MACs the directory does not know.
    pub fn unknown_devices(&self) -> &IndexMap<MacAddress, UnknownEntry> {
        &self.unknown
    }

    /// The subnet this VLAN is meant to carry.
    pub fn subnet<'a>(&self, subnets: &'a SubnetTable) -> Option<&'a str> {
        subnets.subnet(&self.id)
    }

    /// Record `mac` on `port`, under `name` when the directory knows it.
    pub(crate) fn record(&mut self, port: &str, mac: MacAddress, name: Option<String>) {
        if !self.has_port(port) {
            debug!("{} is not an untagged port of VLAN {}, ignoring {}", port, self.id, mac);
            return;
        }
        let vlan = self.id.clone();
        match name {
            Some(name) => {
                self.devices.insert(
                    name,
                    DeviceEntry {
                        ethernet_address: mac,
                        port: port.to_string(),
                        vlan,
                    },
                );
            }
            None => {
                debug!("Unable to find directory entry for {} on port {}", mac, port);
                self.unknown.insert(
                    mac,
                    UnknownEntry {
                        port: port.to_string(),
                        vlan,
                    },
                );
            }
        }
    }

    /// Drop whatever was recorded on `port`.
    pub(crate) fn forget_port(&mut self, port: &str) {
        self.devices.retain(|_, d| d.port != port);
        self.unknown.retain(|_, u| u.port != port);
    }

    pub(crate) fn clear_devices(&mut self) {
        self.devices.clear();
        self.unknown.clear();
    }

    /// Devices on this VLAN whose directory subnet differs from the VLAN's.
    pub async fn survey(&self, directory: &DirectoryCache, subnets: &SubnetTable) -> Result<Vec<String>> {
        let subnet = self.subnet(subnets);
        let mut misplaced = Vec::new();
        for name in self.device_names() {
            let expected = match directory.subnet_for(name).await {
                Ok(subnet) => subnet,
                Err(Error::Directory(DirectoryError::NotFound(_))) => None,
                Err(e) => return Err(e),
            };
            if expected.as_deref() != subnet {
                warn!(
                    "{} is not on the correct subnet, it should be on {}",
                    name,
                    expected.as_deref().unwrap_or("no subnet")
                );
                misplaced.push(name.to_string());
            } else {
                debug!("{} on the correct subnet", name);
            }
        }
        Ok(misplaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(s: &str) -> MacAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_record_and_forget_port() {
        let mut vlan = Vlan::new("10", vec!["1/1/3".to_string(), "1/1/4".to_string()]);
        vlan.record("1/1/3", mac("0040.d012.3456"), None);
        vlan.record("1/1/3", mac("0040.d012.3457"), Some("cam-01".to_string()));
        vlan.record("1/1/4", mac("0040.d012.3458"), Some("cam-02".to_string()));
        assert_eq!(vlan.unknown_devices().len(), 1);
        assert_eq!(vlan.devices()["cam-01"].port, "1/1/3");

        vlan.forget_port("1/1/3");
        assert!(vlan.unknown_devices().is_empty());
        assert_eq!(vlan.device_names(), vec!["cam-02"]);
    }

    #[test]
    fn test_ignores_foreign_ports() {
        let mut vlan = Vlan::new("10", vec!["1/1/3".to_string()]);
        vlan.record("1/1/9", mac("0040.d012.3456"), Some("cam-09".to_string()));
        assert!(vlan.devices().is_empty());
    }

    #[test]
    fn test_device_names_sorted() {
        let mut vlan = Vlan::new("10", vec!["1/1/3".to_string(), "1/1/4".to_string()]);
        vlan.record("1/1/4", mac("0040.d012.0004"), Some("cam-b".to_string()));
        vlan.record("1/1/3", mac("0040.d012.0003"), Some("cam-a".to_string()));
        assert_eq!(vlan.device_names(), vec!["cam-a", "cam-b"]);
    }
}
