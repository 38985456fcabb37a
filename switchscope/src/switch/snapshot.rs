//! Saved VLAN layouts and differences against them.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::vlan::DeviceEntry;
use crate::error::SnapshotError;

/// Devices recorded for one VLAN.
///
/// Older snapshots stored only the sorted device names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotDevices {
    Detailed(IndexMap<String, DeviceEntry>),
    Names(Vec<String>),
}

impl SnapshotDevices {
    /// Device names in stored order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            SnapshotDevices::Detailed(devices) => devices.keys().map(String::as_str).collect(),
            SnapshotDevices::Names(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            SnapshotDevices::Detailed(devices) => devices.contains_key(name),
            SnapshotDevices::Names(names) => names.iter().any(|n| n == name),
        }
    }
}

impl Default for SnapshotDevices {
    fn default() -> Self {
        SnapshotDevices::Detailed(IndexMap::new())
    }
}

/// One VLAN in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanSnapshot {
    pub ports: Vec<String>,
    #[serde(default)]
    pub devices: SnapshotDevices,
}

/// A switch's VLAN layout at one point in time, keyed by VLAN id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationSnapshot {
    pub vlans: IndexMap<String, VlanSnapshot>,
}

impl ConfigurationSnapshot {
    /// Read a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the snapshot as JSON, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn vlan(&self, id: &str) -> Option<&VlanSnapshot> {
        self.vlans.get(id)
    }
}

/// Where a port was and where it is now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMove {
    pub past: String,
    pub current: Option<String>,
}

/// Where a device was and where it is now (`None` once it is gone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMove {
    pub past: String,
    pub current: Option<String>,
}

/// Everything that moved since a snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub devices: IndexMap<String, DeviceMove>,
    pub ports: IndexMap<String, PortMove>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sw1.json");

        let mut snapshot = ConfigurationSnapshot::default();
        snapshot.vlans.insert(
            "10".to_string(),
            VlanSnapshot {
                ports: vec!["1/1/3".to_string()],
                devices: SnapshotDevices::Detailed(IndexMap::from([(
                    "cam-01".to_string(),
                    DeviceEntry {
                        ethernet_address: "00:40:d0:12:34:56".parse().unwrap(),
                        port: "1/1/3".to_string(),
                        vlan: "10".to_string(),
                    },
                )])),
            },
        );
        snapshot.save(&path).unwrap();

        assert_eq!(ConfigurationSnapshot::load(&path).unwrap(), snapshot);
    }

    #[test]
    fn test_reads_name_list_devices() {
        let snapshot: ConfigurationSnapshot = serde_json::from_str(
            r#"{"1": {"ports": ["1/1/1"], "devices": []},
                "10": {"ports": ["1/1/3", "1/1/4"], "devices": ["cam-01", "cam-02"]}}"#,
        )
        .unwrap();
        let vlan = snapshot.vlan("10").unwrap();
        assert_eq!(vlan.devices.names(), vec!["cam-01", "cam-02"]);
        assert!(vlan.devices.contains("cam-02"));
        assert!(snapshot.vlan("1").unwrap().devices.names().is_empty());
    }

    #[test]
    fn test_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ConfigurationSnapshot::load(&path),
            Err(SnapshotError::Json { .. })
        ));
        assert!(matches!(
            ConfigurationSnapshot::load(dir.path().join("missing.json")),
            Err(SnapshotError::Io { .. })
        ));
    }
}
