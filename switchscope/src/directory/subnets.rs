//! VLAN → subnet policy table.

use std::path::Path;

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which subnet each VLAN number is meant to carry, as kept in
/// `subnets.json` (`{"310": "cam.pcdsn", ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubnetTable {
    subnets: IndexMap<String, String>,
}

impl SubnetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a subnet table file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Assign `subnet` to `vlan`.
    pub fn with(mut self, vlan: impl Into<String>, subnet: impl Into<String>) -> Self {
        self.subnets.insert(vlan.into(), subnet.into());
        self
    }

    /// The subnet `vlan` should carry.
    pub fn subnet(&self, vlan: &str) -> Option<&str> {
        let subnet = self.subnets.get(vlan).map(String::as_str);
        if subnet.is_none() {
            warn!("VLAN {} is not associated with a specific subnet", vlan);
        }
        subnet
    }

    pub fn len(&self) -> usize {
        self.subnets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let table = SubnetTable::new().with("310", "cam.pcdsn").with("1", "swhmgt.pcdsn");
        assert_eq!(table.subnet("310"), Some("cam.pcdsn"));
        assert_eq!(table.subnet("42"), None);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subnets.json");
        std::fs::write(&path, r#"{"10": "lab.pcdsn", "20": "daq.pcdsn"}"#).unwrap();
        let table = SubnetTable::from_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.subnet("20"), Some("daq.pcdsn"));

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            SubnetTable::from_file(&path),
            Err(ConfigError::Json { .. })
        ));
    }
}
