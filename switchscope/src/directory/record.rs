//! Directory entries as typed attribute maps.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::survey::MacAddress;

/// The attributes the directory holds for one host.
///
/// Attribute sets vary from host to host, so they are kept as a map.
/// Keys are normalised to lowercase with underscores in place of spaces,
/// which is also how they are looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HostRecord {
    attributes: IndexMap<String, String>,
}

/// `Ethernet Address` → `ethernet_address`.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}

impl HostRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, normalising its key.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.attributes.insert(normalize_key(key), value.into());
    }

    /// Look an attribute up by (normalised) key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    pub fn subnet(&self) -> Option<&str> {
        self.get("subnet")
    }

    /// The host's MAC, if it has one that parses.
    pub fn ethernet_address(&self) -> Option<MacAddress> {
        self.get("ethernet_address")?.parse().ok()
    }
}

impl<'de> Deserialize<'de> for HostRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, String>::deserialize(deserializer)?;
        Ok(Self {
            attributes: raw
                .into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
        })
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HostRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k.as_ref(), v);
        }
        record
    }
}
