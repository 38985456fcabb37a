//! Host directory: names, MACs, subnets and descriptions.
//!
//! The directory itself is an outside service. Everything here talks to it
//! through the [`Directory`] trait; [`DirectoryCache`] keeps one loaded copy
//! that any number of switches can read at once.

mod cache;
mod file;
pub mod glob;
mod record;
mod subnets;

pub use cache::DirectoryCache;
pub use file::StaticDirectory;
pub use glob::Glob;
pub use record::{HostRecord, normalize_key};
pub use subnets::SubnetTable;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::warn;

use crate::error::{DirectoryError, Result};

/// Host name → attributes.
pub type HostMap = IndexMap<String, HostRecord>;

/// A name → attribute directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Hosts whose name matches `pattern` (a name or a wildcard pattern).
    async fn find(&self, pattern: &str) -> Result<HostMap>;

    /// Hosts whose attributes match every `(attribute, pattern)` pair,
    /// ignoring case. The attribute `name` refers to the host name.
    async fn find_by_attributes(&self, constraints: &[(String, String)]) -> Result<HostMap>;
}

/// Filter `hosts` by name pattern.
pub(crate) fn select_by_name<'a>(
    hosts: impl Iterator<Item = (&'a String, &'a HostRecord)>,
    pattern: &str,
) -> std::result::Result<HostMap, DirectoryError> {
    let glob = Glob::new(pattern)?;
    Ok(hosts
        .filter(|(name, _)| glob.is_match(name))
        .map(|(name, record)| (name.clone(), record.clone()))
        .collect())
}

/// Filter `hosts` by attribute patterns.
pub(crate) fn select_by_attributes<'a>(
    hosts: impl Iterator<Item = (&'a String, &'a HostRecord)>,
    constraints: &[(String, String)],
) -> std::result::Result<HostMap, DirectoryError> {
    if constraints.is_empty() {
        warn!("No attributes specified");
        return Ok(HostMap::new());
    }
    let globs = constraints
        .iter()
        .map(|(attr, pattern)| Ok((normalize_key(attr), Glob::case_insensitive(pattern)?)))
        .collect::<std::result::Result<Vec<_>, regex::Error>>()?;

    Ok(hosts
        .filter(|(name, record)| {
            globs.iter().all(|(attr, glob)| {
                let value = if attr == "name" {
                    Some(name.as_str())
                } else {
                    record.get(attr)
                };
                value.is_some_and(|v| !v.is_empty() && glob.is_match(v))
            })
        })
        .map(|(name, record)| (name.clone(), record.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> HostMap {
        let mut hosts = HostMap::new();
        hosts.insert(
            "switch-b34-01".to_string(),
            HostRecord::new()
                .with("description", "Ruckus ICX7150")
                .with("subnet", "swhmgt.pcdsn"),
        );
        hosts.insert(
            "cam-01".to_string(),
            HostRecord::new().with("subnet", "cam.pcdsn"),
        );
        hosts
    }

    #[test]
    fn test_select_by_name() {
        let hosts = hosts();
        let found = select_by_name(hosts.iter(), "switch-*").unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["switch-b34-01"]);
    }

    #[test]
    fn test_select_by_attributes_ignores_case() {
        let hosts = hosts();
        let constraints = vec![
            ("Description".to_string(), "*ruckus*".to_string()),
            ("name".to_string(), "SWITCH-*".to_string()),
        ];
        let found = select_by_attributes(hosts.iter(), &constraints).unwrap();
        assert_eq!(found.len(), 1);
        assert!(select_by_attributes(hosts.iter(), &[]).unwrap().is_empty());
    }
}
