//! JSON-file backed directory.

use std::path::Path;

use async_trait::async_trait;
use log::debug;

use super::{Directory, HostMap, HostRecord, select_by_attributes, select_by_name};
use crate::error::{DirectoryError, Result};

/// A directory held in memory, usually read from a JSON file of the form
/// `{"host": {"attribute": "value", ...}, ...}`.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    hosts: HostMap,
}

impl StaticDirectory {
    /// Create a directory from host records.
    pub fn new(hosts: HostMap) -> Self {
        Self { hosts }
    }

    /// Read a JSON host file.
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, DirectoryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let hosts: HostMap = serde_json::from_str(&text).map_err(|source| DirectoryError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} hosts from {}", hosts.len(), path.display());
        Ok(Self { hosts })
    }

    /// Add or replace one host.
    pub fn insert(&mut self, name: impl Into<String>, record: HostRecord) {
        self.hosts.insert(name.into(), record);
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn find(&self, pattern: &str) -> Result<HostMap> {
        Ok(select_by_name(self.hosts.iter(), pattern)?)
    }

    async fn find_by_attributes(&self, constraints: &[(String, String)]) -> Result<HostMap> {
        Ok(select_by_attributes(self.hosts.iter(), constraints)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"cam-01": {{"Ethernet Address": "00:40:d0:12:34:56", "subnet": "cam.pcdsn"}},
                "cam-02": {{"subnet": "cam.pcdsn"}}}}"#
        )
        .unwrap();

        let directory = StaticDirectory::from_file(file.path()).unwrap();
        assert_eq!(directory.len(), 2);

        let found = directory.find("cam-0[1]").await.unwrap();
        assert_eq!(found["cam-01"].subnet(), Some("cam.pcdsn"));
        assert!(found["cam-01"].ethernet_address().is_some());
    }

    #[test]
    fn test_missing_file() {
        let err = StaticDirectory::from_file("/nonexistent/hosts.json").unwrap_err();
        assert!(matches!(err, DirectoryError::Io { .. }));
    }
}
