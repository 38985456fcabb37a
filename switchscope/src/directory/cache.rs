//! Shared, explicitly reloaded copy of the directory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{Directory, HostMap, HostRecord, select_by_attributes, select_by_name};
use crate::error::{DirectoryError, Result};
use crate::survey::MacAddress;

#[derive(Default)]
struct Loaded {
    hosts: HostMap,
    macs: HashMap<MacAddress, String>,
    loaded_at: Option<Instant>,
}

/// One loaded copy of a [`Directory`] plus a MAC → host index.
///
/// The first lookup loads everything. After that the copy is reused until
/// [`load`](Self::load) is called again or, when a TTL is set, until it is
/// older than the TTL. Lookups take a read lock, so switches refreshing in
/// parallel can share one cache.
pub struct DirectoryCache {
    source: Arc<dyn Directory>,
    ttl: Option<Duration>,
    state: RwLock<Loaded>,
}

impl DirectoryCache {
    /// Create an empty cache over `source`.
    pub fn new(source: Arc<dyn Directory>) -> Self {
        Self {
            source,
            ttl: None,
            state: RwLock::new(Loaded::default()),
        }
    }

    /// Reload automatically once the copy is older than `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Reload every host from the source. Returns the host count.
    pub async fn load(&self) -> Result<usize> {
        debug!("Loading directory information...");
        let hosts = self.source.find("*").await?;

        let mut macs = HashMap::new();
        for (name, record) in &hosts {
            match record.ethernet_address() {
                Some(mac) => {
                    macs.insert(mac, name.clone());
                }
                None => debug!("{} has no ethernet address listed", name),
            }
        }

        let count = hosts.len();
        let mut state = self.state.write().await;
        *state = Loaded {
            hosts,
            macs,
            loaded_at: Some(Instant::now()),
        };
        info!("Loaded {} directory entries", count);
        Ok(count)
    }

    /// Drop the loaded copy; the next lookup reloads.
    pub async fn invalidate(&self) {
        self.state.write().await.loaded_at = None;
    }

    /// Whether a copy is loaded and still within its TTL.
    pub async fn is_fresh(&self) -> bool {
        let state = self.state.read().await;
        match (state.loaded_at, self.ttl) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(at), Some(ttl)) => at.elapsed() < ttl,
        }
    }

    async fn ensure_loaded(&self) -> Result<()> {
        if !self.is_fresh().await {
            self.load().await?;
        }
        Ok(())
    }

    /// The record for exactly `name`.
    pub async fn host(&self, name: &str) -> Result<HostRecord> {
        self.ensure_loaded().await?;
        let state = self.state.read().await;
        state
            .hosts
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()).into())
    }

    /// The host that owns `mac`, if the directory knows it.
    pub async fn host_for_mac(&self, mac: &MacAddress) -> Result<Option<String>> {
        self.ensure_loaded().await?;
        Ok(self.state.read().await.macs.get(mac).cloned())
    }

    /// The subnet the directory assigns to `name`.
    pub async fn subnet_for(&self, name: &str) -> Result<Option<String>> {
        Ok(self.host(name).await?.subnet().map(str::to_string))
    }

    /// The free-text description of `name`, empty if it has none.
    pub async fn description(&self, name: &str) -> Result<String> {
        Ok(self
            .host(name)
            .await?
            .description()
            .unwrap_or_default()
            .to_string())
    }

    /// Hosts whose name matches `pattern`.
    pub async fn find(&self, pattern: &str) -> Result<HostMap> {
        self.ensure_loaded().await?;
        let state = self.state.read().await;
        let found = select_by_name(state.hosts.iter(), pattern)?;
        debug!("Found {} that match {}", found.len(), pattern);
        Ok(found)
    }

    /// Hosts whose attributes match every constraint.
    pub async fn find_by_attributes(&self, constraints: &[(String, String)]) -> Result<HostMap> {
        self.ensure_loaded().await?;
        let state = self.state.read().await;
        Ok(select_by_attributes(state.hosts.iter(), constraints)?)
    }
}
