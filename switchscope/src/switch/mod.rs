//! The believed state of one switch, and the operations that change it.
//!
//! A [`Switch`] starts [`Uninitialized`](SwitchState::Uninitialized).
//! [`update`](Switch::update) rebuilds its VLANs from scratch and makes it
//! [`Loaded`](SwitchState::Loaded). A change made without verification
//! leaves it [`Stale`](SwitchState::Stale) until the next `update`.
//!
//! Change operations report refusals and unconfirmed results as
//! [`MoveOutcome`] / [`ChangeOutcome`] values rather than errors; only
//! failures to read the switch at all surface as `Err`.

mod builder;
mod outcome;
mod snapshot;
mod vlan;

pub use builder::SwitchBuilder;
pub use outcome::{ApplyReport, AutoConfigureReport, ChangeFailure, ChangeOutcome, MoveOutcome};
pub use snapshot::{
    ConfigurationSnapshot, DeviceMove, DiffResult, PortMove, SnapshotDevices, VlanSnapshot,
};
pub use vlan::{DeviceEntry, UnknownEntry, Vlan};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use secrecy::SecretString;
use serde::Serialize;
use tokio::time::Instant;

use crate::directory::{DirectoryCache, SubnetTable};
use crate::error::{DirectoryError, Error, Result, SnapshotError, SurveyError};
use crate::platform::Vendor;
use crate::survey::{LabelTable, MacAddress, MacTable, PortRefresh, PowerTable, Surveyor, VlanTable};

/// Where the model stands relative to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwitchState {
    /// Never surveyed.
    Uninitialized,

    /// Matches the last full survey.
    Loaded,

    /// Changed since the last full survey.
    Stale,
}

/// How long to let a port settle before re-reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTimes {
    /// After a port name change.
    pub port: Duration,

    /// After switching PoE off.
    pub power_off: Duration,

    /// After switching PoE on.
    pub power_on: Duration,
}

impl Default for SettleTimes {
    fn default() -> Self {
        Self {
            port: Duration::from_millis(500),
            power_off: Duration::from_secs(15),
            power_on: Duration::from_secs(20),
        }
    }
}

impl SettleTimes {
    /// No settling at all (simulated switches).
    pub const fn none() -> Self {
        Self {
            port: Duration::ZERO,
            power_off: Duration::ZERO,
            power_on: Duration::ZERO,
        }
    }
}

/// Destination of a device move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    Vlan(String),
    Subnet(String),
}

/// A device whose name contains a search string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceMatch {
    pub name: String,
    pub vlan: String,
    pub port: String,
}

/// One switch: its VLANs, the devices on them, PoE state and port names.
pub struct Switch {
    name: String,
    surveyor: Surveyor,
    directory: Arc<DirectoryCache>,
    subnets: Arc<SubnetTable>,
    enable_password: Option<SecretString>,
    settle: SettleTimes,
    vlans: Vec<Vlan>,
    port_index: IndexMap<String, String>,
    power: PowerTable,
    labels: LabelTable,
    state: SwitchState,
    refreshed_at: Option<Instant>,
}

impl Switch {
    pub(crate) fn new(
        name: String,
        surveyor: Surveyor,
        directory: Arc<DirectoryCache>,
        subnets: Arc<SubnetTable>,
        enable_password: Option<SecretString>,
        settle: SettleTimes,
    ) -> Self {
        Self {
            name,
            surveyor,
            directory,
            subnets,
            enable_password,
            settle,
            vlans: Vec::new(),
            port_index: IndexMap::new(),
            power: PowerTable::new(),
            labels: LabelTable::new(),
            state: SwitchState::Uninitialized,
            refreshed_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vendor(&self) -> Vendor {
        self.surveyor.vendor()
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn surveyor(&self) -> &Surveyor {
        &self.surveyor
    }

    pub fn directory(&self) -> &DirectoryCache {
        &self.directory
    }

    /// VLANs in the order the switch listed them.
    pub fn vlans(&self) -> &[Vlan] {
        &self.vlans
    }

    pub fn vlan(&self, id: &str) -> Option<&Vlan> {
        self.vlans.iter().find(|v| v.id() == id)
    }

    fn vlan_mut(&mut self, id: &str) -> Option<&mut Vlan> {
        self.vlans.iter_mut().find(|v| v.id() == id)
    }

    /// Supply (or replace) the enable password after a failed escalation.
    pub fn set_enable_password(&mut self, password: SecretString) {
        self.enable_password = Some(password);
    }

    pub fn has_enable_password(&self) -> bool {
        self.enable_password.is_some()
    }

    /// True when a change would need an enable password that we lack.
    pub async fn needs_enable_password(&self) -> Result<bool> {
        if self.enable_password.is_some() {
            return Ok(false);
        }
        self.surveyor.mode_probe(&self.name).await
    }

    /// True when the model was never loaded, has changed since, or is older
    /// than `max_age`.
    pub fn refresh_due(&self, max_age: Duration) -> bool {
        match (self.state, self.refreshed_at) {
            (SwitchState::Loaded, Some(at)) => at.elapsed() >= max_age,
            _ => true,
        }
    }

    // ---- refresh -----------------------------------------------------------

    /// Re-read VLANs, learned MACs, PoE state and port names.
    ///
    /// The VLAN and MAC tables must both be read before anything is
    /// replaced; if either fails the previous state is kept (and marked
    /// stale if it was loaded). PoE and port name failures only empty those
    /// tables.
    pub async fn update(&mut self) -> Result<()> {
        let tables = async {
            info!("Loading port locations from {}", self.name);
            let vlans = self.surveyor.vlan_table(&self.name, None).await?;
            info!("Requesting mac addresses from {}", self.name);
            let macs = self.surveyor.mac_table(&self.name, None).await?;
            Ok::<_, Error>((vlans, macs))
        }
        .await;

        let (vlans, macs) = match tables {
            Ok(tables) => tables,
            Err(e) => {
                warn!("Unable to refresh {}: {}", self.name, e);
                self.mark_stale();
                return Err(e);
            }
        };

        let power = self.surveyor.power_table(&self.name).await.unwrap_or_else(|e| {
            warn!("Unable to read PoE state from {}: {}", self.name, e);
            PowerTable::new()
        });
        let labels = self.surveyor.label_table(&self.name).await.unwrap_or_else(|e| {
            warn!("Unable to read port names from {}: {}", self.name, e);
            LabelTable::new()
        });

        self.replace_vlans(vlans);
        self.attach_macs(macs).await;
        self.power = power;
        self.labels = labels;
        self.state = SwitchState::Loaded;
        self.refreshed_at = Some(Instant::now());
        info!("Switch information updated");
        Ok(())
    }

    /// Re-read the VLAN table only. Device maps are emptied.
    pub async fn load_ports(&mut self) -> Result<()> {
        info!("Loading port locations from {}", self.name);
        let vlans = self.surveyor.vlan_table(&self.name, None).await?;
        self.replace_vlans(vlans);
        Ok(())
    }

    /// Re-read the MAC table and rebuild every VLAN's device maps.
    pub async fn find_connections(&mut self) -> Result<()> {
        info!("Requesting mac addresses from {}", self.name);
        let macs = self.surveyor.mac_table(&self.name, None).await?;
        self.attach_macs(macs).await;
        Ok(())
    }

    /// Re-read PoE state.
    pub async fn load_power(&mut self) -> Result<()> {
        info!("Loading Power over Ethernet information");
        self.power = self.surveyor.power_table(&self.name).await?;
        Ok(())
    }

    /// Re-read port names.
    pub async fn load_labels(&mut self) -> Result<()> {
        info!("Loading port-name information");
        self.labels = self.surveyor.label_table(&self.name).await?;
        Ok(())
    }

    fn replace_vlans(&mut self, table: VlanTable) {
        self.port_index.clear();
        self.vlans = table
            .into_iter()
            .map(|(id, ports)| {
                debug!("Found VLAN {} on switch", id);
                for port in &ports {
                    self.port_index.insert(port.clone(), id.clone());
                }
                Vlan::new(id, ports)
            })
            .collect();
    }

    async fn attach_macs(&mut self, macs: MacTable) {
        for vlan in &mut self.vlans {
            vlan.clear_devices();
        }
        for (mac, port) in macs {
            let Some(vlan_id) = self.port_index.get(&port).cloned() else {
                debug!("{} is a tagged port, ignoring mac address {}", port, mac);
                continue;
            };
            let name = self.lookup_mac(&mac).await;
            if let Some(vlan) = self.vlan_mut(&vlan_id) {
                vlan.record(&port, mac, name);
            }
        }
        debug!("Mac address processing complete");
    }

    /// Directory name for `mac`. Lookup failures count as unknown.
    async fn lookup_mac(&self, mac: &MacAddress) -> Option<String> {
        self.directory.host_for_mac(mac).await.unwrap_or_else(|e| {
            warn!("Directory lookup for {} failed: {}", mac, e);
            None
        })
    }

    /// Re-read one port after the usual settle delay.
    pub async fn refresh_port(&mut self, port: &str) -> Result<PortRefresh> {
        self.refresh_port_after(port, self.settle.port).await
    }

    /// Re-read one port's MAC, name and PoE state after `delay`.
    ///
    /// The port's VLAN is assumed unchanged; whatever device was recorded on
    /// the port is replaced by what the switch reports now.
    pub async fn refresh_port_after(&mut self, port: &str, delay: Duration) -> Result<PortRefresh> {
        if !delay.is_zero() {
            info!("Delaying {:?} for switch to settle", delay);
            tokio::time::sleep(delay).await;
        }
        info!("Updating switch information for port {}", port);
        let refresh = self.surveyor.single_port_refresh(&self.name, port).await?;

        if self.surveyor.vocabulary().has_power() {
            match refresh.power {
                Some(power) => {
                    self.power.insert(port.to_string(), power);
                }
                None => {
                    self.power.shift_remove(port);
                }
            }
        }
        if self.surveyor.vocabulary().has_labels() {
            self.labels.insert(port.to_string(), refresh.label.clone());
        }

        if let Some(vlan_id) = self.port_index.get(port).cloned() {
            let name = match &refresh.mac {
                Some(mac) => self.lookup_mac(mac).await,
                None => None,
            };
            if let Some(vlan) = self.vlan_mut(&vlan_id) {
                vlan.forget_port(port);
                if let Some(mac) = refresh.mac {
                    vlan.record(port, mac, name);
                }
            }
        }
        info!("Switch information updated");
        Ok(refresh)
    }

    fn mark_stale(&mut self) {
        if self.state == SwitchState::Loaded {
            self.state = SwitchState::Stale;
        }
    }

    // ---- queries -----------------------------------------------------------

    /// Every untagged port, in numeric order.
    pub fn ports(&self) -> Vec<&str> {
        let mut ports: Vec<&str> = self
            .vlans
            .iter()
            .flat_map(|v| v.ports().iter().map(String::as_str))
            .collect();
        ports.sort_by_key(|p| (port_key(p), *p));
        ports
    }

    /// VLAN → configured subnet, in VLAN number order.
    pub fn subnets(&self) -> Vec<(&str, Option<&str>)> {
        let mut subnets: Vec<(&str, Option<&str>)> = self
            .vlans
            .iter()
            .map(|v| (v.id(), v.subnet(&self.subnets)))
            .collect();
        subnets.sort_by_key(|(id, _)| id.parse::<u32>().unwrap_or(u32::MAX));
        subnets
    }

    /// Known devices on every VLAN.
    pub fn devices(&self) -> IndexMap<String, DeviceEntry> {
        self.vlans
            .iter()
            .flat_map(|v| v.devices().iter().map(|(k, d)| (k.clone(), d.clone())))
            .collect()
    }

    /// MACs the directory does not know, on every VLAN.
    pub fn unknown_devices(&self) -> IndexMap<MacAddress, UnknownEntry> {
        self.vlans
            .iter()
            .flat_map(|v| v.unknown_devices().iter().map(|(k, u)| (*k, u.clone())))
            .collect()
    }

    pub fn power(&self) -> &PowerTable {
        &self.power
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// The VLAN `port` is an untagged member of.
    pub fn find_port(&self, port: &str) -> Option<&str> {
        let vlan = self.port_index.get(port).map(String::as_str);
        match vlan {
            Some(vlan) => debug!("Found {} on VLAN {}", port, vlan),
            None => debug!("Unable to find port {} on any VLAN", port),
        }
        vlan
    }

    /// The VLANs of several ports, `None` for ports on no VLAN.
    pub fn find_vlans<'a>(&'a self, ports: &[&str]) -> Vec<Option<&'a str>> {
        ports.iter().map(|p| self.find_port(p)).collect()
    }

    /// `(vlan, port)` of a device known by name.
    pub fn find_device(&self, device: &str) -> Option<(&str, &str)> {
        let found = self.vlans.iter().find_map(|v| {
            v.devices()
                .get(device)
                .map(|entry| (v.id(), entry.port.as_str()))
        });
        if found.is_none() {
            debug!("Unable to find device {} on any VLAN", device);
        }
        found
    }

    /// Devices whose name contains `fragment`.
    ///
    /// An exact name match is returned alone; otherwise every partial match
    /// is returned, sorted by name.
    pub fn find_device_substr(&self, fragment: &str) -> Vec<DeviceMatch> {
        let mut matches = Vec::new();
        for vlan in &self.vlans {
            for (name, entry) in vlan.devices() {
                if !name.contains(fragment) {
                    continue;
                }
                let found = DeviceMatch {
                    name: name.clone(),
                    vlan: vlan.id().to_string(),
                    port: entry.port.clone(),
                };
                if name == fragment {
                    return vec![found];
                }
                matches.push(found);
            }
        }
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }

    /// The VLAN configured to carry `subnet`.
    pub fn find_vlan_for_subnet(&self, subnet: &str) -> Option<String> {
        let vlan = self
            .subnets()
            .into_iter()
            .find(|(_, s)| *s == Some(subnet))
            .map(|(id, _)| id.to_string());
        if vlan.is_none() {
            debug!("No VLAN associated with subnet {}", subnet);
        }
        vlan
    }

    /// `(vlan, subnet)` a host belongs on according to the directory.
    pub async fn find_subnet_for_host(&self, host: &str) -> Result<(Option<String>, Option<String>)> {
        let subnet = self.directory.subnet_for(host).await?;
        let vlan = subnet.as_deref().and_then(|s| self.find_vlan_for_subnet(s));
        Ok((vlan, subnet))
    }

    // ---- changes -----------------------------------------------------------

    /// Run configuration commands in privileged mode, mapping every failure
    /// to a [`ChangeFailure`]. A rejected enable password is forgotten.
    ///
    /// A command list that failed after the shell opened may have been
    /// partly applied, so the model is marked stale.
    async fn run_change(&mut self, commands: Vec<String>) -> std::result::Result<(), ChangeFailure> {
        let result = self
            .surveyor
            .run_privileged(&self.name, commands, self.enable_password.as_ref())
            .await;
        match result {
            Ok(_) => {
                info!("Finished running switch commands");
                Ok(())
            }
            Err(e) if e.is_escalation_failure() => {
                info!("Bad enable password!");
                self.enable_password = None;
                Err(ChangeFailure::Escalation(e.to_string()))
            }
            Err(Error::Survey(SurveyError::Rejected {
                command, message, ..
            })) => {
                error!("{} rejected '{}': {}", self.name, command, message);
                self.mark_stale();
                Err(ChangeFailure::Rejected(format!("'{command}': {message}")))
            }
            Err(e) => {
                error!("Commands on {} failed: {}", self.name, e);
                if !e.is_connection_failure() {
                    self.mark_stale();
                }
                Err(ChangeFailure::Session(e.to_string()))
            }
        }
    }

    /// Move `port` onto VLAN `destination`.
    ///
    /// With `verify` the switch is surveyed again and the outcome reflects
    /// where the port actually ended up. Without it, success only means the
    /// commands were accepted and the model is left stale.
    pub async fn move_port(&mut self, port: &str, destination: &str, verify: bool) -> MoveOutcome {
        let Some(origin) = self.find_port(port).map(str::to_string) else {
            error!("Port {} is not this switch", port);
            return MoveOutcome::failed(ChangeFailure::UnknownPort(port.to_string()));
        };
        if origin == destination {
            info!("Port is already on VLAN {}", origin);
            return MoveOutcome::AlreadyThere;
        }
        if destination != "1" && self.vlan(destination).is_none() {
            error!("VLAN {} is not on this switch", destination);
            return MoveOutcome::failed(ChangeFailure::UnknownVlan(destination.to_string()));
        }

        let commands = self
            .surveyor
            .vocabulary()
            .changes
            .move_port(port, &origin, destination);
        info!("Moving port {} from VLAN {} to VLAN {}", port, origin, destination);
        if let Err(failure) = self.run_change(commands).await {
            return MoveOutcome::failed(failure);
        }

        if !verify {
            self.mark_stale();
            return MoveOutcome::Accepted;
        }

        if let Err(e) = self.update().await {
            warn!("Port {} move sent but the switch could not be re-read: {}", port, e);
            return MoveOutcome::Unconfirmed {
                reason: e.to_string(),
            };
        }
        match self.find_port(port) {
            Some(vlan) if vlan == destination => {
                info!("Port {} is now on VLAN {}", port, destination);
                MoveOutcome::Verified
            }
            actual => {
                warn!(
                    "Port move was unsuccessful, port {} is now on VLAN {}",
                    port,
                    actual.unwrap_or("none")
                );
                MoveOutcome::Mismatch {
                    expected: destination.to_string(),
                    actual: actual.map(str::to_string),
                }
            }
        }
    }

    /// Move a known device's port onto a VLAN, or onto the VLAN carrying
    /// a subnet.
    pub async fn move_device(&mut self, device: &str, target: MoveTarget, verify: bool) -> MoveOutcome {
        let Some((_, port)) = self.find_device(device) else {
            error!("No device named {} on switch", device);
            return MoveOutcome::failed(ChangeFailure::UnknownDevice(device.to_string()));
        };
        let port = port.to_string();

        let vlan = match target {
            MoveTarget::Vlan(vlan) if !vlan.is_empty() => vlan,
            MoveTarget::Subnet(subnet) if !subnet.is_empty() => {
                match self.find_vlan_for_subnet(&subnet) {
                    Some(vlan) => vlan,
                    None => {
                        error!("{} was not found on this switch", subnet);
                        return MoveOutcome::failed(ChangeFailure::UnknownSubnet(subnet));
                    }
                }
            }
            _ => {
                error!("Please select either a target subnet or VLAN");
                return MoveOutcome::failed(ChangeFailure::NoTarget);
            }
        };

        info!("Moving {} on port {} to VLAN {}", device, port, vlan);
        self.move_port(&port, &vlan, verify).await
    }

    /// Switch PoE on or off for `port`, then re-read the port once it has
    /// had time to power up or down.
    pub async fn set_power(&mut self, port: &str, on: bool) -> ChangeOutcome {
        if !self.surveyor.vocabulary().has_power() {
            return ChangeOutcome::from(Err(ChangeFailure::Unsupported(format!(
                "{} switches do not report PoE",
                self.vendor()
            ))));
        }
        info!("Turning {} power for {}", if on { "on" } else { "off" }, port);
        let commands = self.surveyor.vocabulary().changes.set_power(port, on);
        if let Err(failure) = self.run_change(commands).await {
            return ChangeOutcome::from(Err(failure));
        }

        let settle = if on {
            self.settle.power_on
        } else {
            self.settle.power_off
        };
        if let Err(e) = self.refresh_port_after(port, settle).await {
            warn!("Unable to re-read port {}: {}", port, e);
            self.mark_stale();
        }
        ChangeOutcome::Applied
    }

    /// Name `port`, or clear its name when `label` is empty.
    pub async fn set_label(&mut self, port: &str, label: &str) -> ChangeOutcome {
        if !self.surveyor.vocabulary().has_labels() {
            return ChangeOutcome::from(Err(ChangeFailure::Unsupported(format!(
                "{} switches do not report port names",
                self.vendor()
            ))));
        }
        info!("Setting port-name for {} to \"{}\"", port, label);
        let commands = self.surveyor.vocabulary().changes.set_label(port, label);
        if let Err(failure) = self.run_change(commands).await {
            return ChangeOutcome::from(Err(failure));
        }
        if let Err(e) = self.refresh_port(port).await {
            warn!("Unable to re-read port {}: {}", port, e);
            self.mark_stale();
        }
        ChangeOutcome::Applied
    }

    /// Save the running configuration on the switch.
    pub async fn write_memory(&mut self) -> ChangeOutcome {
        let commands = self.surveyor.vocabulary().changes.write_memory();
        let result = self.run_change(commands).await;
        match &result {
            Ok(()) => info!("Write memory complete, settings saved"),
            Err(failure) => error!("Write memory had an error: {}", failure),
        }
        ChangeOutcome::from(result)
    }

    // ---- survey ------------------------------------------------------------

    /// Known devices whose directory subnet differs from their VLAN's.
    pub async fn survey(&self) -> Result<Vec<String>> {
        let mut misplaced = Vec::new();
        for vlan in &self.vlans {
            misplaced.extend(vlan.survey(&self.directory, &self.subnets).await?);
        }
        Ok(misplaced)
    }

    /// Move every misplaced device onto the VLAN for its directory subnet,
    /// then survey again.
    ///
    /// Moves are not verified one by one; a single refresh follows the
    /// batch. Devices whose subnet has no VLAN on this switch are reported
    /// as unmovable.
    pub async fn auto_configure(&mut self) -> Result<AutoConfigureReport> {
        let mut report = AutoConfigureReport {
            misplaced: self.survey().await?,
            ..AutoConfigureReport::default()
        };

        for device in report.misplaced.clone() {
            info!("Attempting to move {}", device);
            let (vlan, subnet) = match self.find_subnet_for_host(&device).await {
                Ok(found) => found,
                Err(Error::Directory(DirectoryError::NotFound(_))) => {
                    warn!("{} has no directory entry, leaving it where it is", device);
                    report.unmovable.push(device);
                    continue;
                }
                Err(e) => return Err(e),
            };
            match (vlan, subnet) {
                (Some(_), Some(subnet)) => {
                    let outcome = self
                        .move_device(&device, MoveTarget::Subnet(subnet.clone()), false)
                        .await;
                    if outcome.is_success() {
                        report.moved.push(device);
                    } else {
                        warn!("Unable to move device {} on to subnet {}: {}", device, subnet, outcome);
                        report.unmovable.push(device);
                    }
                }
                (_, subnet) => {
                    warn!(
                        "Device {} can not be moved to the subnet {} because it is not present on the switch",
                        device,
                        subnet.as_deref().unwrap_or("(none)")
                    );
                    report.unmovable.push(device);
                }
            }
        }

        self.update().await?;
        report.still_misplaced = self.survey().await?;
        for device in &report.still_misplaced {
            warn!("{} remains on the wrong subnet", device);
        }
        Ok(report)
    }

    // ---- configuration snapshots -------------------------------------------

    /// The current VLAN layout.
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        let vlans = self
            .vlans
            .iter()
            .map(|vlan| {
                let mut devices: IndexMap<String, DeviceEntry> = vlan
                    .devices()
                    .iter()
                    .map(|(k, d)| (k.clone(), d.clone()))
                    .collect();
                devices.sort_keys();
                (
                    vlan.id().to_string(),
                    VlanSnapshot {
                        ports: vlan.ports().to_vec(),
                        devices: SnapshotDevices::Detailed(devices),
                    },
                )
            })
            .collect();
        ConfigurationSnapshot { vlans }
    }

    /// Write the current layout to `dir`, named `file` or
    /// `<switch>_<unix seconds>.json`. Returns the path written.
    pub fn save_configuration(&self, dir: impl AsRef<Path>, file: Option<&str>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = match file {
            Some(file) => file.to_string(),
            None => {
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                format!("{}_{}.json", self.name, secs)
            }
        };
        let path = dir.join(file);
        info!("Saving configuration to {}", path.display());
        self.snapshot().save(&path)?;
        Ok(path)
    }

    /// Ports and devices that are no longer where `saved` has them.
    pub fn diff(&self, saved: &ConfigurationSnapshot) -> DiffResult {
        let mut moved = DiffResult::default();
        for (vlan_id, past) in &saved.vlans {
            let Some(current) = self.vlan(vlan_id) else {
                warn!("VLAN {} is not on switch anymore", vlan_id);
                continue;
            };
            for port in &past.ports {
                if current.has_port(port) {
                    continue;
                }
                let now = self.find_port(port).map(str::to_string);
                info!(
                    "Port {} has moved from {} to {}",
                    port,
                    vlan_id,
                    now.as_deref().unwrap_or("none")
                );
                moved.ports.insert(
                    port.clone(),
                    PortMove {
                        past: vlan_id.clone(),
                        current: now,
                    },
                );
            }
            for device in past.devices.names() {
                if current.devices().contains_key(device) {
                    continue;
                }
                let now = self.find_device(device).map(|(vlan, _)| vlan.to_string());
                match &now {
                    Some(vlan) => info!("Device {} has moved from {} to {}", device, vlan_id, vlan),
                    None => warn!("Device {} is no longer on the switch", device),
                }
                moved.devices.insert(
                    device.to_string(),
                    DeviceMove {
                        past: vlan_id.clone(),
                        current: now,
                    },
                );
            }
        }
        moved
    }

    /// [`diff`](Self::diff) against a snapshot file.
    pub fn diff_file(&self, path: impl AsRef<Path>) -> Result<DiffResult> {
        let path = path.as_ref();
        info!("Comparing current configuration to the saved file {}", path.display());
        Ok(self.diff(&ConfigurationSnapshot::load(path)?))
    }

    /// Move every port that left its saved VLAN back, refresh, and report
    /// the ports that still differ.
    pub async fn apply(&mut self, saved: &ConfigurationSnapshot) -> Result<ApplyReport> {
        let diff = self.diff(saved);
        let mut report = ApplyReport::default();
        for (port, moved) in diff.ports {
            info!(
                "Moving port {} from {} to {}",
                port,
                moved.current.as_deref().unwrap_or("none"),
                moved.past
            );
            let outcome = self.move_port(&port, &moved.past, false).await;
            report.moves.insert(port, outcome);
        }

        self.update().await?;
        report.unmatched = self.diff(saved).ports;
        for port in report.unmatched.keys() {
            warn!("{} was not moved to the correct VLAN", port);
        }
        Ok(report)
    }

    /// [`apply`](Self::apply) a snapshot file.
    pub async fn apply_file(&mut self, path: impl AsRef<Path>) -> Result<ApplyReport> {
        let saved = ConfigurationSnapshot::load(path)?;
        self.apply(&saved).await
    }
}

/// Refresh several switches at once. Results are in input order.
pub async fn refresh_all(switches: &mut [Switch]) -> Vec<Result<()>> {
    join_all(switches.iter_mut().map(|switch| switch.update())).await
}

/// Numeric sort key for `EtN`, `U/M/P` and `Gi1/0/5` style port names.
fn port_key(port: &str) -> u64 {
    let numbers = port.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    numbers
        .split('/')
        .try_fold(0u64, |acc, part| {
            part.parse::<u64>()
                .ok()
                .map(|n| acc.saturating_mul(1000).saturating_add(n))
        })
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_order() {
        let mut ports = vec!["1/1/10", "1/2/1", "1/1/2", "Et10", "Et2", "weird"];
        ports.sort_by_key(|p| (port_key(p), *p));
        assert_eq!(ports, vec!["Et2", "Et10", "1/1/2", "1/1/10", "1/2/1", "weird"]);
    }

    #[test]
    fn test_settle_defaults() {
        let settle = SettleTimes::default();
        assert_eq!(settle.port, Duration::from_millis(500));
        assert_eq!(settle.power_off, Duration::from_secs(15));
        assert_eq!(settle.power_on, Duration::from_secs(20));
    }
}
