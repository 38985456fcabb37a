//! A simulated Ruckus switch behind the public `Connector`/`Transport` traits.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use indexmap::IndexMap;

use switchscope::directory::{Directory, DirectoryCache, HostMap, HostRecord, SubnetTable};
use switchscope::error::{Result, TransportError};
use switchscope::switch::SettleTimes;
use switchscope::transport::{Connector, Transport};
use switchscope::{Switch, SwitchBuilder};

pub const SWITCH: &str = "sw1";

/// Device-side state shared by every session.
#[derive(Debug, Default)]
pub struct Fabric {
    /// VLAN → untagged ports (`1/1/N`).
    pub vlans: IndexMap<String, Vec<String>>,
    /// Dotted MAC → port.
    pub macs: IndexMap<String, String>,
    pub power: IndexMap<String, bool>,
    pub labels: IndexMap<String, String>,
    /// Ports that accept move commands but never move.
    pub stuck: Vec<String>,
    /// Lines the switch answers with "Invalid input" without acting on them.
    pub reject: Vec<String>,
    /// `Some` puts new sessions in unprivileged mode until this is given.
    pub enable_password: Option<String>,
    /// Every line any session received.
    pub sent: Vec<String>,
}

impl Fabric {
    /// VLAN 1 with ports 1-2, VLAN 10 with 3-4, VLAN 20 with 5-6.
    /// cam-01 on 1/1/3, cam-02 on 1/1/4, ctl-01 on 1/1/5, an unknown MAC on
    /// 1/1/6.
    pub fn lab() -> Self {
        let ports = |ns: &[u32]| ns.iter().map(|n| format!("1/1/{n}")).collect::<Vec<_>>();
        let mut fabric = Fabric::default();
        fabric.vlans.insert("1".into(), ports(&[1, 2]));
        fabric.vlans.insert("10".into(), ports(&[3, 4]));
        fabric.vlans.insert("20".into(), ports(&[5, 6]));
        fabric.macs.insert("0040.d012.0003".into(), "1/1/3".into());
        fabric.macs.insert("0040.d012.0004".into(), "1/1/4".into());
        fabric.macs.insert("0040.d012.0005".into(), "1/1/5".into());
        fabric.macs.insert("0040.d0ff.0006".into(), "1/1/6".into());
        fabric.power.insert("1/1/3".into(), true);
        fabric.labels.insert("1/1/3".into(), "cam-01".into());
        fabric
    }

    pub fn vlan_of(&self, port: &str) -> Option<&str> {
        self.vlans
            .iter()
            .find(|(_, ports)| ports.iter().any(|p| p == port))
            .map(|(id, _)| id.as_str())
    }

    /// Configuration lines sessions received: no `show`, `exit`, `enable`
    /// or the blank line sent after each command.
    pub fn config_lines(&self) -> Vec<&str> {
        self.sent
            .iter()
            .map(String::as_str)
            .filter(|l| {
                !l.trim().is_empty()
                    && !l.starts_with("show")
                    && !l.starts_with("enable ")
                    && *l != "exit"
            })
            .collect()
    }

    fn untag(&mut self, vlan: &str, port: &str) {
        if self.stuck.iter().any(|p| p == port) {
            return;
        }
        for ports in self.vlans.values_mut() {
            ports.retain(|p| p != port);
        }
        self.vlans.entry(vlan.to_string()).or_default().push(port.to_string());
    }

    fn show_vlan(&self) -> String {
        let mut out = String::new();
        for (id, ports) in &self.vlans {
            out.push_str(&format!("PORT-VLAN {id}, Name vlan-{id}, Priority level0\r\n"));
            if ports.is_empty() {
                out.push_str(" Untagged Ports: None\r\n");
            } else {
                let numbers: Vec<&str> = ports.iter().filter_map(|p| p.strip_prefix("1/1/")).collect();
                out.push_str(&format!(" Untagged Ports: (U1/M1)   {}\r\n", numbers.join("   ")));
            }
            out.push_str(" Monitoring: Disabled\r\n");
        }
        out
    }

    fn show_macs(&self, only: Option<&str>) -> String {
        self.macs
            .iter()
            .filter(|(_, port)| only.is_none_or(|o| o == port.as_str()))
            .map(|(mac, port)| {
                let vlan = self.vlan_of(port).unwrap_or("1");
                format!("{mac}  {port}          Dynamic       {vlan}\r\n")
            })
            .collect()
    }

    fn show_power(&self, only: Option<&str>) -> String {
        self.power
            .iter()
            .filter(|(port, _)| only.is_none_or(|o| o == port.as_str()))
            .map(|(port, on)| {
                let state = if *on { "On" } else { "Off" };
                format!("  {port}   {state}       {state}          4400\r\n")
            })
            .collect()
    }

    fn show_labels(&self, only: Option<&str>) -> String {
        self.labels
            .iter()
            .filter(|(port, _)| only.is_none_or(|o| o == port.as_str()))
            .map(|(port, label)| {
                format!("{port}      Up      Forward Full 1G    None  No  10   0   609c.9f1d.0003  {label}\r\n")
            })
            .collect()
    }
}

/// Where a session is in the configuration tree.
enum Context {
    Exec,
    Config,
    Vlan(String),
    Interface(String),
}

struct SimShell {
    fabric: Arc<Mutex<Fabric>>,
    host: String,
    inbox: VecDeque<u8>,
    partial: Vec<u8>,
    context: Context,
    privileged: bool,
    closing: bool,
}

impl SimShell {
    fn new(fabric: Arc<Mutex<Fabric>>, host: &str) -> Self {
        let privileged = lock(&fabric).enable_password.is_none();
        let mut shell = Self {
            fabric,
            host: host.to_string(),
            inbox: VecDeque::new(),
            partial: Vec::new(),
            context: Context::Exec,
            privileged,
            closing: false,
        };
        let prompt = shell.prompt();
        shell.inbox.extend(prompt.into_bytes());
        shell
    }

    fn prompt(&self) -> String {
        let context = match &self.context {
            Context::Exec => String::new(),
            Context::Config => "(config)".to_string(),
            Context::Vlan(id) => format!("(config-vlan-{id})"),
            Context::Interface(port) => format!("(config-if-e1000-{port})"),
        };
        let mode = if self.privileged { '#' } else { '>' };
        format!("SSH@{}{}{}", self.host, context, mode)
    }

    /// Output for `line`, or `None` when the shell closes.
    fn answer(&mut self, line: &str) -> Option<String> {
        let mut fabric = lock(&self.fabric);
        fabric.sent.push(line.to_string());

        if line.trim().is_empty() {
            return Some(String::new());
        }
        if fabric.reject.iter().any(|r| r == line) {
            return Some(format!("Invalid input -> {line}\r\nType ? for a list\r\n"));
        }

        if let Some(password) = line.strip_prefix("enable ") {
            self.privileged = fabric.enable_password.as_deref() == Some(password);
            return Some(String::new());
        }
        if let Some(port) = line.strip_prefix("show mac-address ethernet ") {
            return Some(fabric.show_macs(Some(port)));
        }
        if let Some(port) = line.strip_prefix("show inline power ") {
            return Some(fabric.show_power(Some(port)));
        }
        if let Some(port) = line.strip_prefix("show interfaces brief ethernet ") {
            return Some(fabric.show_labels(Some(port)));
        }

        let body = match (line, &self.context) {
            ("exit", Context::Exec) => return None,
            ("exit", Context::Config) => {
                self.context = Context::Exec;
                String::new()
            }
            ("exit", _) => {
                self.context = Context::Config;
                String::new()
            }
            ("show clock", _) => "12:00:00.000 GMT+00 Mon Jan 01 2024\r\n".to_string(),
            ("show vlan", _) => fabric.show_vlan(),
            ("show mac-address", _) => fabric.show_macs(None),
            ("show inline power", _) => fabric.show_power(None),
            ("show interfaces brief", _) => fabric.show_labels(None),
            ("write memory", Context::Exec) if self.privileged => {
                "Write startup-config done.\r\n".to_string()
            }
            ("config terminal", Context::Exec) if self.privileged => {
                self.context = Context::Config;
                String::new()
            }
            (_, Context::Config) if line.starts_with("vlan ") => {
                self.context = Context::Vlan(line["vlan ".len()..].to_string());
                String::new()
            }
            (_, Context::Config) if line.starts_with("interface ethernet ") => {
                self.context = Context::Interface(line["interface ethernet ".len()..].to_string());
                String::new()
            }
            (_, Context::Vlan(vlan)) if line.starts_with("no untag ethernet ") => {
                let port = &line["no untag ethernet ".len()..];
                if !fabric.stuck.iter().any(|p| p == port) {
                    if let Some(ports) = fabric.vlans.get_mut(vlan.as_str()) {
                        ports.retain(|p| p != port);
                    }
                    fabric.vlans.entry("1".to_string()).or_default().push(port.to_string());
                }
                String::new()
            }
            (_, Context::Vlan(vlan)) if line.starts_with("untag ethernet ") => {
                let vlan = vlan.clone();
                fabric.untag(&vlan, &line["untag ethernet ".len()..]);
                String::new()
            }
            ("inline power", Context::Interface(port)) => {
                fabric.power.insert(port.clone(), true);
                String::new()
            }
            ("no inline power", Context::Interface(port)) => {
                fabric.power.insert(port.clone(), false);
                String::new()
            }
            ("no port-name", Context::Interface(port)) => {
                fabric.labels.shift_remove(port.as_str());
                String::new()
            }
            (_, Context::Interface(port)) if line.starts_with("port-name ") => {
                fabric
                    .labels
                    .insert(port.clone(), line["port-name ".len()..].to_string());
                String::new()
            }
            _ => format!("Invalid input -> {line}\r\nType ? for a list\r\n"),
        };
        Some(body)
    }
}

#[async_trait]
impl Transport for SimShell {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.closing {
            return Err(TransportError::Disconnected.into());
        }
        self.partial.extend_from_slice(data);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            match self.answer(&line) {
                Some(body) => {
                    let prompt = self.prompt();
                    self.inbox
                        .extend(format!("{line}\r\n{body}{prompt}").into_bytes());
                }
                None => {
                    self.inbox.extend(format!("{line}\r\n").into_bytes());
                    self.closing = true;
                    break;
                }
            }
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.inbox.is_empty() {
            return Ok(Some(self.inbox.drain(..).collect()));
        }
        if self.closing {
            return Ok(None);
        }
        std::future::pending::<()>().await;
        Ok(None)
    }

    fn exit_status(&self) -> Option<u32> {
        self.closing.then_some(0)
    }

    fn is_closed(&self) -> bool {
        self.closing && self.inbox.is_empty()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Opens shells on the simulated switch, refusing the first `refusals`.
pub struct SimConnector {
    pub fabric: Arc<Mutex<Fabric>>,
    refusals: AtomicU32,
    attempts: AtomicU32,
}

impl SimConnector {
    pub fn new(fabric: Arc<Mutex<Fabric>>) -> Self {
        Self {
            fabric,
            refusals: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn refusing(self, refusals: u32) -> Self {
        self.refusals.store(refusals, Ordering::SeqCst);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for SimConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.refusals.load(Ordering::SeqCst);
        if remaining > 0 {
            self.refusals.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::ConnectionFailed {
                host: host.to_string(),
                port: 22,
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            }
            .into());
        }
        Ok(Box::new(SimShell::new(self.fabric.clone(), host)))
    }
}

/// A directory whose records tests can edit between loads.
#[derive(Clone, Default)]
pub struct EditableDirectory {
    pub hosts: Arc<Mutex<HostMap>>,
}

impl EditableDirectory {
    /// The switch and the three known lab devices.
    pub fn lab() -> Self {
        let mut hosts = HostMap::new();
        hosts.insert(
            SWITCH.to_string(),
            HostRecord::new().with("Description", "Ruckus ICX7150-48P lab"),
        );
        for (name, mac, subnet) in [
            ("cam-01", "00:40:d0:12:00:03", "cam"),
            ("cam-02", "00:40:d0:12:00:04", "cam"),
            ("ctl-01", "00:40:d0:12:00:05", "ctl"),
        ] {
            hosts.insert(
                name.to_string(),
                HostRecord::new()
                    .with("Ethernet Address", mac)
                    .with("Subnet", subnet),
            );
        }
        Self {
            hosts: Arc::new(Mutex::new(hosts)),
        }
    }

    pub fn remove(&self, host: &str) {
        lock(&self.hosts).shift_remove(host);
    }

    pub fn set(&self, host: &str, key: &str, value: &str) {
        if let Some(record) = lock(&self.hosts).get_mut(host) {
            record.insert(key, value);
        }
    }
}

#[async_trait]
impl Directory for EditableDirectory {
    async fn find(&self, pattern: &str) -> Result<HostMap> {
        let hosts = lock(&self.hosts);
        Ok(hosts
            .iter()
            .filter(|(name, _)| pattern == "*" || name.as_str() == pattern)
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect())
    }

    async fn find_by_attributes(&self, _constraints: &[(String, String)]) -> Result<HostMap> {
        Ok(HostMap::new())
    }
}

/// VLAN 10 carries `cam`, VLAN 20 carries `ctl`.
pub fn lab_subnets() -> SubnetTable {
    SubnetTable::new().with("10", "cam").with("20", "ctl")
}

/// Everything one test needs.
pub struct Lab {
    pub fabric: Arc<Mutex<Fabric>>,
    pub connector: Arc<SimConnector>,
    pub directory: EditableDirectory,
    pub cache: Arc<DirectoryCache>,
}

impl Lab {
    pub fn new() -> Self {
        Self::with_fabric(Fabric::lab())
    }

    pub fn with_fabric(fabric: Fabric) -> Self {
        let fabric = Arc::new(Mutex::new(fabric));
        let connector = Arc::new(SimConnector::new(fabric.clone()));
        let directory = EditableDirectory::lab();
        let cache = Arc::new(DirectoryCache::new(Arc::new(directory.clone())));
        Self {
            fabric,
            connector,
            directory,
            cache,
        }
    }

    pub fn builder(&self) -> SwitchBuilder {
        SwitchBuilder::new(SWITCH)
            .directory(self.cache.clone())
            .subnets(lab_subnets())
            .connector(self.connector.clone())
            .settle(SettleTimes::none())
    }

    pub async fn switch(&self) -> Switch {
        let mut switch = self.builder().build().await.unwrap();
        switch.update().await.unwrap();
        switch
    }

    pub fn fabric(&self) -> std::sync::MutexGuard<'_, Fabric> {
        lock(&self.fabric)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
