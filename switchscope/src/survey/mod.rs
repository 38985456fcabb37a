//! Per-vendor survey of VLANs, learned MACs, PoE state and port names.
//!
//! A [`Surveyor`] pairs a vendor's [`Vocabulary`] with a [`SessionRunner`].
//! Every query opens its own session, so a failure in one table never
//! leaves another half read.

mod mac;
pub mod parse;

pub use mac::MacAddress;
pub use parse::{LabelTable, MacTable, PoeStatus, PortRefresh, PowerState, PowerTable, VlanTable};

use log::{debug, info};
use secrecy::SecretString;

use crate::channel::Mode;
use crate::driver::{CommandRunner, CommandSpec, RunOutput, SessionRunner};
use crate::error::{Result, SurveyError};
use crate::platform::{Vendor, Vocabulary};

/// Everything one full survey of a switch learned.
#[derive(Debug, Clone, Default)]
pub struct SurveyResult {
    pub vlans: VlanTable,
    pub macs: MacTable,
    pub power: PowerTable,
    pub labels: LabelTable,
}

/// Runs a vendor's survey commands and parses what comes back.
#[derive(Clone)]
pub struct Surveyor {
    vendor: Vendor,
    vocabulary: Vocabulary,
    runner: SessionRunner,
}

impl Surveyor {
    /// Create a surveyor for `vendor` driving sessions through `runner`.
    pub fn new(vendor: Vendor, runner: SessionRunner) -> Self {
        Self {
            vendor,
            vocabulary: vendor.vocabulary(),
            runner,
        }
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn runner(&self) -> &SessionRunner {
        &self.runner
    }

    /// VLAN → untagged ports, optionally for one VLAN only.
    ///
    /// A full listing with no VLANs at all is an error: every switch has at
    /// least the default VLAN, so an empty parse means the output was not
    /// what the grammar expects.
    pub async fn vlan_table(&self, host: &str, vlan: Option<&str>) -> Result<VlanTable> {
        let raw = self.fetch(host, vec![self.vocabulary.vlan(vlan)]).await?;
        let table = parse::vlans(&self.vocabulary, &raw);
        if table.is_empty() && vlan.is_none() {
            return Err(SurveyError::EmptyTable {
                host: host.to_string(),
                table: "VLAN",
            }
            .into());
        }
        Ok(table)
    }

    /// Dynamically learned MAC → port, optionally for one VLAN only.
    pub async fn mac_table(&self, host: &str, vlan: Option<&str>) -> Result<MacTable> {
        let raw = self.fetch(host, vec![self.vocabulary.mac(vlan)]).await?;
        Ok(parse::macs(&self.vocabulary, &raw))
    }

    /// Port → PoE state. Empty for switches without PoE reporting.
    pub async fn power_table(&self, host: &str) -> Result<PowerTable> {
        let Some(command) = self.vocabulary.power_command.clone() else {
            return Ok(PowerTable::new());
        };
        let raw = self.fetch(host, vec![command]).await?;
        Ok(parse::power(&self.vocabulary, &raw))
    }

    /// Port → name. Empty for switches without port names.
    pub async fn label_table(&self, host: &str) -> Result<LabelTable> {
        let Some(command) = self.vocabulary.label_command.clone() else {
            return Ok(LabelTable::new());
        };
        let raw = self.fetch(host, vec![command]).await?;
        Ok(parse::labels(&self.vocabulary, &raw))
    }

    /// Re-read one port's MAC, name and PoE state in a single session.
    pub async fn single_port_refresh(&self, host: &str, port: &str) -> Result<PortRefresh> {
        let raw = self.fetch(host, self.vocabulary.single_port(port)).await?;
        let refresh = parse::port_refresh(&self.vocabulary, port, &raw);
        debug!(
            "{} port {}: power {}, label {:?}, mac {:?}",
            host,
            port,
            refresh.oper_power(),
            refresh.label,
            refresh.mac.map(|m| m.to_string())
        );
        Ok(refresh)
    }

    /// True when a fresh session lands in unprivileged mode.
    ///
    /// Switches with no mode probe command never ask for `enable`.
    pub async fn mode_probe(&self, host: &str) -> Result<bool> {
        let Some(probe) = &self.vocabulary.mode_probe_command else {
            return Ok(false);
        };
        let mode = self.runner.probe_mode(host, probe).await?;
        Ok(mode == Some(Mode::Unprivileged))
    }

    /// Run configuration commands in privileged mode.
    ///
    /// A command that trips one of the vendor's failure markers turns the
    /// whole run into [`SurveyError::Rejected`].
    pub async fn run_privileged(
        &self,
        host: &str,
        commands: Vec<String>,
        enable_password: Option<&SecretString>,
    ) -> Result<RunOutput> {
        let spec = CommandSpec::from(commands);
        let output = self.runner.run_privileged(host, &spec, enable_password).await?;
        reject_failures(host, &output)?;
        Ok(output)
    }

    /// Read all four tables, one session each.
    pub async fn survey(&self, host: &str) -> Result<SurveyResult> {
        let vlans = self.vlan_table(host, None).await?;
        let macs = self.mac_table(host, None).await?;
        let power = self.power_table(host).await?;
        let labels = self.label_table(host).await?;
        info!(
            "{}: {} VLANs, {} learned MACs, {} PoE ports, {} named ports",
            host,
            vlans.len(),
            macs.len(),
            power.len(),
            labels.len()
        );
        Ok(SurveyResult {
            vlans,
            macs,
            power,
            labels,
        })
    }

    async fn fetch(&self, host: &str, commands: Vec<String>) -> Result<String> {
        let output = self.runner.run(host, &CommandSpec::from(commands)).await?;
        reject_failures(host, &output)?;
        Ok(output.output())
    }
}

fn reject_failures(host: &str, output: &RunOutput) -> Result<()> {
    match output.failure() {
        Some(failed) => Err(SurveyError::Rejected {
            host: host.to_string(),
            command: failed.command.clone(),
            message: failed.failure_message.clone().unwrap_or_default(),
        }
        .into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::Error;
    use crate::transport::scripted::{ScriptedConnector, ScriptedShell, reply};

    const PROMPT: &str = "SSH@sw1#";

    fn surveyor(vendor: Vendor, answer: fn(&str) -> Option<String>) -> Surveyor {
        let connector = ScriptedConnector::new(move || {
            ScriptedShell::new(
                PROMPT,
                Box::new(move |line| match line {
                    "exit" => None,
                    _ => reply(line, &answer(line).unwrap_or_default(), PROMPT),
                }),
            )
        });
        Surveyor::new(vendor, SessionRunner::new(Arc::new(connector), vendor.platform()))
    }

    fn ruckus(line: &str) -> Option<String> {
        let text = match line {
            "show vlan" => {
                "PORT-VLAN 1, Name DEFAULT-VLAN, Priority level0\r\n\
                 Untagged Ports: (U1/M1)   1   2\r\n\
                 Monitoring: Disabled\r\n\
                 PORT-VLAN 10, Name lab, Priority level0\r\n\
                 Untagged Ports: (U1/M1)   3\r\n\
                 Monitoring: Disabled\r\n"
            }
            "show mac-address" => "0040.d012.3456  1/1/3          Dynamic       10\r\n",
            "show inline power" => "  1/1/3   On       On          4400\r\n",
            "show interfaces brief" => {
                "1/1/3      Up      Forward Full 1G    None  No  10   0   609c.9f1d.0003  cam-03\r\n"
            }
            "show vlan 99" => "Error - VLAN 99 not configured\r\n",
            _ => return None,
        };
        Some(text.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_survey() {
        let result = surveyor(Vendor::Ruckus, ruckus).survey("sw1").await.unwrap();
        assert_eq!(result.vlans["10"], vec!["1/1/3"]);
        assert_eq!(result.macs.values().collect::<Vec<_>>(), vec!["1/1/3"]);
        assert_eq!(result.power["1/1/3"].oper, PoeStatus::On);
        assert_eq!(result.labels["1/1/3"], "cam-03");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_command() {
        let err = surveyor(Vendor::Ruckus, ruckus)
            .vlan_table("sw1", Some("99"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Survey(SurveyError::Rejected { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_vlan_listing_is_an_error() {
        let err = surveyor(Vendor::Brocade, |_| None)
            .vlan_table("sw1", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Survey(SurveyError::EmptyTable { table: "VLAN", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_brocade_has_no_power_or_probe() {
        let surveyor = surveyor(Vendor::Brocade, ruckus);
        assert!(surveyor.power_table("sw1").await.unwrap().is_empty());
        assert!(surveyor.label_table("sw1").await.unwrap().is_empty());
        assert!(!surveyor.mode_probe("sw1").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_port_refresh() {
        let surveyor = surveyor(Vendor::Ruckus, |line| {
            let text = match line {
                "show mac-address ethernet 1/1/3" => "0040.d012.3456  1/1/3   Dynamic  10\r\n",
                "show inline power 1/1/3" => "  1/1/3   On       Off         0\r\n",
                _ => return None,
            };
            Some(text.to_string())
        });
        let refresh = surveyor.single_port_refresh("sw1", "1/1/3").await.unwrap();
        assert_eq!(refresh.mac.unwrap().to_string(), "00:40:d0:12:34:56");
        assert_eq!(refresh.oper_power(), PoeStatus::Off);
        assert_eq!(refresh.label, "");
    }
}
