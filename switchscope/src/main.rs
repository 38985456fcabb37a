//! `switchscope` command line tool.
//!
//! ```bash
//! switchscope --switch switch-b34-01 show
//! switchscope --switch switch-b34-01 move-port 1/1/3 310
//! switchscope --switch switch-b34-01 -v auto-configure
//! switchscope run --vendor arista --command "show version" sw1 sw2
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use secrecy::SecretString;

use switchscope::config::{Credentials, Settings};
use switchscope::directory::{DirectoryCache, StaticDirectory, SubnetTable};
use switchscope::driver::TerminalServerRunner;
use switchscope::error::ConfigError;
use switchscope::transport::{SshConfig, TelnetConfig, TelnetConnector};
use switchscope::{
    CommandRunner, CommandSpec, MoveOutcome, MoveTarget, RunnerBuilder, Switch, SwitchBuilder,
    Vendor, refresh_all,
};

/// Survey and reconcile VLAN membership on network switches
#[derive(Parser)]
#[command(name = "switchscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Switch to operate on (repeat for several)
    #[arg(short, long = "switch", global = true)]
    switches: Vec<String>,

    /// Login user
    #[arg(short, long, global = true, env = "SWITCHSCOPE_USER")]
    user: Option<String>,

    /// Login password
    #[arg(short, long, global = true, env = "SWITCHSCOPE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Password for privileged mode
    #[arg(long, global = true, env = "SWITCHSCOPE_ENABLE_PASSWORD", hide_env_values = true)]
    enable_password: Option<String>,

    /// Switch type, when the directory description does not say
    #[arg(long, global = true)]
    vendor: Option<Vendor>,

    /// Hours before a loaded switch is surveyed again
    #[arg(short, long, global = true, default_value = "1", value_parser = parse_hours)]
    timeout: Duration,

    /// Configuration directory (subnets.json, hosts.json, credentials, configs/)
    #[arg(long, global = true, env = "SWITCHSCOPE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print VLANs, ports and the devices on them
    Show,
    /// List devices on the wrong subnet
    Survey,
    /// Move every misplaced device onto its subnet's VLAN
    AutoConfigure,
    /// Move a port to another VLAN
    MovePort {
        port: String,
        vlan: String,
        /// Do not survey again to confirm the move
        #[arg(long)]
        no_verify: bool,
    },
    /// Move a device's port to a VLAN or to the VLAN carrying a subnet
    MoveDevice {
        device: String,
        #[arg(long, conflicts_with = "subnet", required_unless_present = "subnet")]
        vlan: Option<String>,
        #[arg(long)]
        subnet: Option<String>,
        /// Do not survey again to confirm the move
        #[arg(long)]
        no_verify: bool,
    },
    /// Save the VLAN layout to the snapshot directory
    Save {
        /// File name (default `<switch>_<unix seconds>.json`)
        #[arg(long)]
        file: Option<String>,
    },
    /// Show what moved since a snapshot
    Diff { snapshot: PathBuf },
    /// Move ports back to where a snapshot has them
    Apply { snapshot: PathBuf },
    /// Switch PoE on or off for a port
    Power {
        port: String,
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Name a port (no name clears it)
    Label { port: String, label: Option<String> },
    /// Save the running configuration on the switch
    WriteMemory,
    /// Re-survey whenever the refresh timeout passes
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
    /// Run raw commands over SSH on each host (needs --vendor)
    Run {
        /// Command to run (repeat for several)
        #[arg(short, long = "command", required = true)]
        commands: Vec<String>,
        hosts: Vec<String>,
    },
    /// Run raw commands on terminal servers over Telnet
    Terminal {
        /// Command to run (repeat for several)
        #[arg(short, long = "command", required = true)]
        commands: Vec<String>,
        hosts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Resolved login details: flags first, then the credentials file.
struct Login {
    username: String,
    password: Option<SecretString>,
    enable_password: Option<SecretString>,
}

impl Login {
    fn resolve(cli: &Cli, file: Credentials) -> Self {
        Self {
            username: cli
                .user
                .clone()
                .or(file.username)
                .unwrap_or_else(|| "admin".to_string()),
            password: cli.password.clone().map(SecretString::from).or(file.password),
            enable_password: cli
                .enable_password
                .clone()
                .map(SecretString::from)
                .or(file.enable_password),
        }
    }
}

/// Returns `Ok(false)` when the command ran but did not fully succeed.
async fn run(cli: Cli) -> switchscope::Result<bool> {
    let settings = cli
        .config_dir
        .clone()
        .map(Settings::new)
        .unwrap_or_default();
    let login = Login::resolve(&cli, settings.load_credentials()?);

    match &cli.command {
        Commands::Run { commands, hosts } => {
            let vendor = cli.vendor.ok_or(ConfigError::Missing("--vendor"))?;
            return run_raw(&login, vendor, commands, hosts).await;
        }
        Commands::Terminal { commands, hosts } => {
            return run_terminal(&login, commands, hosts).await;
        }
        _ => {}
    }

    if cli.switches.is_empty() {
        return Err(ConfigError::Missing("--switch").into());
    }

    let hosts = StaticDirectory::from_file(settings.hosts())?;
    let directory = Arc::new(DirectoryCache::new(Arc::new(hosts)));
    let subnets = Arc::new(SubnetTable::from_file(settings.subnets())?);

    let mut switches = Vec::with_capacity(cli.switches.len());
    for name in &cli.switches {
        let mut builder = SwitchBuilder::new(name)
            .username(&login.username)
            .directory(directory.clone())
            .subnets(subnets.clone());
        if let Some(password) = &login.password {
            builder = builder.password(password.clone());
        }
        if let Some(password) = &login.enable_password {
            builder = builder.enable_password(password.clone());
        }
        if let Some(vendor) = cli.vendor {
            builder = builder.vendor(vendor);
        }
        switches.push(builder.build().await?);
    }

    let results = refresh_all(&mut switches).await;
    let (mut loaded, failed) = split_loaded(switches, results);
    for (switch, e) in &failed {
        error!("Unable to survey {}: {}", switch.name(), e);
        eprintln!("{}: not surveyed: {e}", switch.name());
    }

    let mut ok = failed.is_empty();
    for switch in &mut loaded {
        match run_on_switch(switch, &cli.command, &settings, cli.timeout).await {
            Ok(done) => ok &= done,
            Err(e) => {
                error!("{}: {}", switch.name(), e);
                eprintln!("{}: {e}", switch.name());
                ok = false;
            }
        }
    }
    Ok(ok)
}

/// Parse a number of hours into a refresh timeout.
fn parse_hours(s: &str) -> Result<Duration, String> {
    let hours: f64 = s.parse().map_err(|e| format!("{s}: {e}"))?;
    Duration::try_from_secs_f64(hours * 3600.0).map_err(|e| format!("{s} hours: {e}"))
}

/// Pair each switch with its refresh result, keeping the ones that loaded.
fn split_loaded<T>(
    switches: Vec<T>,
    results: Vec<switchscope::Result<()>>,
) -> (Vec<T>, Vec<(T, switchscope::Error)>) {
    let mut loaded = Vec::new();
    let mut failed = Vec::new();
    for (switch, result) in switches.into_iter().zip(results) {
        match result {
            Ok(()) => loaded.push(switch),
            Err(e) => failed.push((switch, e)),
        }
    }
    (loaded, failed)
}

async fn run_on_switch(
    switch: &mut Switch,
    command: &Commands,
    settings: &Settings,
    max_age: Duration,
) -> switchscope::Result<bool> {
    match command {
        Commands::Show => {
            show(switch);
            Ok(true)
        }
        Commands::Survey => {
            let misplaced = switch.survey().await?;
            for device in &misplaced {
                println!("{device}");
            }
            Ok(misplaced.is_empty())
        }
        Commands::AutoConfigure => {
            let report = switch.auto_configure().await?;
            println!("moved: {}", report.moved.join(", "));
            if !report.unmovable.is_empty() {
                println!("unmovable: {}", report.unmovable.join(", "));
            }
            if !report.still_misplaced.is_empty() {
                println!("still misplaced: {}", report.still_misplaced.join(", "));
            }
            Ok(report.still_misplaced.is_empty())
        }
        Commands::MovePort {
            port,
            vlan,
            no_verify,
        } => {
            let outcome = switch.move_port(port, vlan, !no_verify).await;
            Ok(report_move(switch, port, &outcome))
        }
        Commands::MoveDevice {
            device,
            vlan,
            subnet,
            no_verify,
        } => {
            let target = match (vlan, subnet) {
                (Some(vlan), _) => MoveTarget::Vlan(vlan.clone()),
                (None, Some(subnet)) => MoveTarget::Subnet(subnet.clone()),
                (None, None) => MoveTarget::Vlan(String::new()),
            };
            let outcome = switch.move_device(device, target, !no_verify).await;
            Ok(report_move(switch, device, &outcome))
        }
        Commands::Save { file } => {
            let path = switch.save_configuration(settings.snapshots(), file.as_deref())?;
            println!("{}", path.display());
            Ok(true)
        }
        Commands::Diff { snapshot } => {
            let diff = switch.diff_file(snapshot)?;
            for (port, moved) in &diff.ports {
                println!(
                    "port {port}: {} -> {}",
                    moved.past,
                    moved.current.as_deref().unwrap_or("none")
                );
            }
            for (device, moved) in &diff.devices {
                println!(
                    "device {device}: {} -> {}",
                    moved.past,
                    moved.current.as_deref().unwrap_or("gone")
                );
            }
            Ok(diff.is_empty())
        }
        Commands::Apply { snapshot } => {
            let report = switch.apply_file(snapshot).await?;
            for (port, outcome) in &report.moves {
                println!("{port}: {outcome}");
            }
            for port in report.unmatched.keys() {
                println!("{port}: still on the wrong VLAN");
            }
            Ok(report.is_complete())
        }
        Commands::Power { port, state } => {
            let outcome = switch.set_power(port, state == "on").await;
            println!("{}: power {state} {outcome}", switch.name());
            Ok(outcome.is_success())
        }
        Commands::Label { port, label } => {
            let outcome = switch.set_label(port, label.as_deref().unwrap_or("")).await;
            println!("{}: port-name {outcome}", switch.name());
            Ok(outcome.is_success())
        }
        Commands::WriteMemory => {
            let outcome = switch.write_memory().await;
            println!("{}: write memory {outcome}", switch.name());
            Ok(outcome.is_success())
        }
        Commands::Watch { interval } => {
            watch(switch, max_age, Duration::from_secs(*interval)).await;
            Ok(true)
        }
        Commands::Run { .. } | Commands::Terminal { .. } => Ok(true),
    }
}

fn report_move(switch: &Switch, subject: &str, outcome: &MoveOutcome) -> bool {
    println!("{}: {subject} {outcome}", switch.name());
    if let MoveOutcome::Failed {
        failure: switchscope::switch::ChangeFailure::Escalation(_),
    } = outcome
    {
        eprintln!("Supply the enable password with --enable-password or the credentials file");
    }
    outcome.is_success()
}

fn show(switch: &Switch) {
    println!("{} ({})", switch.name(), switch.vendor());
    for (vlan, subnet) in switch.subnets() {
        println!("VLAN {vlan} [{}]", subnet.unwrap_or("no subnet"));
        let Some(vlan) = switch.vlan(vlan) else {
            continue;
        };
        for port in vlan.ports() {
            let power = switch
                .power()
                .get(port)
                .map(|p| format!(" power {p}"))
                .unwrap_or_default();
            let label = switch
                .labels()
                .get(port)
                .filter(|l| !l.is_empty())
                .map(|l| format!(" \"{l}\""))
                .unwrap_or_default();
            let devices: Vec<String> = vlan
                .devices()
                .iter()
                .filter(|(_, d)| &d.port == port)
                .map(|(name, _)| name.clone())
                .chain(
                    vlan.unknown_devices()
                        .iter()
                        .filter(|(_, u)| &u.port == port)
                        .map(|(mac, _)| mac.to_string()),
                )
                .collect();
            println!("  {port}{label}{power} {}", devices.join(", "));
        }
    }
}

async fn watch(switch: &mut Switch, max_age: Duration, interval: Duration) {
    info!("Watching {} every {:?}", switch.name(), interval);
    loop {
        if switch.refresh_due(max_age) {
            match switch.update().await {
                Ok(()) => match switch.survey().await {
                    Ok(misplaced) if misplaced.is_empty() => {
                        info!("{}: every device on its subnet", switch.name())
                    }
                    Ok(misplaced) => {
                        println!("{}: misplaced {}", switch.name(), misplaced.join(", "))
                    }
                    Err(e) => warn!("{}: survey failed: {}", switch.name(), e),
                },
                Err(e) => warn!("{}: refresh failed: {}", switch.name(), e),
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                return;
            }
        }
    }
}

async fn run_raw(
    login: &Login,
    vendor: Vendor,
    commands: &[String],
    hosts: &[String],
) -> switchscope::Result<bool> {
    let ssh = match &login.password {
        Some(password) => SshConfig::with_password(login.username.clone(), password.clone()),
        None => SshConfig {
            username: login.username.clone(),
            ..SshConfig::default()
        },
    };
    let runner = RunnerBuilder::new().ssh(ssh).vendor(vendor).build()?;
    let spec = CommandSpec::new(commands.iter().cloned());
    Ok(print_results(runner.run_each(hosts, &spec).await))
}

async fn run_terminal(login: &Login, commands: &[String], hosts: &[String]) -> switchscope::Result<bool> {
    let password = login
        .password
        .clone()
        .ok_or(ConfigError::Missing("password"))?;
    let connector = Arc::new(TelnetConnector::new(TelnetConfig::default()));
    let runner = TerminalServerRunner::new(connector, login.username.clone(), password);
    let spec = CommandSpec::new(commands.iter().cloned());
    Ok(print_results(runner.run_each(hosts, &spec).await))
}

/// Print each host's output and count failures.
fn print_results(results: Vec<(String, switchscope::Result<switchscope::RunOutput>)>) -> bool {
    let mut failed = Vec::new();
    for (host, result) in results {
        match result {
            Ok(output) => {
                println!("==== {host}");
                for command in &output.commands {
                    println!("# {}", command.command);
                    println!("{}", command.output);
                }
                if output.failure().is_some() {
                    failed.push(host);
                }
            }
            Err(e) => {
                error!("{}: {}", host, e);
                failed.push(host);
            }
        }
    }
    if !failed.is_empty() {
        eprintln!("{} host(s) failed: {}", failed.len(), failed.join(", "));
    }
    failed.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchscope::error::TransportError;

    #[test]
    fn test_timeout_in_hours() {
        assert_eq!(parse_hours("1").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_hours("0.5").unwrap(), Duration::from_secs(1800));
        assert!(parse_hours("-1").is_err());
        assert!(parse_hours("inf").is_err());
        assert!(parse_hours("1e300").is_err());
        assert!(parse_hours("soon").is_err());
    }

    #[test]
    fn test_bad_timeout_is_a_usage_error() {
        assert!(Cli::try_parse_from(["switchscope", "--timeout", "inf", "show"]).is_err());
        let cli = Cli::try_parse_from(["switchscope", "-s", "sw1", "show"]).unwrap();
        assert_eq!(cli.timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_failed_switch_does_not_stop_the_rest() {
        let results = vec![
            Ok(()),
            Err(TransportError::Disconnected.into()),
            Ok(()),
        ];

        let (loaded, failed) = split_loaded(vec!["sw1", "sw2", "sw3"], results);

        assert_eq!(loaded, vec!["sw1", "sw3"]);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "sw2");
    }
}
