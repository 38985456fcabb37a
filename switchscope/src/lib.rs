//! # Switchscope
//!
//! Async VLAN and port survey for Cisco, Arista, Brocade and Ruckus switches.
//!
//! Switchscope drives a switch's interactive CLI over SSH (or a terminal
//! server over Telnet) the way an operator would, parses what comes back into
//! VLAN, MAC, PoE and port name tables, and keeps a model of which directory
//! hosts sit on which VLAN. From that model it can report devices on the wrong
//! subnet, move ports between VLANs and verify the move, and save, diff and
//! re-apply whole VLAN layouts.
//!
//! ## Layers
//!
//! - [`transport`]: SSH (russh) and Telnet shells behind `Connector`/`Transport`
//! - [`channel`]: line assembly, terminal noise removal, prompt matching
//! - [`driver`]: one-session command runs with vendor open/close hooks
//! - [`platform`]: per-vendor prompts, commands and output grammar
//! - [`survey`]: table parsing
//! - [`directory`]: host lookup by name, attribute and MAC
//! - [`switch`]: the VLAN model and the operations that change it
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use secrecy::SecretString;
//! use switchscope::directory::{DirectoryCache, StaticDirectory};
//! use switchscope::{MoveOutcome, SwitchBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchscope::Error> {
//!     let hosts = StaticDirectory::from_file("config/hosts.json")?;
//!     let mut switch = SwitchBuilder::new("switch-b34-01")
//!         .username("admin")
//!         .password(SecretString::from("secret".to_string()))
//!         .directory(Arc::new(DirectoryCache::new(Arc::new(hosts))))
//!         .build()
//!         .await?;
//!
//!     switch.update().await?;
//!     match switch.move_port("1/1/3", "310", true).await {
//!         MoveOutcome::Verified => println!("moved"),
//!         other => println!("not moved: {other}"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod directory;
pub mod driver;
pub mod error;
pub mod platform;
pub mod survey;
pub mod switch;
pub mod transport;

// Re-export main types for convenience
pub use driver::{CommandRunner, CommandSpec, RunOutput, RunnerBuilder, SessionRunner};
pub use error::{Error, Result};
pub use platform::{PlatformDefinition, Vendor};
pub use survey::{MacAddress, Surveyor};
pub use switch::{
    ChangeOutcome, ConfigurationSnapshot, MoveOutcome, MoveTarget, Switch, SwitchBuilder,
    SwitchState, refresh_all,
};
pub use transport::{AuthMethod, SshConfig};
