//! What switch operations report back.
//!
//! Operations that change a switch never return `Err` for a refused or
//! unconfirmed change. They report it here instead so that a batch of moves
//! carries on past one bad port.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::snapshot::PortMove;

/// Why a change was not made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ChangeFailure {
    /// The port is on no untagged VLAN of this switch.
    UnknownPort(String),

    /// The destination VLAN is not configured on this switch.
    UnknownVlan(String),

    /// No device by this name was found on the switch.
    UnknownDevice(String),

    /// No VLAN on this switch carries this subnet.
    UnknownSubnet(String),

    /// A move needs a target VLAN or subnet.
    NoTarget,

    /// The enable password was missing or wrong; it has been forgotten.
    Escalation(String),

    /// The switch answered a command with an error marker.
    Rejected(String),

    /// The vendor cannot do this.
    Unsupported(String),

    /// The session failed (connection, timeout, ...).
    Session(String),
}

impl fmt::Display for ChangeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeFailure::UnknownPort(port) => write!(f, "port {port} is not on this switch"),
            ChangeFailure::UnknownVlan(vlan) => write!(f, "VLAN {vlan} is not on this switch"),
            ChangeFailure::UnknownDevice(name) => write!(f, "no device named {name} on switch"),
            ChangeFailure::UnknownSubnet(subnet) => {
                write!(f, "{subnet} was not found on this switch")
            }
            ChangeFailure::NoTarget => f.write_str("select either a target subnet or VLAN"),
            ChangeFailure::Escalation(message)
            | ChangeFailure::Rejected(message)
            | ChangeFailure::Unsupported(message)
            | ChangeFailure::Session(message) => f.write_str(message),
        }
    }
}

/// Result of moving a port (or a device's port) to another VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Already on the destination; nothing was sent.
    AlreadyThere,

    /// The commands were accepted; the result was not checked.
    Accepted,

    /// A fresh survey shows the port on the destination VLAN.
    Verified,

    /// The commands ran but a fresh survey shows the port elsewhere.
    Mismatch {
        expected: String,
        actual: Option<String>,
    },

    /// The commands ran but the switch could not be surveyed again.
    Unconfirmed { reason: String },

    /// The move did not go through. If the switch answered with an error
    /// part way through, some commands may have applied and the model is
    /// left stale.
    Failed { failure: ChangeFailure },
}

impl MoveOutcome {
    pub(crate) fn failed(failure: ChangeFailure) -> Self {
        MoveOutcome::Failed { failure }
    }

    /// The move went through (or was unnecessary).
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            MoveOutcome::AlreadyThere | MoveOutcome::Accepted | MoveOutcome::Verified
        )
    }
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOutcome::AlreadyThere => f.write_str("already on the destination VLAN"),
            MoveOutcome::Accepted => f.write_str("commands accepted (not verified)"),
            MoveOutcome::Verified => f.write_str("moved and verified"),
            MoveOutcome::Mismatch { expected, actual } => write!(
                f,
                "move unconfirmed: expected VLAN {expected}, port is on {}",
                actual.as_deref().unwrap_or("no VLAN")
            ),
            MoveOutcome::Unconfirmed { reason } => write!(f, "move unconfirmed: {reason}"),
            MoveOutcome::Failed { failure } => write!(f, "failed: {failure}"),
        }
    }
}

/// Result of a power, port name or write memory change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChangeOutcome {
    Applied,
    Failed { failure: ChangeFailure },
}

impl ChangeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChangeOutcome::Applied)
    }
}

impl From<Result<(), ChangeFailure>> for ChangeOutcome {
    fn from(result: Result<(), ChangeFailure>) -> Self {
        match result {
            Ok(()) => ChangeOutcome::Applied,
            Err(failure) => ChangeOutcome::Failed { failure },
        }
    }
}

impl fmt::Display for ChangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOutcome::Applied => f.write_str("applied"),
            ChangeOutcome::Failed { failure } => write!(f, "failed: {failure}"),
        }
    }
}

/// Result of applying a saved configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    /// Every port move attempted, in order.
    pub moves: IndexMap<String, MoveOutcome>,

    /// Ports still not on their saved VLAN after the refresh.
    pub unmatched: IndexMap<String, PortMove>,
}

impl ApplyReport {
    /// True when every saved port is back where it was.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Result of moving misplaced devices onto their directory subnets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoConfigureReport {
    /// Devices the first survey found on the wrong subnet.
    pub misplaced: Vec<String>,

    /// Devices whose move commands were accepted.
    pub moved: Vec<String>,

    /// Devices that could not be moved (no VLAN for their subnet here, ...).
    pub unmovable: Vec<String>,

    /// Devices the final survey still finds on the wrong subnet.
    pub still_misplaced: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_outcome_success() {
        assert!(MoveOutcome::AlreadyThere.is_success());
        assert!(MoveOutcome::Accepted.is_success());
        assert!(
            !MoveOutcome::Mismatch {
                expected: "20".to_string(),
                actual: Some("10".to_string())
            }
            .is_success()
        );
        assert!(!MoveOutcome::failed(ChangeFailure::UnknownPort("1/1/9".to_string())).is_success());
    }

    #[test]
    fn test_serialized_shape() {
        let outcome = MoveOutcome::failed(ChangeFailure::UnknownVlan("99".to_string()));
        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#"{"outcome":"failed","failure":{"reason":"unknown_vlan","detail":"99"}}"#
        );
    }
}
