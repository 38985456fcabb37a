//! Switch families and how to recognise them.

use std::fmt;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};

use super::vendors::{arista, cisco, foundry};
use super::{PlatformDefinition, Vocabulary};
use crate::error::PlatformError;

/// Supported switch families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Cisco,
    Arista,
    Brocade,
    Ruckus,
}

impl Vendor {
    /// Every vendor, in the order descriptions are matched.
    pub const ALL: [Vendor; 4] = [Vendor::Arista, Vendor::Brocade, Vendor::Ruckus, Vendor::Cisco];

    /// Lowercase name as it appears in directory descriptions.
    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::Cisco => "cisco",
            Vendor::Arista => "arista",
            Vendor::Brocade => "brocade",
            Vendor::Ruckus => "ruckus",
        }
    }

    /// Pick the vendor named in a directory description.
    pub fn from_description(name: &str, description: &str) -> Result<Self, PlatformError> {
        let lowered = description.to_lowercase();
        match Self::ALL.into_iter().find(|v| lowered.contains(v.as_str())) {
            Some(vendor) => {
                let article = if vendor.as_str().starts_with(['a', 'e', 'i', 'o', 'u']) {
                    "an"
                } else {
                    "a"
                };
                info!("{name} is {article} {vendor} switch.");
                Ok(vendor)
            }
            None => Err(PlatformError::UnknownVendor {
                name: name.to_string(),
                description: description.to_string(),
                supported: Self::ALL.map(Vendor::as_str).join(", "),
            }),
        }
    }

    /// Session definition for this vendor.
    pub fn platform(self) -> PlatformDefinition {
        match self {
            Vendor::Cisco => cisco::platform(),
            Vendor::Arista => arista::platform(),
            Vendor::Brocade => foundry::brocade_platform(),
            Vendor::Ruckus => foundry::ruckus_platform(),
        }
    }

    /// Survey commands and parsers for this vendor.
    pub fn vocabulary(self) -> Vocabulary {
        match self {
            Vendor::Cisco => cisco::vocabulary(),
            Vendor::Arista => arista::vocabulary(),
            Vendor::Brocade => foundry::brocade_vocabulary(),
            Vendor::Ruckus => foundry::ruckus_vocabulary(),
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlatformError::UnknownType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_description() {
        assert_eq!(
            Vendor::from_description("sw1", "Ruckus ICX7150-48P B34").unwrap(),
            Vendor::Ruckus
        );
        assert_eq!(
            Vendor::from_description("core1", "ARISTA 7050 core").unwrap(),
            Vendor::Arista
        );
    }

    #[test]
    fn test_unknown_description_names_supported() {
        let err = Vendor::from_description("sw9", "Juniper EX2200").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Juniper EX2200"));
        assert!(message.contains("arista, brocade, ruckus, cisco"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Brocade".parse::<Vendor>().unwrap(), Vendor::Brocade);
        assert!("hp".parse::<Vendor>().is_err());
    }
}
