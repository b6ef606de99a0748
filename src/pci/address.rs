// SPDX-License-Identifier: GPL-3.0-only
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EjectError;

/// `domain:bus:device.function`, e.g. `0000:01:00.0`
static PCI_ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{4}:[0-9A-Fa-f]{2}:[0-9A-Fa-f]{2}\.[0-7]$")
        .expect("Invalid PCI address regex")
});

/// A validated, lower-cased PCI address.
///
/// The only way to obtain one is through [`PciAddress::parse`], so any value
/// of this type is safe to join onto a sysfs path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PciAddress(String);

impl PciAddress {
    /// Validate `raw` and return its canonical (lower-case) form.
    pub fn parse(raw: &str) -> Result<Self, EjectError> {
        if !PCI_ADDRESS_REGEX.is_match(raw) {
            return Err(EjectError::InvalidFormat(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PciAddress {
    type Err = EjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PciAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
