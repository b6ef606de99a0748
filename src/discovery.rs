// SPDX-License-Identifier: GPL-3.0-only
//! NVIDIA display controller discovery
//!
//! Every call walks sysfs from scratch; nothing is cached between scans, so
//! the result is only as stale as the moment it was taken. Devices that
//! disappear while a scan is running (unreadable attributes, half torn down
//! directories) are treated as absent rather than as errors.

use crate::pci::{DISPLAY_CLASS_PREFIX, NVIDIA_VENDOR_ID, PciAddress, PciDevice, SysfsTree};

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    sysfs: SysfsTree,
}

impl Scanner {
    pub fn new(sysfs: SysfsTree) -> Self {
        Self { sysfs }
    }

    /// Addresses of present NVIDIA display controllers, sorted
    pub fn list(&self) -> Vec<PciAddress> {
        self.devices().into_iter().map(|d| d.address).collect()
    }

    /// Full records for the same set of devices as [`Scanner::list`]
    pub fn devices(&self) -> Vec<PciDevice> {
        let names = match self.sysfs.entry_names() {
            Ok(names) => names,
            Err(e) => {
                debug!(
                    "Cannot list {}: {}",
                    self.sysfs.devices_dir().display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut addresses: Vec<PciAddress> = names
            .iter()
            .filter_map(|name| match PciAddress::parse(name) {
                Ok(addr) => Some(addr),
                Err(_) => {
                    debug!("Skipping non-PCI entry {:?}", name);
                    None
                }
            })
            .collect();
        addresses.sort();

        let devices: Vec<PciDevice> = addresses
            .iter()
            .filter_map(|addr| self.probe(addr))
            .collect();

        debug!("Discovery found {} NVIDIA display controller(s)", devices.len());
        devices
    }

    fn probe(&self, address: &PciAddress) -> Option<PciDevice> {
        let vendor = match self.sysfs.read_attr(address, "vendor") {
            Ok(vendor) => vendor.to_ascii_lowercase(),
            Err(e) => {
                debug!(address = %address, "Vendor unreadable, treating as absent: {}", e);
                return None;
            }
        };
        if vendor != NVIDIA_VENDOR_ID {
            return None;
        }

        // Audio (0x04) and other companion functions of the card are skipped
        let class = match self.sysfs.read_attr(address, "class") {
            Ok(class) => class.to_ascii_lowercase(),
            Err(e) => {
                debug!(address = %address, "Class unreadable, treating as absent: {}", e);
                return None;
            }
        };
        if !class.starts_with(DISPLAY_CLASS_PREFIX) {
            trace!(address = %address, class = %class, "Skipping non-display NVIDIA function");
            return None;
        }

        Some(PciDevice {
            address: address.clone(),
            vendor,
            class,
            driver: self.sysfs.bound_driver(address),
        })
    }
}
