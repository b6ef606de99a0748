// SPDX-License-Identifier: GPL-3.0-only
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::PciAddress;
use crate::error::EjectError;

/// Root of the kernel's PCI bus directory
pub const PCI_BUS_PATH: &str = "/sys/bus/pci";

/// Handle on a PCI bus directory in sysfs.
///
/// Production code uses [`SysfsTree::system`]; tests point it at a temporary
/// directory with the same `devices/` and `drivers/` layout.
#[derive(Debug, Clone)]
pub struct SysfsTree {
    devices: PathBuf,
    drivers: PathBuf,
}

/// Snapshot of one PCI device, read fresh from sysfs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PciDevice {
    pub address: PciAddress,
    /// Vendor identifier as printed by the kernel (e.g. "0x10de")
    pub vendor: String,
    /// Class code (e.g. "0x030000")
    pub class: String,
    /// Bound driver, None when unbound
    pub driver: Option<String>,
}

impl Default for SysfsTree {
    fn default() -> Self {
        Self::system()
    }
}

impl SysfsTree {
    pub fn system() -> Self {
        Self::with_root(PCI_BUS_PATH)
    }

    /// Use `root` in place of `/sys/bus/pci`
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            devices: root.join("devices"),
            drivers: root.join("drivers"),
        }
    }

    pub fn devices_dir(&self) -> &Path {
        &self.devices
    }

    pub fn device_dir(&self, address: &PciAddress) -> PathBuf {
        self.devices.join(address.as_str())
    }

    pub fn driver_dir(&self, driver: &str) -> PathBuf {
        self.drivers.join(driver)
    }

    /// Read and trim a device attribute such as `vendor` or `class`
    pub fn read_attr(&self, address: &PciAddress, attr: &str) -> io::Result<String> {
        fs::read_to_string(self.device_dir(address).join(attr)).map(|s| s.trim().to_string())
    }

    /// Name of the driver the device's `driver` link points at
    pub fn bound_driver(&self, address: &PciAddress) -> Option<String> {
        fs::read_link(self.device_dir(address).join("driver"))
            .ok()
            .and_then(|target| target.file_name().map(|n| n.to_string_lossy().to_string()))
    }

    /// Names of all entries under `devices/`, unvalidated
    pub fn entry_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.devices)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    /// Read the full record for `address`, None if any attribute is gone
    pub fn device(&self, address: &PciAddress) -> Option<PciDevice> {
        let vendor = self.read_attr(address, "vendor").ok()?;
        let class = self.read_attr(address, "class").ok()?;
        Some(PciDevice {
            address: address.clone(),
            vendor: vendor.to_ascii_lowercase(),
            class: class.to_ascii_lowercase(),
            driver: self.bound_driver(address),
        })
    }
}

/// Write `content` to an existing sysfs control file.
///
/// Control files are never created; a missing file is reported like any
/// other refused write.
pub(crate) fn write_control(path: &Path, content: &str) -> Result<(), EjectError> {
    let to_err = |source| EjectError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(to_err)?;
    file.write_all(content.as_bytes()).map_err(to_err)?;
    Ok(())
}
