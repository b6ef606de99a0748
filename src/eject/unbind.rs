// SPDX-License-Identifier: GPL-3.0-only
use crate::error::EjectError;
use crate::pci::{PciAddress, SysfsTree, write_control};

/// What the unbind step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unbound {
    /// Address written to the driver's unbind control
    Detached(String),
    /// No driver currently claims the device
    AlreadyUnbound,
    /// The driver exposes no unbind control
    NoControl(String),
}

/// Detach `address` from whatever driver currently owns it.
///
/// Idempotent: an unbound device, or a driver without an `unbind` file, is
/// not an error.
pub fn unbind_driver(sysfs: &SysfsTree, address: &PciAddress) -> Result<Unbound, EjectError> {
    let Some(driver) = sysfs.bound_driver(address) else {
        debug!(address = %address, "No driver bound, nothing to unbind");
        return Ok(Unbound::AlreadyUnbound);
    };

    let driver_dir = sysfs.driver_dir(&driver);
    if !driver_dir.join(address.as_str()).exists() {
        debug!(address = %address, driver = %driver, "Driver does not list device");
        return Ok(Unbound::AlreadyUnbound);
    }

    let unbind_path = driver_dir.join("unbind");
    if !unbind_path.exists() {
        warn!(driver = %driver, "Driver has no unbind control, skipping unbind");
        return Ok(Unbound::NoControl(driver));
    }

    debug!(address = %address, driver = %driver, "Unbinding from driver");
    write_control(&unbind_path, &format!("{address}\n"))?;
    info!(address = %address, driver = %driver, "Device unbound");

    Ok(Unbound::Detached(driver))
}
