// SPDX-License-Identifier: GPL-3.0-only
use crate::error::EjectError;
use crate::pci::{PciAddress, SysfsTree, write_control};

/// Ask the kernel to hot-remove `address` from the bus.
pub fn remove_device(sysfs: &SysfsTree, address: &PciAddress) -> Result<(), EjectError> {
    let remove_path = sysfs.device_dir(address).join("remove");
    if !remove_path.exists() {
        return Err(EjectError::RemoveUnsupported(remove_path));
    }

    write_control(&remove_path, "1\n")?;
    info!(address = %address, "Device removed from PCI bus");
    Ok(())
}
