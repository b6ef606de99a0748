// SPDX-License-Identifier: GPL-3.0-only
use crate::error::EjectError;
use crate::pci::{NVIDIA_VENDOR_ID, PciAddress, SysfsTree};

/// Check that `address` names a PCI device that is present and made by NVIDIA.
pub fn ensure_nvidia_device(sysfs: &SysfsTree, address: &PciAddress) -> Result<(), EjectError> {
    if !sysfs.device_dir(address).exists() {
        return Err(EjectError::DeviceNotFound(address.clone()));
    }

    let vendor = sysfs
        .read_attr(address, "vendor")
        .map_err(|_| EjectError::VendorUnknown(address.clone()))?;

    if !vendor.eq_ignore_ascii_case(NVIDIA_VENDOR_ID) {
        return Err(EjectError::NotNvidiaDevice {
            vendor,
            address: address.clone(),
        });
    }

    debug!(address = %address, vendor = %vendor, "Verified NVIDIA device");
    Ok(())
}
