//! PCI addresses and the sysfs view of PCI devices

mod address;
mod sysfs;

pub use address::PciAddress;
pub use sysfs::{PciDevice, SysfsTree, PCI_BUS_PATH};
pub(crate) use sysfs::write_control;

/// Vendor identifier of NVIDIA Corporation as sysfs prints it
pub const NVIDIA_VENDOR_ID: &str = "0x10de";

/// Class-code prefix of display controllers (VGA, 3D, other display)
pub const DISPLAY_CLASS_PREFIX: &str = "0x03";
