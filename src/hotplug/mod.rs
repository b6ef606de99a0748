/// PCI hotplug detection using udev
///
/// Watches kernel events for the pci subsystem so the tray can rescan when a
/// GPU appears, disappears, or changes driver binding.

mod udev_monitor;

pub use udev_monitor::{Batch, HotplugMonitor, TopologyAction};
