// SPDX-License-Identifier: GPL-3.0-only
//! Safe hot-removal of NVIDIA GPUs through the kernel's PCI sysfs interface.
//!
//! The crate ships two binaries sharing this library:
//!
//! - `nvidia-eject-helper`: the privileged, single-shot helper that validates,
//!   unbinds and removes one PCI device.
//! - `nvidia-eject-tray`: the unprivileged front end that watches udev for PCI
//!   topology changes, lists NVIDIA display controllers and launches the
//!   helper through the escalation agent.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod discovery;
pub mod eject;
pub mod error;
pub mod hotplug;
pub mod logging;
#[cfg(feature = "desktop-notifications")]
pub mod notify;
pub mod pci;
pub mod pool;
pub mod runner;
pub mod tray;

#[cfg(test)]
pub(crate) mod fixture;
