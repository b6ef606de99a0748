// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the helper and the tray
//!
//! `EjectError` is the taxonomy of the privileged helper: every variant is
//! terminal for the attempt in progress and is reported as a single line on
//! stderr. `AppError` covers the unprivileged side (launching the helper,
//! configuration, single-instance locking).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::pci::PciAddress;

/// Failure of a single eject attempt inside the helper
#[derive(Error, Debug)]
pub enum EjectError {
    #[error("Usage: nvidia-eject-helper <PCI_ID>")]
    Usage,

    #[error("Invalid PCI ID format: {0}")]
    InvalidFormat(String),

    #[error("This helper must run as root (use pkexec).")]
    PermissionDenied,

    #[error("PCI device not found: {0}")]
    DeviceNotFound(PciAddress),

    #[error("Vendor file missing for device: {0}")]
    VendorUnknown(PciAddress),

    #[error("Device is not NVIDIA (vendor={vendor}): {address}")]
    NotNvidiaDevice { vendor: String, address: PciAddress },

    #[error("Remove interface not found: {}", .0.display())]
    RemoveUnsupported(PathBuf),

    /// A sysfs control file existed but the write was refused
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EjectError {
    /// Process exit code the helper reports for this failure
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Errors raised by the unprivileged tray process
#[derive(Error, Debug)]
pub enum AppError {
    /// The helper ran and reported a failure; the text is its diagnostic, verbatim
    #[error("{0}")]
    HelperFailed(String),

    #[error("Eject helper did not finish within {timeout:?} for {address}")]
    HelperTimeout {
        address: PciAddress,
        timeout: Duration,
    },

    #[error("Failed to launch {program}: {source}")]
    HelperSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("An eject is already in progress for {0}")]
    EjectInProgress(PciAddress),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Another nvidia-eject-tray instance is already running")]
    AlreadyRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;
