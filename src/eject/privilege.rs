// SPDX-License-Identifier: GPL-3.0-only
use crate::error::EjectError;

/// Identity the helper is running under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub euid: u32,
}

impl Credentials {
    /// Credentials of the current process
    pub fn current() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        Self { euid }
    }

    pub fn root() -> Self {
        Self { euid: 0 }
    }

    pub fn is_root(&self) -> bool {
        self.euid == 0
    }
}

/// Refuse to continue unless running with root's effective uid
pub fn ensure_privileged(credentials: &Credentials) -> Result<(), EjectError> {
    if credentials.is_root() {
        Ok(())
    } else {
        debug!("Refusing to run with euid {}", credentials.euid);
        Err(EjectError::PermissionDenied)
    }
}
