// SPDX-License-Identifier: GPL-3.0-only
//! Privileged eject sequence
//!
//! One helper invocation walks a linear state machine:
//!
//! `Validate → PrivilegeCheck → Verify → Unbind → Remove → Done`
//!
//! A failing step ends the run in `Failed` and nothing after it executes.
//! There are no retries and no compensating rebind if removal fails after the
//! driver was already detached.

mod privilege;
mod remove;
mod unbind;
mod verify;

use std::ffi::OsString;
use std::fmt;

pub use privilege::{Credentials, ensure_privileged};
pub use remove::remove_device;
pub use unbind::{Unbound, unbind_driver};
pub use verify::ensure_nvidia_device;

use crate::error::EjectError;
use crate::pci::{PciAddress, SysfsTree};

/// Successful eject of one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ejected {
    pub address: PciAddress,
    pub unbound: Unbound,
}

impl fmt::Display for Ejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ejected NVIDIA GPU: {}", self.address)
    }
}

/// Position of a run in the eject sequence
#[derive(Debug)]
pub enum EjectState {
    Validate(String),
    PrivilegeCheck(PciAddress),
    Verify(PciAddress),
    Unbind(PciAddress),
    Remove(PciAddress, Unbound),
    Done(Ejected),
    Failed(EjectError),
}

impl EjectState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EjectState::Done(_) | EjectState::Failed(_))
    }

    fn name(&self) -> &'static str {
        match self {
            EjectState::Validate(_) => "validate",
            EjectState::PrivilegeCheck(_) => "privilege-check",
            EjectState::Verify(_) => "verify",
            EjectState::Unbind(_) => "unbind",
            EjectState::Remove(..) => "remove",
            EjectState::Done(_) => "done",
            EjectState::Failed(_) => "failed",
        }
    }
}

/// Runs the eject sequence against a sysfs tree with given credentials
pub struct Ejector {
    sysfs: SysfsTree,
    credentials: Credentials,
}

impl Ejector {
    pub fn new(sysfs: SysfsTree, credentials: Credentials) -> Self {
        Self { sysfs, credentials }
    }

    /// Ejector for the live system and the current process identity
    pub fn system() -> Self {
        Self::new(SysfsTree::system(), Credentials::current())
    }

    /// Advance `state` by exactly one step.
    ///
    /// Terminal states are returned unchanged.
    pub fn step(&self, state: EjectState) -> EjectState {
        let from = state.name();
        let next = match state {
            EjectState::Validate(raw) => match PciAddress::parse(&raw) {
                Ok(address) => EjectState::PrivilegeCheck(address),
                Err(e) => EjectState::Failed(e),
            },
            EjectState::PrivilegeCheck(address) => match ensure_privileged(&self.credentials) {
                Ok(()) => EjectState::Verify(address),
                Err(e) => EjectState::Failed(e),
            },
            EjectState::Verify(address) => match ensure_nvidia_device(&self.sysfs, &address) {
                Ok(()) => EjectState::Unbind(address),
                Err(e) => EjectState::Failed(e),
            },
            EjectState::Unbind(address) => match unbind_driver(&self.sysfs, &address) {
                Ok(unbound) => EjectState::Remove(address, unbound),
                Err(e) => EjectState::Failed(e),
            },
            EjectState::Remove(address, unbound) => match remove_device(&self.sysfs, &address) {
                Ok(()) => EjectState::Done(Ejected { address, unbound }),
                Err(e) => EjectState::Failed(e),
            },
            terminal => return terminal,
        };
        debug!("eject: {} -> {}", from, next.name());
        next
    }

    /// Drive a run for `raw` to its terminal state
    pub fn run(&self, raw: &str) -> Result<Ejected, EjectError> {
        let mut state = EjectState::Validate(raw.to_string());
        while !state.is_terminal() {
            state = self.step(state);
        }
        match state {
            EjectState::Done(ejected) => {
                info!("{}", ejected);
                Ok(ejected)
            }
            EjectState::Failed(e) => {
                warn!("Eject of {:?} failed: {}", raw, e);
                Err(e)
            }
            _ => unreachable!("loop exits only on terminal states"),
        }
    }

    /// Entry point of the helper binary: `args` excludes the program name.
    ///
    /// Arguments are taken as OS strings; bytes that are not UTF-8 are
    /// replaced and then rejected by validation.
    pub fn run_cli<I>(&self, args: I) -> Result<Ejected, EjectError>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        match (args.next(), args.next()) {
            (Some(raw), None) => self.run(&raw.to_string_lossy()),
            _ => Err(EjectError::Usage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FakeSysfs;

    const UNPRIVILEGED: Credentials = Credentials { euid: 1000 };

    fn gpu(fake: &FakeSysfs, vendor: &str) -> PciAddress {
        let addr = fake.add_device("0000:01:00.0", vendor, "0x030000");
        fake.bind(&addr, "nvidia");
        addr
    }

    #[test]
    fn test_end_to_end_success() {
        let fake = FakeSysfs::new();
        let addr = gpu(&fake, "0x10de");
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let ejected = ejector.run_cli(["0000:01:00.0".to_string()]).unwrap();
        assert_eq!(ejected.to_string(), "Ejected NVIDIA GPU: 0000:01:00.0");
        assert_eq!(ejected.unbound, Unbound::Detached("nvidia".to_string()));
        assert_eq!(fake.read(&fake.unbind_path("nvidia")), "0000:01:00.0\n");
        assert_eq!(fake.read(&fake.remove_path(&addr)), "1\n");
    }

    #[test]
    fn test_upper_case_input_is_canonicalized() {
        let fake = FakeSysfs::new();
        let addr = fake.add_device("0000:0a:00.0", "0x10de", "0x030000");
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let ejected = ejector.run("0000:0A:00.0").unwrap();
        assert_eq!(ejected.address, addr);
        assert_eq!(ejected.unbound, Unbound::AlreadyUnbound);
    }

    #[test]
    fn test_unbind_happens_before_remove() {
        let fake = FakeSysfs::new();
        let addr = gpu(&fake, "0x10de");
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let mut state = EjectState::Validate(addr.to_string());
        while !matches!(state, EjectState::Remove(..)) {
            assert!(!state.is_terminal(), "ended early: {state:?}");
            state = ejector.step(state);
        }
        assert_eq!(fake.read(&fake.unbind_path("nvidia")), "0000:01:00.0\n");
        assert_eq!(fake.read(&fake.remove_path(&addr)), "");

        let state = ejector.step(state);
        assert!(matches!(state, EjectState::Done(_)));
        assert_eq!(fake.read(&fake.remove_path(&addr)), "1\n");
    }

    #[test]
    fn test_vendor_mismatch_writes_nothing() {
        let fake = FakeSysfs::new();
        let addr = gpu(&fake, "0x1002");
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let err = ejector.run("0000:01:00.0").unwrap_err();
        assert!(err.to_string().contains("not NVIDIA"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fake.read(&fake.unbind_path("nvidia")), "");
        assert_eq!(fake.read(&fake.remove_path(&addr)), "");
    }

    #[test]
    fn test_unprivileged_writes_nothing() {
        let fake = FakeSysfs::new();
        let addr = gpu(&fake, "0x10de");
        let ejector = Ejector::new(fake.tree(), UNPRIVILEGED);

        let err = ejector.run("0000:01:00.0").unwrap_err();
        assert!(matches!(err, EjectError::PermissionDenied));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fake.read(&fake.unbind_path("nvidia")), "");
        assert_eq!(fake.read(&fake.remove_path(&addr)), "");
    }

    #[test]
    fn test_invalid_address_fails_before_privilege_check() {
        let fake = FakeSysfs::new();
        let ejector = Ejector::new(fake.tree(), UNPRIVILEGED);

        let state = ejector.step(EjectState::Validate("not-an-address".to_string()));
        assert!(matches!(state, EjectState::Failed(EjectError::InvalidFormat(_))));
    }

    #[test]
    fn test_remove_unsupported_is_final() {
        let fake = FakeSysfs::new();
        let addr = gpu(&fake, "0x10de");
        fake.drop_attr(&addr, "remove");
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let err = ejector.run("0000:01:00.0").unwrap_err();
        assert!(matches!(err, EjectError::RemoveUnsupported(_)));
        // Already unbound at this point; no rebind is attempted
        assert_eq!(fake.read(&fake.unbind_path("nvidia")), "0000:01:00.0\n");
        assert!(!fake.remove_path(&addr).exists());
    }

    #[test]
    fn test_terminal_state_does_not_advance() {
        let fake = FakeSysfs::new();
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let state = ejector.step(EjectState::Failed(EjectError::PermissionDenied));
        assert!(matches!(state, EjectState::Failed(EjectError::PermissionDenied)));
    }

    #[test]
    fn test_cli_requires_exactly_one_argument() {
        let fake = FakeSysfs::new();
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        assert!(matches!(ejector.run_cli(Vec::<String>::new()), Err(EjectError::Usage)));
        assert!(matches!(
            ejector.run_cli(["0000:01:00.0".to_string(), "extra".to_string()]),
            Err(EjectError::Usage)
        ));
    }

    #[test]
    fn test_cli_non_utf8_argument_is_invalid_format() {
        use std::os::unix::ffi::OsStringExt;

        let fake = FakeSysfs::new();
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let arg = OsString::from_vec(vec![0x30, 0xff, 0x3a]);
        let err = ejector.run_cli([arg]).unwrap_err();
        assert!(matches!(err, EjectError::InvalidFormat(_)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string().lines().count(), 1);
    }

    #[test]
    fn test_missing_device_reports_not_found() {
        let fake = FakeSysfs::new();
        let ejector = Ejector::new(fake.tree(), Credentials::root());

        let err = ejector.run("0000:05:00.0").unwrap_err();
        assert_eq!(err.to_string(), "PCI device not found: 0000:05:00.0");
    }
}
