// SPDX-License-Identifier: GPL-3.0-only
//! Background eject jobs
//!
//! Ejects run as tasks bounded by a semaphore. An address with an eject
//! still outstanding cannot be submitted again, so two clicks on the same
//! GPU never race each other's sysfs writes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::{Semaphore, mpsc};

use crate::error::{AppError, Result};
use crate::pci::PciAddress;
use crate::runner::HelperInvocation;

/// Result of one eject attempt, handed to the tray loop once
#[derive(Debug)]
pub struct EjectOutcome {
    pub address: PciAddress,
    pub result: Result<String>,
}

type InFlight = Arc<Mutex<HashSet<PciAddress>>>;

pub struct EjectPool {
    invocation: Arc<HelperInvocation>,
    permits: Arc<Semaphore>,
    in_flight: InFlight,
    completions: mpsc::UnboundedSender<EjectOutcome>,
}

/// Releases an address from the in-flight set when the job ends
struct InFlightGuard {
    address: PciAddress,
    in_flight: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.address);
    }
}

impl EjectPool {
    pub fn new(
        invocation: HelperInvocation,
        workers: usize,
        completions: mpsc::UnboundedSender<EjectOutcome>,
    ) -> Self {
        Self {
            invocation: Arc::new(invocation),
            permits: Arc::new(Semaphore::new(workers.max(1))),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            completions,
        }
    }

    #[cfg(test)]
    fn is_in_flight(&self, address: &PciAddress) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(address)
    }

    /// Number of ejects queued or running
    pub fn outstanding(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Queue an eject of `address`.
    ///
    /// Fails with `EjectInProgress` if the same address is already queued or
    /// running. Must be called from within a tokio runtime.
    pub fn submit(&self, address: PciAddress) -> Result<()> {
        {
            let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if !set.insert(address.clone()) {
                warn!("Eject of {} already in progress, ignoring request", address);
                return Err(AppError::EjectInProgress(address));
            }
        }

        let guard = InFlightGuard {
            address: address.clone(),
            in_flight: self.in_flight.clone(),
        };
        let invocation = self.invocation.clone();
        let permits = self.permits.clone();
        let completions = self.completions.clone();

        tokio::spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => invocation.run(&address).await,
                Err(_) => Err(AppError::HelperFailed("eject pool shut down".to_string())),
            };

            drop(guard);
            if completions.send(EjectOutcome { address, result }).is_err() {
                debug!("Tray loop gone, dropping eject outcome");
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::runner::tests::script;

    fn addr(s: &str) -> PciAddress {
        PciAddress::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_duplicate_in_flight_address() {
        let dir = tempfile::tempdir().unwrap();
        let inv = script(&dir, "sleep 0.3\necho \"Ejected NVIDIA GPU: $1\"\n", Duration::from_secs(10));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = EjectPool::new(inv, 2, tx);

        pool.submit(addr("0000:01:00.0")).unwrap();
        assert!(pool.is_in_flight(&addr("0000:01:00.0")));
        assert!(matches!(
            pool.submit(addr("0000:01:00.0")),
            Err(AppError::EjectInProgress(_))
        ));

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.address, addr("0000:01:00.0"));
        assert_eq!(outcome.result.unwrap(), "Ejected NVIDIA GPU: 0000:01:00.0");
        assert!(!pool.is_in_flight(&addr("0000:01:00.0")));

        // Accepted again once the first attempt is done
        pool.submit(addr("0000:01:00.0")).unwrap();
        assert!(rx.recv().await.unwrap().result.is_ok());
    }

    #[tokio::test]
    async fn test_distinct_addresses_run_independently() {
        let dir = tempfile::tempdir().unwrap();
        let inv = script(&dir, "echo \"Ejected NVIDIA GPU: $1\"\n", Duration::from_secs(10));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = EjectPool::new(inv, 1, tx);

        pool.submit(addr("0000:01:00.0")).unwrap();
        pool.submit(addr("0000:02:00.0")).unwrap();

        let mut done = vec![rx.recv().await.unwrap().address, rx.recv().await.unwrap().address];
        done.sort();
        assert_eq!(done, [addr("0000:01:00.0"), addr("0000:02:00.0")]);
    }

    #[tokio::test]
    async fn test_failure_is_delivered_and_released() {
        let dir = tempfile::tempdir().unwrap();
        let inv = script(&dir, "echo \"PCI device not found: $1\" >&2\nexit 1\n", Duration::from_secs(10));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = EjectPool::new(inv, 2, tx);

        pool.submit(addr("0000:03:00.0")).unwrap();
        let outcome = rx.recv().await.unwrap();
        assert!(matches!(
            outcome.result,
            Err(AppError::HelperFailed(ref m)) if m == "PCI device not found: 0000:03:00.0"
        ));
        assert!(!pool.is_in_flight(&addr("0000:03:00.0")));
    }
}
