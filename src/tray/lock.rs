// SPDX-License-Identifier: GPL-3.0-only
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const LOCK_NAME: &str = "nvidia-eject-tray.lock";

/// Exclusive lock ensuring only one tray watches udev and launches ejects.
///
/// Held for as long as the value lives; the kernel drops the `flock` when
/// the file is closed.
#[derive(Debug)]
pub struct InstanceLock {
    _file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Lock file in the user's runtime dir, `/tmp` if there is none
    pub fn default_path() -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(LOCK_NAME)
    }

    pub fn acquire(path: &Path) -> Result<Self> {
        let file = File::create(path)?;

        // SAFETY: the fd is valid for the lifetime of `file`
        let lock_result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };

        if lock_result != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                info!("Tray lock {} is held by another instance", path.display());
                return Err(AppError::AlreadyRunning);
            }
            error!("Failed to acquire tray lock: {}", err);
            return Err(AppError::Io(err));
        }

        debug!("Acquired tray lock {}", path.display());
        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_instance_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCK_NAME);

        let first = InstanceLock::acquire(&path).unwrap();
        assert_eq!(first.path(), path);
        assert!(matches!(
            InstanceLock::acquire(&path),
            Err(AppError::AlreadyRunning)
        ));

        drop(first);
        assert!(InstanceLock::acquire(&path).is_ok());
    }
}
