// SPDX-License-Identifier: GPL-3.0-only
//! Launching the privileged helper
//!
//! The tray never touches sysfs control files itself. Each eject is one
//! `<escalation> <helper> <address>` process whose exit status and captured
//! output are handed back exactly once.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pci::PciAddress;

/// Where package installs put the helper
pub const INSTALLED_HELPER: &str = "/usr/local/libexec/nvidia-eject-helper";
pub const HELPER_NAME: &str = "nvidia-eject-helper";

#[derive(Debug, Clone)]
pub struct HelperInvocation {
    pub escalation: Option<String>,
    pub helper: PathBuf,
    pub timeout: Duration,
}

impl HelperInvocation {
    pub fn from_config(config: &Config) -> Self {
        Self {
            escalation: config.escalation.clone(),
            helper: config.helper.clone().unwrap_or_else(resolve_helper),
            timeout: config.helper_timeout,
        }
    }

    fn command(&self, address: &PciAddress) -> Command {
        let mut cmd = match &self.escalation {
            Some(agent) => {
                let mut cmd = Command::new(agent);
                cmd.arg(&self.helper);
                cmd
            }
            None => Command::new(&self.helper),
        };
        cmd.arg(address.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn program(&self) -> String {
        match &self.escalation {
            Some(agent) => agent.clone(),
            None => self.helper.display().to_string(),
        }
    }

    /// Run the helper for `address` and wait for it, at most `timeout`.
    ///
    /// Returns the helper's confirmation line on success. A non-zero exit
    /// yields its diagnostic text verbatim.
    pub async fn run(&self, address: &PciAddress) -> Result<String> {
        info!("Launching eject helper {} for {}", self.helper.display(), address);

        let child = self
            .command(address)
            .spawn()
            .map_err(|source| AppError::HelperSpawn {
                program: self.program(),
                source,
            })?;

        // Dropping the future on timeout kills the child (kill_on_drop)
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                error!("Eject helper for {} timed out after {:?}", address, self.timeout);
                return Err(AppError::HelperTimeout {
                    address: address.clone(),
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            info!("Eject helper succeeded: {}", stdout);
            return Ok(stdout);
        }

        let message = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            "unknown error".to_string()
        };
        warn!(
            "Eject helper for {} failed ({}): {}",
            address, output.status, message
        );
        Err(AppError::HelperFailed(message))
    }
}

/// Installed helper if present, otherwise the one shipped next to this binary
pub fn resolve_helper() -> PathBuf {
    let installed = Path::new(INSTALLED_HELPER);
    if installed.exists() {
        return installed.to_path_buf();
    }

    match std::env::current_exe() {
        Ok(exe) => exe.with_file_name(HELPER_NAME),
        Err(e) => {
            warn!("Cannot locate own executable ({}), using {} from PATH", e, HELPER_NAME);
            PathBuf::from(HELPER_NAME)
        }
    }
}
