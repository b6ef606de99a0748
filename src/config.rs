// SPDX-License-Identifier: GPL-3.0-only
//! Tray configuration
//!
//! Read from `$XDG_CONFIG_HOME/nvidia-eject-tray/config.kdl`:
//!
//! ```kdl
//! helper "/usr/local/libexec/nvidia-eject-helper"
//! escalation "pkexec"
//! helper-timeout-secs 120
//! refresh-interval-secs 30
//! workers 2
//! notifications #true
//! ```
//!
//! Every key is optional. A bad value is reported and its default kept.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kdl::{KdlDocument, KdlValue};

use crate::error::AppError;

pub const CONFIG_DIR: &str = "nvidia-eject-tray";
pub const CONFIG_FILE: &str = "config.kdl";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Explicit helper path; resolved automatically when None
    pub helper: Option<PathBuf>,
    /// Privilege escalation agent; None runs the helper directly
    pub escalation: Option<String>,
    pub helper_timeout: Duration,
    /// Periodic rescan; None disables it
    pub refresh_interval: Option<Duration>,
    pub workers: usize,
    pub notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            helper: None,
            escalation: Some("pkexec".to_string()),
            helper_timeout: Duration::from_secs(120),
            refresh_interval: Some(Duration::from_secs(30)),
            workers: 2,
            notifications: true,
        }
    }
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the user's config, falling back to defaults
    pub fn load() -> Result<Self, (Vec<AppError>, Self)> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, (Vec<AppError>, Self)> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err((vec![AppError::Io(e)], Self::default())),
        }
    }

    /// Parse KDL text; on error returns the errors alongside a usable config
    pub fn parse(text: &str) -> Result<Self, (Vec<AppError>, Self)> {
        let doc: KdlDocument = match text.parse() {
            Ok(doc) => doc,
            Err(e) => {
                return Err((
                    vec![AppError::Config(format!("invalid KDL: {e}"))],
                    Self::default(),
                ));
            }
        };

        let mut config = Self::default();
        let mut errs = Vec::new();

        if let Some(value) = doc.get_arg("helper") {
            match value.as_string() {
                Some(s) if !s.is_empty() => config.helper = Some(PathBuf::from(s)),
                _ => errs.push(invalid("helper", value)),
            }
        }

        if let Some(value) = doc.get_arg("escalation") {
            match value.as_string() {
                Some("") => config.escalation = None,
                Some(s) => config.escalation = Some(s.to_string()),
                None => errs.push(invalid("escalation", value)),
            }
        }

        if let Some(value) = doc.get_arg("helper-timeout-secs") {
            match secs(value) {
                Some(0) | None => errs.push(invalid("helper-timeout-secs", value)),
                Some(n) => config.helper_timeout = Duration::from_secs(n),
            }
        }

        if let Some(value) = doc.get_arg("refresh-interval-secs") {
            match secs(value) {
                Some(0) => config.refresh_interval = None,
                Some(n) => config.refresh_interval = Some(Duration::from_secs(n)),
                None => errs.push(invalid("refresh-interval-secs", value)),
            }
        }

        if let Some(value) = doc.get_arg("workers") {
            match secs(value).and_then(|n| usize::try_from(n).ok()) {
                Some(n) if n > 0 => config.workers = n,
                _ => errs.push(invalid("workers", value)),
            }
        }

        if let Some(value) = doc.get_arg("notifications") {
            match value.as_bool() {
                Some(b) => config.notifications = b,
                None => errs.push(invalid("notifications", value)),
            }
        }

        if errs.is_empty() {
            Ok(config)
        } else {
            Err((errs, config))
        }
    }
}

fn secs(value: &KdlValue) -> Option<u64> {
    value.as_integer().and_then(|n| u64::try_from(n).ok())
}

fn invalid(key: &str, value: &KdlValue) -> AppError {
    AppError::Config(format!("invalid value for {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_all_keys() {
        let config = Config::parse(
            r#"
            helper "/opt/eject/helper"
            escalation "doas"
            helper-timeout-secs 10
            refresh-interval-secs 5
            workers 4
            notifications #false
            "#,
        )
        .unwrap();

        assert_eq!(config.helper, Some(PathBuf::from("/opt/eject/helper")));
        assert_eq!(config.escalation.as_deref(), Some("doas"));
        assert_eq!(config.helper_timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(5)));
        assert_eq!(config.workers, 4);
        assert!(!config.notifications);
    }

    #[test]
    fn test_zero_and_empty_disable() {
        let config = Config::parse("escalation \"\"\nrefresh-interval-secs 0").unwrap();
        assert_eq!(config.escalation, None);
        assert_eq!(config.refresh_interval, None);
    }

    #[test]
    fn test_bad_value_keeps_default() {
        let (errs, config) = Config::parse("workers 0\nhelper-timeout-secs 30").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].to_string().contains("workers"));
        assert_eq!(config.workers, 2);
        assert_eq!(config.helper_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_kdl() {
        let (errs, config) = Config::parse("helper \"unterminated").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.kdl")).unwrap();
        assert_eq!(config, Config::default());
    }
}
