// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Monitor configuration, loaded from TOML.

use crate::enumerator::pnp::DEFAULT_NAME_PATTERNS;
use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Enumeration backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Windows Device Manager via PowerShell
    Pnp,
    Adb,
    Fastboot,
    /// Linux `/sys/bus/usb/devices`
    Sysfs,
    /// User-supplied command from the `[command]` table
    Command,
}

impl BackendKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "pnp" | "wmi" | "devmgmt" => Ok(Self::Pnp),
            "adb" => Ok(Self::Adb),
            "fastboot" => Ok(Self::Fastboot),
            "sysfs" | "usb" => Ok(Self::Sysfs),
            "command" | "cmd" => Ok(Self::Command),
            other => Err(MonitorError::Configuration(format!(
                "unknown backend '{}'. Supported: pnp, adb, fastboot, sysfs, command",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pnp => "pnp",
            Self::Adb => "adb",
            Self::Fastboot => "fastboot",
            Self::Sysfs => "sysfs",
            Self::Command => "command",
        }
    }

    /// Backends that make sense on the current platform.
    pub fn platform_defaults() -> Vec<Self> {
        if cfg!(windows) {
            vec![Self::Pnp]
        } else if cfg!(target_os = "linux") {
            vec![Self::Sysfs, Self::Adb, Self::Fastboot]
        } else {
            vec![Self::Adb, Self::Fastboot]
        }
    }
}

/// Program and arguments for the `command` backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
    /// Seconds between status events; 0 disables them.
    pub status_interval_secs: u64,
    /// Timeout for each external command; 0 waits indefinitely.
    pub command_timeout_secs: u64,
    /// Consecutive enumeration failures before a warning is logged.
    pub failure_warn_threshold: u32,
    pub bell: bool,
    pub backends: Vec<BackendKind>,
    pub name_patterns: Vec<String>,
    pub command: Option<CommandSpec>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            status_interval_secs: 30,
            command_timeout_secs: 10,
            failure_warn_threshold: 3,
            bell: true,
            backends: BackendKind::platform_defaults(),
            name_patterns: DEFAULT_NAME_PATTERNS.iter().map(|s| s.to_string()).collect(),
            command: None,
        }
    }
}

impl MonitorConfig {
    /// Load from TOML file
    pub fn from_toml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Configuration(format!("Cannot read {}: {}", path, e)))?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| MonitorError::Configuration(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(MonitorError::Configuration(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.failure_warn_threshold == 0 {
            return Err(MonitorError::Configuration(
                "failure_warn_threshold must be greater than zero".to_string(),
            ));
        }
        if self.backends.is_empty() {
            return Err(MonitorError::Configuration(
                "at least one backend is required".to_string(),
            ));
        }
        if self.backends.contains(&BackendKind::Command) && self.command.is_none() {
            return Err(MonitorError::Configuration(
                "backend \"command\" needs a [command] table".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn status_interval(&self) -> Option<Duration> {
        (self.status_interval_secs > 0).then(|| Duration::from_secs(self.status_interval_secs))
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        let backends = BackendKind::platform_defaults()
            .iter()
            .map(|b| format!("\"{}\"", b.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"# Recovery Monitor configuration
poll_interval_ms = 1000
status_interval_secs = 30
command_timeout_secs = 10
failure_warn_threshold = 3
bell = true

# Any of: pnp, adb, fastboot, sysfs, command
# Default: ["pnp"] on Windows, ["sysfs", "adb", "fastboot"] on Linux,
# ["adb", "fastboot"] elsewhere
backends = [{backends}]

# Device names containing any of these are reported (pnp and sysfs backends)
name_patterns = ["MediaTek", "Android", "Nokia", "MTK", "PreLoader", "Bootloader", "9008", "Qualcomm"]

# Optional: arbitrary listing command, one device per output line
# [command]
# program = "lsusb"
# args = []
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.status_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.name_patterns.len(), 8);
    }

    #[test]
    fn test_sample_parses() {
        let config = MonitorConfig::from_toml(&MonitorConfig::sample_toml()).unwrap();
        assert_eq!(config.backends, BackendKind::platform_defaults());
        assert_eq!(config.backends, MonitorConfig::default().backends);
        assert!(config.command.is_none());
    }

    #[test]
    fn test_backend_names_round_trip_through_parse() {
        for kind in [
            BackendKind::Pnp,
            BackendKind::Adb,
            BackendKind::Fastboot,
            BackendKind::Sysfs,
            BackendKind::Command,
        ] {
            assert_eq!(BackendKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MonitorConfig::from_toml("poll_interval_ms = 250\n").unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.failure_warn_threshold, 3);
        assert!(config.bell);
    }

    #[test]
    fn test_zero_intervals_disable() {
        let config =
            MonitorConfig::from_toml("status_interval_secs = 0\ncommand_timeout_secs = 0\n").unwrap();
        assert_eq!(config.status_interval(), None);
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_command_backend() {
        let toml = r#"
backends = ["command"]
[command]
program = "lsusb"
args = ["-v"]
"#;
        let config = MonitorConfig::from_toml(toml).unwrap();
        let cmd = config.command.unwrap();
        assert_eq!(cmd.program, "lsusb");
        assert_eq!(cmd.args, vec!["-v".to_string()]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(MonitorConfig::from_toml("poll_interval_ms = 0").is_err());
        assert!(MonitorConfig::from_toml("failure_warn_threshold = 0").is_err());
        assert!(MonitorConfig::from_toml("backends = []").is_err());
        assert!(MonitorConfig::from_toml("backends = [\"command\"]").is_err());
        assert!(MonitorConfig::from_toml("backends = [\"bluetooth\"]").is_err());
        assert!(MonitorConfig::from_toml("poll_interval_ms = \"fast\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = MonitorConfig::from_toml_file("/nonexistent/remon.toml").unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(BackendKind::parse("ADB").unwrap(), BackendKind::Adb);
        assert_eq!(BackendKind::parse("wmi").unwrap(), BackendKind::Pnp);
        assert_eq!(BackendKind::parse(" usb ").unwrap(), BackendKind::Sysfs);
        assert!(BackendKind::parse("serial").is_err());
    }
}
