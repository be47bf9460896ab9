//! `adb devices` and `fastboot devices` listings.

use super::command::run_command;
use super::DeviceEnumerator;
use crate::error::Result;
use crate::snapshot::DeviceSnapshot;
use std::time::Duration;

/// Devices visible to the adb server (booted, recovery, sideload, ...).
#[derive(Debug, Clone)]
pub struct AdbEnumerator {
    program: String,
    timeout: Option<Duration>,
}

impl AdbEnumerator {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            program: "adb".to_string(),
            timeout,
        }
    }
}

impl DeviceEnumerator for AdbEnumerator {
    fn name(&self) -> &str {
        "adb"
    }

    fn enumerate(&self) -> Result<DeviceSnapshot> {
        let out = run_command(&self.program, &["devices".to_string()], self.timeout)?;
        Ok(parse_adb_devices(&out))
    }
}

/// Parse `adb devices` output.
///
/// ```text
/// * daemon not running; starting now at tcp:5037
/// List of devices attached
/// R58M12345ABC	device
/// emulator-5554	offline
/// ```
pub fn parse_adb_devices(output: &str) -> DeviceSnapshot {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?;
            let state = fields.next().unwrap_or("unknown");
            Some(format!("Android ADB {} ({})", serial, state))
        })
        .collect()
}

/// Devices sitting in the bootloader's fastboot mode.
#[derive(Debug, Clone)]
pub struct FastbootEnumerator {
    program: String,
    timeout: Option<Duration>,
}

impl FastbootEnumerator {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            program: "fastboot".to_string(),
            timeout,
        }
    }
}

impl DeviceEnumerator for FastbootEnumerator {
    fn name(&self) -> &str {
        "fastboot"
    }

    fn enumerate(&self) -> Result<DeviceSnapshot> {
        let out = run_command(&self.program, &["devices".to_string()], self.timeout)?;
        Ok(parse_fastboot_devices(&out))
    }
}

/// Parse `fastboot devices` output (`<serial>\tfastboot` per line; newer
/// builds may report `fastbootd` for userspace fastboot).
pub fn parse_fastboot_devices(output: &str) -> DeviceSnapshot {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?;
            let state = fields.next().unwrap_or("fastboot");
            Some(format!("Android Bootloader {} ({})", serial, state))
        })
        .collect()
}
