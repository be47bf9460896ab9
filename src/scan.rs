//! One-shot scan: snapshot plus classification.

use crate::classify::{classify, DeviceMode};
use crate::enumerator::DeviceEnumerator;
use crate::snapshot::DeviceSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedDevice {
    pub description: String,
    pub mode: DeviceMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub backend: String,
    pub devices: Vec<ClassifiedDevice>,
    /// Set when the enumeration failed and the report is empty because of it.
    pub error: Option<String>,
}

impl ScanReport {
    pub fn from_snapshot(backend: impl Into<String>, snapshot: DeviceSnapshot) -> Self {
        let devices = snapshot
            .into_iter()
            .map(|description| ClassifiedDevice {
                mode: classify(&description),
                description,
            })
            .collect();
        Self {
            backend: backend.into(),
            devices,
            error: None,
        }
    }

    /// Distinct modes present, in declaration order.
    pub fn modes(&self) -> BTreeSet<DeviceMode> {
        self.devices.iter().map(|d| d.mode).collect()
    }

    pub fn has_recovery_device(&self) -> bool {
        self.devices.iter().any(|d| d.mode.is_recovery())
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Take one snapshot. A failed enumeration yields an empty report with the
/// failure noted, never an error.
pub fn quick_scan<E: DeviceEnumerator + ?Sized>(enumerator: &E) -> ScanReport {
    match enumerator.enumerate() {
        Ok(snapshot) => ScanReport::from_snapshot(enumerator.name(), snapshot),
        Err(e) => {
            log::debug!("{} enumeration failed: {}", enumerator.name(), e);
            ScanReport {
                backend: enumerator.name().to_string(),
                devices: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::testing::ScriptedEnumerator;

    #[test]
    fn test_scan_classifies() {
        let e = ScriptedEnumerator::new(vec![ScriptedEnumerator::ok(&[
            "MediaTek PreLoader USB VCOM (Android)",
            "Android Bootloader 0123 (fastboot)",
            "Logitech USB Receiver",
        ])]);
        let report = quick_scan(&e);
        assert_eq!(report.devices.len(), 3);
        assert!(report.error.is_none());
        assert!(report.has_recovery_device());
        let modes: Vec<_> = report.modes().into_iter().collect();
        assert_eq!(
            modes,
            vec![
                DeviceMode::MediatekPreloader,
                DeviceMode::AndroidBootloader,
                DeviceMode::Unknown
            ]
        );
    }

    #[test]
    fn test_scan_failure_is_empty_report() {
        let e = ScriptedEnumerator::new(vec![ScriptedEnumerator::fail()]);
        let report = quick_scan(&e);
        assert!(report.is_empty());
        assert!(!report.has_recovery_device());
        assert_eq!(report.backend, "scripted");
        assert!(report.error.as_deref().unwrap_or("").contains("scripted failure"));
    }

    #[test]
    fn test_adb_only_is_not_recovery() {
        let report = ScanReport::from_snapshot(
            "adb",
            ["Android ADB R58M (device)"].iter().collect(),
        );
        assert!(!report.has_recovery_device());
        assert_eq!(report.devices[0].mode, DeviceMode::AndroidAdb);
    }
}
