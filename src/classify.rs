//! Recovery-mode classification of device descriptions.
//!
//! Matching uses the vendor/class names that Windows Device Manager, `adb`
//! and `fastboot` put into their listings. The first rule that matches wins.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};

/// Low-level state a phone is exposing over USB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceMode {
    /// MediaTek BootROM / PreLoader download mode.
    MediatekPreloader,
    /// Android bootloader speaking the fastboot protocol.
    AndroidBootloader,
    /// Qualcomm Emergency Download (HS-USB QDLoader 9008).
    QualcommEdl,
    /// Booted Android with USB debugging.
    AndroidAdb,
    Unknown,
}

impl DeviceMode {
    /// Flashing tool that talks to a device in this mode.
    pub fn tool_hint(&self) -> Option<&'static str> {
        match self {
            Self::MediatekPreloader => Some("SP Flash Tool"),
            Self::AndroidBootloader => Some("fastboot"),
            Self::QualcommEdl => Some("QFIL"),
            Self::AndroidAdb => Some("adb"),
            Self::Unknown => None,
        }
    }

    /// Parse a mode name as given on the command line.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "preloader" | "mtk" | "mediatek" => Ok(Self::MediatekPreloader),
            "bootloader" | "fastboot" => Ok(Self::AndroidBootloader),
            "edl" | "qualcomm" | "9008" => Ok(Self::QualcommEdl),
            "adb" => Ok(Self::AndroidAdb),
            other => Err(MonitorError::Configuration(format!(
                "unknown mode '{}'. Supported: preloader, bootloader, edl, adb",
                other
            ))),
        }
    }

    /// True for the modes a bricked device falls back to.
    pub fn is_recovery(&self) -> bool {
        matches!(
            self,
            Self::MediatekPreloader | Self::AndroidBootloader | Self::QualcommEdl
        )
    }
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MediatekPreloader => write!(f, "MediaTek PreLoader"),
            Self::AndroidBootloader => write!(f, "Android Bootloader"),
            Self::QualcommEdl => write!(f, "Qualcomm EDL"),
            Self::AndroidAdb => write!(f, "Android ADB"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

const PRELOADER_KEYS: &[&str] = &["MediaTek", "PreLoader", "MTK"];
const BOOTLOADER_KEYS: &[&str] = &["Android Bootloader"];
const EDL_KEYS: &[&str] = &["9008", "Qualcomm", "QDLoader"];
const ADB_KEYS: &[&str] = &["Android ADB", "ADB Interface"];

// Prefixes written by the adb and fastboot parsers; the serial after them is
// free text and may contain any of the keys above.
const ADB_PREFIX: &str = "Android ADB ";
const FASTBOOT_PREFIX: &str = "Android Bootloader ";

/// Classify one device description.
pub fn classify(description: &str) -> DeviceMode {
    let has = |keys: &[&str]| keys.iter().any(|k| description.contains(k));

    if description.starts_with(ADB_PREFIX) {
        DeviceMode::AndroidAdb
    } else if description.starts_with(FASTBOOT_PREFIX) {
        DeviceMode::AndroidBootloader
    } else if has(PRELOADER_KEYS) {
        DeviceMode::MediatekPreloader
    } else if has(BOOTLOADER_KEYS) || description.to_lowercase().contains("fastboot") {
        DeviceMode::AndroidBootloader
    } else if has(EDL_KEYS) {
        DeviceMode::QualcommEdl
    } else if has(ADB_KEYS) {
        DeviceMode::AndroidAdb
    } else {
        DeviceMode::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preloader() {
        assert_eq!(
            classify("MediaTek PreLoader USB VCOM (Android) (COM5) [USB\\VID_0E8D&PID_2000\\5&1]"),
            DeviceMode::MediatekPreloader
        );
        assert_eq!(classify("MTK USB Port"), DeviceMode::MediatekPreloader);
    }

    #[test]
    fn test_bootloader() {
        assert_eq!(
            classify("Android Bootloader Interface [USB\\VID_18D1&PID_D00D\\0123]"),
            DeviceMode::AndroidBootloader
        );
        assert_eq!(
            classify("Android Bootloader 0123456789 (fastboot)"),
            DeviceMode::AndroidBootloader
        );
        assert_eq!(classify("Google Fastboot device"), DeviceMode::AndroidBootloader);
    }

    #[test]
    fn test_edl() {
        assert_eq!(
            classify("Qualcomm HS-USB QDLoader 9008 (COM7)"),
            DeviceMode::QualcommEdl
        );
        assert_eq!(classify("Unknown device 05c6:9008"), DeviceMode::QualcommEdl);
    }

    #[test]
    fn test_adb() {
        assert_eq!(classify("Android ADB R58M12345 (device)"), DeviceMode::AndroidAdb);
        assert_eq!(classify("Android Composite ADB Interface"), DeviceMode::AndroidAdb);
    }

    #[test]
    fn test_tool_listing_prefix_wins_over_serial() {
        assert_eq!(classify("Android ADB R58M9008AB (device)"), DeviceMode::AndroidAdb);
        assert_eq!(classify("Android ADB MTK123456 (device)"), DeviceMode::AndroidAdb);
        assert_eq!(
            classify("Android Bootloader MTK9008XY (fastboot)"),
            DeviceMode::AndroidBootloader
        );
    }

    #[test]
    fn test_parse_mode_names() {
        assert_eq!(DeviceMode::parse("PreLoader").unwrap(), DeviceMode::MediatekPreloader);
        assert_eq!(DeviceMode::parse("fastboot").unwrap(), DeviceMode::AndroidBootloader);
        assert_eq!(DeviceMode::parse(" edl ").unwrap(), DeviceMode::QualcommEdl);
        assert_eq!(DeviceMode::parse("adb").unwrap(), DeviceMode::AndroidAdb);
        assert!(matches!(
            DeviceMode::parse("dfu"),
            Err(MonitorError::Configuration(_))
        ));
    }

    #[test]
    fn test_preloader_wins_over_other_keys() {
        // MediaTek devices often carry "Android" in the name too
        assert_eq!(
            classify("MediaTek PreLoader Android Bootloader"),
            DeviceMode::MediatekPreloader
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify("Logitech USB Receiver"), DeviceMode::Unknown);
        assert_eq!(DeviceMode::Unknown.tool_hint(), None);
        assert!(!DeviceMode::Unknown.is_recovery());
    }

    #[test]
    fn test_recovery_modes_have_tools() {
        for mode in [
            DeviceMode::MediatekPreloader,
            DeviceMode::AndroidBootloader,
            DeviceMode::QualcommEdl,
        ] {
            assert!(mode.is_recovery());
            assert!(mode.tool_hint().is_some());
        }
        assert!(!DeviceMode::AndroidAdb.is_recovery());
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceMode::QualcommEdl.to_string(), "Qualcomm EDL");
    }
}
