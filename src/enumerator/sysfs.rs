//! Linux USB enumeration from `/sys/bus/usb/devices`.

use super::DeviceEnumerator;
use crate::error::{MonitorError, Result};
use crate::snapshot::DeviceSnapshot;
use std::fs;
use std::path::{Path, PathBuf};

/// Vendor IDs that only show up for phones (or their download modes).
const RECOVERY_VENDORS: &[(u16, &str)] = &[
    (0x0e8d, "MediaTek"),
    (0x18d1, "Google"),
    (0x05c6, "Qualcomm"),
];

/// Qualcomm HS-USB QDLoader product ID.
const QDLOADER_PID: u16 = 0x9008;

#[derive(Debug, Clone)]
pub struct SysfsEnumerator {
    root: PathBuf,
    patterns: Vec<String>,
}

impl SysfsEnumerator {
    pub fn new(patterns: Vec<String>) -> Self {
        Self::with_root("/sys/bus/usb/devices", patterns)
    }

    pub fn with_root(root: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
        Self {
            root: root.into(),
            patterns,
        }
    }

    fn wanted(&self, vendor_id: u16, description: &str) -> bool {
        RECOVERY_VENDORS.iter().any(|(vid, _)| *vid == vendor_id)
            || self
                .patterns
                .iter()
                .any(|p| !p.is_empty() && description.contains(p.as_str()))
    }
}

impl DeviceEnumerator for SysfsEnumerator {
    fn name(&self) -> &str {
        "sysfs"
    }

    fn enumerate(&self) -> Result<DeviceSnapshot> {
        if !self.root.exists() {
            return Err(MonitorError::UnsupportedPlatform(format!(
                "{} not present",
                self.root.display()
            )));
        }

        let mut snapshot = DeviceSnapshot::new();
        for entry in fs::read_dir(&self.root)?.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // "1-2.3" is a device, "1-2.3:1.0" an interface, "usb1" a root hub
            if !name.contains('-') || name.contains(':') {
                continue;
            }
            let path = entry.path();
            let vendor_id = read_usb_attr(&path, "idVendor");
            let product_id = read_usb_attr(&path, "idProduct");
            let description = describe(
                vendor_id,
                product_id,
                read_usb_string(&path, "manufacturer"),
                read_usb_string(&path, "product"),
            );
            if self.wanted(vendor_id, &description) {
                snapshot.insert(format!("{} ({})", description, name));
            }
        }
        Ok(snapshot)
    }
}

/// Human-readable description for one USB device. The QDLoader PID is
/// spelled out so EDL devices classify even without string descriptors.
pub fn describe(
    vendor_id: u16,
    product_id: u16,
    manufacturer: Option<String>,
    product: Option<String>,
) -> String {
    let vendor = manufacturer.or_else(|| {
        RECOVERY_VENDORS
            .iter()
            .find(|(vid, _)| *vid == vendor_id)
            .map(|(_, name)| name.to_string())
    });

    let mut parts: Vec<String> = Vec::new();
    if let Some(v) = vendor {
        parts.push(v);
    }
    match product {
        Some(p) => parts.push(p),
        None if vendor_id == 0x05c6 && product_id == QDLOADER_PID => {
            parts.push("HS-USB QDLoader 9008".to_string())
        }
        None => parts.push("USB Device".to_string()),
    }
    parts.push(format!("[{:04x}:{:04x}]", vendor_id, product_id));
    parts.join(" ")
}

fn read_usb_attr(path: &Path, attr: &str) -> u16 {
    fs::read_to_string(path.join(attr))
        .ok()
        .and_then(|s| u16::from_str_radix(s.trim(), 16).ok())
        .unwrap_or(0)
}

fn read_usb_string(path: &Path, attr: &str) -> Option<String> {
    fs::read_to_string(path.join(attr))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn fake_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "remon-sysfs-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn add_device(root: &Path, name: &str, attrs: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (k, v) in attrs {
            fs::write(dir.join(k), format!("{}\n", v)).unwrap();
        }
    }

    #[test]
    fn test_describe_qdloader_without_strings() {
        let d = describe(0x05c6, 0x9008, None, None);
        assert_eq!(d, "Qualcomm HS-USB QDLoader 9008 [05c6:9008]");
    }

    #[test]
    fn test_describe_with_strings() {
        let d = describe(
            0x0e8d,
            0x2000,
            Some("MediaTek".to_string()),
            Some("MT65xx Preloader".to_string()),
        );
        assert_eq!(d, "MediaTek MT65xx Preloader [0e8d:2000]");
    }

    #[test]
    fn test_enumerate_filters_devices() {
        let root = fake_root();
        add_device(&root, "1-1", &[("idVendor", "0e8d"), ("idProduct", "2000"), ("product", "MT65xx Preloader")]);
        add_device(&root, "1-2", &[("idVendor", "046d"), ("idProduct", "c52b"), ("product", "USB Receiver")]);
        add_device(&root, "1-3", &[("idVendor", "2e04"), ("idProduct", "c025"), ("manufacturer", "HMD Global"), ("product", "Nokia G11")]);
        add_device(&root, "1-1:1.0", &[("idVendor", "0e8d")]);
        add_device(&root, "usb1", &[("idVendor", "1d6b")]);

        let e = SysfsEnumerator::with_root(&root, vec!["Nokia".to_string()]);
        let snapshot = e.enumerate().unwrap();
        assert_eq!(
            snapshot.iter().collect::<Vec<_>>(),
            vec![
                "HMD Global Nokia G11 [2e04:c025] (1-3)",
                "MediaTek MT65xx Preloader [0e8d:2000] (1-1)",
            ]
        );
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_root_is_error() {
        let e = SysfsEnumerator::with_root("/nonexistent/remon/usb", vec![]);
        assert!(matches!(e.enumerate(), Err(MonitorError::UnsupportedPlatform(_))));
    }
}
