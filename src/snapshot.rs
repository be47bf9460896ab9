// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Device snapshots and the difference between two of them.
//!
//! A snapshot is the set of device-description strings observed by one
//! enumeration. Strings are opaque: two devices are the same device when
//! their descriptions are byte-for-byte equal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of device descriptions seen at one poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceSnapshot {
    devices: BTreeSet<String>,
}

impl DeviceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one description. Blank descriptions are ignored and
    /// surrounding whitespace is trimmed.
    pub fn insert(&mut self, description: impl AsRef<str>) -> bool {
        let trimmed = description.as_ref().trim();
        if trimmed.is_empty() {
            return false;
        }
        self.devices.insert(trimmed.to_string())
    }

    pub fn contains(&self, description: &str) -> bool {
        self.devices.contains(description)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(String::as_str)
    }

    /// Merge another snapshot into this one (used when several
    /// enumerators contribute to a single tick).
    pub fn extend(&mut self, other: DeviceSnapshot) {
        self.devices.extend(other.devices);
    }

    /// Compare against the `previous` snapshot.
    pub fn diff_from(&self, previous: &DeviceSnapshot) -> SnapshotDiff {
        SnapshotDiff::between(previous, self)
    }
}

impl<S: AsRef<str>> FromIterator<S> for DeviceSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut snapshot = DeviceSnapshot::new();
        for item in iter {
            snapshot.insert(item);
        }
        snapshot
    }
}

impl IntoIterator for DeviceSnapshot {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_iter()
    }
}

/// Devices that appeared and disappeared between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// In the current snapshot but not the previous one.
    pub appeared: Vec<String>,
    /// In the previous snapshot but not the current one.
    pub disappeared: Vec<String>,
}

impl SnapshotDiff {
    pub fn between(previous: &DeviceSnapshot, current: &DeviceSnapshot) -> Self {
        Self {
            appeared: current
                .devices
                .difference(&previous.devices)
                .cloned()
                .collect(),
            disappeared: previous
                .devices
                .difference(&current.devices)
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.appeared.is_empty() && self.disappeared.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(items: &[&str]) -> DeviceSnapshot {
        items.iter().collect()
    }

    #[test]
    fn test_device_removed() {
        let diff = SnapshotDiff::between(&snap(&["DeviceX"]), &snap(&[]));
        assert_eq!(diff.disappeared, vec!["DeviceX".to_string()]);
        assert!(diff.appeared.is_empty());
    }

    #[test]
    fn test_device_added_to_empty() {
        let diff = SnapshotDiff::between(&snap(&[]), &snap(&["DeviceY"]));
        assert_eq!(diff.appeared, vec!["DeviceY".to_string()]);
        assert!(diff.disappeared.is_empty());
    }

    #[test]
    fn test_device_added_alongside_existing() {
        let diff = SnapshotDiff::between(&snap(&["DeviceX"]), &snap(&["DeviceX", "DeviceY"]));
        assert_eq!(diff.appeared, vec!["DeviceY".to_string()]);
        assert!(diff.disappeared.is_empty());
    }

    #[test]
    fn test_identical_snapshots_have_empty_diff() {
        let a = snap(&["MediaTek PreLoader USB VCOM [USB\\VID_0E8D]", "Android ADB abc (device)"]);
        let diff = a.diff_from(&a.clone());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_appeared_and_disappeared_are_disjoint() {
        let previous = snap(&["A", "B", "C"]);
        let current = snap(&["B", "C", "D", "E"]);
        let diff = current.diff_from(&previous);
        assert_eq!(diff.appeared, vec!["D".to_string(), "E".to_string()]);
        assert_eq!(diff.disappeared, vec!["A".to_string()]);
        for item in &diff.appeared {
            assert!(!diff.disappeared.contains(item));
        }
    }

    #[test]
    fn test_equality_is_exact() {
        let diff = SnapshotDiff::between(&snap(&["device"]), &snap(&["Device"]));
        assert_eq!(diff.appeared, vec!["Device".to_string()]);
        assert_eq!(diff.disappeared, vec!["device".to_string()]);
    }

    #[test]
    fn test_insert_trims_and_skips_blank() {
        let mut s = DeviceSnapshot::new();
        assert!(s.insert("  Nokia  "));
        assert!(!s.insert("Nokia"));
        assert!(!s.insert("   "));
        assert_eq!(s.len(), 1);
        assert!(s.contains("Nokia"));
    }

    #[test]
    fn test_extend_unions() {
        let mut a = snap(&["A"]);
        a.extend(snap(&["A", "B"]));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_snapshot_serializes_as_array() {
        let json = serde_json::to_string(&snap(&["b", "a"])).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }
}
