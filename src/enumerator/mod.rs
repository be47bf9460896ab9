// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Device enumeration backends.
//!
//! Each backend wraps one OS facility (Device Manager, `adb`, `fastboot`,
//! sysfs, or an arbitrary command) and turns its output into a
//! [`DeviceSnapshot`]. Backends report failures as errors; deciding what a
//! failure means is left to the caller.
//!
//! ## Platform Support
//!
//! - **Windows**: `pnp` (PowerShell + `Win32_PnPEntity`), `adb`, `fastboot`
//! - **Linux**: `sysfs`, `adb`, `fastboot`
//! - **macOS**: `adb`, `fastboot`

pub mod android;
pub mod command;
pub mod pnp;
pub mod sysfs;

pub use android::{AdbEnumerator, FastbootEnumerator};
pub use command::CommandEnumerator;
pub use pnp::PnpEnumerator;
pub use sysfs::SysfsEnumerator;

use crate::config::{BackendKind, MonitorConfig};
use crate::error::{MonitorError, Result};
use crate::snapshot::DeviceSnapshot;
use std::cell::Cell;
use std::fmt;

const DEFAULT_WARN_THRESHOLD: u32 = 3;

/// A source of device snapshots.
pub trait DeviceEnumerator {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Take one snapshot of the currently attached devices.
    fn enumerate(&self) -> Result<DeviceSnapshot>;
}

impl<T: DeviceEnumerator + ?Sized> DeviceEnumerator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn enumerate(&self) -> Result<DeviceSnapshot> {
        (**self).enumerate()
    }
}

/// Consecutive enumeration failures of one backend.
///
/// Every failure is logged at debug level; a single warning is emitted when
/// the streak reaches the threshold and a single info line when it ends.
#[derive(Debug, Default)]
pub(crate) struct FailureStreak {
    count: Cell<u32>,
}

impl FailureStreak {
    pub(crate) fn count(&self) -> u32 {
        self.count.get()
    }

    /// Returns true when this failure triggered the warning.
    pub(crate) fn record_failure(
        &self,
        backend: &str,
        threshold: u32,
        error: &dyn fmt::Display,
    ) -> bool {
        let count = self.count.get().saturating_add(1);
        self.count.set(count);
        log::debug!("{} enumeration failed ({} in a row): {}", backend, count, error);
        if count == threshold {
            log::warn!(
                "{} enumeration has failed {} times in a row, treating as no devices: {}",
                backend,
                count,
                error
            );
            return true;
        }
        false
    }

    /// Returns true when this success ended a warned-about streak.
    pub(crate) fn record_success(&self, backend: &str, threshold: u32) -> bool {
        let count = self.count.replace(0);
        if count >= threshold {
            log::info!("{} enumeration recovered after {} failures", backend, count);
            return true;
        }
        false
    }
}

/// Union of several backends.
///
/// A tick succeeds as long as one member succeeds; failing members
/// contribute nothing. Each member keeps its own failure streak, so a
/// missing `adb` is still reported while `sysfs` keeps working.
pub struct CompositeEnumerator {
    members: Vec<Box<dyn DeviceEnumerator>>,
    streaks: Vec<FailureStreak>,
    warn_threshold: u32,
    name: String,
}

impl CompositeEnumerator {
    pub fn new(members: Vec<Box<dyn DeviceEnumerator>>) -> Self {
        let name = members
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join("+");
        let streaks = members.iter().map(|_| FailureStreak::default()).collect();
        Self {
            members,
            streaks,
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            name,
        }
    }

    /// Consecutive failures after which a member's failure is logged as a warning.
    pub fn with_warn_threshold(mut self, threshold: u32) -> Self {
        self.warn_threshold = threshold.max(1);
        self
    }

    /// Current failure streak of every member, in configuration order.
    pub fn member_failures(&self) -> Vec<(&str, u32)> {
        self.members
            .iter()
            .zip(&self.streaks)
            .map(|(m, s)| (m.name(), s.count()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl DeviceEnumerator for CompositeEnumerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn enumerate(&self) -> Result<DeviceSnapshot> {
        let mut snapshot = DeviceSnapshot::new();
        let mut errors = Vec::new();

        for (member, streak) in self.members.iter().zip(&self.streaks) {
            match member.enumerate() {
                Ok(part) => {
                    streak.record_success(member.name(), self.warn_threshold);
                    snapshot.extend(part);
                }
                Err(e) => {
                    streak.record_failure(member.name(), self.warn_threshold, &e);
                    errors.push(format!("{}: {}", member.name(), e));
                }
            }
        }

        if !self.members.is_empty() && errors.len() == self.members.len() {
            return Err(MonitorError::CommandFailed(errors.join("; ")));
        }
        Ok(snapshot)
    }
}

/// Build the enumerator described by `config`.
pub fn from_config(config: &MonitorConfig) -> Result<Box<dyn DeviceEnumerator>> {
    let timeout = config.command_timeout();
    let mut members: Vec<Box<dyn DeviceEnumerator>> = Vec::new();

    for kind in &config.backends {
        let member: Box<dyn DeviceEnumerator> = match kind {
            BackendKind::Pnp => Box::new(PnpEnumerator::new(config.name_patterns.clone(), timeout)),
            BackendKind::Adb => Box::new(AdbEnumerator::new(timeout)),
            BackendKind::Fastboot => Box::new(FastbootEnumerator::new(timeout)),
            BackendKind::Sysfs => Box::new(SysfsEnumerator::new(config.name_patterns.clone())),
            BackendKind::Command => {
                let cmd = config.command.as_ref().ok_or_else(|| {
                    MonitorError::Configuration(
                        "backend \"command\" needs a [command] table".to_string(),
                    )
                })?;
                Box::new(CommandEnumerator::new(
                    cmd.program.clone(),
                    cmd.args.clone(),
                    timeout,
                ))
            }
        };
        members.push(member);
    }

    match members.len() {
        0 => Err(MonitorError::Configuration(
            "no enumeration backends configured".to_string(),
        )),
        1 => Ok(members.remove(0)),
        _ => Ok(Box::new(
            CompositeEnumerator::new(members).with_warn_threshold(config.failure_warn_threshold),
        )),
    }
}
