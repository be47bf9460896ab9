// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Fixed-interval device polling.
//!
//! Every tick takes a fresh snapshot and diffs it against the previous one.
//! The previous snapshot lives in the loop, not in the poller, so a poller
//! can be reused for several independent runs.
//!
//! Enumeration errors never leave this module: a failed tick is an empty
//! snapshot. Consecutive failures are counted so a missing tool (e.g. `adb`
//! not on PATH) is reported once instead of every second.

use crate::classify::{classify, DeviceMode};
use crate::config::MonitorConfig;
use crate::enumerator::{DeviceEnumerator, FailureStreak};
use crate::snapshot::{DeviceSnapshot, SnapshotDiff};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionKind {
    Appeared,
    Disappeared,
}

impl std::fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Appeared => write!(f, "appeared"),
            Self::Disappeared => write!(f, "disappeared"),
        }
    }
}

/// One device that appeared or disappeared between two ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub kind: DetectionKind,
    pub device: String,
    pub mode: DeviceMode,
    pub timestamp: DateTime<Local>,
}

impl DetectionEvent {
    pub fn new(kind: DetectionKind, device: String) -> Self {
        let mode = classify(&device);
        Self {
            kind,
            device,
            mode,
            timestamp: Local::now(),
        }
    }
}

/// Everything the run loop reports to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum PollEvent {
    Detection(DetectionEvent),
    /// Periodic heartbeat.
    Status {
        timestamp: DateTime<Local>,
        detections: u64,
        devices: usize,
    },
}

/// Expand a diff into events, appeared devices first.
pub fn detection_events(diff: SnapshotDiff) -> Vec<DetectionEvent> {
    let SnapshotDiff {
        appeared,
        disappeared,
    } = diff;
    appeared
        .into_iter()
        .map(|d| DetectionEvent::new(DetectionKind::Appeared, d))
        .chain(
            disappeared
                .into_iter()
                .map(|d| DetectionEvent::new(DetectionKind::Disappeared, d)),
        )
        .collect()
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub status_interval: Option<Duration>,
    pub failure_warn_threshold: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            status_interval: Some(Duration::from_secs(30)),
            failure_warn_threshold: 3,
        }
    }
}

impl From<&MonitorConfig> for PollerConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            status_interval: config.status_interval(),
            failure_warn_threshold: config.failure_warn_threshold.max(1),
        }
    }
}

pub struct DevicePoller<E> {
    enumerator: E,
    config: PollerConfig,
    detections: u64,
    failures: FailureStreak,
}

impl<E: DeviceEnumerator> DevicePoller<E> {
    pub fn new(enumerator: E, config: PollerConfig) -> Self {
        Self {
            enumerator,
            config,
            detections: 0,
            failures: FailureStreak::default(),
        }
    }

    pub fn enumerator(&self) -> &E {
        &self.enumerator
    }

    /// Number of appeared events seen so far.
    pub fn detections(&self) -> u64 {
        self.detections
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.count()
    }

    /// Current snapshot; empty when enumeration fails.
    pub fn snapshot(&mut self) -> DeviceSnapshot {
        let threshold = self.config.failure_warn_threshold;
        match self.enumerator.enumerate() {
            Ok(snapshot) => {
                self.failures.record_success(self.enumerator.name(), threshold);
                snapshot
            }
            Err(e) => {
                self.failures
                    .record_failure(self.enumerator.name(), threshold, &e);
                DeviceSnapshot::new()
            }
        }
    }

    /// One tick: take a snapshot and diff it against `previous`. The caller
    /// keeps the returned snapshot for the next tick.
    pub fn poll_once(&mut self, previous: &DeviceSnapshot) -> (DeviceSnapshot, SnapshotDiff) {
        let current = self.snapshot();
        let diff = current.diff_from(previous);
        self.detections += diff.appeared.len() as u64;
        (current, diff)
    }

    /// Poll until a device whose mode satisfies `wanted` is attached or
    /// `timeout` passes. Unlike [`run_while`](Self::run_while) there is no
    /// baseline: a matching device already attached on the first check is
    /// returned immediately.
    pub fn wait_for<M>(&mut self, wanted: M, timeout: Duration) -> Option<DetectionEvent>
    where
        M: Fn(DeviceMode) -> bool,
    {
        let deadline = Instant::now().checked_add(timeout);
        log::info!(
            "waiting up to {:?} for a device via {}",
            timeout,
            self.enumerator.name()
        );

        loop {
            let snapshot = self.snapshot();
            if let Some(device) = snapshot.iter().find(|d| wanted(classify(d))) {
                self.detections += 1;
                return Some(DetectionEvent::new(
                    DetectionKind::Appeared,
                    device.to_string(),
                ));
            }

            let pause = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        log::info!("no matching device within {:?}", timeout);
                        return None;
                    }
                    remaining.min(self.config.interval)
                }
                None => self.config.interval,
            };
            thread::sleep(pause);
        }
    }

    /// Poll until `running` is cleared. Returns the detection count.
    pub fn run<F>(&mut self, running: &AtomicBool, on_event: F) -> u64
    where
        F: FnMut(PollEvent),
    {
        self.run_while(|| running.load(Ordering::SeqCst), on_event)
    }

    /// Poll while `keep_going` returns true. It is checked at the top of
    /// each tick; an in-flight enumeration is never interrupted.
    pub fn run_while<C, F>(&mut self, mut keep_going: C, mut on_event: F) -> u64
    where
        C: FnMut() -> bool,
        F: FnMut(PollEvent),
    {
        let mut previous = self.snapshot();
        let mut last_status = Instant::now();

        log::info!(
            "monitoring via {} every {:?} ({} device(s) at start)",
            self.enumerator.name(),
            self.config.interval,
            previous.len()
        );

        while keep_going() {
            let (current, diff) = self.poll_once(&previous);
            for event in detection_events(diff) {
                on_event(PollEvent::Detection(event));
            }
            previous = current;

            if let Some(every) = self.config.status_interval {
                if last_status.elapsed() >= every {
                    on_event(PollEvent::Status {
                        timestamp: Local::now(),
                        detections: self.detections,
                        devices: previous.len(),
                    });
                    last_status = Instant::now();
                }
            }

            thread::sleep(self.config.interval);
        }

        self.detections
    }
}
