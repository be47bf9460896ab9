//! Recovery Monitor: detect phones sitting in PreLoader, bootloader/fastboot
//! or EDL mode.
//!
//! The crate polls an OS device-listing facility, diffs consecutive
//! snapshots and classifies what appeared or disappeared.
//!
//! ```no_run
//! use remonlib::config::MonitorConfig;
//! use remonlib::poller::{DevicePoller, PollEvent, PollerConfig};
//! use std::sync::atomic::AtomicBool;
//!
//! let config = MonitorConfig::default();
//! let enumerator = remonlib::enumerator::from_config(&config)?;
//! let mut poller = DevicePoller::new(enumerator, PollerConfig::from(&config));
//! let running = AtomicBool::new(true);
//! poller.run(&running, |event| {
//!     if let PollEvent::Detection(d) = event {
//!         println!("{} {} ({})", d.kind, d.device, d.mode);
//!     }
//! });
//! # Ok::<(), remonlib::error::MonitorError>(())
//! ```

pub mod classify;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod poller;
pub mod scan;
pub mod snapshot;

pub use classify::{classify, DeviceMode};
pub use config::{BackendKind, MonitorConfig};
pub use enumerator::DeviceEnumerator;
pub use error::{MonitorError, Result};
pub use poller::{DetectionEvent, DetectionKind, DevicePoller, PollEvent, PollerConfig};
pub use scan::{quick_scan, ScanReport};
pub use snapshot::{DeviceSnapshot, SnapshotDiff};
