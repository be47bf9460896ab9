// SPDX-License-Identifier: AGPL-3.0-or-later
//! Benchmark for snapshot diffing and output parsing.
//!
//! Diffing runs once per poll tick, so its cost bounds how tight the poll
//! interval can be on a hub with many devices attached.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use remonlib::enumerator::android::parse_adb_devices;
use remonlib::DeviceSnapshot;

fn snapshot(range: std::ops::Range<usize>) -> DeviceSnapshot {
    range
        .map(|i| format!("USB Composite Device [USB\\VID_1234&PID_{:04X}\\{}]", i, i))
        .collect()
}

fn bench_diff(c: &mut Criterion) {
    let previous = snapshot(0..500);
    let current = snapshot(250..750);
    c.bench_function("diff_500_devices", |b| {
        b.iter(|| black_box(&current).diff_from(black_box(&previous)));
    });
}

fn bench_parse_adb(c: &mut Criterion) {
    let mut output = String::from("List of devices attached\n");
    for i in 0..64 {
        output.push_str(&format!("SERIAL{:04}\tdevice\n", i));
    }
    c.bench_function("parse_adb_devices_64", |b| {
        b.iter(|| parse_adb_devices(black_box(&output)));
    });
}

criterion_group!(benches, bench_diff, bench_parse_adb);
criterion_main!(benches);
