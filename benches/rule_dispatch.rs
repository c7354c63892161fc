// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use device_sim::core::handle::{DeviceHandle, KindId};
use device_sim::core::manager::DeviceManager;
use device_sim::core::rule::{ActionTarget, Trigger};
use device_sim::devices;

fn fresh_manager_with_fpga() -> (DeviceManager, DeviceHandle) {
    let mut manager = DeviceManager::new();
    devices::register_builtin_kinds(&mut manager).unwrap();
    manager.create_device(KindId::Fpga, 0).unwrap();
    (manager, DeviceHandle::new(KindId::Fpga, 0))
}

fn write_word_no_match_benchmark(c: &mut Criterion) {
    c.bench_function("write_word_no_matching_rule", |b| {
        let (manager, h) = fresh_manager_with_fpga();
        b.iter(|| {
            black_box(manager.write_word(h, 0x04, black_box(0x1234)).unwrap());
        });
    });
}

fn write_word_single_match_benchmark(c: &mut Criterion) {
    let (manager, h) = fresh_manager_with_fpga();
    manager
        .install_rule(
            h,
            Trigger::new(0x20, 0x1, 0xFFFF_FFFF),
            vec![ActionTarget::Write {
                handle: h,
                addr: 0x30,
                value: 0xAA,
                mask: 0xFFFF_FFFF,
            }],
            0,
            "bench-single-match",
        )
        .unwrap();

    c.bench_function("write_word_single_matching_rule", |b| {
        b.iter(|| {
            black_box(manager.write_word(h, 0x20, black_box(0x1)).unwrap());
        });
    });
}

fn write_word_fan_out_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_fan_out");

    for target_count in [1usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("targets", target_count),
            &target_count,
            |b, &target_count| {
                let (manager, h) = fresh_manager_with_fpga();
                let targets = (0..target_count)
                    .map(|i| ActionTarget::Write {
                        handle: h,
                        addr: 0x24,
                        value: i as u32,
                        mask: 0xFFFF_FFFF,
                    })
                    .collect();
                manager
                    .install_rule(h, Trigger::new(0x28, 0x1, 0xFFFF_FFFF), targets, 0, "bench-fan-out")
                    .unwrap();

                b.iter(|| {
                    black_box(manager.write_word(h, 0x28, black_box(0x1)).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    write_word_no_match_benchmark,
    write_word_single_match_benchmark,
    write_word_fan_out_benchmark
);
criterion_main!(benches);
