// Copyright 2025 eraflo
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

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use vesta_core::{HandlePool, RawHandle};

const CAPACITY: usize = 4096;

fn bench_handle_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("Handle Pool");

    group.bench_function("Reserve/Release churn", |b| {
        let mut pool = HandlePool::with_capacity("bench", CAPACITY);
        let mut live: Vec<RawHandle> = Vec::with_capacity(CAPACITY);
        b.iter(|| {
            // Fill half the pool, then free every other handle so the free list is fragmented.
            for i in 0..CAPACITY / 2 {
                if let Ok(handle) = pool.reserve(i as u32) {
                    live.push(handle);
                }
            }
            for handle in live.iter().step_by(2) {
                black_box(pool.release(*handle));
            }
            for handle in live.iter().skip(1).step_by(2) {
                black_box(pool.release(*handle));
            }
            live.clear();
        });
    });

    let mut pool = HandlePool::with_capacity("bench", CAPACITY);
    let handles: Vec<RawHandle> = (0..CAPACITY as u32)
        .filter_map(|i| pool.reserve(i).ok())
        .collect();

    group.bench_function("Generation-checked lookup", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for handle in &handles {
                if let Some(value) = pool.get(*handle) {
                    sum += *value as u64;
                }
            }
            black_box(sum)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_handle_pool);
criterion_main!(benches);
