// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

#![allow(unsafe_code)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn floating_f32_reduce_max_of_abs_d_and_sum_of_d2(c: &mut Criterion) {
    use rand::Rng;
    use simd::floating_f32::reduce_max_of_abs_d_and_sum_of_d2 as k;
    let mut rng = rand::rng();
    let x = (0..4095)
        .map(|_| rng.random_range(-1.0..=1.0f32))
        .collect::<Vec<_>>();
    let y = (0..4095)
        .map(|_| rng.random_range(-1.0..=1.0f32))
        .collect::<Vec<_>>();
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v4") {
        c.bench_function("floating_f32::reduce_max_of_abs_d_and_sum_of_d2::v4", |b| {
            b.iter(|| unsafe { k::reduce_max_of_abs_d_and_sum_of_d2_v4(black_box(&x), &y) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v3") {
        c.bench_function("floating_f32::reduce_max_of_abs_d_and_sum_of_d2::v3", |b| {
            b.iter(|| unsafe { k::reduce_max_of_abs_d_and_sum_of_d2_v3(black_box(&x), &y) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v2") {
        c.bench_function("floating_f32::reduce_max_of_abs_d_and_sum_of_d2::v2", |b| {
            b.iter(|| unsafe { k::reduce_max_of_abs_d_and_sum_of_d2_v2(black_box(&x), &y) })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simd::is_cpu_detected!("a2") {
        c.bench_function("floating_f32::reduce_max_of_abs_d_and_sum_of_d2::a2", |b| {
            b.iter(|| unsafe { k::reduce_max_of_abs_d_and_sum_of_d2_a2(black_box(&x), &y) })
        });
    }
    c.bench_function("floating_f32::reduce_max_of_abs_d_and_sum_of_d2", |b| {
        b.iter(|| k::reduce_max_of_abs_d_and_sum_of_d2(black_box(&x), &y))
    });
}

fn floating_f16_reduce_max_of_abs_d_and_sum_of_d2(c: &mut Criterion) {
    use rand::Rng;
    use simd::f16;
    use simd::floating_f16::reduce_max_of_abs_d_and_sum_of_d2 as k;
    let mut rng = rand::rng();
    let x = (0..4095)
        .map(|_| f16::from_f32(rng.random_range(-1.0..=1.0)))
        .collect::<Vec<_>>();
    let y = (0..4095)
        .map(|_| f16::from_f32(rng.random_range(-1.0..=1.0)))
        .collect::<Vec<_>>();
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v4") {
        c.bench_function("floating_f16::reduce_max_of_abs_d_and_sum_of_d2::v4", |b| {
            b.iter(|| unsafe { k::reduce_max_of_abs_d_and_sum_of_d2_v4(black_box(&x), &y) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v3") {
        c.bench_function("floating_f16::reduce_max_of_abs_d_and_sum_of_d2::v3", |b| {
            b.iter(|| unsafe { k::reduce_max_of_abs_d_and_sum_of_d2_v3(black_box(&x), &y) })
        });
    }
    c.bench_function("floating_f16::reduce_max_of_abs_d_and_sum_of_d2", |b| {
        b.iter(|| k::reduce_max_of_abs_d_and_sum_of_d2(black_box(&x), &y))
    });
}

criterion_group!(
    benches,
    floating_f32_reduce_max_of_abs_d_and_sum_of_d2,
    floating_f16_reduce_max_of_abs_d_and_sum_of_d2
);
criterion_main!(benches);
