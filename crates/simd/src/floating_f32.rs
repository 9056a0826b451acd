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

use crate::Floating;

impl Floating for f32 {
    #[inline(always)]
    fn zero() -> Self {
        0.0f32
    }

    #[inline(always)]
    fn scalar_to_f32(self) -> f32 {
        self
    }

    #[inline(always)]
    fn reduce_max_of_abs_d_and_sum_of_d2(lhs: &[f32], rhs: &[f32]) -> (f32, f64) {
        reduce_max_of_abs_d_and_sum_of_d2::reduce_max_of_abs_d_and_sum_of_d2(lhs, rhs)
    }
}

pub mod reduce_max_of_abs_d_and_sum_of_d2 {
    use crate::accumulate::DiffAcc;
    use crate::lane::{load, load_partial};

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    pub fn reduce_max_of_abs_d_and_sum_of_d2_v4(lhs: &[f32], rhs: &[f32]) -> (f32, f64) {
        use crate::accumulate::DiffAccV4;
        use core::arch::x86_64::*;
        assert!(lhs.len() == rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut acc = DiffAccV4::new();
        while n >= 16 {
            let x = unsafe { _mm512_loadu_ps(a) };
            let y = unsafe { _mm512_loadu_ps(b) };
            acc.add(x, y);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let mask = _bzhi_u32(0xffff, n as u32) as u16;
            let x = unsafe { _mm512_maskz_loadu_ps(mask, a) };
            let y = unsafe { _mm512_maskz_loadu_ps(mask, b) };
            acc.add(x, y);
        }
        acc.reduce()
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn reduce_max_of_abs_d_and_sum_of_d2_v4_test() {
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        for (lhs, rhs) in tests::samples() {
            for z in 3984..4016 {
                let (lhs, rhs) = (&lhs[..z], &rhs[..z]);
                let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_v4(lhs, rhs) };
                tests::check(specialized, fallback(lhs, rhs));
            }
        }
        for (lhs, rhs) in tests::poisoned() {
            let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_v4(&lhs, &rhs) };
            tests::check_poisoned(specialized, fallback(&lhs, &rhs));
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    pub fn reduce_max_of_abs_d_and_sum_of_d2_v3(lhs: &[f32], rhs: &[f32]) -> (f32, f64) {
        use crate::accumulate::DiffAccV3;
        use crate::lane::load_partial_f32_v3;
        use core::arch::x86_64::*;
        assert!(lhs.len() == rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut acc = DiffAccV3::new();
        while n >= 8 {
            let x = unsafe { _mm256_loadu_ps(a) };
            let y = unsafe { _mm256_loadu_ps(b) };
            acc.add(x, y);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let tail = lhs.len() - n;
            let (x, y) = load_partial_f32_v3(&lhs[tail..], &rhs[tail..]);
            acc.add(x, y);
        }
        acc.reduce()
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn reduce_max_of_abs_d_and_sum_of_d2_v3_test() {
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        for (lhs, rhs) in tests::samples() {
            for z in 3984..4016 {
                let (lhs, rhs) = (&lhs[..z], &rhs[..z]);
                let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_v3(lhs, rhs) };
                tests::check(specialized, fallback(lhs, rhs));
            }
        }
        for (lhs, rhs) in tests::poisoned() {
            let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_v3(&lhs, &rhs) };
            tests::check_poisoned(specialized, fallback(&lhs, &rhs));
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    pub fn reduce_max_of_abs_d_and_sum_of_d2_v2(lhs: &[f32], rhs: &[f32]) -> (f32, f64) {
        use crate::accumulate::DiffAccV2;
        use crate::lane::partial_load;
        use core::arch::x86_64::*;
        assert!(lhs.len() == rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut acc = DiffAccV2::new();
        while n >= 4 {
            let x = unsafe { _mm_loadu_ps(a) };
            let y = unsafe { _mm_loadu_ps(b) };
            acc.add(x, y);
            (n, a, b) = unsafe { (n - 4, a.add(4), b.add(4)) };
        }
        if n > 0 {
            let tail = lhs.len() - n;
            let _a = partial_load::<f32, 4>(&lhs[tail..]);
            let _b = partial_load::<f32, 4>(&rhs[tail..]);
            let x = unsafe { _mm_loadu_ps(_a.as_ptr()) };
            let y = unsafe { _mm_loadu_ps(_b.as_ptr()) };
            acc.add(x, y);
        }
        acc.reduce()
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn reduce_max_of_abs_d_and_sum_of_d2_v2_test() {
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        for (lhs, rhs) in tests::samples() {
            for z in 3984..4016 {
                let (lhs, rhs) = (&lhs[..z], &rhs[..z]);
                let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_v2(lhs, rhs) };
                tests::check(specialized, fallback(lhs, rhs));
            }
        }
        for (lhs, rhs) in tests::poisoned() {
            let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_v2(&lhs, &rhs) };
            tests::check_poisoned(specialized, fallback(&lhs, &rhs));
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    pub fn reduce_max_of_abs_d_and_sum_of_d2_a2(lhs: &[f32], rhs: &[f32]) -> (f32, f64) {
        use crate::accumulate::DiffAccA2;
        use crate::lane::partial_load;
        use core::arch::aarch64::*;
        assert!(lhs.len() == rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut acc = DiffAccA2::new();
        while n >= 4 {
            let x = unsafe { vld1q_f32(a) };
            let y = unsafe { vld1q_f32(b) };
            acc.add(x, y);
            (n, a, b) = unsafe { (n - 4, a.add(4), b.add(4)) };
        }
        if n > 0 {
            let tail = lhs.len() - n;
            let _a = partial_load::<f32, 4>(&lhs[tail..]);
            let _b = partial_load::<f32, 4>(&rhs[tail..]);
            let x = unsafe { vld1q_f32(_a.as_ptr()) };
            let y = unsafe { vld1q_f32(_b.as_ptr()) };
            acc.add(x, y);
        }
        acc.reduce()
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn reduce_max_of_abs_d_and_sum_of_d2_a2_test() {
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        for (lhs, rhs) in tests::samples() {
            for z in 3984..4016 {
                let (lhs, rhs) = (&lhs[..z], &rhs[..z]);
                let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_a2(lhs, rhs) };
                tests::check(specialized, fallback(lhs, rhs));
            }
        }
        for (lhs, rhs) in tests::poisoned() {
            let specialized = unsafe { reduce_max_of_abs_d_and_sum_of_d2_a2(&lhs, &rhs) };
            tests::check_poisoned(specialized, fallback(&lhs, &rhs));
        }
    }

    #[crate::multiversion(@"v4", @"v3", @"v2", @"a2")]
    pub fn reduce_max_of_abs_d_and_sum_of_d2(lhs: &[f32], rhs: &[f32]) -> (f32, f64) {
        assert!(lhs.len() == rhs.len());
        let mut acc = DiffAcc::<8>::new();
        let x = lhs.chunks_exact(8);
        let y = rhs.chunks_exact(8);
        let (x_tail, y_tail) = (x.remainder(), y.remainder());
        for (x, y) in x.zip(y) {
            acc.add(load(x), load(y));
        }
        if !x_tail.is_empty() {
            let (x, y) = load_partial(x_tail, y_tail);
            acc.add(x, y);
        }
        acc.reduce()
    }


    #[test]
    fn reduce_max_of_abs_d_and_sum_of_d2_tails() {
        let lhs = (0..53).map(|i| i as f32 * 0.25).collect::<Vec<_>>();
        let rhs = (0..53)
            .map(|i| i as f32 * 0.25 + (i % 3) as f32)
            .collect::<Vec<_>>();
        for n in 1..53 {
            let (max, sum) = reduce_max_of_abs_d_and_sum_of_d2(&lhs[..n], &rhs[..n]);
            let expected_max = (0..n).map(|i| (i % 3) as f32).fold(0.0f32, f32::max);
            let expected_sum = (0..n).map(|i| ((i % 3) * (i % 3)) as f64).sum::<f64>();
            assert_eq!(max, expected_max, "n = {n}");
            assert_eq!(sum, expected_sum, "n = {n}");
        }
    }
}

#[test]
fn reduce_max_of_abs_d_and_sum_of_d2_example() {
    let (max, sum) = f32::reduce_max_of_abs_d_and_sum_of_d2(&[1.0, 2.0, 3.0], &[1.0, 2.5, 3.0]);
    assert_eq!(max, 0.5);
    assert_eq!(sum, 0.25);
}
