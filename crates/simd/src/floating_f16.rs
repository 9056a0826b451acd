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

use crate::{Floating, f16};

impl Floating for f16 {
    #[inline(always)]
    fn zero() -> Self {
        f16::ZERO
    }

    #[inline(always)]
    fn scalar_to_f32(self) -> f32 {
        self.to_f32()
    }

    #[inline(always)]
    fn reduce_max_of_abs_d_and_sum_of_d2(lhs: &[f16], rhs: &[f16]) -> (f32, f64) {
        reduce_max_of_abs_d_and_sum_of_d2::reduce_max_of_abs_d_and_sum_of_d2(lhs, rhs)
    }
}

pub mod reduce_max_of_abs_d_and_sum_of_d2 {
    use crate::accumulate::DiffAcc;
    use crate::f16;
    use crate::lane::{load, load_partial};

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    pub fn reduce_max_of_abs_d_and_sum_of_d2_v4(lhs: &[f16], rhs: &[f16]) -> (f32, f64) {
        use crate::accumulate::DiffAccV4;
        use core::arch::x86_64::*;
        assert!(lhs.len() == rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut acc = DiffAccV4::new();
        while n >= 16 {
            let x = unsafe { _mm512_cvtph_ps(_mm256_loadu_epi16(a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_loadu_epi16(b.cast())) };
            acc.add(x, y);
            (n, a, b) = unsafe { (n - 16, a.add(16), b.add(16)) };
        }
        if n > 0 {
            let mask = _bzhi_u32(0xffff, n as u32) as u16;
            let x = unsafe { _mm512_cvtph_ps(_mm256_maskz_loadu_epi16(mask, a.cast())) };
            let y = unsafe { _mm512_cvtph_ps(_mm256_maskz_loadu_epi16(mask, b.cast())) };
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
    pub fn reduce_max_of_abs_d_and_sum_of_d2_v3(lhs: &[f16], rhs: &[f16]) -> (f32, f64) {
        use crate::accumulate::DiffAccV3;
        use crate::lane::load_partial_f16_v3;
        use core::arch::x86_64::*;
        assert!(lhs.len() == rhs.len());
        let mut n = lhs.len();
        let mut a = lhs.as_ptr();
        let mut b = rhs.as_ptr();
        let mut acc = DiffAccV3::new();
        while n >= 8 {
            let x = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(a.cast())) };
            let y = unsafe { _mm256_cvtph_ps(_mm_loadu_si128(b.cast())) };
            acc.add(x, y);
            (n, a, b) = unsafe { (n - 8, a.add(8), b.add(8)) };
        }
        if n > 0 {
            let tail = lhs.len() - n;
            let (x, y) = load_partial_f16_v3(&lhs[tail..], &rhs[tail..]);
            acc.add(x, y);
        }
        acc.reduce()
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
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

    // no stable f16 conversion intrinsics on v2 and a2, so these get the
    // autovectorized body
    #[crate::multiversion(@"v4", @"v3", "v2", "a2")]
    pub fn reduce_max_of_abs_d_and_sum_of_d2(lhs: &[f16], rhs: &[f16]) -> (f32, f64) {
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
    fn reduce_max_of_abs_d_and_sum_of_d2_matches_promoted_f32() {
        use rand::Rng;
        let mut rng = rand::rng();
        for n in [1, 7, 8, 9, 15, 16, 17, 255, 1031] {
            let lhs = (0..n)
                .map(|_| f16::from_f32(rng.random_range(-8.0..=8.0)))
                .collect::<Vec<_>>();
            let rhs = (0..n)
                .map(|_| f16::from_f32(rng.random_range(-8.0..=8.0)))
                .collect::<Vec<_>>();
            let wide_lhs = lhs.iter().map(|x| x.to_f32()).collect::<Vec<_>>();
            let wide_rhs = rhs.iter().map(|x| x.to_f32()).collect::<Vec<_>>();
            let half = reduce_max_of_abs_d_and_sum_of_d2(&lhs, &rhs);
            let single =
                <f32 as crate::Floating>::reduce_max_of_abs_d_and_sum_of_d2(&wide_lhs, &wide_rhs);
            assert_eq!(half.0, single.0, "n = {n}");
            assert!(
                (half.1 - single.1).abs() <= 1e-5 * single.1.max(1.0),
                "n = {n}, half = {half:?}, single = {single:?}"
            );
        }
    }
}
