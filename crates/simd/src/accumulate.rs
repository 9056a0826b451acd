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

//! Running `max |d|` and `sum d²` over pairs of lanes.
//!
//! Positions whose two inputs have identical bits contribute a zero
//! difference, so equal NaNs and equal infinities never poison the result.
//! A NaN difference between two different inputs is skipped by the maximum
//! and propagates into the sum.

use crate::lane::Lane;

/// Pairwise maximum, halving the width until one value remains.
#[inline(always)]
pub fn reduce_max_of_x<const W: usize>(mut v: Lane<W>) -> f32 {
    const { assert!(W.is_power_of_two()) };
    let mut width = W;
    while width > 1 {
        width /= 2;
        for i in 0..width {
            v[i] = v[i].max(v[i + width]);
        }
    }
    v[0]
}

/// Widens every lane to `f64`, then adds pairwise, halving the width.
#[inline(always)]
pub fn reduce_sum_of_x_as_f64<const W: usize>(v: Lane<W>) -> f64 {
    const { assert!(W.is_power_of_two()) };
    let mut s = v.map(f64::from);
    let mut width = W;
    while width > 1 {
        width /= 2;
        for i in 0..width {
            s[i] += s[i + width];
        }
    }
    s[0]
}

#[derive(Debug, Clone, Copy)]
pub struct DiffAcc<const W: usize> {
    max_abs: Lane<W>,
    sum_of_d2: Lane<W>,
}

impl<const W: usize> Default for DiffAcc<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize> DiffAcc<W> {
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            max_abs: [0.0; W],
            sum_of_d2: [0.0; W],
        }
    }

    #[inline(always)]
    pub fn add(&mut self, a: Lane<W>, b: Lane<W>) {
        for i in 0..W {
            let d = if a[i].to_bits() == b[i].to_bits() {
                0.0
            } else {
                b[i] - a[i]
            };
            self.sum_of_d2[i] += d * d;
            self.max_abs[i] = d.abs().max(self.max_abs[i]);
        }
    }

    /// Returns `(max |d|, sum d²)`.
    #[inline(always)]
    pub fn reduce(self) -> (f32, f64) {
        (
            reduce_max_of_x(self.max_abs),
            reduce_sum_of_x_as_f64(self.sum_of_d2),
        )
    }
}

#[cfg(target_arch = "x86_64")]
mod x86_64 {
    use crate::emulate::*;
    use core::arch::x86_64::*;

    pub struct DiffAccV4 {
        max_abs: __m512,
        sum_of_d2: __m512,
    }

    #[allow(clippy::new_without_default)]
    impl DiffAccV4 {
        #[inline]
        #[crate::target_cpu(enable = "v4")]
        pub fn new() -> Self {
            Self {
                max_abs: _mm512_setzero_ps(),
                sum_of_d2: _mm512_setzero_ps(),
            }
        }

        #[inline]
        #[crate::target_cpu(enable = "v4")]
        pub fn add(&mut self, a: __m512, b: __m512) {
            let d = _mm512_sub_ps(b, a);
            let eq = _mm512_cmpeq_epi32_mask(_mm512_castps_si512(a), _mm512_castps_si512(b));
            let d = _mm512_maskz_mov_ps(!eq, d);
            self.sum_of_d2 = _mm512_fmadd_ps(d, d, self.sum_of_d2);
            self.max_abs = _mm512_max_ps(_mm512_abs_ps(d), self.max_abs);
        }

        #[inline]
        #[crate::target_cpu(enable = "v4")]
        pub fn reduce(self) -> (f32, f64) {
            (
                _mm512_reduce_max_ps(self.max_abs),
                emulate_mm512_reduce_add_ps_as_pd(self.sum_of_d2),
            )
        }
    }

    pub struct DiffAccV3 {
        max_abs: __m256,
        sum_of_d2: __m256,
    }

    #[allow(clippy::new_without_default)]
    impl DiffAccV3 {
        #[inline]
        #[crate::target_cpu(enable = "v3")]
        pub fn new() -> Self {
            Self {
                max_abs: _mm256_setzero_ps(),
                sum_of_d2: _mm256_setzero_ps(),
            }
        }

        #[inline]
        #[crate::target_cpu(enable = "v3")]
        pub fn add(&mut self, a: __m256, b: __m256) {
            let d = _mm256_sub_ps(b, a);
            let eq = _mm256_cmpeq_epi32(_mm256_castps_si256(a), _mm256_castps_si256(b));
            let d = _mm256_andnot_ps(_mm256_castsi256_ps(eq), d);
            self.sum_of_d2 = _mm256_fmadd_ps(d, d, self.sum_of_d2);
            let abs = _mm256_andnot_ps(_mm256_set1_ps(-0.0), d);
            // maxps returns the second operand when either is NaN
            self.max_abs = _mm256_max_ps(abs, self.max_abs);
        }

        #[inline]
        #[crate::target_cpu(enable = "v3")]
        pub fn reduce(self) -> (f32, f64) {
            (
                emulate_mm256_reduce_max_ps(self.max_abs),
                emulate_mm256_reduce_add_ps_as_pd(self.sum_of_d2),
            )
        }
    }

    pub struct DiffAccV2 {
        max_abs: __m128,
        sum_of_d2: __m128,
    }

    #[allow(clippy::new_without_default)]
    impl DiffAccV2 {
        #[inline]
        #[crate::target_cpu(enable = "v2")]
        pub fn new() -> Self {
            Self {
                max_abs: _mm_setzero_ps(),
                sum_of_d2: _mm_setzero_ps(),
            }
        }

        #[inline]
        #[crate::target_cpu(enable = "v2")]
        pub fn add(&mut self, a: __m128, b: __m128) {
            let d = _mm_sub_ps(b, a);
            let eq = _mm_cmpeq_epi32(_mm_castps_si128(a), _mm_castps_si128(b));
            let d = _mm_andnot_ps(_mm_castsi128_ps(eq), d);
            self.sum_of_d2 = _mm_add_ps(_mm_mul_ps(d, d), self.sum_of_d2);
            let abs = _mm_andnot_ps(_mm_set1_ps(-0.0), d);
            self.max_abs = _mm_max_ps(abs, self.max_abs);
        }

        #[inline]
        #[crate::target_cpu(enable = "v2")]
        pub fn reduce(self) -> (f32, f64) {
            (
                emulate_mm_reduce_max_ps(self.max_abs),
                emulate_mm_reduce_add_ps_as_pd(self.sum_of_d2),
            )
        }
    }
}

#[cfg(target_arch = "x86_64")]
pub use x86_64::{DiffAccV2, DiffAccV3, DiffAccV4};

#[cfg(target_arch = "aarch64")]
mod aarch64 {
    use core::arch::aarch64::*;

    pub struct DiffAccA2 {
        max_abs: float32x4_t,
        sum_of_d2: float32x4_t,
    }

    #[allow(clippy::new_without_default)]
    impl DiffAccA2 {
        #[inline]
        #[crate::target_cpu(enable = "a2")]
        pub fn new() -> Self {
            Self {
                max_abs: vdupq_n_f32(0.0),
                sum_of_d2: vdupq_n_f32(0.0),
            }
        }

        #[inline]
        #[crate::target_cpu(enable = "a2")]
        pub fn add(&mut self, a: float32x4_t, b: float32x4_t) {
            let d = vsubq_f32(b, a);
            let eq = vceqq_u32(vreinterpretq_u32_f32(a), vreinterpretq_u32_f32(b));
            let d = vreinterpretq_f32_u32(vbicq_u32(vreinterpretq_u32_f32(d), eq));
            self.sum_of_d2 = vfmaq_f32(self.sum_of_d2, d, d);
            self.max_abs = vmaxnmq_f32(self.max_abs, vabsq_f32(d));
        }

        #[inline]
        #[crate::target_cpu(enable = "a2")]
        pub fn reduce(self) -> (f32, f64) {
            let lo = vcvt_f64_f32(vget_low_f32(self.sum_of_d2));
            let hi = vcvt_high_f64_f32(self.sum_of_d2);
            (vmaxnmvq_f32(self.max_abs), vaddvq_f64(vaddq_f64(hi, lo)))
        }
    }
}

#[cfg(target_arch = "aarch64")]
pub use aarch64::DiffAccA2;

#[test]
fn reduce_sum_of_x_as_f64_widens_first() {
    let mut lanes = [1.0f32; 8];
    lanes[0] = 16777216.0;
    assert_eq!(reduce_sum_of_x_as_f64(lanes), 16777223.0);
    assert_eq!(reduce_max_of_x(lanes), 16777216.0);
    assert_eq!(reduce_max_of_x([0.5f32, 3.0, -9.0, 2.0]), 3.0);
}

#[test]
fn diff_acc_masks_identical_bits() {
    let mut acc = DiffAcc::<4>::new();
    let a = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 1.0];
    let b = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 1.5];
    acc.add(a, b);
    let (max, sum) = acc.reduce();
    assert_eq!(max, 0.5);
    assert_eq!(sum, 0.25);
}

#[test]
fn diff_acc_signed_zero() {
    let mut acc = DiffAcc::<4>::new();
    acc.add([0.0, -0.0, 0.0, 0.0], [-0.0, 0.0, 0.0, 0.0]);
    let (max, sum) = acc.reduce();
    assert_eq!(max.to_bits(), 0.0f32.to_bits());
    assert_eq!(sum, 0.0);
}

#[test]
fn diff_acc_distinct_nan() {
    let mut acc = DiffAcc::<4>::new();
    acc.add([f32::NAN, 1.0, 0.0, 0.0], [2.0, 3.0, 0.0, 0.0]);
    let (max, sum) = acc.reduce();
    assert_eq!(max, 2.0);
    assert!(sum.is_nan());
}
