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

//! Loading source elements into `f32` lanes.
//!
//! Every partial load reads exactly the elements it is given: the tail of a
//! buffer may sit at the very end of an allocation.

use crate::Floating;

/// `W` promoted values.
pub type Lane<const W: usize> = [f32; W];

/// Promotes a full chunk. `src.len()` must be `W`.
#[inline(always)]
pub fn load<T: Floating, const W: usize>(src: &[T]) -> Lane<W> {
    debug_assert!(src.len() == W);
    core::array::from_fn(|i| src[i].scalar_to_f32())
}

/// Promotes a tail of `1..=W` elements from each buffer into zero-padded
/// lanes. Any other count, or mismatched counts, yields two zero lanes.
#[inline(always)]
pub fn load_partial<T: Floating, const W: usize>(x: &[T], y: &[T]) -> (Lane<W>, Lane<W>) {
    let count = x.len();
    let mut fx = [0.0f32; W];
    let mut fy = [0.0f32; W];
    if !(1..=W).contains(&count) || y.len() != count {
        return (fx, fy);
    }
    for i in 0..count {
        fx[i] = x[i].scalar_to_f32();
        fy[i] = y[i].scalar_to_f32();
    }
    (fx, fy)
}

/// Copies a tail of at most `W` source elements into a zero-filled array, so
/// that a full-width load can be issued against the copy.
#[inline(always)]
pub fn partial_load<T: Floating, const W: usize>(src: &[T]) -> [T; W] {
    let mut buffer = [T::zero(); W];
    let n = src.len().min(W);
    buffer[..n].copy_from_slice(&src[..n]);
    buffer
}

#[cfg(target_arch = "x86_64")]
mod x86_64 {
    use core::arch::x86_64::*;

    /// # Safety
    ///
    /// `p` must be valid for reads of 2 elements.
    #[inline]
    #[crate::target_cpu(enable = "v3")]
    unsafe fn load_f32x2(p: *const f32) -> __m128 {
        let bits = unsafe { p.cast::<i64>().read_unaligned() };
        _mm_castsi128_ps(_mm_cvtsi64_si128(bits))
    }

    /// # Safety
    ///
    /// `p` must be valid for reads of 3 elements.
    #[inline]
    #[crate::target_cpu(enable = "v3")]
    unsafe fn load_f32x3(p: *const f32) -> __m128 {
        let low = unsafe { load_f32x2(p) };
        let third = unsafe { _mm_load_ss(p.add(2)) };
        _mm_insert_ps::<0x20>(low, third)
    }

    /// Widens a tail of `1..=7` `f32` into a zero-padded 8-lane register,
    /// built from 1, 2 and 4 element loads.
    #[inline]
    #[crate::target_cpu(enable = "v3")]
    pub fn load_partial_f32x8_v3(x: &[f32]) -> __m256 {
        let p = x.as_ptr();
        let zero = _mm_setzero_ps();
        let (low, high) = match x.len() {
            1 => (unsafe { _mm_load_ss(p) }, zero),
            2 => (unsafe { load_f32x2(p) }, zero),
            3 => (unsafe { load_f32x3(p) }, zero),
            4 => (unsafe { _mm_loadu_ps(p) }, zero),
            5 => unsafe { (_mm_loadu_ps(p), _mm_load_ss(p.add(4))) },
            6 => unsafe { (_mm_loadu_ps(p), load_f32x2(p.add(4))) },
            7 => unsafe { (_mm_loadu_ps(p), load_f32x3(p.add(4))) },
            _ => return _mm256_setzero_ps(),
        };
        _mm256_setr_m128(low, high)
    }

    /// Widens a tail of `1..=7` `f16` into a zero-padded 8-lane register,
    /// built from 2, 4 and 8 byte loads plus single element inserts.
    #[inline]
    #[crate::target_cpu(enable = "v3")]
    pub fn load_partial_f16x8_v3(x: &[crate::f16]) -> __m256 {
        let p = x.as_ptr();
        let word = |i: usize| x[i].to_bits() as i32;
        let dword = |i: usize| unsafe { p.add(i).cast::<i32>().read_unaligned() };
        let qword = || unsafe { p.cast::<i64>().read_unaligned() };
        let bits = match x.len() {
            1 => _mm_cvtsi32_si128(word(0)),
            2 => _mm_cvtsi32_si128(dword(0)),
            3 => _mm_insert_epi16::<2>(_mm_cvtsi32_si128(dword(0)), word(2)),
            4 => _mm_cvtsi64_si128(qword()),
            5 => _mm_insert_epi16::<4>(_mm_cvtsi64_si128(qword()), word(4)),
            6 => _mm_insert_epi32::<2>(_mm_cvtsi64_si128(qword()), dword(4)),
            7 => {
                let bits = _mm_insert_epi32::<2>(_mm_cvtsi64_si128(qword()), dword(4));
                _mm_insert_epi16::<6>(bits, word(6))
            }
            _ => return _mm256_setzero_ps(),
        };
        _mm256_cvtph_ps(bits)
    }

    #[inline]
    #[crate::target_cpu(enable = "v3")]
    pub fn load_partial_f32_v3(x: &[f32], y: &[f32]) -> (__m256, __m256) {
        if x.len() != y.len() {
            return (_mm256_setzero_ps(), _mm256_setzero_ps());
        }
        (load_partial_f32x8_v3(x), load_partial_f32x8_v3(y))
    }

    #[inline]
    #[crate::target_cpu(enable = "v3")]
    pub fn load_partial_f16_v3(x: &[crate::f16], y: &[crate::f16]) -> (__m256, __m256) {
        if x.len() != y.len() {
            return (_mm256_setzero_ps(), _mm256_setzero_ps());
        }
        (load_partial_f16x8_v3(x), load_partial_f16x8_v3(y))
    }
}

#[cfg(target_arch = "x86_64")]
pub use x86_64::{
    load_partial_f16_v3, load_partial_f16x8_v3, load_partial_f32_v3, load_partial_f32x8_v3,
};

#[test]
fn load_partial_pads_with_zero() {
    let x = [1.0f32, 2.0, 3.0];
    let y = [4.0f32, 5.0, 6.0];
    let (fx, fy) = load_partial::<f32, 8>(&x, &y);
    assert_eq!(fx, [1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(fy, [4.0, 5.0, 6.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let (fx, fy) = load_partial::<f32, 8>(&[], &[]);
    assert_eq!(fx, [0.0; 8]);
    assert_eq!(fy, [0.0; 8]);
    let wide = [1.0f32; 9];
    let (fx, fy) = load_partial::<f32, 8>(&wide, &wide);
    assert_eq!(fx, [0.0; 8]);
    assert_eq!(fy, [0.0; 8]);
}

#[test]
fn partial_load_copies_only_the_tail() {
    let x = [crate::f16::from_f32(1.5), crate::f16::from_f32(-2.0)];
    let buffer = partial_load::<crate::f16, 4>(&x);
    assert_eq!(buffer[0].to_f32(), 1.5);
    assert_eq!(buffer[1].to_f32(), -2.0);
    assert_eq!(buffer[2].to_bits(), 0);
    assert_eq!(buffer[3].to_bits(), 0);
}

#[cfg(all(target_arch = "x86_64", test))]
#[test]
fn load_partial_v3_test() {
    use core::arch::x86_64::*;
    if !crate::is_cpu_detected!("v3") {
        println!("test {} ... skipped (v3)", module_path!());
        return;
    }
    let values = [1.0f32, -2.0, 3.5, f32::NAN, 5.0, f32::INFINITY, -7.25];
    let halves = values.map(crate::f16::from_f32);
    for count in 1..8 {
        // the tail is copied to the end of its own allocation
        let x: Box<[f32]> = values[..count].into();
        let y: Box<[crate::f16]> = halves[..count].into();
        let mut fx = [0.0f32; 8];
        let mut fy = [0.0f32; 8];
        unsafe {
            _mm256_storeu_ps(fx.as_mut_ptr(), load_partial_f32x8_v3(&x));
            _mm256_storeu_ps(fy.as_mut_ptr(), load_partial_f16x8_v3(&y));
        }
        let (ex, _) = load_partial::<f32, 8>(&x, &x);
        let (ey, _) = load_partial::<crate::f16, 8>(&y, &y);
        assert_eq!(
            fx.map(f32::to_bits),
            ex.map(f32::to_bits),
            "count = {count}"
        );
        assert_eq!(
            fy.map(f32::to_bits),
            ey.map(f32::to_bits),
            "count = {count}"
        );
    }
    let (fx, fy) = unsafe { load_partial_f32_v3(&[], &[]) };
    let mut out = [1.0f32; 8];
    unsafe { _mm256_storeu_ps(out.as_mut_ptr(), fx) };
    assert_eq!(out, [0.0; 8]);
    unsafe { _mm256_storeu_ps(out.as_mut_ptr(), fy) };
    assert_eq!(out, [0.0; 8]);
}
