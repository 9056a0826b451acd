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

// Horizontal reductions that have no single instruction. Sums are widened to
// f64 before any lanes are combined.

#[inline]
#[cfg(target_arch = "x86_64")]
#[crate::target_cpu(enable = "v2")]
pub fn emulate_mm_reduce_max_ps(x: core::arch::x86_64::__m128) -> f32 {
    use core::arch::x86_64::*;
    let s = _mm_max_ps(x, _mm_movehl_ps(x, x));
    let s = _mm_max_ss(s, _mm_movehdup_ps(s));
    _mm_cvtss_f32(s)
}

#[inline]
#[cfg(target_arch = "x86_64")]
#[crate::target_cpu(enable = "v2")]
pub fn emulate_mm_reduce_add_ps_as_pd(x: core::arch::x86_64::__m128) -> f64 {
    use core::arch::x86_64::*;
    let lo = _mm_cvtps_pd(x);
    let hi = _mm_cvtps_pd(_mm_movehl_ps(x, x));
    let s = _mm_add_pd(hi, lo);
    let s = _mm_add_sd(s, _mm_unpackhi_pd(s, s));
    _mm_cvtsd_f64(s)
}

#[inline]
#[cfg(target_arch = "x86_64")]
#[crate::target_cpu(enable = "v3")]
pub fn emulate_mm256_reduce_max_ps(x: core::arch::x86_64::__m256) -> f32 {
    use core::arch::x86_64::*;
    let lo = _mm256_castps256_ps128(x);
    let hi = _mm256_extractf128_ps::<1>(x);
    emulate_mm_reduce_max_ps(_mm_max_ps(hi, lo))
}

#[inline]
#[cfg(target_arch = "x86_64")]
#[crate::target_cpu(enable = "v3")]
pub fn emulate_mm256_reduce_add_ps_as_pd(x: core::arch::x86_64::__m256) -> f64 {
    use core::arch::x86_64::*;
    let lo = _mm256_cvtps_pd(_mm256_castps256_ps128(x));
    let hi = _mm256_cvtps_pd(_mm256_extractf128_ps::<1>(x));
    let d = _mm256_add_pd(hi, lo);
    let s = _mm_add_pd(_mm256_extractf128_pd::<1>(d), _mm256_castpd256_pd128(d));
    let s = _mm_add_sd(s, _mm_unpackhi_pd(s, s));
    _mm_cvtsd_f64(s)
}

#[inline]
#[cfg(target_arch = "x86_64")]
#[crate::target_cpu(enable = "v4")]
pub fn emulate_mm512_reduce_add_ps_as_pd(x: core::arch::x86_64::__m512) -> f64 {
    use core::arch::x86_64::*;
    let lo = _mm512_cvtps_pd(_mm512_castps512_ps256(x));
    let hi = _mm512_cvtps_pd(_mm512_extractf32x8_ps::<1>(x));
    _mm512_reduce_add_pd(_mm512_add_pd(hi, lo))
}

#[cfg(all(target_arch = "x86_64", test))]
#[test]
fn emulate_mm256_reduce_add_ps_as_pd_test() {
    use core::arch::x86_64::*;
    if !crate::is_cpu_detected!("v3") {
        println!("test {} ... skipped (v3)", module_path!());
        return;
    }
    // 2^24 + 1 is not representable in f32, so an f32 tree would drop the ones
    let lanes = [16777216.0f32, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
    let sum = unsafe { emulate_mm256_reduce_add_ps_as_pd(_mm256_loadu_ps(lanes.as_ptr())) };
    assert_eq!(sum, 16777223.0f64);
    let max = unsafe { emulate_mm256_reduce_max_ps(_mm256_loadu_ps(lanes.as_ptr())) };
    assert_eq!(max, 16777216.0f32);
}

#[cfg(all(target_arch = "x86_64", test))]
#[test]
fn emulate_mm_reduce_add_ps_as_pd_test() {
    use core::arch::x86_64::*;
    if !crate::is_cpu_detected!("v2") {
        println!("test {} ... skipped (v2)", module_path!());
        return;
    }
    let lanes = [1.0f32, 16777216.0, 1.0, 1.0];
    let sum = unsafe { emulate_mm_reduce_add_ps_as_pd(_mm_loadu_ps(lanes.as_ptr())) };
    assert_eq!(sum, 16777219.0f64);
    let max = unsafe { emulate_mm_reduce_max_ps(_mm_loadu_ps(lanes.as_ptr())) };
    assert_eq!(max, 16777216.0f32);
}

#[cfg(all(target_arch = "x86_64", test))]
#[test]
#[cfg_attr(miri, ignore)]
fn emulate_mm512_reduce_add_ps_as_pd_test() {
    use core::arch::x86_64::*;
    if !crate::is_cpu_detected!("v4") {
        println!("test {} ... skipped (v4)", module_path!());
        return;
    }
    let mut lanes = [1.0f32; 16];
    lanes[9] = 16777216.0;
    let sum = unsafe { emulate_mm512_reduce_add_ps_as_pd(_mm512_loadu_ps(lanes.as_ptr())) };
    assert_eq!(sum, 16777231.0f64);
}
