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

use crate::error::DiffError;
use crate::options::DiffOptions;
use crate::tensor::{ElementType, Tensor};
use simd::Floating;
use std::fmt::{Display, Formatter};

/// Summary of how far two equally sized buffers are apart.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TensorDiff {
    pub length: usize,
    /// `max |rhs[i] - lhs[i]|`, with bit-identical pairs counted as zero.
    pub max_abs_diff: f32,
    /// `sum (rhs[i] - lhs[i])² / length`.
    pub avg_diff_squared: f64,
}

impl TensorDiff {
    pub fn print(&self, label: Option<&str>) {
        let TensorDiff {
            length,
            max_abs_diff,
            avg_diff_squared,
        } = *self;
        match label {
            Some(label) => log::debug!(
                "{label}: length {length}, max_abs_diff = {max_abs_diff}, avg_diff_squared = {avg_diff_squared}"
            ),
            None => log::debug!("{self}"),
        }
    }

    pub fn within(&self, options: &DiffOptions) -> bool {
        self.max_abs_diff <= options.max_abs_diff_tolerance
            && self.avg_diff_squared <= options.avg_diff_squared_tolerance
    }
}

impl Display for TensorDiff {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} elements, max_abs_diff = {}, avg_diff_squared = {}",
            self.length, self.max_abs_diff, self.avg_diff_squared
        )
    }
}

/// Compares two buffers of the same encoding.
///
/// Panics if the lengths differ.
pub fn compute_diff<T: Floating>(lhs: &[T], rhs: &[T]) -> TensorDiff {
    assert_eq!(lhs.len(), rhs.len(), "buffers of different lengths");
    let length = lhs.len();
    if length == 0 {
        return TensorDiff::default();
    }
    let (max_abs_diff, sum_of_d2) = T::reduce_max_of_abs_d_and_sum_of_d2(lhs, rhs);
    TensorDiff {
        length,
        max_abs_diff,
        avg_diff_squared: sum_of_d2 / length as f64,
    }
}

/// Compares two tensors of identical layout and element type.
pub fn compute_tensor_diff(lhs: &dyn Tensor, rhs: &dyn Tensor) -> Result<TensorDiff, DiffError> {
    let (lhs_layout, rhs_layout) = (lhs.layout(), rhs.layout());
    if lhs_layout != rhs_layout {
        return Err(DiffError::LayoutMismatch {
            lhs: lhs_layout,
            rhs: rhs_layout,
        });
    }
    let element_type = lhs.element_type();
    if element_type != rhs.element_type() {
        return Err(DiffError::ElementTypeMismatch {
            lhs: element_type,
            rhs: rhs.element_type(),
        });
    }
    match element_type {
        ElementType::F32 => {
            let mut x = Vec::with_capacity(lhs.count().unwrap_or_default());
            let mut y = Vec::with_capacity(rhs.count().unwrap_or_default());
            lhs.download(&mut x)?;
            rhs.download(&mut y)?;
            if x.len() != y.len() {
                return Err(DiffError::LengthMismatch {
                    lhs: x.len(),
                    rhs: y.len(),
                });
            }
            Ok(compute_diff(&x, &y))
        }
        ElementType::F16 => {
            log::warn!("comparing {element_type} tensors of layout {lhs_layout} is not implemented");
            Err(DiffError::NotImplemented(element_type))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{HostData, HostTensor, Layout};
    use rand::Rng;
    use simd::f16;

    fn reference(lhs: &[f32], rhs: &[f32]) -> (f32, f64) {
        let mut max = 0.0f32;
        let mut sum = 0.0f64;
        for (&a, &b) in lhs.iter().zip(rhs) {
            if a.to_bits() == b.to_bits() {
                continue;
            }
            let d = b - a;
            max = max.max(d.abs());
            sum += (d as f64) * (d as f64);
        }
        (max, sum)
    }

    fn random(n: usize, range: f32) -> Vec<f32> {
        let mut rng = rand::rng();
        (0..n).map(|_| rng.random_range(-range..=range)).collect()
    }

    #[test]
    fn example() {
        let diff = compute_diff(&[1.0f32, 2.0, 3.0], &[1.0, 2.5, 3.0]);
        assert_eq!(diff.length, 3);
        assert_eq!(diff.max_abs_diff, 0.5);
        assert_eq!(diff.avg_diff_squared, 0.25 / 3.0);
    }

    #[test]
    fn identity() {
        for n in [1, 5, 8, 100, 4097] {
            let x = random(n, 1000.0);
            let diff = compute_diff(&x, &x);
            assert_eq!(diff.length, n);
            assert_eq!(diff.max_abs_diff, 0.0);
            assert_eq!(diff.avg_diff_squared, 0.0);
        }
    }

    #[test]
    fn empty() {
        let diff = compute_diff::<f32>(&[], &[]);
        assert_eq!(diff, TensorDiff::default());
        let diff = compute_diff::<f16>(&[], &[]);
        assert_eq!(diff.length, 0);
        assert_eq!(diff.avg_diff_squared, 0.0);
    }

    #[test]
    #[should_panic]
    fn different_lengths() {
        compute_diff(&[1.0f32, 2.0], &[1.0]);
    }

    #[test]
    fn non_finite_pairs_are_masked() {
        let mut x = random(77, 1.0);
        let mut y = x.clone();
        for (i, v) in [
            (0, f32::NAN),
            (9, f32::INFINITY),
            (40, f32::NEG_INFINITY),
            (76, f32::NAN),
        ] {
            x[i] = v;
            y[i] = v;
        }
        y[13] += 0.25;
        let diff = compute_diff(&x, &y);
        assert!(diff.max_abs_diff.is_finite());
        assert!(diff.avg_diff_squared.is_finite());
        let (max, sum) = reference(&x, &y);
        assert_eq!(diff.max_abs_diff, max);
        let expected = sum / 77.0;
        assert!((diff.avg_diff_squared - expected).abs() <= 1e-6 * expected);
    }

    #[test]
    fn signed_zero() {
        let diff = compute_diff(&[0.0f32, -0.0, 1.0], &[-0.0, 0.0, 1.0]);
        assert_eq!(diff.max_abs_diff, 0.0);
        assert_eq!(diff.avg_diff_squared, 0.0);
    }

    #[test]
    fn every_tail_length() {
        for k in 0..4 {
            for r in 1..16 {
                let n = k * 16 + r;
                let x = random(n, 10.0);
                let y = random(n, 10.0);
                let (max, sum) = reference(&x, &y);
                // exact allocations, so reading past the end would leave the heap block
                let (bx, by): (Box<[f32]>, Box<[f32]>) = (x.clone().into(), y.clone().into());
                let diff = compute_diff(&bx, &by);
                assert_eq!(diff.max_abs_diff, max, "n = {n}");
                let expected = sum / n as f64;
                assert!(
                    (diff.avg_diff_squared - expected).abs() <= 1e-5 * expected.max(1e-30),
                    "n = {n}, diff = {diff}, expected = {expected}"
                );
                // garbage after the end must not be observed
                let mut px = x.clone();
                let mut py = y.clone();
                px.extend([f32::NAN; 16]);
                py.extend([1e30f32; 16]);
                let padded = compute_diff(&px[..n], &py[..n]);
                assert_eq!(padded, diff, "n = {n}");
            }
        }
    }

    #[test]
    fn magnitude() {
        let x = random(10_001, 100.0);
        let mut y = x.clone();
        y[5_000] += 64.0;
        y[7] -= 3.0;
        let diff = compute_diff(&x, &y);
        let (max, _) = reference(&x, &y);
        assert_eq!(diff.max_abs_diff, max);
        assert!((diff.max_abs_diff - 64.0).abs() < 1e-3);
    }

    #[test]
    fn averaging_precision() {
        // one lane sums 2^30 while the others sum ones; at 2^30 an f32 has a
        // spacing of 128, so the lanes must be widened before they are added
        let n = 1_000_003;
        let x = vec![0.0f32; n];
        let y = (0..n)
            .map(|i| match i {
                0 => 32768.0f32,
                _ if i % 4 == 0 => 0.0,
                _ => 1.0,
            })
            .collect::<Vec<_>>();
        let ones = n - n.div_ceil(4);
        let sum = (1u64 << 30) as f64 + ones as f64;
        let (_, reference_sum) = reference(&x, &y);
        assert_eq!(reference_sum, sum);
        let diff = compute_diff(&x, &y);
        assert_eq!(diff.max_abs_diff, 32768.0);
        assert_eq!(diff.avg_diff_squared, sum / n as f64, "diff = {diff}");
    }

    #[test]
    fn random_small_differences() {
        // lanes accumulate in f32, so generic data only agrees to about 1e-6
        let mut rng = rand::rng();
        let n = 1_000_000;
        let x = random(n, 1.0);
        let y = x
            .iter()
            .map(|&a| a + rng.random_range(0.0..1e-3f32))
            .collect::<Vec<_>>();
        let (_, sum) = reference(&x, &y);
        let expected = sum / n as f64;
        let diff = compute_diff(&x, &y);
        assert!(
            (diff.avg_diff_squared - expected).abs() <= 1e-4 * expected,
            "diff = {diff}, expected = {expected}"
        );
    }

    #[test]
    fn half_matches_promoted_single() {
        let mut rng = rand::rng();
        for n in [1, 3, 8, 15, 16, 17, 1000, 1031] {
            let mut x = (0..n)
                .map(|_| f16::from_f32(rng.random_range(-4.0..=4.0)))
                .collect::<Vec<_>>();
            let mut y = (0..n)
                .map(|_| f16::from_f32(rng.random_range(-4.0..=4.0)))
                .collect::<Vec<_>>();
            (x[0], y[0]) = (f16::NAN, f16::NAN);
            (x[n - 1], y[n - 1]) = (f16::INFINITY, f16::INFINITY);
            let half = compute_diff(&x, &y);
            let wide_x = x.iter().map(|x| x.to_f32()).collect::<Vec<_>>();
            let wide_y = y.iter().map(|x| x.to_f32()).collect::<Vec<_>>();
            let single = compute_diff(&wide_x, &wide_y);
            assert_eq!(half.length, single.length);
            assert_eq!(half.max_abs_diff, single.max_abs_diff, "n = {n}");
            assert!(
                (half.avg_diff_squared - single.avg_diff_squared).abs()
                    <= 1e-5 * single.avg_diff_squared.max(1e-30),
                "n = {n}, half = {half}, single = {single}"
            );
        }
    }

    #[test]
    fn within_tolerance() {
        let options = DiffOptions::default();
        let close = compute_diff(&[1.0f32, 2.0], &[1.0, 2.0 + 1e-6]);
        assert!(close.within(&options));
        let far = compute_diff(&[1.0f32, 2.0], &[1.0, 2.5]);
        assert!(!far.within(&options));
        let poisoned = TensorDiff {
            length: 1,
            max_abs_diff: 0.0,
            avg_diff_squared: f64::NAN,
        };
        assert!(!poisoned.within(&options));
    }

    #[test]
    fn display() {
        let diff = compute_diff(&[1.0f32, 2.0, 3.0, 4.0], &[1.0, 2.5, 3.0, 4.0]);
        assert_eq!(
            diff.to_string(),
            "4 elements, max_abs_diff = 0.5, avg_diff_squared = 0.0625"
        );
        diff.print(Some("attention"));
        diff.print(None);
    }

    #[test]
    fn tensor_overload() {
        let layout = Layout::contiguous([2, 3, 1, 1]);
        let lhs = HostData::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let rhs = HostData::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 7.0]);
        let lhs = HostTensor::new(layout, lhs).unwrap();
        let rhs = HostTensor::new(layout, rhs).unwrap();
        let diff = compute_tensor_diff(&lhs, &rhs).unwrap();
        assert_eq!(diff.length, 6);
        assert_eq!(diff.max_abs_diff, 1.0);
        assert_eq!(diff.avg_diff_squared, 1.0 / 6.0);
    }

    #[test]
    fn tensor_overload_rejects_layout_mismatch() {
        let data = HostData::F32(vec![0.0; 6]);
        let lhs = HostTensor::new(Layout::contiguous([2, 3, 1, 1]), data.clone()).unwrap();
        let rhs = HostTensor::new(Layout::contiguous([3, 2, 1, 1]), data).unwrap();
        let err = compute_tensor_diff(&lhs, &rhs).unwrap_err();
        assert!(matches!(err, DiffError::LayoutMismatch { .. }), "{err}");
    }

    #[test]
    fn tensor_overload_rejects_element_type_mismatch() {
        let lhs = HostTensor::new(Layout::vector(2), HostData::F32(vec![0.0; 2])).unwrap();
        let rhs = HostTensor::new(Layout::vector(2), HostData::F16(vec![f16::ZERO; 2])).unwrap();
        let err = compute_tensor_diff(&lhs, &rhs).unwrap_err();
        assert!(
            matches!(
                err,
                DiffError::ElementTypeMismatch {
                    lhs: ElementType::F32,
                    rhs: ElementType::F16
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn tensor_overload_half_is_not_implemented() {
        let lhs = HostTensor::new(Layout::vector(2), HostData::F16(vec![f16::ZERO; 2])).unwrap();
        let err = compute_tensor_diff(&lhs, &lhs.clone()).unwrap_err();
        assert!(matches!(err, DiffError::NotImplemented(ElementType::F16)), "{err}");
    }

    struct Truncated(usize);

    impl Tensor for Truncated {
        fn element_type(&self) -> ElementType {
            ElementType::F32
        }
        fn layout(&self) -> Layout {
            Layout::vector(4)
        }
        fn download(&self, out: &mut Vec<f32>) -> Result<(), DiffError> {
            out.clear();
            out.resize(self.0, 0.0);
            Ok(())
        }
    }

    #[test]
    fn tensor_overload_rejects_length_mismatch() {
        let err = compute_tensor_diff(&Truncated(4), &Truncated(3)).unwrap_err();
        assert!(matches!(err, DiffError::LengthMismatch { lhs: 4, rhs: 3 }), "{err}");
    }
}
