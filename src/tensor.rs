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

use crate::error::{DiffError, UnknownElementType};
use simd::f16;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    F32,
    F16,
}

impl Display for ElementType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::F32 => write!(f, "f32"),
            ElementType::F16 => write!(f, "f16"),
        }
    }
}

impl FromStr for ElementType {
    type Err = UnknownElementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f32" => Ok(ElementType::F32),
            "f16" => Ok(ElementType::F16),
            _ => Err(UnknownElementType(s.to_string())),
        }
    }
}

/// Sizes and strides of up to four dimensions, innermost first. Unused
/// dimensions have size 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    pub shape: [u32; 4],
    pub strides: [u32; 4],
}

impl Layout {
    pub fn contiguous(shape: [u32; 4]) -> Self {
        let mut strides = [0u32; 4];
        let mut stride = 1u32;
        for i in 0..4 {
            strides[i] = stride;
            stride = stride.saturating_mul(shape[i]);
        }
        Self { shape, strides }
    }

    pub fn vector(len: u32) -> Self {
        Self::contiguous([len, 1, 1, 1])
    }

    /// Number of elements, or `None` if it does not fit in `usize`.
    pub fn count(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |count, &x| count.checked_mul(x as usize))
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.shape;
        let [e, g, h, i] = self.strides;
        write!(f, "[{a}, {b}, {c}, {d}] / [{e}, {g}, {h}, {i}]")
    }
}

/// A tensor whose contents can be brought to host memory.
pub trait Tensor {
    fn element_type(&self) -> ElementType;

    fn layout(&self) -> Layout;

    fn count(&self) -> Option<usize> {
        self.layout().count()
    }

    /// Replaces the contents of `out` with every element promoted to `f32`.
    fn download(&self, out: &mut Vec<f32>) -> Result<(), DiffError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostData {
    F32(Vec<f32>),
    F16(Vec<f16>),
}

impl HostData {
    pub fn element_type(&self) -> ElementType {
        match self {
            HostData::F32(_) => ElementType::F32,
            HostData::F16(_) => ElementType::F16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HostData::F32(x) => x.len(),
            HostData::F16(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A densely stored tensor in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    layout: Layout,
    data: HostData,
}

impl HostTensor {
    pub fn new(layout: Layout, data: HostData) -> Result<Self, DiffError> {
        let Some(count) = layout.count() else {
            return Err(DiffError::LayoutOverflow(layout));
        };
        if count != data.len() {
            return Err(DiffError::LengthMismatch {
                lhs: count,
                rhs: data.len(),
            });
        }
        Ok(Self { layout, data })
    }
}

impl Tensor for HostTensor {
    fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn download(&self, out: &mut Vec<f32>) -> Result<(), DiffError> {
        out.clear();
        match &self.data {
            HostData::F32(x) => out.extend_from_slice(x),
            HostData::F16(x) => out.extend(x.iter().map(|x| x.to_f32())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_strides() {
        let layout = Layout::contiguous([3, 4, 5, 1]);
        assert_eq!(layout.strides, [1, 3, 12, 60]);
        assert_eq!(layout.count(), Some(60));
        assert_eq!(Layout::vector(7).count(), Some(7));
        assert_eq!(layout.to_string(), "[3, 4, 5, 1] / [1, 3, 12, 60]");
    }

    #[test]
    fn element_type_parse() {
        assert_eq!("f32".parse::<ElementType>(), Ok(ElementType::F32));
        assert_eq!("f16".parse::<ElementType>(), Ok(ElementType::F16));
        assert!("bf16".parse::<ElementType>().is_err());
        assert_eq!(ElementType::F16.to_string(), "f16");
    }

    #[test]
    fn host_tensor_checks_count() {
        let data = HostData::F32(vec![1.0, 2.0]);
        let err = HostTensor::new(Layout::vector(3), data).unwrap_err();
        assert!(matches!(err, DiffError::LengthMismatch { lhs: 3, rhs: 2 }));
    }

    #[test]
    fn count_overflow() {
        let huge = Layout::contiguous([65536; 4]);
        assert_eq!(huge.count(), None);
        assert_eq!(Layout::contiguous([65536, 256, 1, 1]).count(), Some(1 << 24));
        let err = HostTensor::new(huge, HostData::F32(Vec::new())).unwrap_err();
        assert!(matches!(err, DiffError::LayoutOverflow(layout) if layout == huge), "{err}");
    }

    #[test]
    fn host_tensor_download() {
        let tensor = HostTensor::new(
            Layout::contiguous([2, 2, 1, 1]),
            HostData::F16(vec![
                f16::from_f32(1.0),
                f16::from_f32(-0.5),
                f16::from_f32(2.0),
                f16::INFINITY,
            ]),
        )
        .unwrap();
        assert_eq!(tensor.element_type(), ElementType::F16);
        assert_eq!(tensor.count(), Some(4));
        let mut out = vec![9.0; 10];
        tensor.download(&mut out).unwrap();
        assert_eq!(out, vec![1.0, -0.5, 2.0, f32::INFINITY]);
    }
}
