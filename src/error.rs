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

use crate::tensor::{ElementType, Layout};

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("layouts differ: {lhs} and {rhs}")]
    LayoutMismatch { lhs: Layout, rhs: Layout },
    #[error("element types differ: {lhs} and {rhs}")]
    ElementTypeMismatch { lhs: ElementType, rhs: ElementType },
    #[error("layout {0} has more elements than the address space")]
    LayoutOverflow(Layout),
    #[error("downloaded lengths differ: {lhs} and {rhs}")]
    LengthMismatch { lhs: usize, rhs: usize },
    #[error("comparing {0} tensors is not implemented")]
    NotImplemented(ElementType),
    #[error("dump of {len} bytes is not a whole number of {element} elements")]
    Misaligned { len: usize, element: &'static str },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to parse options: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid options: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown element type `{0}`, expected `f32` or `f16`")]
pub struct UnknownElementType(pub String);
