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

//! Parity checks between two computations of the same tensor.

mod diff;
mod dump;
mod error;
mod options;
mod shapes;
mod tensor;

pub use diff::{TensorDiff, compute_diff, compute_tensor_diff};
pub use dump::{Dumper, read_elements};
pub use error::{DiffError, UnknownElementType};
pub use options::DiffOptions;
pub use shapes::ShapeLogger;
pub use simd::{Floating, f16};
pub use tensor::{ElementType, HostData, HostTensor, Layout, Tensor};

// dependencies of the binary
use anyhow as _;
use clap as _;
use env_logger as _;
