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

use crate::tensor::Tensor;
use std::collections::{HashMap, HashSet};

/// Logs each distinct combination of tensor sizes once per label.
#[derive(Debug, Default)]
pub struct ShapeLogger {
    seen: HashMap<String, HashSet<[u32; 8]>>,
}

impl ShapeLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the pair of shapes was not seen before under `label`.
    pub fn log_pair(&mut self, label: &str, lhs: &dyn Tensor, rhs: &dyn Tensor) -> bool {
        let mut sizes = [0u32; 8];
        sizes[..4].copy_from_slice(&lhs.layout().shape);
        sizes[4..].copy_from_slice(&rhs.layout().shape);
        self.log(label, sizes)
    }

    pub fn log_single(&mut self, label: &str, tensor: &dyn Tensor) -> bool {
        let mut sizes = [0u32; 8];
        sizes[..4].copy_from_slice(&tensor.layout().shape);
        self.log(label, sizes)
    }

    /// Sizes are stored as unsigned and logged as signed.
    pub fn log_sizes(&mut self, label: &str, lhs: &[i32; 4], rhs: &[i32; 4]) -> bool {
        let mut sizes = [0u32; 8];
        for i in 0..4 {
            sizes[i] = lhs[i] as u32;
            sizes[4 + i] = rhs[i] as u32;
        }
        self.log(label, sizes)
    }

    fn log(&mut self, label: &str, sizes: [u32; 8]) -> bool {
        let inserted = match self.seen.get_mut(label) {
            Some(set) => set.insert(sizes),
            None => {
                self.seen.insert(label.to_string(), HashSet::from([sizes]));
                true
            }
        };
        if !inserted {
            return false;
        }
        log::debug!("{}", describe(label, &sizes));
        true
    }

    pub fn seen(&self, label: &str) -> usize {
        self.seen.get(label).map_or(0, HashSet::len)
    }
}

/// Sizes are printed signed.
fn describe(label: &str, sizes: &[u32; 8]) -> String {
    let [a, b, c, d, e, f, g, h] = sizes.map(|x| x as i32);
    if [e, f, g, h] == [0; 4] {
        format!("{label}: [ {a}, {b}, {c}, {d} ]")
    } else {
        format!("{label}: [ {a}, {b}, {c}, {d} ], [ {e}, {f}, {g}, {h} ]")
    }
}
