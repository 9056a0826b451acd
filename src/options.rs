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
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "Self::validate_self"))]
pub struct DiffOptions {
    #[serde(default = "DiffOptions::default_dump_directory")]
    pub dump_directory: PathBuf,
    #[serde(default = "DiffOptions::default_max_abs_diff_tolerance")]
    #[validate(range(min = 0.0))]
    pub max_abs_diff_tolerance: f32,
    #[serde(default = "DiffOptions::default_avg_diff_squared_tolerance")]
    #[validate(range(min = 0.0))]
    pub avg_diff_squared_tolerance: f64,
}

impl DiffOptions {
    fn default_dump_directory() -> PathBuf {
        std::env::temp_dir().join("tensordiff")
    }
    fn default_max_abs_diff_tolerance() -> f32 {
        1e-5
    }
    fn default_avg_diff_squared_tolerance() -> f64 {
        1e-10
    }
    pub fn validate_self(&self) -> Result<(), ValidationError> {
        if self.max_abs_diff_tolerance.is_nan() || self.avg_diff_squared_tolerance.is_nan() {
            return Err(ValidationError::new("tolerances must not be NaN"));
        }
        Ok(())
    }

    pub fn from_toml(s: &str) -> Result<Self, DiffError> {
        let options = toml::from_str::<DiffOptions>(s)?;
        options.validate()?;
        Ok(options)
    }
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            dump_directory: Self::default_dump_directory(),
            max_abs_diff_tolerance: Self::default_max_abs_diff_tolerance(),
            avg_diff_squared_tolerance: Self::default_avg_diff_squared_tolerance(),
        }
    }
}
