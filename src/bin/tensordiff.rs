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

#![allow(unused_crate_dependencies)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tensordiff::{
    DiffOptions, Dumper, ElementType, Floating, TensorDiff, compute_diff, f16, read_elements,
};

/// Compares two raw dumps of the same tensor.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Element type of both dumps.
    element_type: ElementType,
    /// Relative paths are resolved against the configured dump directory.
    lhs: PathBuf,
    rhs: PathBuf,
    /// TOML file with tolerances.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    label: Option<String>,
}

fn diff_files<T: Floating + zerocopy::FromBytes>(
    dumper: &Dumper,
    lhs: &Path,
    rhs: &Path,
) -> Result<TensorDiff> {
    let (lhs, rhs) = (dumper.resolve(lhs), dumper.resolve(rhs));
    let x = read_elements::<T>(&lhs).with_context(|| format!("reading {lhs:?}"))?;
    let y = read_elements::<T>(&rhs).with_context(|| format!("reading {rhs:?}"))?;
    if x.len() != y.len() {
        anyhow::bail!(
            "{lhs:?} has {} elements but {rhs:?} has {}",
            x.len(),
            y.len()
        );
    }
    Ok(compute_diff(&x, &y))
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();
    let cli = Cli::parse();
    let options = match &cli.config {
        Some(path) => {
            let s = std::fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
            DiffOptions::from_toml(&s).with_context(|| format!("loading {path:?}"))?
        }
        None => DiffOptions::default(),
    };
    let dumper = Dumper::new(&options.dump_directory);
    let diff = match cli.element_type {
        ElementType::F32 => diff_files::<f32>(&dumper, &cli.lhs, &cli.rhs)?,
        ElementType::F16 => diff_files::<f16>(&dumper, &cli.lhs, &cli.rhs)?,
    };
    diff.print(cli.label.as_deref());
    println!("{diff}");
    if diff.within(&options) {
        Ok(ExitCode::SUCCESS)
    } else {
        log::info!(
            "outside tolerances: max_abs_diff <= {}, avg_diff_squared <= {}",
            options.max_abs_diff_tolerance,
            options.avg_diff_squared_tolerance
        );
        Ok(ExitCode::FAILURE)
    }
}
