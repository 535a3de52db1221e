//! Command implementations

pub mod bake;
pub mod pack;

use anim_bake::PackOptions;
use anyhow::{Context, Result};

/// Packing options from an optional `--fill-factor`
pub fn pack_options(fill_factor: Option<f32>) -> Result<PackOptions> {
    match fill_factor {
        Some(fill) => PackOptions::with_fill_factor(fill).context("Invalid --fill-factor"),
        None => Ok(PackOptions::default()),
    }
}
