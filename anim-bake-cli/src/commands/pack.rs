//! Pack command implementation

use anim_bake::AtlasPacker;
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::commands::pack_options;
use crate::utils::{add_table_row, create_table, format_percentage, format_rect};

#[derive(Debug, Serialize)]
struct PackReport {
    width: u32,
    height: u32,
    efficiency: f64,
    regions: Vec<[u32; 4]>,
}

/// Pack regions of a shared height and print where each one lands
pub fn execute(height: u32, widths: &[u32], fill_factor: Option<f32>, json: bool) -> Result<()> {
    let packer = AtlasPacker::new(pack_options(fill_factor)?);
    let sizes: Vec<(u32, u32)> = widths.iter().map(|&width| (width, height)).collect();

    info!("Packing {} regions of height {}", sizes.len(), height);
    let result = packer.pack(&sizes).context("Failed to pack regions")?;

    if json {
        let report = PackReport {
            width: result.width,
            height: result.height,
            efficiency: result.efficiency(),
            regions: result
                .regions
                .iter()
                .map(|r| [r.x, r.y, r.width, r.height])
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut table = create_table(&["#", "Region"]);
    for (index, region) in result.regions.iter().enumerate() {
        add_table_row(&mut table, vec![index.to_string(), format_rect(region)]);
    }
    table.printstd();

    println!(
        "\nAtlas: {}x{} ({} used)",
        result.width,
        result.height,
        format_percentage(result.efficiency())
    );
    Ok(())
}
