//! Bake command implementation

use std::path::Path;

use anim_bake::{BakeOutput, Baker};
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::commands::pack_options;
use crate::scene::Scene;
use crate::utils::{
    BakeProgress, add_table_row, create_table, format_bounds, format_bytes, format_percentage,
    format_rect,
};

/// Machine-readable summary of a bake
#[derive(Debug, Serialize)]
pub struct BakeReport {
    pub bone_count: usize,
    pub atlas: AtlasReport,
    pub meshes: Vec<MeshReport>,
    pub animations: Vec<AnimationReport>,
}

#[derive(Debug, Serialize)]
pub struct AtlasReport {
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub used_texels: u64,
    pub efficiency: f64,
}

#[derive(Debug, Serialize)]
pub struct MeshReport {
    pub name: String,
    pub vertices: usize,
    pub submeshes: usize,
    pub materials: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct AnimationReport {
    pub name: String,
    pub length: f32,
    pub sample_rate: f32,
    pub frames: u32,
    pub region: [u32; 4],
    pub bounds_center: [f32; 3],
    pub bounds_extents: [f32; 3],
}

impl BakeReport {
    pub fn from_output(output: &BakeOutput) -> Self {
        Self {
            bone_count: output.bone_count,
            atlas: AtlasReport {
                width: output.atlas.width(),
                height: output.atlas.height(),
                bytes: output.atlas.byte_len(),
                used_texels: output.layout.used_area(),
                efficiency: output.layout.efficiency(),
            },
            meshes: output
                .meshes
                .iter()
                .map(|mesh| MeshReport {
                    name: mesh.name().to_string(),
                    vertices: mesh.vertex_count(),
                    submeshes: mesh.submeshes().len(),
                    materials: mesh.materials().iter().map(|m| m.0).collect(),
                })
                .collect(),
            animations: output
                .animations
                .iter()
                .map(|animation| {
                    let region = animation.region;
                    AnimationReport {
                        name: animation.name.clone(),
                        length: animation.length,
                        sample_rate: animation.sample_rate,
                        frames: animation.frame_count,
                        region: [region.x, region.y, region.width, region.height],
                        bounds_center: animation.bounds.center.to_array(),
                        bounds_extents: animation.bounds.extents.to_array(),
                    }
                })
                .collect(),
        }
    }
}

pub fn execute(scene: &Path, json: bool, show_progress: bool, fill_factor: Option<f32>) -> Result<()> {
    info!("Loading scene: {}", scene.display());
    let config = Scene::load(scene)?
        .into_config()?
        .with_pack_options(pack_options(fill_factor)?);

    let progress = if show_progress && !json {
        BakeProgress::new(config.meshes.len(), config.clips.len())
    } else {
        BakeProgress::hidden()
    };

    let result = Baker::new().with_progress(progress.clone()).bake(&config);
    let output = match result {
        Ok(output) => {
            progress.finish();
            output
        }
        Err(err) => {
            progress.clear();
            return Err(err).with_context(|| format!("Failed to bake {}", scene.display()));
        }
    };

    let report = BakeReport::from_output(&output);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &output);
    }
    Ok(())
}

fn print_report(report: &BakeReport, output: &BakeOutput) {
    println!("\n=== Bake Summary ===");
    println!("Bones:  {}", report.bone_count);
    println!(
        "Atlas:  {}x{} RGBA16F, {} ({} used)",
        report.atlas.width,
        report.atlas.height,
        format_bytes(report.atlas.bytes as u64),
        format_percentage(report.atlas.efficiency)
    );

    println!("\nMeshes:");
    let mut table = create_table(&["Name", "Vertices", "Submeshes", "Materials"]);
    for mesh in &report.meshes {
        let materials: Vec<String> = mesh.materials.iter().map(u32::to_string).collect();
        add_table_row(
            &mut table,
            vec![
                mesh.name.clone(),
                mesh.vertices.to_string(),
                mesh.submeshes.to_string(),
                materials.join(", "),
            ],
        );
    }
    table.printstd();

    println!("\nAnimations:");
    let mut table = create_table(&["Name", "Length", "Frames", "Region", "Bounds"]);
    for animation in &output.animations {
        add_table_row(
            &mut table,
            vec![
                animation.name.clone(),
                format!("{:.3}s", animation.length),
                animation.frame_count.to_string(),
                format_rect(&animation.region),
                format_bounds(&animation.bounds),
            ],
        );
    }
    table.printstd();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_uses_packed_layout() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/arm.json");
        let config = Scene::load(&path).unwrap().into_config().unwrap();
        let output = Baker::new().bake(&config).unwrap();
        let report = BakeReport::from_output(&output);

        assert_eq!(report.atlas.used_texels, output.layout.used_area());
        assert_eq!(report.atlas.efficiency, output.layout.efficiency());
        assert_eq!(report.atlas.width, output.layout.width);
        // wave: 30 frames, walk: 12 frames, both 6 rows high
        assert_eq!(report.atlas.used_texels, (30 + 12) * 6);
        assert_eq!(report.animations.len(), 2);
    }
}
