//! Root CLI structure for anim-bake

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "anim-bake")]
#[command(about = "Bake skinned animation into static meshes and a bone texture atlas", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bake a JSON scene and report the result
    Bake {
        /// Path to the scene file
        scene: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Do not draw progress bars
        #[arg(long)]
        no_progress: bool,

        /// Target atlas occupancy used to pick the atlas width
        #[arg(long, value_name = "F")]
        fill_factor: Option<f32>,
    },

    /// Lay out clip regions without baking
    Pack {
        /// Height shared by all regions (twice the bone count)
        #[arg(long)]
        height: u32,

        /// Region widths (frame counts)
        #[arg(required = true)]
        widths: Vec<u32>,

        /// Target atlas occupancy used to pick the atlas width
        #[arg(long, value_name = "F")]
        fill_factor: Option<f32>,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
