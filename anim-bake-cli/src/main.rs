//! Main entry point for the anim-bake CLI

mod cli;
mod commands;
mod scene;
mod utils;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still overrides the flags
    let level = match (cli.verbose, cli.quiet) {
        (0, true) => "error",
        (0, false) => "warn",
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Execute command
    match cli.command {
        Commands::Bake {
            scene,
            json,
            no_progress,
            fill_factor,
        } => commands::bake::execute(&scene, json, !no_progress && !cli.quiet, fill_factor),

        Commands::Pack {
            height,
            widths,
            fill_factor,
            json,
        } => commands::pack::execute(height, &widths, fill_factor, json),

        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
