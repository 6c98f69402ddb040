//! Susurrus CLI - Ambient Soundscape Tools
//!
//! Command-line interface for mix synthesis and noise quality analysis.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use susurrus::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Susurrus v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Mix { sources, output }) => commands::mix(&sources, &output)
            .with_context(|| format!("mixing to {}", output.display()))?,
        Some(Commands::Analyze {
            input,
            name,
            out_dir,
        }) => commands::analyze(&input, name, &out_dir)
            .with_context(|| format!("analyzing {}", input.display()))?,
        Some(Commands::Render {
            sources,
            out_dir,
            name,
        }) => commands::render(&sources, &out_dir, name).context("rendering batch")?,
        None => {
            println!("Susurrus v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
        }
    }

    Ok(())
}
