//! CLI Module
//!
//! Command-line interface for the Susurrus soundscape tools.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Susurrus - ambient soundscape synthesis and analysis
#[derive(Parser, Debug)]
#[command(name = "susurrus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Source paths shared by the mix-producing commands
#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Forest ambience WAV
    pub forest: PathBuf,

    /// Rain WAV
    pub rain: PathBuf,

    /// Fire crackle WAV
    pub fire: PathBuf,

    /// Optional bird call WAV placed at jittered intervals
    #[arg(short, long)]
    pub bird_calls: Option<PathBuf>,

    /// Optional intro WAV crossfaded onto the front
    #[arg(long)]
    pub intro: Option<PathBuf>,

    /// Optional outro WAV crossfaded onto the back
    #[arg(long)]
    pub outro: Option<PathBuf>,

    /// Mix duration in milliseconds
    #[arg(short, long, default_value_t = 300_000)]
    pub duration_ms: u64,

    /// Seed for reproducible event timing
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize an ambient mix and export it as WAV
    #[command(name = "mix")]
    Mix {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output WAV path
        #[arg(short, long, default_value = "mix.wav")]
        output: PathBuf,
    },

    /// Analyze one audio file and write its noise report
    #[command(name = "analyze")]
    Analyze {
        /// Audio file to analyze
        input: PathBuf,

        /// Component name used in report filenames
        #[arg(short, long)]
        name: Option<String>,

        /// Directory for the report and diagnostics
        #[arg(short, long, default_value = "results")]
        out_dir: PathBuf,
    },

    /// Mix, export, and analyze every component
    #[command(name = "render")]
    Render {
        #[command(flatten)]
        sources: SourceArgs,

        /// Root directory for the run output
        #[arg(short, long, default_value = "results")]
        out_dir: PathBuf,

        /// Run directory name (defaults to a timestamp)
        #[arg(short, long)]
        name: Option<String>,
    },
}
