//! Command Implementations
//!
//! Handlers for the CLI commands.

use log::info;
use std::path::Path;

use crate::analysis::{JsonArtifactSink, NoiseAnalyzer};
use crate::audio::save_wav_with_depth;
use crate::cli::SourceArgs;
use crate::error::Result;
use crate::mix::{synthesize, MixConfig};
use crate::pipeline::{self, BatchRequest, TrackLevels};

fn request_from_args(sources: &SourceArgs, out_dir: &Path, name: Option<String>) -> BatchRequest {
    BatchRequest {
        forest: sources.forest.clone(),
        rain: sources.rain.clone(),
        fire: sources.fire.clone(),
        bird_calls: sources.bird_calls.clone(),
        intro: sources.intro.clone(),
        outro: sources.outro.clone(),
        levels: TrackLevels::default(),
        config: MixConfig {
            target_ms: sources.duration_ms,
            seed: sources.seed,
            ..MixConfig::default()
        },
        output_root: out_dir.to_path_buf(),
        output_name: name,
    }
}

/// Synthesize a mix and export it, without analysis
pub fn mix(sources: &SourceArgs, output: &Path) -> Result<()> {
    let request = request_from_args(sources, Path::new("."), None);
    let loaded = pipeline::load_sources(&request)?;
    let final_mix = synthesize(&loaded, &request.config)?;
    save_wav_with_depth(&final_mix, output, 16)?;
    info!(
        "mix of {} ms written to {}",
        final_mix.duration_ms(),
        output.display()
    );
    Ok(())
}

/// Analyze a single file and print the headline numbers
pub fn analyze(input: &Path, name: Option<String>, out_dir: &Path) -> Result<()> {
    let name = name.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "component".to_string())
    });

    let metadata = pipeline::analyze_file(
        input,
        &name,
        out_dir,
        &NoiseAnalyzer::default(),
        &JsonArtifactSink,
    )?;

    print_component_summary(&name, &metadata.noise_analysis);
    info!("reports written to {}", out_dir.display());
    Ok(())
}

/// Full batch: mix, export, analyze every component
pub fn render(sources: &SourceArgs, out_dir: &Path, name: Option<String>) -> Result<()> {
    let request = request_from_args(sources, out_dir, name);
    let report = pipeline::run(&request, &JsonArtifactSink)?;

    println!("Final mix saved as: {}", report.mix_path.display());
    println!("\nNoise Analysis Summary:");
    println!("{}", "-".repeat(50));
    for (component, metadata) in &report.components {
        print_component_summary(component, &metadata.noise_analysis);
    }
    Ok(())
}

fn print_component_summary(name: &str, report: &crate::analysis::NoiseReport) {
    let dist = &report.distribution_analysis;
    println!("\n{}:", name.to_uppercase());
    println!("  Spectral Flatness: {:.4}", report.spectral_flatness);
    println!("  Distribution Statistics:");
    println!("    Mean: {:.4}", dist.mean);
    println!("    Std Dev: {:.4}", dist.std);
    println!("    Skewness: {:.4}", dist.skewness);
    println!("    Kurtosis: {:.4}", dist.kurtosis);
    match &dist.ks_test.skipped {
        Some(reason) => println!("  Normality Test (K-S): skipped ({})", reason),
        None => {
            println!("  Normality Test (K-S):");
            println!("    Statistic: {:.4}", dist.ks_test.statistic);
            println!("    P-value: {:.4}", dist.ks_test.p_value);
        }
    }
}
