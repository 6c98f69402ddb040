//! Structured analysis reports
//!
//! These types are the wire contract with the reporting layer: each
//! analyzed component persists one noise report and one metadata record
//! as JSON, keyed by component name ("forest", "rain", "fire",
//! "final_mix", ...).

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::analysis::stats::{KsResult, Moments};
use crate::error::Result;

/// Kolmogorov-Smirnov outcome as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KsTest {
    pub statistic: f64,
    pub p_value: f64,
    /// Present when the test was skipped (zero-variance input); holds
    /// the reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl KsTest {
    pub fn from_result(result: &KsResult) -> Self {
        Self {
            statistic: result.statistic,
            p_value: result.p_value,
            skipped: result
                .degenerate
                .then(|| "zero standard deviation".to_string()),
        }
    }
}

/// Distribution statistics over raw samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionAnalysis {
    pub mean: f64,
    pub std: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub ks_test: KsTest,
}

impl DistributionAnalysis {
    pub fn new(moments: &Moments, ks: &KsResult) -> Self {
        Self {
            mean: moments.mean,
            std: moments.std,
            skewness: moments.skewness,
            kurtosis: moments.kurtosis,
            ks_test: KsTest::from_result(ks),
        }
    }
}

/// Complete noise quality report for one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseReport {
    /// Time-averaged Wiener entropy in [0, 1]; 1 is perfectly flat
    pub spectral_flatness: f64,
    pub distribution_analysis: DistributionAnalysis,
    /// Numeric diagnostics bundle written for the plot renderer
    pub noise_analysis_plot: PathBuf,
}

impl NoiseReport {
    /// Persist as `<prefix>_noise_analysis.json`
    pub fn save(&self, out_dir: &Path, name: &str) -> Result<PathBuf> {
        let path = out_dir.join(format!("{}_noise_analysis.json", name));
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(path)
    }
}

/// Container-level metadata for one analyzed component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentMetadata {
    pub filename: String,
    pub duration_seconds: f64,
    pub channels: u16,
    /// Bytes per sample
    pub sample_width: u16,
    pub frame_rate: u32,
    pub visualization_path: PathBuf,
    pub noise_analysis: NoiseReport,
}

impl ComponentMetadata {
    /// Persist as `<prefix>_metadata.json`
    pub fn save(&self, out_dir: &Path, name: &str) -> Result<PathBuf> {
        let path = out_dir.join(format!("{}_metadata.json", name));
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(path)
    }
}
