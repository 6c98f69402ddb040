//! Noise quality analysis engine
//!
//! Runs the spectral and statistical analyzers over a buffer and
//! assembles a [`NoiseReport`]. Plot rendering is not done here: the
//! engine emits a numeric diagnostics bundle through the
//! [`ArtifactSink`] seam and an external renderer draws from that.

pub mod report;
pub mod spectral;
pub mod stats;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::AudioBuffer;
use crate::error::Result;

pub use report::{ComponentMetadata, DistributionAnalysis, KsTest, NoiseReport};
pub use spectral::{Psd, Spectrogram};
pub use stats::{KsResult, Moments};

/// Lag count kept in the diagnostics bundle, matching what a rendered
/// autocorrelation plot would show
const DIAGNOSTIC_LAGS: usize = 1000;

/// Histogram resolution in the diagnostics bundle
const HISTOGRAM_BINS: usize = 100;

/// Spectrogram frames are decimated down to at most this many for the
/// bundle; a plot cannot resolve more anyway
const MAX_SPECTROGRAM_FRAMES: usize = 256;

/// Sample histogram with a fitted normal curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    pub bin_centers: Vec<f64>,
    /// Empirical probability density per bin
    pub density: Vec<f64>,
    /// Normal pdf with the sample mean/std, evaluated at the centers
    pub normal_fit: Vec<f64>,
}

/// Numeric diagnostics handed to the rendering collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticData {
    pub psd: Psd,
    pub autocorrelation: Vec<f64>,
    pub histogram: Histogram,
    pub spectrogram: Spectrogram,
}

/// Destination for diagnostics bundles.
///
/// The default sink persists the numbers as JSON for an external plot
/// renderer; tests substitute their own.
pub trait ArtifactSink {
    fn write_diagnostics(
        &self,
        name: &str,
        data: &DiagnosticData,
        out_dir: &Path,
    ) -> Result<PathBuf>;
}

/// Writes the diagnostics bundle as `<name>_noise_analysis_data.json`
#[derive(Debug, Default)]
pub struct JsonArtifactSink;

impl ArtifactSink for JsonArtifactSink {
    fn write_diagnostics(
        &self,
        name: &str,
        data: &DiagnosticData,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let path = out_dir.join(format!("{}_noise_analysis_data.json", name));
        let writer = std::io::BufWriter::new(std::fs::File::create(&path)?);
        serde_json::to_writer(writer, data)?;
        Ok(path)
    }
}

/// Noise quality analysis over a single buffer
#[derive(Debug, Clone)]
pub struct NoiseAnalyzer {
    /// STFT size for flatness and the spectrogram
    pub fft_size: usize,
    /// Welch segment length
    pub segment_len: usize,
    /// Welch overlap fraction
    pub overlap: f64,
}

impl Default for NoiseAnalyzer {
    fn default() -> Self {
        Self {
            fft_size: spectral::DEFAULT_FFT_SIZE,
            segment_len: spectral::DEFAULT_FFT_SIZE,
            overlap: spectral::DEFAULT_OVERLAP,
        }
    }
}

impl NoiseAnalyzer {
    /// Analyze `buffer`, write the diagnostics bundle and the report
    /// JSON into `out_dir`, and return the report.
    ///
    /// Spectral flatness is computed over the full buffer, and the
    /// distribution statistics over its raw samples.
    pub fn analyze(
        &self,
        buffer: &AudioBuffer,
        name: &str,
        out_dir: &Path,
        sink: &dyn ArtifactSink,
    ) -> Result<NoiseReport> {
        std::fs::create_dir_all(out_dir)?;

        log::info!("analyzing '{}' ({} ms)", name, buffer.duration_ms());

        let mono = buffer.to_mono_f64();
        let flatness = spectral::spectral_flatness(buffer, self.fft_size);
        let m = stats::moments(&mono);
        let ks = stats::ks_normality_test(&mono);
        if ks.degenerate {
            log::warn!("'{}': zero variance, normality test skipped", name);
        }

        let data = DiagnosticData {
            psd: spectral::welch_psd(buffer, self.segment_len, self.overlap),
            autocorrelation: stats::autocorrelation(
                &mono,
                Some(DIAGNOSTIC_LAGS.min(mono.len() / 2).max(1)),
            ),
            histogram: histogram(&mono, &m),
            spectrogram: decimate_spectrogram(spectral::spectrogram(buffer, self.fft_size)),
        };
        let artifact_path = sink.write_diagnostics(name, &data, out_dir)?;

        let analysis = NoiseReport {
            spectral_flatness: flatness,
            distribution_analysis: DistributionAnalysis::new(&m, &ks),
            noise_analysis_plot: artifact_path,
        };
        analysis.save(out_dir, name)?;

        Ok(analysis)
    }
}

/// 100-bin density histogram with the fitted normal curve
fn histogram(samples: &[f64], m: &Moments) -> Histogram {
    let (min, max) = samples.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &s| {
        (lo.min(s), hi.max(s))
    });
    // constant signals still get a drawable single-spike histogram
    let (min, max) = if min < max {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };

    let width = (max - min) / HISTOGRAM_BINS as f64;
    let mut counts = vec![0usize; HISTOGRAM_BINS];
    for &s in samples {
        let bin = (((s - min) / width) as usize).min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }

    let n = samples.len() as f64;
    let bin_centers: Vec<f64> = (0..HISTOGRAM_BINS)
        .map(|i| min + (i as f64 + 0.5) * width)
        .collect();
    let density = counts.iter().map(|&c| c as f64 / (n * width)).collect();
    let normal_fit = bin_centers
        .iter()
        .map(|&x| normal_pdf(x, m.mean, m.std))
        .collect();

    Histogram {
        bin_centers,
        density,
        normal_fit,
    }
}

fn normal_pdf(x: f64, mean: f64, std: f64) -> f64 {
    if std == 0.0 {
        return 0.0;
    }
    let z = (x - mean) / std;
    (-0.5 * z * z).exp() / (std * (2.0 * std::f64::consts::PI).sqrt())
}

/// Keep at most [`MAX_SPECTROGRAM_FRAMES`] evenly strided frames
fn decimate_spectrogram(mut spec: Spectrogram) -> Spectrogram {
    let total = spec.frames.len();
    if total > MAX_SPECTROGRAM_FRAMES {
        let stride = total.div_ceil(MAX_SPECTROGRAM_FRAMES);
        log::debug!(
            "spectrogram decimated {} -> {} frames for the artifact",
            total,
            total.div_ceil(stride)
        );
        spec.frames = spec
            .frames
            .into_iter()
            .step_by(stride)
            .collect();
        spec.hop *= stride;
    }
    spec
}
