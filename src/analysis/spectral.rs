//! Spectral analysis
//!
//! Power spectral density by Welch's method, spectral flatness (Wiener
//! entropy) over short-time frames, and STFT spectrograms. Multi-channel
//! buffers are mixed down to mono before analysis.

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;

/// Additive floor preventing log-of-zero and division-by-zero on silent
/// frames
const FLATNESS_EPSILON: f64 = 1e-10;

/// Default FFT/segment length for PSD and flatness
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Default overlap fraction between Welch segments
pub const DEFAULT_OVERLAP: f64 = 0.5;

/// One-sided power spectral density estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Psd {
    /// Bin center frequencies in Hz
    pub frequencies: Vec<f64>,
    /// Power density per bin, V^2/Hz
    pub power: Vec<f64>,
}

/// Short-time magnitude spectrogram
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrogram {
    pub n_fft: usize,
    pub hop: usize,
    pub sample_rate: u32,
    /// One magnitude row per time frame, n_fft/2 + 1 bins each
    pub frames: Vec<Vec<f64>>,
}

/// Periodic Hann window of length `n`
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos()))
        .collect()
}

/// Windowed one-sided power spectrum of a single segment
fn segment_power(segment: &[f64], window: &[f64], fft: &std::sync::Arc<dyn rustfft::Fft<f64>>) -> Vec<f64> {
    let n = window.len();
    let mean = segment.iter().sum::<f64>() / segment.len() as f64;

    let mut bins: Vec<Complex<f64>> = (0..n)
        .map(|i| Complex::new((segment[i] - mean) * window[i], 0.0))
        .collect();
    fft.process(&mut bins);

    bins.iter()
        .take(n / 2 + 1)
        .map(|c| c.norm_sqr())
        .collect()
}

/// Estimate the power spectral density with a segmented, windowed,
/// overlapping-average periodogram.
///
/// Averaging over `segment_len`-sample Hann-windowed segments with the
/// given overlap fraction trades frequency resolution for variance
/// reduction versus a single FFT. Input shorter than one segment falls
/// back to a single truncated segment.
pub fn welch_psd(buffer: &AudioBuffer, segment_len: usize, overlap: f64) -> Psd {
    let mono = buffer.to_mono_f64();
    let fs = buffer.sample_rate() as f64;

    let seg_len = segment_len.min(mono.len()).max(1);
    let noverlap = ((seg_len as f64) * overlap.clamp(0.0, 0.99)) as usize;
    let step = (seg_len - noverlap).max(1);

    let window = hann_window(seg_len);
    let win_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (fs * win_power);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(seg_len);

    let num_bins = seg_len / 2 + 1;
    let mut accumulated = vec![0.0; num_bins];
    let mut segments = 0usize;

    let mut start = 0;
    while start + seg_len <= mono.len() {
        let power = segment_power(&mono[start..start + seg_len], &window, &fft);
        for (acc, p) in accumulated.iter_mut().zip(power.iter()) {
            *acc += p;
        }
        segments += 1;
        start += step;
    }

    let power: Vec<f64> = accumulated
        .iter()
        .enumerate()
        .map(|(k, &p)| {
            // one-sided density: double everything except DC and Nyquist
            let one_sided = if k == 0 || (seg_len % 2 == 0 && k == seg_len / 2) {
                1.0
            } else {
                2.0
            };
            p * scale * one_sided / segments as f64
        })
        .collect();

    let frequencies = (0..num_bins).map(|k| k as f64 * fs / seg_len as f64).collect();

    Psd { frequencies, power }
}

/// Spectral flatness (Wiener entropy), time-averaged across STFT frames.
///
/// Per frame, flatness is the geometric mean of the power spectrum over
/// its arithmetic mean, so a flat ("white") spectrum scores near 1 and a
/// tonal spectrum near 0. Digital silence has no spectrum to speak of
/// and reports the sentinel 0.0.
pub fn spectral_flatness(buffer: &AudioBuffer, n_fft: usize) -> f64 {
    let mono = buffer.to_mono_f64();
    if mono.iter().all(|&s| s == 0.0) {
        return 0.0;
    }

    let hop = (n_fft / 4).max(1);
    let window = hann_window(n_fft);
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);

    let mut sum = 0.0;
    let mut frames = 0usize;

    let mut start = 0;
    loop {
        let end = start + n_fft;
        let frame: Vec<f64> = if end <= mono.len() {
            mono[start..end].to_vec()
        } else if start < mono.len() {
            // zero-pad the final partial frame
            let mut f = mono[start..].to_vec();
            f.resize(n_fft, 0.0);
            f
        } else {
            break;
        };

        let mut bins: Vec<Complex<f64>> = frame
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut bins);

        let power: Vec<f64> = bins.iter().take(n_fft / 2 + 1).map(|c| c.norm_sqr()).collect();
        let log_mean =
            power.iter().map(|&p| (p + FLATNESS_EPSILON).ln()).sum::<f64>() / power.len() as f64;
        let arith_mean = power.iter().sum::<f64>() / power.len() as f64;
        sum += log_mean.exp() / (arith_mean + FLATNESS_EPSILON);
        frames += 1;

        if end >= mono.len() {
            break;
        }
        start += hop;
    }

    if frames == 0 {
        return 0.0;
    }
    sum / frames as f64
}

/// STFT magnitude frames for diagnostic rendering
pub fn spectrogram(buffer: &AudioBuffer, n_fft: usize) -> Spectrogram {
    let mono = buffer.to_mono_f64();
    let hop = (n_fft / 4).max(1);
    let window = hann_window(n_fft);
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);

    let mut frames = Vec::new();
    let mut start = 0;
    while start + n_fft <= mono.len() {
        let mut bins: Vec<Complex<f64>> = mono[start..start + n_fft]
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut bins);
        frames.push(bins.iter().take(n_fft / 2 + 1).map(|c| c.norm()).collect());
        start += hop;
    }

    Spectrogram {
        n_fft,
        hop,
        sample_rate: buffer.sample_rate(),
        frames,
    }
}
