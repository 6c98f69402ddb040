//! Distribution and correlation statistics
//!
//! Moments, a one-sample Kolmogorov-Smirnov test against the standard
//! normal distribution, and normalized autocorrelation. All computation
//! runs on raw samples, not dB-normalized values, so results reflect the
//! actual waveform shape.

use rustfft::{num_complex::Complex, FftPlanner};

/// First four moments of a sample sequence.
///
/// `std` is the population standard deviation; `skewness` and
/// `kurtosis` are the population g1 and excess g2. A zero-variance
/// sequence reports 0.0 for both shape moments rather than a division
/// fault.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// Kolmogorov-Smirnov test outcome.
///
/// `degenerate` marks the zero-variance short circuit: the statistic and
/// p-value hold the defined sentinel (0, 1) and no test actually ran.
#[derive(Debug, Clone, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
    pub degenerate: bool,
}

/// Compute mean, population std, skewness, and excess kurtosis
pub fn moments(samples: &[f64]) -> Moments {
    if samples.is_empty() {
        return Moments {
            mean: 0.0,
            std: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
        };
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;

    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &x in samples {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    let std = m2.sqrt();
    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    } else {
        (0.0, 0.0)
    };

    Moments {
        mean,
        std,
        skewness,
        kurtosis,
    }
}

/// One-sample KS goodness-of-fit test of z-normalized samples against
/// the standard normal CDF.
///
/// A zero-variance input cannot be z-normalized; it short-circuits to
/// the degenerate sentinel instead of dividing by zero.
pub fn ks_normality_test(samples: &[f64]) -> KsResult {
    let m = moments(samples);
    if m.std == 0.0 || samples.is_empty() {
        return KsResult {
            statistic: 0.0,
            p_value: 1.0,
            degenerate: true,
        };
    }

    let mut z: Vec<f64> = samples.iter().map(|&x| (x - m.mean) / m.std).collect();
    z.sort_by(|a, b| a.total_cmp(b));

    let n = z.len() as f64;
    let mut d = 0.0_f64;
    for (i, &zi) in z.iter().enumerate() {
        let cdf = normal_cdf(zi);
        let d_plus = (i as f64 + 1.0) / n - cdf;
        let d_minus = cdf - i as f64 / n;
        d = d.max(d_plus).max(d_minus);
    }

    KsResult {
        statistic: d,
        p_value: kolmogorov_p_value(z.len(), d),
        degenerate: false,
    }
}

/// Full linear autocorrelation restricted to non-negative lags,
/// normalized by the zero-lag value so lag 0 is exactly 1.0.
///
/// `max_lag` defaults to half the signal length. Computed via FFT
/// (Wiener-Khinchin), which keeps long ambient buffers tractable.
pub fn autocorrelation(samples: &[f64], max_lag: Option<usize>) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let max_lag = max_lag.unwrap_or(n / 2).min(n).max(1);

    // pad to 2n so the circular correlation is a linear one
    let size = (2 * n).next_power_of_two();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(size);
    let ifft = planner.plan_fft_inverse(size);

    let mut bins: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(size)
        .collect();
    fft.process(&mut bins);
    for bin in &mut bins {
        *bin = Complex::new(bin.norm_sqr(), 0.0);
    }
    ifft.process(&mut bins);

    let zero_lag = bins[0].re;
    if zero_lag <= 0.0 {
        // all-zero signal: defined as 1 at lag 0, uncorrelated elsewhere
        let mut result = vec![0.0; max_lag];
        result[0] = 1.0;
        return result;
    }

    (0..max_lag).map(|lag| bins[lag].re / zero_lag).collect()
}

/// Standard normal CDF via the Abramowitz-Stegun erf approximation
/// (max absolute error ~1.5e-7)
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Asymptotic Kolmogorov survival function with the small-sample
/// correction of Stephens
fn kolmogorov_p_value(n: usize, d: f64) -> f64 {
    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;

    let mut sum = 0.0;
    let mut sign = 1.0;
    for j in 1..=100 {
        let term = (-2.0 * (j as f64) * (j as f64) * lambda * lambda).exp();
        sum += sign * term;
        sign = -sign;
        if term < 1e-10 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}
