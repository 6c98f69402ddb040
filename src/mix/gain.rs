//! Gain staging
//!
//! dB-domain level adjustments applied before any compositing. The
//! overlay stage sums amplitudes without clipping or ducking, so keeping
//! summed levels in range is entirely this module's job.

use crate::audio::AudioBuffer;

/// Default headroom left below full scale when peak-normalizing, in dB
pub const PEAK_HEADROOM_DB: f32 = 0.1;

/// Scale a buffer so its RMS loudness equals `target_dbfs`.
///
/// The applied gain is `target_dbfs - current dBFS`. An all-silent
/// buffer measures -inf dBFS; normalizing it is a no-op rather than an
/// attempt to amplify silence to arbitrary loudness.
pub fn normalize_rms(buffer: &AudioBuffer, target_dbfs: f32) -> AudioBuffer {
    let current = buffer.dbfs();
    if current.is_infinite() {
        log::debug!("normalize_rms: silent buffer, gain clamped to 0 dB");
        return buffer.clone();
    }
    buffer.with_gain_db(target_dbfs - current)
}

/// Apply an additional additive gain offset in dB
pub fn trim(buffer: &AudioBuffer, delta_db: f32) -> AudioBuffer {
    if delta_db == 0.0 {
        return buffer.clone();
    }
    buffer.with_gain_db(delta_db)
}

/// Scale a buffer so its peak sits `headroom_db` below full scale.
///
/// Silent buffers are returned unchanged.
pub fn normalize_peak(buffer: &AudioBuffer, headroom_db: f32) -> AudioBuffer {
    let peak_db = buffer.peak_dbfs();
    if peak_db.is_infinite() {
        return buffer.clone();
    }
    buffer.with_gain_db(-headroom_db - peak_db)
}
