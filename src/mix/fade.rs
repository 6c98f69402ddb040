//! Fade envelopes
//!
//! Linear fade-in/fade-out amplitude ramps at buffer edges. When the two
//! fade regions overlap (fade_in + fade_out longer than the buffer), both
//! ramps multiply the same samples, which shortens the effective attack.
//! That overlap behavior is intentional; only a fade longer than the
//! whole buffer is clamped.

use crate::audio::AudioBuffer;

/// Multiply the first `fade_in_ms` by a 0..1 ramp and the last
/// `fade_out_ms` by a 1..0 ramp, linear in time.
pub fn apply_fades(buffer: &AudioBuffer, fade_in_ms: u64, fade_out_ms: u64) -> AudioBuffer {
    let frames = buffer.num_frames();
    let channels = buffer.channels() as usize;

    let fade_in_frames = buffer.frames_for_ms(fade_in_ms).min(frames);
    let fade_out_frames = buffer.frames_for_ms(fade_out_ms).min(frames);

    let mut result = buffer.clone();
    let samples = result.samples_mut();

    if fade_in_frames > 0 {
        for frame in 0..fade_in_frames {
            let gain = frame as f32 / fade_in_frames as f32;
            for s in &mut samples[frame * channels..(frame + 1) * channels] {
                *s *= gain;
            }
        }
    }

    if fade_out_frames > 0 {
        let start = frames - fade_out_frames;
        for frame in start..frames {
            let gain = (frames - 1 - frame) as f32 / fade_out_frames as f32;
            for s in &mut samples[frame * channels..(frame + 1) * channels] {
                *s *= gain;
            }
        }
    }

    result
}
