//! Loop trimming
//!
//! Extends a buffer to at least a target duration by periodic repetition,
//! then truncates to the exact duration.

use crate::audio::AudioBuffer;
use crate::error::{Result, SusurrusError};

/// Repeat `buffer` end-to-end until it covers `target_ms`, then truncate
/// to exactly that duration. A buffer already long enough is only
/// truncated. Truncation is always from the start of the repeated
/// sequence.
pub fn loop_to_duration(buffer: &AudioBuffer, target_ms: u64) -> Result<AudioBuffer> {
    let source_frames = buffer.num_frames();
    if source_frames == 0 {
        // a zero-length source would loop forever
        return Err(SusurrusError::EmptyBuffer);
    }

    let target_frames = buffer.frames_for_ms(target_ms);
    if target_frames == 0 {
        return Err(SusurrusError::InvalidConfig {
            reason: format!("target duration {} ms resolves to zero frames", target_ms),
        });
    }

    if source_frames >= target_frames {
        return Ok(buffer.truncated_frames(target_frames));
    }

    let channels = buffer.channels() as usize;
    let repeats = target_frames.div_ceil(source_frames);
    let mut samples = Vec::with_capacity(target_frames * channels);
    for _ in 0..repeats {
        samples.extend_from_slice(buffer.samples());
    }
    samples.truncate(target_frames * channels);

    AudioBuffer::new(samples, buffer.channels(), buffer.sample_rate())
}
