//! Overlay compositing
//!
//! Sums time-aligned buffers sample-wise. The base buffer's length never
//! changes: an addend hanging past the end is truncated to the overlap.
//! No clipping or ducking happens here; summed headroom is the gain
//! stager's responsibility.

use crate::audio::AudioBuffer;
use crate::error::Result;

/// Add `addend`'s samples onto `base` starting at `offset_ms`.
pub fn overlay(base: &AudioBuffer, addend: &AudioBuffer, offset_ms: u64) -> Result<AudioBuffer> {
    base.check_compatible(addend)?;

    let channels = base.channels() as usize;
    let base_frames = base.num_frames();
    let offset_frames = base.frames_for_ms(offset_ms);

    let mut result = base.clone();
    if offset_frames >= base_frames {
        return Ok(result);
    }

    let overlap_frames = (base_frames - offset_frames).min(addend.num_frames());
    let out = &mut result.samples_mut()[offset_frames * channels..];
    let add = addend.samples();
    for i in 0..overlap_frames * channels {
        out[i] += add[i];
    }

    Ok(result)
}
