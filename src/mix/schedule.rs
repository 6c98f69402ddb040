//! Event scheduling
//!
//! Places short discrete sound events (bird calls and the like) onto a
//! base buffer at jittered interval positions. The random source is
//! injected by the caller so scheduling is reproducible under a fixed
//! seed. Jitter is drawn independently per slot; two adjacent events can
//! still overlap each other when jitter pushes them together, and that
//! is preserved behavior rather than corrected.

use rand::Rng;

use crate::audio::AudioBuffer;
use crate::error::{Result, SusurrusError};
use crate::mix::fade::apply_fades;
use crate::mix::overlay::overlay;

/// Outcome counters for one scheduling pass.
///
/// Skips are not errors: an event whose jittered position would overrun
/// the end of the base buffer is silently omitted, observable only here
/// and in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleStats {
    /// Number of candidate interval slots
    pub candidates: usize,
    /// Events actually overlaid
    pub placed: usize,
    /// Events dropped because they would overrun the buffer end
    pub skipped: usize,
}

/// Overlay copies of `event` onto `base` at jittered interval positions.
///
/// Candidate start positions are `i * interval_ms` for
/// `i = 0 .. floor(base_duration / interval_ms)`, each perturbed by a
/// uniform offset in `[-jitter_ms, +jitter_ms]` and clamped to zero. An
/// event that would extend past the end of the base is skipped entirely,
/// not clamped to fit.
///
/// The event copy is truncated or zero-padded to `event_duration_ms` and
/// gets a short `event_fade_ms` ramp at both edges to avoid clicks.
pub fn schedule_events<R: Rng>(
    base: &AudioBuffer,
    event: &AudioBuffer,
    interval_ms: u64,
    event_duration_ms: u64,
    jitter_ms: u64,
    event_fade_ms: u64,
    rng: &mut R,
) -> Result<(AudioBuffer, ScheduleStats)> {
    base.check_compatible(event)?;
    if interval_ms == 0 || event_duration_ms == 0 {
        return Err(SusurrusError::InvalidConfig {
            reason: "event interval and duration must be positive".to_string(),
        });
    }

    let prepared = prepare_event(event, event_duration_ms, event_fade_ms)?;

    let base_ms = base.duration_ms();
    let candidates = (base_ms / interval_ms) as usize;

    let mut result = base.clone();
    let mut stats = ScheduleStats {
        candidates,
        placed: 0,
        skipped: 0,
    };

    let jitter = jitter_ms as i64;
    for i in 0..candidates {
        let offset: i64 = rng.gen_range(-jitter..=jitter);
        let position = ((i as i64 * interval_ms as i64) + offset).max(0) as u64;

        if position + event_duration_ms > base_ms {
            stats.skipped += 1;
            log::debug!(
                "event slot {} at {} ms skipped: would overrun {} ms base",
                i,
                position,
                base_ms
            );
            continue;
        }

        result = overlay(&result, &prepared, position)?;
        stats.placed += 1;
    }

    log::info!(
        "scheduled {} of {} events ({} skipped)",
        stats.placed,
        stats.candidates,
        stats.skipped
    );

    Ok((result, stats))
}

/// Truncate or zero-pad the event to its configured duration, then ramp
/// both edges.
fn prepare_event(
    event: &AudioBuffer,
    event_duration_ms: u64,
    event_fade_ms: u64,
) -> Result<AudioBuffer> {
    let target_frames = event.frames_for_ms(event_duration_ms);
    let channels = event.channels() as usize;

    let sized = if event.num_frames() > target_frames {
        event.truncated_frames(target_frames)
    } else if event.num_frames() < target_frames {
        let mut samples = event.samples().to_vec();
        samples.resize(target_frames * channels, 0.0);
        AudioBuffer::new(samples, event.channels(), event.sample_rate())?
    } else {
        event.clone()
    };

    Ok(apply_fades(&sized, event_fade_ms, event_fade_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn quiet_base(duration_ms: u64, sample_rate: u32) -> AudioBuffer {
        AudioBuffer::silence(duration_ms, 1, sample_rate)
    }

    fn click(duration_ms: u64, sample_rate: u32) -> AudioBuffer {
        let frames = crate::audio::ms_to_frames(duration_ms, sample_rate);
        AudioBuffer::new(vec![0.5; frames], 1, sample_rate).unwrap()
    }

    #[test]
    fn test_candidate_slot_count() {
        let base = quiet_base(300_000, 1000);
        let event = click(5000, 1000);
        let mut rng = Pcg32::seed_from_u64(7);
        let (_, stats) =
            schedule_events(&base, &event, 30_000, 5000, 2000, 500, &mut rng).unwrap();
        assert_eq!(stats.candidates, 10);
        assert_eq!(stats.placed + stats.skipped, 10);
        assert!(stats.placed <= 10);
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let base = quiet_base(60_000, 1000);
        let event = click(2000, 1000);

        let mut rng_a = Pcg32::seed_from_u64(42);
        let (out_a, stats_a) =
            schedule_events(&base, &event, 10_000, 2000, 1500, 200, &mut rng_a).unwrap();

        let mut rng_b = Pcg32::seed_from_u64(42);
        let (out_b, stats_b) =
            schedule_events(&base, &event, 10_000, 2000, 1500, 200, &mut rng_b).unwrap();

        assert_eq!(stats_a, stats_b);
        assert!(out_a.is_approx_equal(&out_b, 0.0));
    }

    #[test]
    fn test_zero_jitter_places_on_grid() {
        let base = quiet_base(10_000, 1000);
        let event = click(1000, 1000);
        let mut rng = Pcg32::seed_from_u64(1);
        let (out, stats) =
            schedule_events(&base, &event, 2000, 1000, 0, 0, &mut rng).unwrap();

        assert_eq!(stats.candidates, 5);
        assert_eq!(stats.placed, 5);
        // energy exactly at 0, 2000, 4000, 6000, 8000 ms
        let samples = out.samples();
        assert!(samples[500] != 0.0);
        assert!(samples[1500] == 0.0);
        assert!(samples[2500] != 0.0);
    }

    #[test]
    fn test_overrunning_event_skipped_not_clamped() {
        // one slot at 0, event as long as the base minus nothing: jitter
        // can only push it over the end
        let base = quiet_base(5000, 1000);
        let event = click(5000, 1000);
        let mut rng = Pcg32::seed_from_u64(3);
        let (out, stats) =
            schedule_events(&base, &event, 5000, 5000, 3000, 0, &mut rng).unwrap();

        assert_eq!(stats.candidates, 1);
        if stats.skipped == 1 {
            // skipped events leave the base untouched
            assert!(out.is_approx_equal(&base, 0.0));
        } else {
            assert_eq!(stats.placed, 1);
        }
    }

    #[test]
    fn test_short_event_zero_padded() {
        let event = click(100, 1000);
        let prepared = prepare_event(&event, 500, 0).unwrap();
        assert_eq!(prepared.num_frames(), 500);
        assert_eq!(prepared.samples()[400], 0.0);
    }

    #[test]
    fn test_event_fades_avoid_hard_edges() {
        let event = click(1000, 1000);
        let prepared = prepare_event(&event, 1000, 100).unwrap();
        assert_eq!(prepared.samples()[0], 0.0);
        assert_eq!(prepared.samples()[999], 0.0);
        assert!(prepared.samples()[500] > 0.4);
    }
}
