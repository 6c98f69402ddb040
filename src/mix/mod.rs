//! Mix synthesis engine
//!
//! Orchestrates gain staging, loop trimming, fades, overlay compositing,
//! event scheduling, and crossfade splicing into one fixed-duration
//! ambient mix. All level decisions flow from an explicit [`MixConfig`]
//! and per-track trims; there is no process-wide tuning state.

pub mod fade;
pub mod gain;
pub mod loops;
pub mod overlay;
pub mod schedule;
pub mod splice;

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::error::{Result, SusurrusError};

pub use schedule::ScheduleStats;

/// Tuning for one synthesized mix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixConfig {
    /// Total duration of the looping background bed, in milliseconds
    pub target_ms: u64,
    /// Common reference loudness every track is normalized to, in dBFS
    pub reference_dbfs: f32,
    /// Fade-in/fade-out length for background tracks, in milliseconds
    pub fade_ms: u64,
    /// Spacing between discrete event slots, in milliseconds
    pub event_interval_ms: u64,
    /// Length each event is truncated/padded to, in milliseconds
    pub event_duration_ms: u64,
    /// Uniform timing jitter bound for event placement, in milliseconds
    pub event_jitter_ms: u64,
    /// Short edge ramp on each event copy, in milliseconds
    pub event_fade_ms: u64,
    /// Overlap length when splicing intro/outro, in milliseconds
    pub crossfade_ms: u64,
    /// Seed for the jitter random source; None draws from entropy
    pub seed: Option<u64>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            target_ms: 300_000,
            reference_dbfs: -20.0,
            fade_ms: 3000,
            event_interval_ms: 30_000,
            event_duration_ms: 5000,
            event_jitter_ms: 2000,
            event_fade_ms: 500,
            crossfade_ms: 4000,
            seed: None,
        }
    }
}

impl MixConfig {
    /// Default tuning for a mix of the given duration
    pub fn with_target_ms(target_ms: u64) -> Self {
        Self {
            target_ms,
            ..Self::default()
        }
    }

    /// Reject configurations that cannot produce a well-defined mix
    pub fn validate(&self) -> Result<()> {
        if self.target_ms == 0 {
            return Err(SusurrusError::InvalidConfig {
                reason: "target duration must be positive".to_string(),
            });
        }
        if self.event_interval_ms == 0 {
            return Err(SusurrusError::InvalidConfig {
                reason: "event interval must be positive".to_string(),
            });
        }
        if self.event_duration_ms == 0 {
            return Err(SusurrusError::InvalidConfig {
                reason: "event duration must be positive".to_string(),
            });
        }
        if self.event_duration_ms > self.event_interval_ms {
            return Err(SusurrusError::InvalidConfig {
                reason: format!(
                    "event duration {} ms exceeds interval {} ms: events would always overlap",
                    self.event_duration_ms, self.event_interval_ms
                ),
            });
        }
        Ok(())
    }
}

/// One named source with its level trim
#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub buffer: AudioBuffer,
    /// Signed level offset applied after normalization, in dB
    pub trim_db: f32,
    /// Whether the track gets edge fades (continuous beds like rain
    /// usually loop seamlessly and skip them)
    pub fade: bool,
}

impl Track {
    pub fn new(name: impl Into<String>, buffer: AudioBuffer, trim_db: f32, fade: bool) -> Self {
        Self {
            name: name.into(),
            buffer,
            trim_db,
            fade,
        }
    }
}

/// Named source buffers for one mix
#[derive(Debug, Clone, Default)]
pub struct MixSources {
    /// Continuous background beds (forest, rain, fire). At least one is
    /// required.
    pub backgrounds: Vec<Track>,
    /// Optional short event sound placed at jittered intervals
    pub events: Option<Track>,
    /// Optional opening material spliced onto the front
    pub intro: Option<AudioBuffer>,
    /// Optional closing material spliced onto the back
    pub outro: Option<AudioBuffer>,
}

/// Synthesize the final mix, seeding the jitter source from the config
pub fn synthesize(sources: &MixSources, config: &MixConfig) -> Result<AudioBuffer> {
    let mut rng = match config.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_entropy(),
    };
    synthesize_with_rng(sources, config, &mut rng)
}

/// Synthesize the final mix with a caller-provided jitter source.
///
/// Pipeline: normalize + trim each background, loop-trim to the target
/// duration, fade, overlay into one bed, peak-normalize the composite,
/// schedule events, splice intro/outro with crossfades. Output duration
/// is `target_ms` plus any intro/outro duration minus crossfade overlap.
pub fn synthesize_with_rng<R: Rng>(
    sources: &MixSources,
    config: &MixConfig,
    rng: &mut R,
) -> Result<AudioBuffer> {
    config.validate()?;

    if sources.backgrounds.is_empty() {
        return Err(SusurrusError::MissingTrack {
            role: "background".to_string(),
        });
    }

    let reference = &sources.backgrounds[0].buffer;
    for track in &sources.backgrounds[1..] {
        reference.check_compatible(&track.buffer)?;
    }
    if let Some(events) = &sources.events {
        reference.check_compatible(&events.buffer)?;
    }
    if let Some(intro) = &sources.intro {
        reference.check_compatible(intro)?;
    }
    if let Some(outro) = &sources.outro {
        reference.check_compatible(outro)?;
    }

    // Stage 1-3: level, length, and edges per background track
    let mut beds = Vec::with_capacity(sources.backgrounds.len());
    for track in &sources.backgrounds {
        log::info!(
            "preparing background '{}' (trim {:+.1} dB)",
            track.name,
            track.trim_db
        );
        let leveled = gain::trim(
            &gain::normalize_rms(
                &gain::normalize_peak(&track.buffer, gain::PEAK_HEADROOM_DB),
                config.reference_dbfs,
            ),
            track.trim_db,
        );
        let looped = loops::loop_to_duration(&leveled, config.target_ms)?;
        let shaped = if track.fade {
            fade::apply_fades(&looped, config.fade_ms, config.fade_ms)
        } else {
            looped
        };
        beds.push(shaped);
    }

    // Stage 4: sum the beds
    let mut composite = beds[0].clone();
    for bed in &beds[1..] {
        composite = overlay::overlay(&composite, bed, 0)?;
    }

    // Stage 5: reclaim headroom eaten by summation
    composite = gain::normalize_peak(&composite, gain::PEAK_HEADROOM_DB);
    log::info!(
        "composite bed: {} ms at {:.1} dBFS",
        composite.duration_ms(),
        composite.dbfs()
    );

    // Stage 6: discrete events
    if let Some(events) = &sources.events {
        log::info!("scheduling '{}' events", events.name);
        let leveled = gain::trim(
            &gain::normalize_rms(
                &gain::normalize_peak(&events.buffer, gain::PEAK_HEADROOM_DB),
                config.reference_dbfs,
            ),
            events.trim_db,
        );
        let (with_events, _stats) = schedule::schedule_events(
            &composite,
            &leveled,
            config.event_interval_ms,
            config.event_duration_ms,
            config.event_jitter_ms,
            config.event_fade_ms,
            rng,
        )?;
        composite = with_events;
    }

    // Stage 7: intro/outro, gain-matched so the transition is
    // level-continuous
    if let Some(intro) = &sources.intro {
        log::info!("splicing intro ({} ms crossfade)", config.crossfade_ms);
        let matched = gain::normalize_rms(intro, composite.dbfs());
        composite = splice::append(&matched, &composite, config.crossfade_ms)?;
    }
    if let Some(outro) = &sources.outro {
        log::info!("splicing outro ({} ms crossfade)", config.crossfade_ms);
        let matched = gain::normalize_rms(outro, composite.dbfs());
        composite = splice::append(&composite, &matched, config.crossfade_ms)?;
    }

    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const RATE: u32 = 8000;

    fn bed(name: &str, duration_ms: u64, freq: f32, trim_db: f32, fade: bool) -> Track {
        Track::new(name, AudioBuffer::sine_wave(freq, duration_ms, RATE), trim_db, fade)
    }

    fn trio() -> MixSources {
        MixSources {
            backgrounds: vec![
                bed("forest", 1000, 220.0, -10.0, true),
                bed("rain", 1300, 330.0, -7.0, false),
                bed("fire", 700, 110.0, -20.0, true),
            ],
            ..MixSources::default()
        }
    }

    fn quick_config(target_ms: u64) -> MixConfig {
        MixConfig {
            target_ms,
            fade_ms: 200,
            event_interval_ms: 1000,
            event_duration_ms: 300,
            event_jitter_ms: 100,
            event_fade_ms: 50,
            crossfade_ms: 400,
            seed: Some(99),
            ..MixConfig::default()
        }
    }

    #[test]
    fn test_mix_duration_matches_target() {
        let out = synthesize(&trio(), &quick_config(5000)).unwrap();
        assert_eq!(out.duration_ms(), 5000);
    }

    #[test]
    fn test_missing_backgrounds_fatal() {
        let sources = MixSources::default();
        let result = synthesize(&sources, &quick_config(5000));
        assert!(matches!(result, Err(SusurrusError::MissingTrack { .. })));
    }

    #[test]
    fn test_rate_mismatch_fatal_before_output() {
        let mut sources = trio();
        sources.backgrounds.push(Track::new(
            "odd",
            AudioBuffer::sine_wave(220.0, 1000, 48000),
            0.0,
            false,
        ));
        let result = synthesize(&sources, &quick_config(5000));
        assert!(matches!(
            result,
            Err(SusurrusError::SampleRateMismatch { .. })
        ));
    }

    #[test]
    fn test_events_keep_target_duration() {
        let mut sources = trio();
        sources.events = Some(bed("bird_calls", 400, 880.0, -18.0, false));
        let out = synthesize(&sources, &quick_config(5000)).unwrap();
        assert_eq!(out.duration_ms(), 5000);
    }

    #[test]
    fn test_intro_outro_extend_duration() {
        let mut sources = trio();
        sources.intro = Some(AudioBuffer::sine_wave(440.0, 2000, RATE));
        sources.outro = Some(AudioBuffer::sine_wave(440.0, 1500, RATE));
        let config = quick_config(5000);
        let out = synthesize(&sources, &config).unwrap();
        // target + intro + outro - two crossfade overlaps
        assert_eq!(out.duration_ms(), 5000 + 2000 + 1500 - 2 * 400);
    }

    #[test]
    fn test_seeded_mix_reproducible() {
        let mut sources = trio();
        sources.events = Some(bed("bird_calls", 400, 880.0, -18.0, false));
        let config = quick_config(5000);
        let a = synthesize(&sources, &config).unwrap();
        let b = synthesize(&sources, &config).unwrap();
        assert!(a.is_approx_equal(&b, 0.0));
    }

    #[test_case(MixConfig { target_ms: 0, ..MixConfig::default() }; "zero target")]
    #[test_case(MixConfig { event_interval_ms: 0, ..MixConfig::default() }; "zero interval")]
    #[test_case(MixConfig { event_duration_ms: 0, ..MixConfig::default() }; "zero event duration")]
    #[test_case(MixConfig { event_duration_ms: 40_000, ..MixConfig::default() }; "event longer than interval")]
    fn test_invalid_configs_rejected(config: MixConfig) {
        assert!(matches!(
            config.validate(),
            Err(SusurrusError::InvalidConfig { .. })
        ));
    }
}
