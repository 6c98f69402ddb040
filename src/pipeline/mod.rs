//! Batch mix-and-analyze pipeline
//!
//! The top-level entry: load named sources, synthesize the mix, export
//! it, then analyze every component (each source and the final mix) into
//! its own report directory. Components have no ordering dependency on
//! each other; only the steps inside one component are ordered.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analysis::{ArtifactSink, ComponentMetadata, NoiseAnalyzer};
use crate::audio::{load_wav, probe, save_wav_with_depth};
use crate::error::Result;
use crate::mix::{synthesize, MixConfig, MixSources, Track};

/// Bit depth of the exported final mix
const EXPORT_BITS: u16 = 16;

/// Per-role level trims, in dB.
///
/// These replace the original tooling's module-level volume constants:
/// they travel with the request instead of living in process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackLevels {
    pub forest_db: f32,
    pub rain_db: f32,
    pub fire_db: f32,
    pub bird_call_db: f32,
}

impl Default for TrackLevels {
    fn default() -> Self {
        Self {
            forest_db: -10.0,
            rain_db: -7.0,
            fire_db: -20.0,
            bird_call_db: -18.0,
        }
    }
}

/// Everything needed for one batch run
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub forest: PathBuf,
    pub rain: PathBuf,
    pub fire: PathBuf,
    pub bird_calls: Option<PathBuf>,
    pub intro: Option<PathBuf>,
    pub outro: Option<PathBuf>,
    pub levels: TrackLevels,
    pub config: MixConfig,
    /// Root under which the run directory is created
    pub output_root: PathBuf,
    /// Run directory name; defaults to a `mix_<MMDD_HHMM>` timestamp
    pub output_name: Option<String>,
}

/// Aggregate result of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub mix_path: PathBuf,
    /// One metadata record per component, keyed by component name
    pub components: BTreeMap<String, ComponentMetadata>,
}

/// Load the named sources described by a request
pub fn load_sources(request: &BatchRequest) -> Result<MixSources> {
    let levels = &request.levels;
    let backgrounds = vec![
        // rain loops seamlessly as a continuous bed; forest and fire
        // get edge fades
        Track::new("forest", load_wav(&request.forest)?, levels.forest_db, true),
        Track::new("rain", load_wav(&request.rain)?, levels.rain_db, false),
        Track::new("fire", load_wav(&request.fire)?, levels.fire_db, true),
    ];

    let events = match &request.bird_calls {
        Some(path) => Some(Track::new(
            "bird_calls",
            load_wav(path)?,
            levels.bird_call_db,
            false,
        )),
        None => None,
    };
    let intro = request.intro.as_ref().map(load_wav).transpose()?;
    let outro = request.outro.as_ref().map(load_wav).transpose()?;

    Ok(MixSources {
        backgrounds,
        events,
        intro,
        outro,
    })
}

/// Analyze one audio file into `out_dir` and persist its metadata record
pub fn analyze_file(
    path: &Path,
    name: &str,
    out_dir: &Path,
    analyzer: &NoiseAnalyzer,
    sink: &dyn ArtifactSink,
) -> Result<ComponentMetadata> {
    let buffer = load_wav(path)?;
    let info = probe(path)?;

    let noise_analysis = analyzer.analyze(&buffer, name, out_dir, sink)?;
    let metadata = ComponentMetadata {
        filename: path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default(),
        duration_seconds: info.duration_seconds,
        channels: info.channels,
        sample_width: info.sample_width,
        frame_rate: info.sample_rate,
        visualization_path: noise_analysis.noise_analysis_plot.clone(),
        noise_analysis,
    };
    metadata.save(out_dir, name)?;
    Ok(metadata)
}

/// Mix, export, and analyze all components of one request
pub fn run(request: &BatchRequest, sink: &dyn ArtifactSink) -> Result<BatchReport> {
    let output_name = request
        .output_name
        .clone()
        .unwrap_or_else(|| format!("mix_{}", Local::now().format("%m%d_%H%M")));
    let output_dir = request.output_root.join(&output_name);
    std::fs::create_dir_all(&output_dir)?;

    let sources = load_sources(request)?;
    let final_mix = synthesize(&sources, &request.config)?;

    let mix_path = output_dir.join(format!("{}.wav", output_name));
    save_wav_with_depth(&final_mix, &mix_path, EXPORT_BITS)?;
    log::info!("final mix exported to {}", mix_path.display());

    let mut components: Vec<(String, PathBuf)> = vec![
        ("forest".to_string(), request.forest.clone()),
        ("rain".to_string(), request.rain.clone()),
        ("fire".to_string(), request.fire.clone()),
    ];
    if let Some(path) = &request.bird_calls {
        components.push(("bird_calls".to_string(), path.clone()));
    }
    if let Some(path) = &request.intro {
        components.push(("intro".to_string(), path.clone()));
    }
    if let Some(path) = &request.outro {
        components.push(("outro".to_string(), path.clone()));
    }
    components.push(("final_mix".to_string(), mix_path.clone()));

    let analyzer = NoiseAnalyzer::default();
    let mut reports = BTreeMap::new();
    for (name, path) in components {
        let component_dir = output_dir.join(&name);
        let metadata = analyze_file(&path, &name, &component_dir, &analyzer, sink)?;
        reports.insert(name, metadata);
    }

    Ok(BatchReport {
        output_dir,
        mix_path,
        components: reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::JsonArtifactSink;
    use crate::audio::{save_wav, AudioBuffer};
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const RATE: u32 = 8000;

    fn write_noise_wav(dir: &Path, name: &str, duration_ms: u64, seed: u64) -> PathBuf {
        let mut rng = Pcg32::seed_from_u64(seed);
        let frames = crate::audio::ms_to_frames(duration_ms, RATE);
        let samples: Vec<f32> = (0..frames).map(|_| rng.gen_range(-0.4..0.4)).collect();
        let buffer = AudioBuffer::new(samples, 1, RATE).unwrap();
        let path = dir.join(name);
        save_wav(&buffer, &path).unwrap();
        path
    }

    fn small_request(dir: &Path) -> BatchRequest {
        BatchRequest {
            forest: write_noise_wav(dir, "forest.wav", 1000, 1),
            rain: write_noise_wav(dir, "rain.wav", 1300, 2),
            fire: write_noise_wav(dir, "fire.wav", 700, 3),
            bird_calls: None,
            intro: None,
            outro: None,
            levels: TrackLevels::default(),
            config: MixConfig {
                target_ms: 4000,
                fade_ms: 200,
                event_interval_ms: 1000,
                event_duration_ms: 300,
                event_jitter_ms: 100,
                event_fade_ms: 50,
                crossfade_ms: 300,
                seed: Some(5),
                ..MixConfig::default()
            },
            output_root: dir.join("results"),
            output_name: Some("test_run".to_string()),
        }
    }

    #[test]
    fn test_batch_run_produces_mix_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let request = small_request(dir.path());
        let report = run(&request, &JsonArtifactSink).unwrap();

        assert!(report.mix_path.exists());
        let mix = load_wav(&report.mix_path).unwrap();
        assert_eq!(mix.duration_ms(), 4000);

        let names: Vec<&str> = report.components.keys().map(String::as_str).collect();
        assert_eq!(names, ["final_mix", "fire", "forest", "rain"]);
        for name in names {
            let component_dir = report.output_dir.join(name);
            assert!(component_dir
                .join(format!("{}_noise_analysis.json", name))
                .exists());
            assert!(component_dir
                .join(format!("{}_metadata.json", name))
                .exists());
        }
    }

    #[test]
    fn test_batch_run_with_all_optional_components() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = small_request(dir.path());
        request.bird_calls = Some(write_noise_wav(dir.path(), "birds.wav", 400, 4));
        request.intro = Some(write_noise_wav(dir.path(), "intro.wav", 800, 6));
        request.outro = Some(write_noise_wav(dir.path(), "outro.wav", 800, 7));

        let report = run(&request, &JsonArtifactSink).unwrap();
        assert_eq!(report.components.len(), 7);

        // target + intro + outro - two crossfades
        let mix = load_wav(&report.mix_path).unwrap();
        assert_eq!(mix.duration_ms(), 4000 + 800 + 800 - 2 * 300);
    }

    #[test]
    fn test_metadata_reflects_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_noise_wav(dir.path(), "single.wav", 2000, 9);
        let metadata = analyze_file(
            &path,
            "single",
            &dir.path().join("out"),
            &NoiseAnalyzer::default(),
            &JsonArtifactSink,
        )
        .unwrap();

        assert_eq!(metadata.filename, "single.wav");
        assert_eq!(metadata.frame_rate, RATE);
        assert_eq!(metadata.channels, 1);
        assert_eq!(metadata.sample_width, 4);
        assert!((metadata.duration_seconds - 2.0).abs() < 0.01);
    }
}
