//! Audio file I/O operations
//!
//! Handles loading and saving WAV files using the hound crate. This is
//! the codec seam: everything past it works on in-memory sample buffers.

use crate::audio::AudioBuffer;
use crate::error::{Result, SusurrusError};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Container-level facts about a WAV file, used for report metadata
#[derive(Debug, Clone)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    /// Bytes per sample
    pub sample_width: u16,
    pub duration_seconds: f64,
}

/// Read a WAV header without decoding the sample data
pub fn probe<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|e| SusurrusError::AudioReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let spec = reader.spec();
    let frames = reader.duration() as f64;
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        sample_width: spec.bits_per_sample / 8,
        duration_seconds: frames / spec.sample_rate as f64,
    })
}

/// Load a WAV file into an AudioBuffer
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|e| SusurrusError::AudioReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let spec = reader.spec();
    let channels = spec.channels;
    let sample_rate = spec.sample_rate;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| {
                s.map_err(|e| SusurrusError::AudioReadError {
                    path: path.display().to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<f32>>>()?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1u32 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| {
                    s.map(|v| v as f32 / max_val)
                        .map_err(|e| SusurrusError::AudioReadError {
                            path: path.display().to_string(),
                            source: e,
                        })
                })
                .collect::<Result<Vec<f32>>>()?
        }
    };

    AudioBuffer::new(samples, channels, sample_rate)
}

/// Save an AudioBuffer to a WAV file (32-bit float)
pub fn save_wav<P: AsRef<Path>>(buffer: &AudioBuffer, path: P) -> Result<()> {
    save_wav_with_depth(buffer, path, 32)
}

/// Save an AudioBuffer to a WAV file with a specific bit depth
pub fn save_wav_with_depth<P: AsRef<Path>>(
    buffer: &AudioBuffer,
    path: P,
    bits: u16,
) -> Result<()> {
    let path = path.as_ref();

    let write_err = |e: hound::Error| SusurrusError::AudioWriteError {
        path: path.display().to_string(),
        source: e,
    };

    if !matches!(bits, 16 | 24 | 32) {
        return Err(SusurrusError::UnsupportedFormat {
            details: format!("{}-bit export (only 16, 24, 32 supported)", bits),
        });
    }

    let spec = WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bits,
        sample_format: if bits == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;

    match bits {
        32 => {
            for &sample in buffer.samples() {
                writer.write_sample(sample).map_err(write_err)?;
            }
        }
        16 | 24 => {
            let max_val = ((1u32 << (bits - 1)) - 1) as f32;
            for &sample in buffer.samples() {
                let int_sample = (sample.clamp(-1.0, 1.0) * max_val) as i32;
                writer.write_sample(int_sample).map_err(write_err)?;
            }
        }
        _ => {
            return Err(SusurrusError::UnsupportedFormat {
                details: format!("{}-bit export (only 16, 24, 32 supported)", bits),
            });
        }
    }

    writer.finalize().map_err(write_err)?;
    Ok(())
}
