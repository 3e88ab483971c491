//! WAV persistence with level normalization.
//!
//! Generated samples arrive as mono f32 at the model-reported rate. The
//! writer normalizes them according to the chosen strategy, duplicates the
//! mono signal into two channels, and encodes 32-bit float WAV via hound.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{BatchError, Result};

/// Number of output channels (mono source duplicated to stereo).
pub const CHANNELS: u16 = 2;

/// Target level for the loudness strategy, in dBFS.
const TARGET_LOUDNESS_DB: f32 = -14.0;

/// Peak ceiling applied after any gain stage.
const PEAK_CEILING: f32 = 0.99;

/// Level normalization applied before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Gain the signal toward the target loudness, then soft-limit any
    /// samples the gain pushed past the peak ceiling.
    #[default]
    Loudness,
    /// Scale so the absolute peak sits at the ceiling.
    Peak,
    /// Leave samples untouched.
    None,
}

/// Writes samples to `<path>.wav` using the given normalization strategy.
///
/// The `.wav` extension is appended here; callers pass the bare stem.
/// Returns the full path of the written file.
pub fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    normalization: Normalization,
) -> Result<PathBuf> {
    let mut samples = samples.to_vec();
    normalize(&mut samples, normalization);

    // Append rather than set_extension: a dot inside the stem (from the
    // prompt text) must not be treated as an extension boundary.
    let mut out_name = path.as_os_str().to_os_string();
    out_name.push(".wav");
    let out_path = PathBuf::from(out_name);

    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(&out_path, spec).map_err(|e| {
        BatchError::audio_write_failed(format!("{}: {}", out_path.display(), e))
    })?;

    for sample in &samples {
        // Same sample on both channels.
        for _ in 0..CHANNELS {
            writer.write_sample(*sample).map_err(|e| {
                BatchError::audio_write_failed(format!("{}: {}", out_path.display(), e))
            })?;
        }
    }

    writer.finalize().map_err(|e| {
        BatchError::audio_write_failed(format!("{}: {}", out_path.display(), e))
    })?;

    Ok(out_path)
}

/// Applies the chosen normalization in place.
pub fn normalize(samples: &mut [f32], strategy: Normalization) {
    match strategy {
        Normalization::Loudness => normalize_loudness(samples),
        Normalization::Peak => normalize_peak(samples),
        Normalization::None => {}
    }
}

/// Gains the signal toward [`TARGET_LOUDNESS_DB`] measured as RMS energy,
/// then soft-limits with tanh if the gain pushed the peak past the ceiling.
fn normalize_loudness(samples: &mut [f32]) {
    if samples.is_empty() {
        return;
    }

    let energy: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    let rms = (energy / samples.len() as f64).sqrt() as f32;
    if rms <= f32::EPSILON {
        // Silence stays silence; no gain can reach the target.
        return;
    }

    let loudness_db = 20.0 * rms.log10();
    let gain = 10f32.powf((TARGET_LOUDNESS_DB - loudness_db) / 20.0);
    for sample in samples.iter_mut() {
        *sample *= gain;
    }

    let peak = peak_abs(samples);
    if peak > PEAK_CEILING {
        // tanh limiter keeps the gained signal inside the encodable range.
        for sample in samples.iter_mut() {
            *sample = PEAK_CEILING * (*sample / PEAK_CEILING).tanh();
        }
    }
}

/// Scales so the absolute peak sits exactly at the ceiling.
fn normalize_peak(samples: &mut [f32]) {
    let peak = peak_abs(samples);
    if peak <= f32::EPSILON {
        return;
    }
    let scale = PEAK_CEILING / peak;
    for sample in samples.iter_mut() {
        *sample *= scale;
    }
}

fn peak_abs(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}

/// Duration in seconds represented by a mono sample count.
pub fn samples_to_duration(sample_count: usize, sample_rate: u32) -> f32 {
    sample_count as f32 / sample_rate as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_wav_appends_extension_and_roundtrips() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("track_01_test");

        let samples = vec![0.0f32, 0.25, -0.25, 0.0];
        let written = write_wav(&stem, &samples, 32000, Normalization::None).unwrap();

        assert_eq!(written.extension().unwrap(), "wav");
        assert!(written.exists());

        let reader = hound::WavReader::open(&written).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, CHANNELS);
        assert_eq!(spec.sample_rate, 32000);
        assert_eq!(spec.sample_format, SampleFormat::Float);
        // Mono samples duplicated to two channels.
        assert_eq!(reader.len() as usize, samples.len() * CHANNELS as usize);
    }

    #[test]
    fn extension_is_appended_even_with_dotted_stems() {
        let dir = tempdir().unwrap();
        let stem = dir.path().join("track_01_lofi._beats");

        let written = write_wav(&stem, &[0.0f32], 32000, Normalization::None).unwrap();
        assert!(written.to_string_lossy().ends_with("track_01_lofi._beats.wav"));
    }

    #[test]
    fn loudness_leaves_silence_alone() {
        let mut samples = vec![0.0f32; 1024];
        normalize(&mut samples, Normalization::Loudness);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn loudness_gains_quiet_signal_toward_target() {
        // -40 dBFS sine-ish signal, well below the -14 dBFS target.
        let mut samples: Vec<f32> = (0..32000)
            .map(|i| 0.01 * (i as f32 * 0.05).sin())
            .collect();
        normalize(&mut samples, Normalization::Loudness);

        let energy: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
        let rms = (energy / samples.len() as f64).sqrt() as f32;
        let loudness_db = 20.0 * rms.log10();
        assert!(
            (loudness_db - TARGET_LOUDNESS_DB).abs() < 1.0,
            "normalized loudness {loudness_db} dB not near target"
        );
    }

    #[test]
    fn loudness_never_exceeds_peak_ceiling() {
        // A spike on a quiet bed: the gain overshoots and the limiter
        // must pull the spike back inside the ceiling.
        let mut samples = vec![0.001f32; 4096];
        samples[100] = 0.9;
        normalize(&mut samples, Normalization::Loudness);
        assert!(peak_abs(&samples) <= PEAK_CEILING + f32::EPSILON);
    }

    #[test]
    fn peak_strategy_hits_ceiling_exactly() {
        let mut samples = vec![0.1f32, -0.5, 0.25];
        normalize(&mut samples, Normalization::Peak);
        assert!((peak_abs(&samples) - PEAK_CEILING).abs() < 1e-6);
    }

    #[test]
    fn samples_to_duration_calculation() {
        assert_eq!(samples_to_duration(32000, 32000), 1.0);
        assert_eq!(samples_to_duration(16000, 32000), 0.5);
    }
}
