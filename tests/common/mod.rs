use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Creates a fresh test directory for running tests.
pub fn setup_test_dir() -> Result<PathBuf> {
    let dir_name = format!("test-data-{}", Uuid::new_v4());
    let test_dir = PathBuf::from(dir_name);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir)?;
    }
    fs::create_dir(&test_dir)?;
    Ok(test_dir)
}

/// Cleans up the test directory after tests are complete.
pub fn cleanup_test_dir(test_dir: &Path) -> Result<()> {
    if test_dir.exists() {
        fs::remove_dir_all(test_dir)?;
    }
    Ok(())
}

fn write_i16_samples(path: &Path, sample_rate: u32, samples: impl Iterator<Item = f64>) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Writes a mono 16-bit WAV file of `duration_sec` seconds of silence.
pub fn write_silence_wav(path: &Path, duration_sec: f64, sample_rate: u32) -> Result<()> {
    let n = (duration_sec * sample_rate as f64) as usize;
    write_i16_samples(path, sample_rate, std::iter::repeat(0.0).take(n))
}

/// Writes a mono 16-bit WAV file of a pure sine tone at `freq` Hz.
pub fn write_sine_wav(path: &Path, duration_sec: f64, freq: f64, sample_rate: u32) -> Result<()> {
    let n = (duration_sec * sample_rate as f64) as usize;
    write_i16_samples(
        path,
        sample_rate,
        (0..n).map(move |i| 0.8 * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin()),
    )
}

/// Writes a mono 16-bit WAV file whose frequency steps from `freq_before` to
/// `freq_after` at `step_time_sec`, with continuous phase across the step.
pub fn write_stepped_sine_wav(path: &Path, duration_sec: f64, freq_before: f64, freq_after: f64, step_time_sec: f64, sample_rate: u32) -> Result<()> {
    let n = (duration_sec * sample_rate as f64) as usize;
    let step_sample = (step_time_sec * sample_rate as f64) as usize;
    let mut phase = 0.0f64;
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let freq = if i < step_sample { freq_before } else { freq_after };
        samples.push(0.8 * phase.sin());
        phase += 2.0 * PI * freq / sample_rate as f64;
    }
    write_i16_samples(path, sample_rate, samples.into_iter())
}

/// Writes a mono 16-bit WAV file of deterministic pseudo-white-noise, using a
/// small xorshift PRNG seeded by `seed` so tests are reproducible without an
/// extra dependency.
pub fn write_white_noise_wav(path: &Path, duration_sec: f64, sample_rate: u32, seed: u64) -> Result<()> {
    let n = (duration_sec * sample_rate as f64) as usize;
    let mut state = seed.max(1);
    let samples = (0..n).map(move |_| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        ((state >> 40) as f64 / (1u64 << 24) as f64) * 2.0 - 1.0
    });
    write_i16_samples(path, sample_rate, samples)
}

/// Reads a mono WAV file back as `f64` samples in `[-1, 1]`, independent of
/// the library's own reader so I/O tests don't validate themselves.
pub fn read_wav_samples(path: &Path) -> Result<(Vec<f64>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let samples: Vec<f64> = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f64 / i16::MAX as f64))
        .collect::<Result<_, _>>()?;
    Ok((samples, spec.sample_rate))
}
