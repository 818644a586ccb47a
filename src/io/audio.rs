//! WAV file input/output and sample-rate conversion.
//!
//! Reads and writes the `f64` mono streams the pipeline operates on;
//! downmixing, peak normalization, and clipping all happen at this boundary
//! so the core never has to reason about channel count or bit depth.

use anyhow::{anyhow, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;

/// Reads a WAV file, downmixing to mono by averaging channels and
/// normalizing integer samples by their full-scale value.
pub fn read_mono(path: &Path) -> Result<(Vec<f64>, u32)> {
    let mut reader = WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(anyhow!("WAV file declares zero channels"));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64).with_context(|| "failed to read float sample"))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let max_value = 2f64.powi(spec.bits_per_sample as i32 - 1);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_value).with_context(|| "failed to read integer sample"))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = downmix(&interleaved, channels);
    Ok((mono, spec.sample_rate))
}

fn downmix(interleaved: &[f64], channels: usize) -> Vec<f64> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// Writes a mono `f64` stream as a 16-bit PCM WAV file, clipping to
/// `[-1, 1]` before quantizing. Clipping is the sink's responsibility per
/// the core's external-interface contract; the core itself never saturates.
pub fn write_mono(path: &Path, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).with_context(|| format!("failed to create {}", path.display()))?;
    for &s in samples {
        let clipped = s.clamp(-1.0, 1.0);
        let quantized = (clipped * i16::MAX as f64).round() as i16;
        writer.write_sample(quantized).with_context(|| "failed to write sample")?;
    }
    writer.finalize().with_context(|| "failed to finalize WAV file")?;
    Ok(())
}

/// Resamples a mono stream from `source_rate` to `target_rate` Hz using a
/// windowed-sinc FFT resampler. A no-op when the rates already match.
pub fn resample(samples: &[f64], source_rate: u32, target_rate: u32) -> Result<Vec<f64>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let mut resampler = FftFixedIn::<f64>::new(source_rate as usize, target_rate as usize, samples.len(), 1024, 1)
        .with_context(|| "failed to construct resampler")?;
    let mut output = resampler
        .process(&[samples.to_vec()], None)
        .with_context(|| "failed to resample audio")?;
    Ok(output.swap_remove(0))
}
