//! `voxmorph` CLI: shifts a WAV file's pitch and formants by independent
//! semitone amounts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use voxmorph::config::VoiceShiftConfig;
use voxmorph::io::audio;

/// Shift pitch and formants of a mono/stereo WAV file.
#[derive(Parser, Debug)]
#[command(name = "voxmorph", version, about)]
struct Cli {
    /// Input WAV file.
    input: PathBuf,

    /// Output WAV file.
    output: PathBuf,

    /// Pitch shift in semitones, range [-12, 12].
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    transpose: f64,

    /// Formant shift target in semitones, range [-12, 12]. Equal to
    /// `--transpose` moves the vocal tract with the pitch; `0` preserves it.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    formant: f64,

    /// F0 analysis frame period in milliseconds, range [1, 200].
    #[arg(long = "frame-period-msec", default_value_t = 5.0)]
    frame_period_msec: f64,

    /// Output sample rate in Hz. 0 means match the input.
    #[arg(long = "sample-rate-out", default_value_t = 0)]
    sample_rate_out: u32,

    /// FFT analysis width; must be a power of two.
    #[arg(long = "fft-width", default_value_t = 1024)]
    fft_width: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = VoiceShiftConfig {
        transpose: cli.transpose,
        formant: cli.formant,
        frame_period_msec: cli.frame_period_msec,
        sample_rate_out: cli.sample_rate_out,
        fft_width: cli.fft_width,
    };
    config.validate()?;

    if !cli.input.exists() {
        anyhow::bail!("input file does not exist: {}", cli.input.display());
    }

    log::info!("reading {}", cli.input.display());
    let (samples, sample_rate) = audio::read_mono(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    log::info!(
        "transforming {} samples at {} Hz (transpose={} formant={})",
        samples.len(),
        sample_rate,
        config.transpose,
        config.formant
    );
    let (output, output_rate) = voxmorph::transform(samples, sample_rate, &config)?;

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }
    }

    log::info!("writing {} samples at {} Hz to {}", output.len(), output_rate, cli.output.display());
    audio::write_mono(&cli.output, &output, output_rate)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    Ok(())
}
