//! Offline/streaming pitch and formant shifter.
//!
//! Given a monaural audio signal, produces a new signal whose pitch and
//! vocal-tract formant structure have been independently shifted by
//! user-specified musical-semitone amounts. Pitch is shifted by resampling
//! single-period waveforms extracted from the input ([`stretcher`],
//! [`shape`]); formant (spectral-envelope) manipulation happens in the
//! frequency domain via short-time Fourier analysis/synthesis
//! ([`fft_processor`], [`formant_shifter`]). The two halves are coupled by a
//! fundamental-frequency track ([`f0`], [`f0_splitter`]) and a thread-safe
//! streaming buffer ([`wave_buffer`]); [`pipeline`] wires all five stages
//! together.

pub mod config;
pub mod f0;
pub mod f0_splitter;
pub mod fft_processor;
pub mod formant_shifter;
pub mod io;
pub mod pipeline;
pub mod shape;
pub mod stretcher;
pub mod wave_buffer;
pub mod window;

use anyhow::Result;

use config::VoiceShiftConfig;
use io::audio;

/// Canonical F0 analysis floor, matching the reference parameters in the
/// external F0-estimator contract.
pub const F0_FLOOR_HZ: f64 = 71.0;
/// Canonical F0 analysis ceiling.
pub const F0_CEIL_HZ: f64 = 800.0;

/// Runs the full transform over a mono `f64` signal at `sample_rate` Hz,
/// estimating F0 internally via [`f0::estimate_f0`], then, if
/// `config.sample_rate_out` differs from `sample_rate`, resampling the
/// pipeline's output to the target rate via [`audio::resample`].
///
/// The DSP pipeline itself always runs at a unity sample-rate ratio; rate
/// conversion is a WAV-level concern handled once, after synthesis, rather
/// than folded into the `Stretcher`'s own (more general) resample
/// coefficient -- doing both would resample twice.
///
/// Returns the output signal and its sample rate.
pub fn transform(input: Vec<f64>, sample_rate: u32, config: &VoiceShiftConfig) -> Result<(Vec<f64>, u32)> {
    config.validate()?;

    let output_rate = if config.sample_rate_out == 0 { sample_rate } else { config.sample_rate_out };

    let f0_track = f0::estimate_f0(&input, sample_rate as f64, config.frame_period_seconds(), F0_FLOOR_HZ, F0_CEIL_HZ);

    let synthesized = pipeline::run(input, sample_rate, f0_track, config);
    let output = audio::resample(&synthesized, sample_rate, output_rate)?;
    Ok((output, output_rate))
}
