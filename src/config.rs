//! Pipeline configuration and validation.

use anyhow::{anyhow, Result};

/// The five interdependent knobs that drive a single transform run.
///
/// Grouped into one struct because pitch, formant, and FFT width all
/// interact (the formant coefficient is derived from both `transpose` and
/// `formant`, and the cepstral lifter schedule scales with `fft_width`).
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceShiftConfig {
    /// Pitch shift in semitones, range `[-12, 12]`.
    pub transpose: f64,
    /// Target formant position in semitones, range `[-12, 12]`. When equal
    /// to `transpose`, the vocal tract moves with the pitch. When `0`, the
    /// vocal tract is preserved regardless of pitch.
    pub formant: f64,
    /// F0 analysis frame period, in milliseconds, range `[1, 200]`.
    pub frame_period_msec: f64,
    /// Output sample rate in Hz. `0` means "match input"; otherwise must be
    /// in `[8000, 96000]`.
    pub sample_rate_out: u32,
    /// FFT analysis width, must be a power of two.
    pub fft_width: usize,
}

impl Default for VoiceShiftConfig {
    fn default() -> Self {
        Self {
            transpose: 0.0,
            formant: 0.0,
            frame_period_msec: 5.0,
            sample_rate_out: 0,
            fft_width: 1024,
        }
    }
}

impl VoiceShiftConfig {
    /// Rejects out-of-range values before any pipeline thread is spawned.
    pub fn validate(&self) -> Result<()> {
        if !(-12.0..=12.0).contains(&self.transpose) {
            return Err(anyhow!("transpose must be within [-12, 12] semitones, got {}", self.transpose));
        }
        if !(-12.0..=12.0).contains(&self.formant) {
            return Err(anyhow!("formant must be within [-12, 12] semitones, got {}", self.formant));
        }
        if !(1.0..=200.0).contains(&self.frame_period_msec) {
            return Err(anyhow!(
                "frame_period_msec must be within [1, 200], got {}",
                self.frame_period_msec
            ));
        }
        if self.sample_rate_out != 0 && !(8000..=96000).contains(&self.sample_rate_out) {
            return Err(anyhow!(
                "sample_rate_out must be 0 or within [8000, 96000], got {}",
                self.sample_rate_out
            ));
        }
        if self.fft_width < 4 || !self.fft_width.is_power_of_two() {
            return Err(anyhow!("fft_width must be a power of two >= 4, got {}", self.fft_width));
        }
        Ok(())
    }

    /// Pitch coefficient `p = 2^(transpose/12)`.
    pub fn pitch_coef(&self) -> f64 {
        2f64.powf(self.transpose / 12.0)
    }

    /// Formant (spectral-envelope warp) coefficient
    /// `s = 2^((formant - transpose)/12)`.
    pub fn formant_coef(&self) -> f64 {
        2f64.powf((self.formant - self.transpose) / 12.0)
    }

    pub fn frame_period_seconds(&self) -> f64 {
        self.frame_period_msec / 1000.0
    }
}
