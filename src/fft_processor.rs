//! Generic overlap-add short-time Fourier engine.
//!
//! Reads frames of width `W` with hop `W/2` from a [`WaveBuffer`], windows
//! them, takes a forward real FFT, hands the spectrum to a caller-supplied
//! [`SpectralTransform`], inverse-transforms, windows again, and overlap-adds
//! into the output channel. The window pair (`sqrt(Hann)` for both analysis
//! and synthesis) satisfies the constant-overlap-add (COLA) condition at this
//! hop, so an identity transform reconstructs the input exactly.

use std::sync::Arc;

use crossbeam_channel::Sender;
use realfft::num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::wave_buffer::WaveBuffer;
use crate::window::sqrt_hann;

/// A capability that reshapes one short-time spectrum per FFT frame.
///
/// The cepstral formant shifter is the only production implementation, but
/// the trait lets alternative spectral processors (LPC envelopes, simple
/// peak-picking) plug into the same engine.
pub trait SpectralTransform: Send {
    /// Reshapes `spectrum` in place. `spectrum` has length `width/2 + 1` and
    /// is already normalized (forward FFT output divided by `width`).
    /// `wave` is the windowed time-domain frame that produced it, made
    /// available for transforms that need both domains.
    fn transform(&mut self, spectrum: &mut [Complex64], wave: &[f64]);
}

/// A transform that passes the spectrum through unchanged. Used to verify
/// COLA reconstruction end to end.
pub struct IdentityTransform;

impl SpectralTransform for IdentityTransform {
    fn transform(&mut self, _spectrum: &mut [Complex64], _wave: &[f64]) {}
}

/// Overlap-add engine parameterized by a [`SpectralTransform`].
pub struct FftProcessor<T: SpectralTransform> {
    width: usize,
    hop: usize,
    analysis_window: Vec<f64>,
    synthesis_window: Vec<f64>,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
    transform: T,
}

impl<T: SpectralTransform> FftProcessor<T> {
    /// Builds a new processor. `width` is rounded down to an even number,
    /// minimum 4.
    pub fn new(width: usize, transform: T) -> Self {
        let width = (width.max(4) / 2) * 2;
        let mut planner = RealFftPlanner::<f64>::new();
        Self {
            width,
            hop: width / 2,
            analysis_window: sqrt_hann(width),
            synthesis_window: sqrt_hann(width),
            forward: planner.plan_fft_forward(width),
            inverse: planner.plan_fft_inverse(width),
            transform,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Gives back the wrapped transform, e.g. to read diagnostic state after
    /// the run loop has finished.
    pub fn into_transform(self) -> T {
        self.transform
    }

    /// Runs the overlap-add loop to completion, consuming `self`. Reads from
    /// `input` starting at absolute index 0, writes to `output` until the
    /// input buffer closes and drains, then drops `output` (closing it) and
    /// returns the transform for inspection.
    pub fn run(mut self, input: &WaveBuffer, output: &Sender<f64>) -> T {
        log::debug!("FftProcessor started: width={} hop={}", self.width, self.hop);

        let hop = self.hop;
        let width = self.width;

        let mut forward_scratch = self.forward.make_scratch_vec();
        let mut inverse_scratch = self.inverse.make_scratch_vec();
        let mut spectrum = self.forward.make_output_vec();
        let mut wave0 = vec![0.0f64; width];
        let mut wave1 = vec![0.0f64; width];
        let mut wave1_prev = vec![0.0f64; width];

        let mut i = 0usize;
        loop {
            let (src, more) = input.read(i, i + width);
            let terminate = !more;

            for k in 0..width {
                let sample = src.get(k).copied().unwrap_or(0.0);
                wave0[k] = self.analysis_window[k] * sample;
            }

            self.forward
                .process_with_scratch(&mut wave0, &mut spectrum, &mut forward_scratch)
                .expect("real FFT forward failed");
            let norm = 1.0 / width as f64;
            for c in spectrum.iter_mut() {
                *c *= norm;
            }

            self.transform.transform(&mut spectrum, &wave0);

            self.inverse
                .process_with_scratch(&mut spectrum, &mut wave1, &mut inverse_scratch)
                .expect("real FFT inverse failed");

            for k in 0..width {
                wave1[k] *= self.synthesis_window[k];
            }

            for k in 0..hop {
                let v = wave1_prev[hop + k] + wave1[k];
                if output.send(v).is_err() {
                    log::debug!("FftProcessor: downstream closed, stopping early");
                    return self.transform;
                }
            }

            input.discard_until(i);

            if terminate {
                break;
            }

            std::mem::swap(&mut wave1, &mut wave1_prev);
            i += hop;
        }

        log::debug!("FftProcessor finished");
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(samples: &[f64], width: usize) -> Vec<f64> {
        let buffer = WaveBuffer::new();
        buffer.append(samples);
        buffer.close();
        let (tx, rx) = crossbeam_channel::unbounded();
        let proc = FftProcessor::new(width, IdentityTransform);
        proc.run(&buffer, &tx);
        drop(tx);
        rx.into_iter().collect()
    }

    #[test]
    fn identity_transform_reconstructs_input_after_warmup() {
        let width = 64;
        let n = 2000;
        let input: Vec<f64> = (0..n)
            .map(|i| (i as f64 * 0.03).sin() * 0.5)
            .collect();
        let output = collect(&input, width);

        let hop = width / 2;
        // Trim one hop of warm-up at the start, and whatever trailing samples
        // correspond to the zero-padded tail frame.
        let trim_end = output.len().saturating_sub(hop);
        let usable_out = &output[hop..trim_end];
        let usable_in = &input[0..usable_out.len().min(input.len())];

        let mut sum_sq = 0.0;
        let mut count = 0;
        for (a, b) in usable_in.iter().zip(usable_out.iter()) {
            let d = a - b;
            sum_sq += d * d;
            count += 1;
        }
        let rms = (sum_sq / count as f64).sqrt();
        assert!(rms < 1e-6, "COLA reconstruction RMS error too high: {rms}");
    }

    #[test]
    fn width_rounds_down_to_even_minimum_four() {
        let proc = FftProcessor::new(3, IdentityTransform);
        assert_eq!(proc.width(), 4);
        let proc = FftProcessor::new(1025, IdentityTransform);
        assert_eq!(proc.width(), 1024);
    }
}
