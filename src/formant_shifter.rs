//! Cepstral spectral-envelope estimation and formant shifting.
//!
//! Implements the [`SpectralTransform`] capability used by the FFT
//! processor: each short-time spectrum's log-magnitude envelope is
//! estimated by iterative cepstral liftering (a "maximum-tracking" smoother
//! that hugs spectral peaks), then the envelope is stretched horizontally by
//! the formant factor while the fine harmonic/noise structure is preserved.

use realfft::num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::fft_processor::SpectralTransform;

/// Floor applied to spectral magnitudes before taking the log, so that
/// exact zeros (silence, padded frames) never produce `-inf`.
const MAGNITUDE_FLOOR: f64 = 1e-300;

/// Number of cepstral liftering iterations. Fixed regardless of FFT width;
/// only the lifter cutoff scales with width.
const LIFTER_ITERATIONS: usize = 16;

/// Portable lifter-cutoff ratios, calibrated against the reference
/// implementation's hard-coded `cn0=192, cn1=96` at `width=1024`
/// (`192/1024 = 0.1875`, `96/1024 = 0.09375`).
const CN0_RATIO: f64 = 0.1875;
const CN1_RATIO: f64 = 0.09375;

/// A cepstral envelope estimator plus the bin-warping step that turns it
/// into a formant shift.
pub struct CepstralFormantShifter {
    width: usize,
    shift: f64,
    cn0: usize,
    cn1: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
    /// Last computed envelope, exposed for diagnostics/tests. Always
    /// strictly positive after a frame has been processed.
    last_envelope: Vec<f64>,
}

impl CepstralFormantShifter {
    /// `shift` is the formant factor `s = 2^((formant - transpose) / 12)`.
    /// `width` must match the FFT processor's frame width.
    pub fn new(width: usize, shift: f64) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        Self {
            width,
            shift,
            cn0: (CN0_RATIO * width as f64).round() as usize,
            cn1: (CN1_RATIO * width as f64).round() as usize,
            forward: planner.plan_fft_forward(width),
            inverse: planner.plan_fft_inverse(width),
            last_envelope: vec![1.0; width / 2 + 1],
        }
    }

    pub fn last_envelope(&self) -> &[f64] {
        &self.last_envelope
    }

    /// Runs the iterative upper-envelope estimator over a log-magnitude
    /// spectrum `log_spec` (length `width/2+1`), returning the envelope in
    /// the log domain.
    fn estimate_log_envelope(&self, log_spec: &[f64]) -> Vec<f64> {
        let n_bins = log_spec.len();
        let mut l = log_spec.to_vec();

        // Scratch buffers for the small cepstral round-trip. These are
        // re-planned per call rather than cached on self to keep this
        // estimator free of interior mutability; it runs 16 times per FFT
        // frame on a small (width/2+1)-length vector, which is cheap next to
        // the surrounding FFT frame cost.
        let mut forward_scratch = self.forward.make_scratch_vec();
        let mut inverse_scratch = self.inverse.make_scratch_vec();
        let mut complex_in = vec![Complex64::new(0.0, 0.0); n_bins];
        let mut cepstrum = vec![0.0f64; self.width];

        for k in 0..LIFTER_ITERATIONS {
            for (c, &v) in complex_in.iter_mut().zip(l.iter()) {
                *c = Complex64::new(v, 0.0);
            }
            self.inverse
                .process_with_scratch(&mut complex_in, &mut cepstrum, &mut inverse_scratch)
                .expect("cepstral inverse FFT failed");

            let t = if LIFTER_ITERATIONS > 1 {
                k as f64 / (LIFTER_ITERATIONS - 1) as f64
            } else {
                0.0
            };
            let cn = lerp(self.cn0 as f64, self.cn1 as f64, t).round() as usize;
            let cn = cn.min(self.width);
            for bin in cepstrum.iter_mut().take(self.width.saturating_sub(cn)).skip(cn) {
                *bin = 0.0;
            }

            self.forward
                .process_with_scratch(&mut cepstrum, &mut complex_in, &mut forward_scratch)
                .expect("cepstral forward FFT failed");

            let scale = 1.0 / self.width as f64;
            for (i, c) in complex_in.iter().enumerate() {
                let smoothed = c.re * scale;
                if k + 1 < LIFTER_ITERATIONS {
                    l[i] = smoothed.max(log_spec[i]);
                } else {
                    l[i] = smoothed;
                }
            }
        }
        l
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

impl SpectralTransform for CepstralFormantShifter {
    fn transform(&mut self, spectrum: &mut [Complex64], _wave: &[f64]) {
        let n = spectrum.len();
        debug_assert_eq!(n, self.width / 2 + 1);

        let log_spec: Vec<f64> = spectrum
            .iter()
            .map(|c| c.norm().max(MAGNITUDE_FLOOR).ln())
            .collect();

        let log_envelope = self.estimate_log_envelope(&log_spec);
        for (dst, &l) in self.last_envelope.iter_mut().zip(log_envelope.iter()) {
            *dst = l.exp();
        }

        let dc = spectrum[0];
        for i in 1..n {
            let j = (i as f64 / self.shift).max(1.0);
            let mut j_int = j.floor() as usize;
            let mut j_frac = j - j_int as f64;
            if j_int > n - 2 {
                j_int = n - 2;
                j_frac = 1.0;
            }
            let e = lerp(self.last_envelope[j_int], self.last_envelope[j_int + 1], j_frac);
            spectrum[i] *= e / self.last_envelope[i];
        }
        spectrum[0] = dc;
    }
}
