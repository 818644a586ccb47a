//! Analysis/synthesis window generation.
//!
//! The FFT processor needs a window pair that satisfies the constant
//! overlap-add (COLA) property at hop `W/2`. A plain Hann window already
//! does; taking its square root and using the same window for analysis and
//! synthesis preserves COLA while splitting the spectral tapering evenly
//! between the two passes.

use std::f64::consts::PI;

/// Periodic Hann window of length `n`, matching librosa/`scipy.signal.hann`'s
/// `sym=False` convention (denominator `n`, not `n - 1`), which is the
/// convention required for COLA at hop `n/2`.
pub fn hann(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}

/// Square root of the periodic Hann window, used for both analysis and
/// synthesis so that `w_a * w_s` sums to a constant across overlapping
/// frames at hop `n/2`.
pub fn sqrt_hann(n: usize) -> Vec<f64> {
    hann(n).into_iter().map(f64::sqrt).collect()
}
