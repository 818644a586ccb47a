//! Fundamental-frequency (pitch) estimation: the external collaborator the
//! core DSP pipeline consumes as a black box.
//!
//! A faithful port of a production-grade estimator (WORLD/DIO/Harvest) is
//! out of scope for this crate; what ships here is a normalized
//! autocorrelation pitch tracker over the same framing the pipeline expects
//! (`frame_period`, `floor_hz`, `ceil_hz`). It is good enough to drive the
//! CLI and the end-to-end tests, not claimed to be WORLD-equivalent.

/// Frequencies at or below this confidence threshold are reported as
/// unvoiced (`0.0`), matching the F0Splitter's own `min_freq` floor.
const VOICING_THRESHOLD: f64 = 0.3;

/// Estimates one fundamental-frequency value per `frame_period_seconds` of
/// `signal`, searching lags corresponding to `[floor_hz, ceil_hz]`.
///
/// Returns `0.0` for frames judged unvoiced (normalized autocorrelation peak
/// below [`VOICING_THRESHOLD`]), matching the black-box contract in
/// `F0Splitter`: zero means "unvoiced/unknown".
pub fn estimate_f0(signal: &[f64], sample_rate: f64, frame_period_seconds: f64, floor_hz: f64, ceil_hz: f64) -> Vec<f64> {
    let frame_hop = (frame_period_seconds * sample_rate).round().max(1.0) as usize;
    // Each analysis window spans two periods of the floor frequency, so the
    // longest lag searched always fits inside one window.
    let min_lag = (sample_rate / ceil_hz).floor().max(1.0) as usize;
    let max_lag = (sample_rate / floor_hz).ceil() as usize;
    let window_len = (2 * max_lag).max(frame_hop);

    if signal.is_empty() {
        return Vec::new();
    }

    let n_frames = signal.len().div_ceil(frame_hop);
    let mut track = Vec::with_capacity(n_frames);

    for frame_idx in 0..n_frames {
        let center = frame_idx * frame_hop;
        let start = center.saturating_sub(window_len / 2);
        let end = (start + window_len).min(signal.len());
        if end <= start {
            track.push(0.0);
            continue;
        }
        let window = &signal[start..end];
        track.push(estimate_frame(window, min_lag, max_lag, sample_rate));
    }

    track
}

/// Normalized autocorrelation over one analysis window, returning the
/// frequency at the strongest periodicity peak or `0.0` if none clears
/// [`VOICING_THRESHOLD`].
fn estimate_frame(window: &[f64], min_lag: usize, max_lag: usize, sample_rate: f64) -> f64 {
    let max_lag = max_lag.min(window.len().saturating_sub(1));
    if min_lag >= max_lag {
        return 0.0;
    }

    let energy: f64 = window.iter().map(|&s| s * s).sum();
    if energy < 1e-12 {
        return 0.0;
    }

    let mut best_lag = 0usize;
    let mut best_score = 0.0f64;
    for lag in min_lag..=max_lag {
        let mut num = 0.0;
        let mut denom_a = 0.0;
        let mut denom_b = 0.0;
        for i in 0..window.len() - lag {
            let a = window[i];
            let b = window[i + lag];
            num += a * b;
            denom_a += a * a;
            denom_b += b * b;
        }
        let denom = (denom_a * denom_b).sqrt();
        if denom < 1e-12 {
            continue;
        }
        let score = num / denom;
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 || best_score < VOICING_THRESHOLD {
        return 0.0;
    }
    sample_rate / best_lag as f64
}
