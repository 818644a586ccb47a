//! Cuts a sample stream into single-period [`Shape`]s, driven by an F0
//! track.

use crossbeam_channel::{Receiver, Sender};

use crate::shape::Shape;

/// Frequencies below this are treated as unvoiced; the splitter holds the
/// last known voiced frequency instead.
const MIN_FREQ_HZ: f64 = 1.0;

/// Splits an incoming sample stream into periods sized by `f0_track`.
///
/// `f0_track[j]` gives the estimated fundamental frequency for the `j`-th
/// analysis frame of period `frame_period_seconds`; a value below
/// [`MIN_FREQ_HZ`] means unvoiced and the splitter holds `last_frequency`.
pub struct F0Splitter {
    f0_track: Vec<f64>,
    sample_rate: f64,
    frame_rate: f64,
}

impl F0Splitter {
    pub fn new(f0_track: Vec<f64>, sample_rate: f64, frame_period_seconds: f64) -> Self {
        Self {
            f0_track,
            sample_rate,
            frame_rate: 1.0 / frame_period_seconds,
        }
    }

    /// Runs the splitter to completion, consuming `self`. Reads samples from
    /// `input` until it disconnects, emitting completed [`Shape`]s to
    /// `output`. Any residual partial period buffered when `input` closes is
    /// discarded, since it cannot form a complete period.
    pub fn run(self, input: &Receiver<f64>, output: &Sender<Shape>) {
        log::debug!("F0Splitter started: {} F0 frames, frame_rate={}", self.f0_track.len(), self.frame_rate);

        let mut elapsed_samples: u64 = 0;
        let mut phase = 0.0f64;
        let mut last_frequency = 440.0f64;
        let mut buffer: Vec<f64> = Vec::new();
        // One sample preceding the buffer's first sample, if any, so the
        // resulting Shape can address a guard sample on both sides.
        let mut guard_before: Option<f64> = None;

        for v in input.iter() {
            buffer.push(v);

            let j = ((elapsed_samples as f64 * self.frame_rate) / self.sample_rate).floor() as usize;
            let mut current_frequency = last_frequency;
            if let Some(&f) = self.f0_track.get(j) {
                if f >= MIN_FREQ_HZ {
                    current_frequency = f;
                }
            }

            phase += current_frequency / self.sample_rate;
            while phase >= 1.0 {
                phase -= 1.0;
                // The sample immediately after this period is the first
                // sample of the next one, not yet known; Shape::new falls
                // back to replicating the period's own boundary sample,
                // which is what the Lagrange interpolation degrades to
                // gracefully near a shape edge.
                let shape = Shape::new(&buffer, guard_before, None);
                if output.send(shape).is_err() {
                    log::debug!("F0Splitter: downstream closed, stopping early");
                    return;
                }
                guard_before = buffer.last().copied();
                buffer.clear();
            }

            last_frequency = current_frequency;
            elapsed_samples += 1;
        }

        if !buffer.is_empty() {
            log::debug!("F0Splitter: discarding {} residual samples at close", buffer.len());
        }
    }
}
