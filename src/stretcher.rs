//! Resynthesizes a stream of [`Shape`]s at a new pitch and/or sample-rate
//! ratio by interpolating across a rolling window of five periods.

use crossbeam_channel::{Receiver, Sender};

use crate::shape::{Shape, ShapeHistory, SIGMA_WIDTH};

/// Resamples a shape stream into an output sample stream.
///
/// `pitch_coef` is the ratio of output to input fundamental frequency
/// (`p = 2^(transpose/12)`); `resample_coef` is the ratio of output to input
/// sample rate (`1.0` when they match). Both must be strictly positive;
/// validating that is the caller's responsibility (see
/// [`crate::config::VoiceShiftConfig::validate`]).
pub struct Stretcher {
    pitch_coef: f64,
    resample_coef: f64,
}

impl Stretcher {
    pub fn new(pitch_coef: f64, resample_coef: f64) -> Self {
        debug_assert!(pitch_coef > 0.0 && resample_coef > 0.0);
        Self {
            pitch_coef,
            resample_coef,
        }
    }

    /// Runs the stretcher to completion, consuming `self`. Buffers the
    /// first `2 * SIGMA_WIDTH` shapes before emitting any samples, since the
    /// interpolation kernel needs shapes on both sides of the one it
    /// resynthesizes; shapes at the very start and end of a finite stream
    /// are only available asymmetrically and are reused to fill the
    /// history, matching how the history is seeded from the first shape.
    pub fn run(self, input: &Receiver<Shape>, output: &Sender<f64>) {
        log::debug!(
            "Stretcher started: pitch_coef={} resample_coef={}",
            self.pitch_coef,
            self.resample_coef
        );

        let mut history = ShapeHistory::new();
        let mut pending: Vec<Shape> = Vec::new();
        // These persist across shapes, carrying over any fractional phase
        // left when one shape's rendering stops partway through a step.
        let mut src_phase = 0.0f64;
        let mut dst_phase = 0.0f64;

        for shape in input.iter() {
            pending.push(shape);
            if pending.len() <= SIGMA_WIDTH {
                continue;
            }
            // Feed the history one step behind `pending`'s tail so the
            // center slot, once full, is SIGMA_WIDTH shapes behind the most
            // recently received one -- giving it SIGMA_WIDTH future
            // neighbors already buffered.
            if pending.len() > 2 * SIGMA_WIDTH + 1 {
                let oldest = pending.remove(0);
                history.rotate(oldest);
                if !self.render_center(&history, &mut src_phase, &mut dst_phase, output) {
                    return;
                }
            }
        }

        // Drain: feed the remaining buffered shapes into the history one at
        // a time so the tail of a finite stream still gets rendered, with
        // the last available shape standing in for missing future
        // neighbors.
        for shape in pending {
            history.rotate(shape);
            if !self.render_center(&history, &mut src_phase, &mut dst_phase, output) {
                return;
            }
        }
    }

    /// Renders one shape's worth of output samples from the current history
    /// window. `src_phase`/`dst_phase` carry over between calls, as in the
    /// reference implementation. Returns `false` if the downstream channel
    /// has disconnected.
    fn render_center(
        &self,
        history: &ShapeHistory,
        src_phase: &mut f64,
        dst_phase: &mut f64,
        output: &Sender<f64>,
    ) -> bool {
        if !history.is_initialized() {
            return true;
        }
        let freq = history.freq();
        let dst_step = freq / self.resample_coef;
        let src_step = (freq * self.pitch_coef) / self.resample_coef;

        while *dst_phase < 1.0 {
            let v = history.get(*src_phase, *dst_phase);
            if output.send(v).is_err() {
                log::debug!("Stretcher: downstream closed, stopping early");
                return false;
            }
            *src_phase += src_step;
            while *src_phase >= 1.0 {
                *src_phase -= 1.0;
            }
            *dst_phase += dst_step;
        }
        while *dst_phase >= 1.0 {
            *dst_phase -= 1.0;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_shapes(count: usize, period_len: usize) -> Vec<Shape> {
        let period: Vec<f64> = (0..period_len)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / period_len as f64).sin())
            .collect();
        (0..count).map(|_| Shape::new(&period, None, None)).collect()
    }

    #[test]
    fn unit_coefficients_preserve_total_period_count_roughly() {
        let shapes = constant_shapes(40, 80);
        let (tx_in, rx_in) = crossbeam_channel::unbounded();
        for s in shapes {
            tx_in.send(s).unwrap();
        }
        drop(tx_in);

        let (tx_out, rx_out) = crossbeam_channel::unbounded();
        let stretcher = Stretcher::new(1.0, 1.0);
        stretcher.run(&rx_in, &tx_out);
        drop(tx_out);

        let out: Vec<f64> = rx_out.into_iter().collect();
        // 40 shapes of 80 samples each minus the warm-up/drain asymmetry at
        // the edges should land close to 40 * 80 total output samples.
        let expected = 40 * 80;
        let diff = (out.len() as i64 - expected as i64).abs();
        assert!(diff < 3 * 80, "out.len()={} expected~{}", out.len(), expected);
    }

    #[test]
    fn octave_up_doubles_reconstructed_frequency_at_constant_duration() {
        // dst_step depends only on resample_coef, so pitch_coef=2 leaves the
        // output sample count unchanged (time-stretching is a separate
        // knob); what changes is how fast src_phase sweeps the history,
        // which doubles the reconstructed waveform's frequency.
        let shapes = constant_shapes(40, 80);
        let run = |pitch_coef: f64| {
            let (tx_in, rx_in) = crossbeam_channel::unbounded();
            for s in shapes.clone() {
                tx_in.send(s).unwrap();
            }
            drop(tx_in);
            let (tx_out, rx_out) = crossbeam_channel::unbounded();
            Stretcher::new(pitch_coef, 1.0).run(&rx_in, &tx_out);
            drop(tx_out);
            rx_out.into_iter().collect::<Vec<f64>>()
        };

        let unit = run(1.0);
        let octave_up = run(2.0);
        let diff = (unit.len() as i64 - octave_up.len() as i64).abs();
        assert!(diff < 3 * 80, "unit.len()={} octave_up.len()={}", unit.len(), octave_up.len());

        let zero_crossings = |samples: &[f64]| -> usize {
            samples.windows(2).filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0)).count()
        };
        let unit_crossings = zero_crossings(&unit);
        let octave_crossings = zero_crossings(&octave_up);
        assert!(
            (octave_crossings as f64) > (unit_crossings as f64) * 1.5,
            "expected roughly doubled zero crossings: unit={unit_crossings} octave_up={octave_crossings}"
        );
    }

    #[test]
    fn empty_input_produces_no_output() {
        let (tx_in, rx_in) = crossbeam_channel::unbounded::<Shape>();
        drop(tx_in);
        let (tx_out, rx_out) = crossbeam_channel::unbounded();
        let stretcher = Stretcher::new(1.0, 1.0);
        stretcher.run(&rx_in, &tx_out);
        drop(tx_out);
        assert_eq!(rx_out.into_iter().count(), 0);
    }
}
