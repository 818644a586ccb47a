//! Wires the five pipeline stages into a running transform.
//!
//! `source -> WaveBuffer -> FormantShifter -> F0Splitter -> Stretcher -> sink`,
//! each stage its own OS thread communicating over bounded `crossbeam-channel`
//! channels, exactly as described by the concurrency model: no stage assumes
//! exclusive CPU time, and bounded channels provide backpressure end to end.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::bounded;

use crate::config::VoiceShiftConfig;
use crate::f0_splitter::F0Splitter;
use crate::fft_processor::FftProcessor;
use crate::formant_shifter::CepstralFormantShifter;
use crate::stretcher::Stretcher;
use crate::wave_buffer::WaveBuffer;

/// Capacity of the sample channels between stages (WaveBuffer -> FFT output,
/// Stretcher -> sink).
const SAMPLE_CHANNEL_CAPACITY: usize = 4096;
/// Capacity of the shape channel between the F0Splitter and the Stretcher.
const SHAPE_CHANNEL_CAPACITY: usize = 16;
/// Chunk size the source stage appends in, so a large offline input still
/// exercises the WaveBuffer's blocking-read backpressure rather than landing
/// in one shot.
const SOURCE_CHUNK: usize = 2048;

/// Runs the full pitch/formant transform over an in-memory mono signal at
/// `sample_rate` Hz, using `f0_track` (one value per
/// `config.frame_period_seconds()`) to drive the period splitter.
///
/// Always drives the `Stretcher` at a unity resample coefficient: rate
/// conversion for `sample_rate_out` is a WAV-level concern handled once by
/// [`crate::io::audio::resample`] after this function returns, not folded
/// into the DSP pipeline itself (the `Stretcher`'s own resample coefficient
/// stays general-purpose for direct unit testing, see [`crate::stretcher`]).
pub fn run(input: Vec<f64>, sample_rate: u32, f0_track: Vec<f64>, config: &VoiceShiftConfig) -> Vec<f64> {
    let resample_coef = 1.0;
    let buffer = Arc::new(WaveBuffer::new());
    let (fft_tx, fft_rx) = bounded::<f64>(SAMPLE_CHANNEL_CAPACITY);
    let (shape_tx, shape_rx) = bounded(SHAPE_CHANNEL_CAPACITY);
    let (out_tx, out_rx) = bounded::<f64>(SAMPLE_CHANNEL_CAPACITY);

    let source_buffer = Arc::clone(&buffer);
    let source_handle = thread::spawn(move || {
        for chunk in input.chunks(SOURCE_CHUNK) {
            source_buffer.append(chunk);
        }
        source_buffer.close();
        log::debug!("source stage closed after appending input");
    });

    let fft_width = config.fft_width;
    let formant_coef = config.formant_coef();
    let fft_buffer = Arc::clone(&buffer);
    let fft_handle = thread::spawn(move || {
        let transform = CepstralFormantShifter::new(fft_width, formant_coef);
        let processor = FftProcessor::new(fft_width, transform);
        processor.run(&fft_buffer, &fft_tx);
    });

    let frame_period_seconds = config.frame_period_seconds();
    let splitter_handle = thread::spawn(move || {
        let splitter = F0Splitter::new(f0_track, sample_rate as f64, frame_period_seconds);
        splitter.run(&fft_rx, &shape_tx);
    });

    let pitch_coef = config.pitch_coef();
    let stretcher_handle = thread::spawn(move || {
        let stretcher = Stretcher::new(pitch_coef, resample_coef);
        stretcher.run(&shape_rx, &out_tx);
    });

    let output: Vec<f64> = out_rx.into_iter().collect();

    source_handle.join().expect("source thread panicked");
    fft_handle.join().expect("FFT processor thread panicked");
    splitter_handle.join().expect("F0 splitter thread panicked");
    stretcher_handle.join().expect("stretcher thread panicked");

    output
}
