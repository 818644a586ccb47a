//! Thread-safe, append-only sample store with blocking range reads.
//!
//! Decouples a producer (file reader, audio device) from the FFT consumer.
//! Samples are addressed by a monotonically increasing absolute index so
//! callers never need to track physical storage offsets; `discard_until`
//! bridges absolute indices to the physical `VecDeque` once old samples are
//! no longer needed.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct Inner {
    /// Absolute index of `buffer[0]`.
    index: usize,
    buffer: VecDeque<f64>,
    closed: bool,
}

/// Monotonically growing sample buffer shared between a single appender and
/// a single reader.
pub struct WaveBuffer {
    inner: Mutex<Inner>,
    notify: Condvar,
}

impl WaveBuffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                index: 0,
                buffer: VecDeque::new(),
                closed: false,
            }),
            notify: Condvar::new(),
        }
    }

    /// Appends samples, waking any reader blocked waiting for more data.
    /// A no-op (with a log line) if called after `close()`.
    pub fn append(&self, samples: &[f64]) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            log::warn!("WaveBuffer::append called after close, dropping {} samples", samples.len());
            return;
        }
        inner.buffer.extend(samples.iter().copied());
        self.notify.notify_all();
    }

    /// Declares no further appends. Unblocks any reader waiting on more data.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        self.notify.notify_all();
    }

    /// Returns the samples absolutely indexed `[begin, end)`.
    ///
    /// Blocks until either `end` worth of data is available or the buffer is
    /// closed. When closed with insufficient data, returns whatever is
    /// available (possibly shorter than requested, possibly empty) and
    /// `more_follows = false`.
    ///
    /// Panics if `begin` precedes the current discard index: callers must
    /// never backtrack past samples they have already discarded.
    pub fn read(&self, begin: usize, end: usize) -> (Vec<f64>, bool) {
        let mut inner = self.inner.lock().unwrap();
        assert!(
            begin >= inner.index,
            "WaveBuffer::read({begin}, {end}) requested before discard index {}",
            inner.index
        );
        loop {
            let have_end = inner.index + inner.buffer.len();
            if end <= have_end {
                let start = begin - inner.index;
                let stop = end - inner.index;
                let slice: Vec<f64> = inner.buffer.iter().skip(start).take(stop - start).copied().collect();
                return (slice, true);
            }
            if inner.closed {
                let start = (begin.saturating_sub(inner.index)).min(inner.buffer.len());
                let slice: Vec<f64> = inner.buffer.iter().skip(start).copied().collect();
                return (slice, false);
            }
            inner = self.notify.wait(inner).unwrap();
        }
    }

    /// Drops samples with absolute index `< index` from internal storage.
    /// Idempotent; never moves `discard_index` backwards.
    pub fn discard_until(&self, index: usize) {
        let mut inner = self.inner.lock().unwrap();
        if index <= inner.index {
            return;
        }
        let drop_count = (index - inner.index).min(inner.buffer.len());
        inner.buffer.drain(..drop_count);
        inner.index = index;
    }
}

impl Default for WaveBuffer {
    fn default() -> Self {
        Self::new()
    }
}
