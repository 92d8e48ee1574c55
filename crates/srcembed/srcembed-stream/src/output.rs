//! Push-side stream: the caller fills one half while a background drainer writes
//! the other to the sink.
//!
//! # Protocol
//!
//! ```text
//! caller                                   drainer
//! ──────                                   ──────
//! write into active half                   wait pending || finalized
//! half full (or flush):
//!   wait pending == false
//!   valid_len = bytes in half
//!   active = other half
//!   pending = true  ─────────────────────► drain !active, valid_len bytes
//!                                          pending = false
//! ```
//!
//! The caller only ever waits for the *previous* drain, so it can run at most
//! one half ahead of the sink.

use crate::buffer::{Half, StreamConfig};
use crate::error::StreamError;
use crate::handoff::{HandoffState, Shared};
use crate::io::{Sink, is_transient};
use srcembed_perf_recorder::{PerfRecorder, PerfStage};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

/// Writes all of `src`, retrying transient conditions.
fn drain_half<K: Sink>(sink: &mut K, mut src: &[u8], state: &HandoffState) -> io::Result<()> {
    while !src.is_empty() {
        match sink.write(src) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(n) => src = &src[n..],
            Err(e) if is_transient(&e) => state.backoff(),
            Err(e) => return Err(e),
        }
    }
    sink.flush()
}

fn drainer_loop<K: Sink>(mut sink: K, shared: Arc<Shared>) {
    let state = &shared.state;
    loop {
        state.wait_until(|| state.is_pending() || state.is_finalized());
        if !state.is_pending() {
            debug!("drainer: finalized");
            return;
        }

        let half = !state.active();
        let len = state.valid_len();
        // SAFETY: a raised `pending` hands the non-active half to the drainer
        // until it is cleared below.
        let src = unsafe { &shared.buffer.half(half)[..len] };
        match drain_half(&mut sink, src, state) {
            Ok(()) => {
                state.complete(len, false);
                trace!(?half, len, "drainer: half drained");
            }
            Err(e) => {
                error!(error = %e, "drainer: fatal write error");
                state.fail(&e);
                return;
            }
        }
    }
}

/// Double-buffered writer over a [`Sink`].
///
/// Bytes are guaranteed to have reached the sink only after [`flush`] or
/// [`dispose`] return `Ok`. Dropping the stream flushes on a best-effort basis.
///
/// [`flush`]: OutputStream::flush
/// [`dispose`]: OutputStream::dispose
pub struct OutputStream {
    shared: Arc<Shared>,
    drainer: Option<JoinHandle<()>>,
    active: Half,
    cursor: usize,
    fault: Option<io::ErrorKind>,
    bytes_written: u64,
    handoffs: u64,
    recorder: PerfRecorder,
}

impl OutputStream {
    /// Spawns the drainer. The drainer stays idle until the first handoff.
    pub fn initialize<K: Sink>(sink: K, config: StreamConfig) -> Result<Self, StreamError> {
        let shared = Arc::new(Shared::new(&config));

        let handle = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("srcembed-drainer".into())
                .spawn(move || drainer_loop(sink, shared))
                .map_err(StreamError::Spawn)?
        };
        debug!(half_capacity = config.half_capacity, "output: drainer spawned");

        Ok(Self {
            shared,
            drainer: Some(handle),
            active: Half::Left,
            cursor: 0,
            fault: None,
            bytes_written: 0,
            handoffs: 0,
            recorder: PerfRecorder::new(),
        })
    }

    /// Buffers all of `src`, handing off every half that fills up.
    ///
    /// Fails as soon as the drainer has recorded a fatal sink error, without
    /// buffering any of `src`. Bytes accepted before that point are never
    /// silently dropped.
    pub fn write(&mut self, mut src: &[u8]) -> Result<(), StreamError> {
        self.check_fault()?;

        let capacity = self.shared.buffer.capacity();
        while !src.is_empty() {
            let n = (capacity - self.cursor).min(src.len());
            // SAFETY: the active half is caller-owned.
            let dst = unsafe { self.shared.buffer.half_mut(self.active) };
            dst[self.cursor..self.cursor + n].copy_from_slice(&src[..n]);
            self.cursor += n;
            self.bytes_written += n as u64;
            src = &src[n..];

            if self.cursor == capacity {
                self.hand_off(capacity)?;
            }
        }
        Ok(())
    }

    /// Hands off the partially filled half and waits until every byte written
    /// so far has reached the sink.
    ///
    /// Flushing with nothing buffered is a successful no-op, apart from waiting
    /// for a drain that is still in flight.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.check_fault()?;

        self.recorder.begin(PerfStage::OutputFlush);
        if self.cursor > 0 {
            self.hand_off(self.cursor)?;
        }
        let drained = self.await_drain();
        self.recorder.end(PerfStage::OutputFlush);
        drained
    }

    fn hand_off(&mut self, len: usize) -> Result<(), StreamError> {
        self.recorder.begin(PerfStage::OutputHandoffWait);
        let drained = self.await_drain();
        self.recorder.end(PerfStage::OutputHandoffWait);
        drained?;

        let state = &self.shared.state;
        let next = !self.active;
        state.set_valid_len(len);
        state.set_active(next);
        state.raise_pending();

        self.active = next;
        self.cursor = 0;
        self.handoffs += 1;
        trace!(?next, len, "output: handoff");
        Ok(())
    }

    /// Fails once the drainer has reported a sink error, even if the caller
    /// has not reached a handoff since.
    fn check_fault(&mut self) -> Result<(), StreamError> {
        if self.fault.is_none() {
            self.fault = self.shared.state.fault();
        }
        match self.fault {
            Some(kind) => Err(StreamError::Fatal { kind }),
            None => Ok(()),
        }
    }

    /// Waits for the outstanding drain and surfaces a sink failure.
    fn await_drain(&mut self) -> Result<(), StreamError> {
        let state = &self.shared.state;
        state.wait_until(|| !state.is_pending());
        if let Some(kind) = state.fault() {
            warn!(?kind, "output: sink failed");
            self.fault = Some(kind);
            return Err(StreamError::Fatal { kind });
        }
        Ok(())
    }

    /// Flushes, then stops and joins the drainer.
    ///
    /// The drainer is joined even when the final flush fails.
    pub fn dispose(mut self) -> Result<(), StreamError> {
        let flushed = self.flush();
        self.shutdown();
        flushed
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.drainer.take() else {
            return;
        };
        self.shared.state.finalize();
        if handle.join().is_err() {
            warn!("output: drainer thread panicked");
        }
        debug!(
            bytes_written = self.bytes_written,
            handoffs = self.handoffs,
            "output: disposed"
        );
    }

    pub fn half_capacity(&self) -> usize {
        self.shared.buffer.capacity()
    }

    /// Total bytes accepted by [`write`](Self::write) so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn handoffs(&self) -> u64 {
        self.handoffs
    }

    /// Bytes sitting in the caller-owned half, not yet handed off.
    pub fn buffered(&self) -> usize {
        self.cursor
    }

    pub fn recorder(&self) -> &PerfRecorder {
        &self.recorder
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        if self.drainer.is_some() && self.fault.is_none() {
            let _ = self.flush();
        }
        self.shutdown();
    }
}

impl io::Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        OutputStream::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        OutputStream::flush(self).map_err(io::Error::from)
    }
}
