//! Pull-side stream: a background filler keeps one half loaded while the caller
//! copies out of the other.
//!
//! # Protocol
//!
//! ```text
//! caller                                   filler
//! ──────                                   ──────
//! initialize: prime Left synchronously
//!   EOF inside Left ─► no thread, done
//!   Left full       ─► pending = true, spawn ──► fill Right
//!                                              complete(len, end)  (pending = false)
//! read: drain Left ...                         wait active == Right
//! Left exhausted:
//!   wait pending == false
//!   take (len, end) of Right
//!   pending = true
//!   active = Right  ─────────────────────────► fill Left ...
//! ```
//!
//! On EOF or a fatal error the filler finalizes and exits instead of waiting
//! for another handoff; `end` tells the caller the half it is about to take is
//! the last one, so it never waits for a fill that cannot arrive.

use crate::buffer::{Half, StreamConfig};
use crate::error::StreamError;
use crate::handoff::{HandoffState, Shared};
use crate::io::{Source, is_transient};
use srcembed_perf_recorder::{PerfRecorder, PerfStage};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

/// Outcome of filling one half from a [`Source`].
enum Fill {
    /// The whole half was filled; more data may follow.
    Full,
    /// End of stream after this many bytes.
    Eof(usize),
    /// `finalized` was raised while the descriptor kept reporting would-block.
    Cancelled(usize),
    Failed(io::Error),
}

/// Reads until `dst` is full, EOF, a fatal error, or cancellation.
fn fill_half<S: Source>(source: &mut S, dst: &mut [u8], state: &HandoffState) -> Fill {
    let mut filled = 0;
    while filled < dst.len() {
        match source.read(&mut dst[filled..]) {
            Ok(0) => return Fill::Eof(filled),
            Ok(n) => filled += n,
            Err(e) if is_transient(&e) => {
                if state.is_finalized() {
                    return Fill::Cancelled(filled);
                }
                state.backoff();
            }
            Err(e) => return Fill::Failed(e),
        }
    }
    Fill::Full
}

fn filler_loop<S: Source>(mut source: S, shared: Arc<Shared>) {
    let state = &shared.state;
    let capacity = shared.buffer.capacity();
    let mut target = Half::Right;

    loop {
        // SAFETY: `target` is the non-active half and `pending` is raised; the
        // caller does not touch it until `complete`/`fail` below.
        let dst = unsafe { shared.buffer.half_mut(target) };
        match fill_half(&mut source, dst, state) {
            Fill::Full => {
                state.complete(capacity, false);
                trace!(?target, "filler: half ready");
            }
            Fill::Eof(len) => {
                state.complete(len, true);
                state.finalize();
                debug!(?target, len, "filler: end of stream");
                return;
            }
            Fill::Cancelled(len) => {
                debug!(?target, len, "filler: cancelled by dispose");
                return;
            }
            Fill::Failed(e) => {
                error!(error = %e, "filler: fatal read error");
                state.fail(&e);
                return;
            }
        }

        state.wait_until(|| state.active() == target || state.is_finalized());
        if state.is_finalized() {
            debug!("filler: finalized while idle");
            return;
        }
        target = !target;
    }
}

/// Double-buffered reader over a [`Source`].
///
/// Owns the buffer and at most one background filler thread. Not meant to be
/// shared between consumers: every operation takes `&mut self`.
pub struct InputStream {
    shared: Arc<Shared>,
    filler: Option<JoinHandle<()>>,
    /// Caller's copy of `state.active`; the caller is its only writer.
    active: Half,
    cursor: usize,
    /// Valid bytes in the active half.
    limit: usize,
    /// The active half is the final one.
    last: bool,
    fault: Option<io::ErrorKind>,
    bytes_read: u64,
    handoffs: u64,
    recorder: PerfRecorder,
}

impl InputStream {
    /// Puts `source` into non-blocking mode and performs the priming fill.
    ///
    /// A filler thread is spawned only when the priming fill filled the whole
    /// first half; a source that ends inside it is served without a thread.
    pub fn initialize<S: Source>(mut source: S, config: StreamConfig) -> Result<Self, StreamError> {
        source.set_nonblocking()?;

        let shared = Arc::new(Shared::new(&config));
        let mut recorder = PerfRecorder::new();

        recorder.begin(PerfStage::PrimingFill);
        // SAFETY: no other thread exists yet, the caller owns both halves.
        let primed = fill_half(
            &mut source,
            unsafe { shared.buffer.half_mut(Half::Left) },
            &shared.state,
        );
        recorder.end(PerfStage::PrimingFill);

        let mut stream = Self {
            shared,
            filler: None,
            active: Half::Left,
            cursor: 0,
            limit: config.half_capacity,
            last: false,
            fault: None,
            bytes_read: 0,
            handoffs: 0,
            recorder,
        };

        match primed {
            Fill::Full => {
                let shared = Arc::clone(&stream.shared);
                shared.state.raise_pending();
                let handle = thread::Builder::new()
                    .name("srcembed-filler".into())
                    .spawn(move || filler_loop(source, shared))
                    .map_err(StreamError::Spawn)?;
                debug!(half_capacity = config.half_capacity, "input: filler spawned");
                stream.filler = Some(handle);
            }
            Fill::Eof(len) | Fill::Cancelled(len) => {
                debug!(len, "input: source fits in priming fill");
                stream.limit = len;
                stream.last = true;
                stream.shared.state.finalize();
            }
            Fill::Failed(e) => return Err(StreamError::Io(e)),
        }

        Ok(stream)
    }

    /// Copies up to `dst.len()` bytes into `dst`.
    ///
    /// Returns fewer bytes only at end of stream; `Ok(0)` at and after EOF.
    /// A fatal source error discovered after bytes were already copied in this
    /// call is reported on the next call, and on every call after that.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize, StreamError> {
        if let Some(kind) = self.fault {
            return Err(StreamError::Fatal { kind });
        }

        let mut copied = 0;
        loop {
            let n = (self.limit - self.cursor).min(dst.len() - copied);
            if n > 0 {
                // SAFETY: the active half is caller-owned.
                let src = unsafe { self.shared.buffer.half(self.active) };
                dst[copied..copied + n].copy_from_slice(&src[self.cursor..self.cursor + n]);
                self.cursor += n;
                copied += n;
            }

            if copied == dst.len() || self.last {
                break;
            }

            if let Err(e) = self.hand_off() {
                if copied == 0 {
                    return Err(e);
                }
                break;
            }
        }

        self.bytes_read += copied as u64;
        Ok(copied)
    }

    /// Swaps to the half the filler just completed and returns the exhausted
    /// one to it.
    fn hand_off(&mut self) -> Result<(), StreamError> {
        let state = &self.shared.state;

        self.recorder.begin(PerfStage::InputHandoffWait);
        state.wait_until(|| !state.is_pending());
        self.recorder.end(PerfStage::InputHandoffWait);

        if let Some(kind) = state.fault() {
            warn!(?kind, "input: source failed");
            self.fault = Some(kind);
            return Err(StreamError::Fatal { kind });
        }

        let len = state.valid_len();
        let end = state.is_end();
        let next = !self.active;

        state.raise_pending();
        state.set_active(next);

        self.active = next;
        self.cursor = 0;
        self.limit = len;
        self.last = end;
        self.handoffs += 1;
        trace!(?next, len, end, "input: handoff");
        Ok(())
    }

    /// Stops the filler (if any) and joins it.
    pub fn dispose(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.filler.take() else {
            return;
        };
        // `finalized` is part of every filler wait condition, so raising it
        // releases a filler parked on the handoff or spinning on would-block.
        self.shared.state.finalize();
        if handle.join().is_err() {
            warn!("input: filler thread panicked");
        }
        debug!(bytes_read = self.bytes_read, handoffs = self.handoffs, "input: disposed");
    }

    pub fn half_capacity(&self) -> usize {
        self.shared.buffer.capacity()
    }

    /// Total bytes returned to the caller so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn handoffs(&self) -> u64 {
        self.handoffs
    }

    /// `true` while a background filler thread is attached.
    pub fn is_threaded(&self) -> bool {
        self.filler.is_some()
    }

    pub fn recorder(&self) -> &PerfRecorder {
        &self.recorder
    }
}

impl Drop for InputStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl io::Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        InputStream::read(self, buf).map_err(io::Error::from)
    }
}
