//! Shared handoff state observed by the caller thread and the background thread.
//!
//! # Flags
//!
//! ```text
//! active     which half the caller owns. Written only by the caller.
//! pending    background I/O outstanding on the non-active half.
//!            Raised by the caller at handoff, cleared by the background thread.
//! finalized  terminal. Raised by the background thread on EOF/fatal error or
//!            by the caller on disposal. Never cleared.
//! valid_len  input:  bytes in the most recently filled half.
//!            output: bytes the drainer must write from the handed-off half.
//! end        input only: the most recently filled half is the last one.
//! fault      kind of the fatal error, set once before `finalized`.
//! ```
//!
//! # Memory Ordering
//!
//! Every "publish" store is `Release` and every load that gates access to a half
//! is `Acquire`:
//! - `pending = false` (Release) publishes the bytes the background thread put
//!   into (or took out of) its half, together with `valid_len`/`end`.
//! - `active = h` (input) and `pending = true` (output) publish the caller's
//!   handoff, including everything the caller wrote into the handed-off half.
//!
//! `valid_len` and `end` are `Relaxed`: they are only read after an `Acquire`
//! load that synchronizes with the `Release` store that followed their write.

use crate::buffer::{DoubleBuffer, Half, StreamConfig};
use crate::wait::Parker;
use std::io;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

pub(crate) struct HandoffState {
    active: AtomicU8,
    pending: AtomicBool,
    finalized: AtomicBool,
    valid_len: AtomicUsize,
    end: AtomicBool,
    fault: OnceLock<io::ErrorKind>,
    parker: Parker,
}

impl HandoffState {
    fn new(config: &StreamConfig) -> Self {
        Self {
            active: AtomicU8::new(Half::Left as u8),
            pending: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            valid_len: AtomicUsize::new(config.half_capacity),
            end: AtomicBool::new(false),
            fault: OnceLock::new(),
            parker: Parker::new(config.wait),
        }
    }

    #[inline(always)]
    pub(crate) fn active(&self) -> Half {
        Half::from_u8(self.active.load(Ordering::Acquire))
    }

    #[inline(always)]
    pub(crate) fn set_active(&self, half: Half) {
        self.active.store(half as u8, Ordering::Release);
        self.parker.notify();
    }

    #[inline(always)]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn raise_pending(&self) {
        self.pending.store(true, Ordering::Release);
        self.parker.notify();
    }

    /// Background side: the assigned half is ready for the caller.
    #[inline(always)]
    pub(crate) fn complete(&self, valid_len: usize, end: bool) {
        self.valid_len.store(valid_len, Ordering::Relaxed);
        self.end.store(end, Ordering::Relaxed);
        self.pending.store(false, Ordering::Release);
        self.parker.notify();
    }

    #[inline(always)]
    pub(crate) fn set_valid_len(&self, len: usize) {
        self.valid_len.store(len, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn valid_len(&self) -> usize {
        self.valid_len.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn is_end(&self) -> bool {
        self.end.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    pub(crate) fn finalize(&self) {
        self.finalized.store(true, Ordering::Release);
        self.parker.notify();
    }

    /// Background side: fatal error. Records the error kind, finalizes, and
    /// releases a caller parked on `pending`.
    pub(crate) fn fail(&self, err: &io::Error) {
        let _ = self.fault.set(err.kind());
        self.finalized.store(true, Ordering::Release);
        self.pending.store(false, Ordering::Release);
        self.parker.notify();
    }

    #[inline(always)]
    pub(crate) fn fault(&self) -> Option<io::ErrorKind> {
        self.fault.get().copied()
    }

    #[inline(always)]
    pub(crate) fn wait_until(&self, ready: impl FnMut() -> bool) {
        self.parker.wait_until(ready);
    }

    #[inline(always)]
    pub(crate) fn backoff(&self) {
        self.parker.backoff();
    }
}

/// Everything the caller and the background thread share.
pub(crate) struct Shared {
    pub(crate) buffer: DoubleBuffer,
    pub(crate) state: HandoffState,
}

impl Shared {
    pub(crate) fn new(config: &StreamConfig) -> Self {
        Self {
            buffer: DoubleBuffer::new(config.half_capacity),
            state: HandoffState::new(config),
        }
    }
}
