//! Two-half byte arena shared between the caller and one background thread.
//!
//! Each half is its own allocation so that the two threads never hold
//! references into the same memory region. Which thread may touch which half is
//! decided entirely by the handoff protocol in [`crate::handoff`]; this module
//! only provides the storage and the half selector.

use crate::wait::WaitPolicy;
use std::cell::UnsafeCell;
use std::ops::Not;

/// Default bytes per half-buffer.
pub const DEFAULT_HALF_CAPACITY: usize = 64 * 1024;

/// Selects one of the two halves of a [`DoubleBuffer`].
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Half {
    Left = 0,
    Right = 1,
}

impl Half {
    #[inline(always)]
    pub fn other(self) -> Half {
        match self {
            Half::Left => Half::Right,
            Half::Right => Half::Left,
        }
    }

    #[inline(always)]
    pub(crate) fn from_u8(raw: u8) -> Half {
        if raw == Half::Left as u8 {
            Half::Left
        } else {
            Half::Right
        }
    }

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

impl Not for Half {
    type Output = Half;

    #[inline(always)]
    fn not(self) -> Half {
        self.other()
    }
}

/// Construction parameters for a stream.
///
/// The capacity is fixed for the lifetime of the stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Bytes per half. The foreground may run at most this far ahead of
    /// (input) or behind (output) the background thread.
    pub half_capacity: usize,
    /// How a thread passes time while waiting on a handoff flag.
    pub wait: WaitPolicy,
}

impl StreamConfig {
    /// # Panics
    /// Panics if `half_capacity` is zero.
    pub fn new(half_capacity: usize) -> Self {
        assert!(half_capacity > 0, "half capacity must be non-zero");
        Self {
            half_capacity,
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_CAPACITY)
    }
}

struct HalfBuf(UnsafeCell<Box<[u8]>>);

/// Fixed-capacity byte arena split into two independently owned halves.
pub(crate) struct DoubleBuffer {
    halves: [HalfBuf; 2],
    capacity: usize,
}

// SAFETY: access to each half is serialized by the handoff protocol; at any
// instant exactly one thread owns a given half.
unsafe impl Sync for DoubleBuffer {}

impl DoubleBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        let alloc = || HalfBuf(UnsafeCell::new(vec![0u8; capacity].into_boxed_slice()));
        Self {
            halves: [alloc(), alloc()],
            capacity,
        }
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shared view of `half`.
    ///
    /// # Safety
    /// The calling thread must own `half` under the handoff protocol for the
    /// whole lifetime of the returned slice.
    #[inline(always)]
    pub(crate) unsafe fn half(&self, half: Half) -> &[u8] {
        // SAFETY: guaranteed by the caller; no writer exists for an owned half.
        unsafe { &*self.halves[half.index()].0.get() }
    }

    /// Exclusive view of `half`.
    ///
    /// # Safety
    /// The calling thread must own `half` under the handoff protocol, and must
    /// not hold any other reference into it, for the whole lifetime of the
    /// returned slice.
    #[allow(clippy::mut_from_ref)]
    #[inline(always)]
    pub(crate) unsafe fn half_mut(&self, half: Half) -> &mut [u8] {
        // SAFETY: guaranteed by the caller.
        unsafe { &mut *self.halves[half.index()].0.get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_are_complementary() {
        assert_eq!(!Half::Left, Half::Right);
        assert_eq!(!Half::Right, Half::Left);
        assert_eq!(!!Half::Left, Half::Left);
        assert_eq!(Half::from_u8(Half::Right as u8), Half::Right);
        assert_eq!(Half::from_u8(Half::Left as u8), Half::Left);
    }

    #[test]
    fn halves_are_disjoint_allocations() {
        let buf = DoubleBuffer::new(4);
        // SAFETY: single-threaded test owns both halves.
        unsafe {
            buf.half_mut(Half::Left).copy_from_slice(b"ABCD");
            buf.half_mut(Half::Right).copy_from_slice(b"EFGH");
            assert_eq!(buf.half(Half::Left), b"ABCD");
            assert_eq!(buf.half(Half::Right), b"EFGH");
        }
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    #[should_panic(expected = "half capacity must be non-zero")]
    fn zero_capacity_is_rejected() {
        let _ = StreamConfig::new(0);
    }

    #[test]
    fn config_builder_sets_policy() {
        let cfg = StreamConfig::new(16).with_wait(WaitPolicy::Block);
        assert_eq!(cfg.half_capacity, 16);
        assert_eq!(cfg.wait, WaitPolicy::Block);
        assert_eq!(StreamConfig::default().half_capacity, DEFAULT_HALF_CAPACITY);
    }
}
