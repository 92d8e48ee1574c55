//! Lightweight latency recorder for the stream engine's foreground waits.
//!
//! When the `record` feature is **off** (the default), `PerfRecorder` is a
//! zero-sized type and every method is an `#[inline(always)]` no-op.
//!
//! When `record` is **on**, each stage gets a pre-allocated sample buffer and
//! `begin`/`end` pairs store elapsed nanoseconds read from
//! `clock_gettime(CLOCK_MONOTONIC)`. The perf harness uses this to compare how
//! long the foreground spends parked under each wait policy.

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerfStage {
    PrimingFill = 0,
    InputHandoffWait = 1,
    OutputHandoffWait = 2,
    OutputFlush = 3,
}

pub const NUM_STAGES: usize = 4;
pub const MAX_SAMPLES: usize = 65_536;

pub const ALL_STAGES: [PerfStage; NUM_STAGES] = [
    PerfStage::PrimingFill,
    PerfStage::InputHandoffWait,
    PerfStage::OutputHandoffWait,
    PerfStage::OutputFlush,
];

impl PerfStage {
    pub fn name(self) -> &'static str {
        match self {
            PerfStage::PrimingFill => "PrimingFill",
            PerfStage::InputHandoffWait => "InputHandoffWait",
            PerfStage::OutputHandoffWait => "OutputHandoffWait",
            PerfStage::OutputFlush => "OutputFlush",
        }
    }
}

// ─── Feature: record ON ─────────────────────────────────────────────────────

#[cfg(feature = "record")]
mod inner {
    use super::*;

    #[inline(always)]
    pub fn now_ns() -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }
        (ts.tv_sec as u64) * 1_000_000_000 + ts.tv_nsec as u64
    }

    struct StageBuf {
        samples: Box<[u64]>,
        count: usize,
        pending: u64,
    }

    impl StageBuf {
        fn new() -> Self {
            Self {
                samples: vec![0u64; MAX_SAMPLES].into_boxed_slice(),
                count: 0,
                pending: 0,
            }
        }

        #[inline(always)]
        fn push(&mut self, sample: u64) {
            if self.count < MAX_SAMPLES {
                self.samples[self.count] = sample;
                self.count += 1;
            }
        }
    }

    pub struct PerfRecorder {
        stages: Vec<StageBuf>,
    }

    impl PerfRecorder {
        pub fn new() -> Self {
            Self {
                stages: (0..NUM_STAGES).map(|_| StageBuf::new()).collect(),
            }
        }

        #[inline(always)]
        pub fn begin(&mut self, stage: PerfStage) {
            self.stages[stage as usize].pending = now_ns();
        }

        #[inline(always)]
        pub fn end(&mut self, stage: PerfStage) {
            let buf = &mut self.stages[stage as usize];
            let elapsed = now_ns().saturating_sub(buf.pending);
            buf.push(elapsed);
        }

        #[inline(always)]
        pub fn record(&mut self, stage: PerfStage, duration_ns: u64) {
            self.stages[stage as usize].push(duration_ns);
        }

        pub fn samples(&self, stage: PerfStage) -> &[u64] {
            let buf = &self.stages[stage as usize];
            &buf.samples[..buf.count]
        }

        pub fn count(&self, stage: PerfStage) -> usize {
            self.stages[stage as usize].count
        }

        pub fn reset(&mut self) {
            for buf in self.stages.iter_mut() {
                buf.count = 0;
            }
        }
    }

    impl Default for PerfRecorder {
        fn default() -> Self {
            Self::new()
        }
    }
}

// ─── Feature: record OFF (zero-cost stubs) ──────────────────────────────────

#[cfg(not(feature = "record"))]
mod inner {
    use super::*;

    #[inline(always)]
    pub fn now_ns() -> u64 {
        0
    }

    pub struct PerfRecorder;

    impl PerfRecorder {
        #[inline(always)]
        pub fn new() -> Self {
            Self
        }
        #[inline(always)]
        pub fn begin(&mut self, _stage: PerfStage) {}
        #[inline(always)]
        pub fn end(&mut self, _stage: PerfStage) {}
        #[inline(always)]
        pub fn record(&mut self, _stage: PerfStage, _duration_ns: u64) {}
        #[inline(always)]
        pub fn samples(&self, _stage: PerfStage) -> &[u64] {
            &[]
        }
        #[inline(always)]
        pub fn count(&self, _stage: PerfStage) -> usize {
            0
        }
        #[inline(always)]
        pub fn reset(&mut self) {}
    }

    impl Default for PerfRecorder {
        fn default() -> Self {
            Self
        }
    }
}

pub use inner::{PerfRecorder, now_ns};
