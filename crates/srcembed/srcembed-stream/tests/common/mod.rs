//! Scripted sources and sinks shared by the stream integration tests.
//!
//! Chunk sizes and would-block stalls come from caller-supplied scripts so
//! that quickcheck can drive the interleavings and shrink failures.

#![allow(dead_code)]

use srcembed_stream::{Sink, Source};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

/// Maps an arbitrary byte onto `1..=max`.
pub fn size_in(raw: u8, max: usize) -> usize {
    raw as usize % max + 1
}

/// Endless replay of a list; an empty list replays `fallback`.
#[derive(Clone)]
struct Script<T: Copy> {
    items: Vec<T>,
    fallback: T,
    pos: usize,
}

impl<T: Copy> Script<T> {
    fn new(items: Vec<T>, fallback: T) -> Self {
        Self {
            items,
            fallback,
            pos: 0,
        }
    }

    fn next(&mut self) -> T {
        let Some(&item) = self.items.get(self.pos % self.items.len().max(1)) else {
            return self.fallback;
        };
        self.pos += 1;
        item
    }
}

/// Per-call behaviour shared by the scripted endpoints. A stall is reported
/// as would-block at most once in a row so every script makes progress.
#[derive(Clone)]
struct Pacing {
    chunks: Script<usize>,
    stalls: Script<bool>,
    stalled: bool,
    delay: Option<Duration>,
}

impl Pacing {
    fn new() -> Self {
        Self {
            chunks: Script::new(Vec::new(), usize::MAX),
            stalls: Script::new(Vec::new(), false),
            stalled: false,
            delay: None,
        }
    }

    fn stall(&mut self) -> bool {
        if self.stalled {
            self.stalled = false;
            return false;
        }
        self.stalled = self.stalls.next();
        self.stalled
    }

    fn pause(&self) {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
    }

    fn chunk(&mut self, len: usize) -> usize {
        self.chunks.next().clamp(1, len.max(1))
    }
}

/// Source serving `data` in scripted pieces, reporting would-block when the
/// stall script says so, and optionally failing at a fixed offset.
pub struct ScriptedSource {
    data: Vec<u8>,
    pos: usize,
    pacing: Pacing,
    fail_at: Option<usize>,
}

impl ScriptedSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            pacing: Pacing::new(),
            fail_at: None,
        }
    }

    /// Upper bounds of successive reads, replayed in a loop.
    pub fn chunks(mut self, sizes: Vec<usize>) -> Self {
        self.pacing.chunks = Script::new(sizes, usize::MAX);
        self
    }

    pub fn stalls(mut self, stalls: Vec<bool>) -> Self {
        self.pacing.stalls = Script::new(stalls, false);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.pacing.delay = Some(delay);
        self
    }

    pub fn fail_at(mut self, offset: usize) -> Self {
        self.fail_at = Some(offset);
        self
    }
}

impl Source for ScriptedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pacing.stall() {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        self.pacing.pause();
        let end = self.fail_at.unwrap_or(self.data.len()).min(self.data.len());
        if self.pos >= end {
            return match self.fail_at {
                Some(_) => Err(io::Error::from(io::ErrorKind::ConnectionReset)),
                None => Ok(0),
            };
        }
        let n = self.pacing.chunk(buf.len()).min(end - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Source that is broken from the first call.
pub struct BrokenSource;

impl Source for BrokenSource {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

/// Sink recording everything it accepts into a shared vector.
#[derive(Clone)]
pub struct ScriptedSink {
    written: Arc<Mutex<Vec<u8>>>,
    failed: Arc<AtomicBool>,
    pacing: Pacing,
    fail_after: Option<usize>,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            failed: Arc::new(AtomicBool::new(false)),
            pacing: Pacing::new(),
            fail_after: None,
        }
    }

    pub fn chunks(mut self, sizes: Vec<usize>) -> Self {
        self.pacing.chunks = Script::new(sizes, usize::MAX);
        self
    }

    pub fn stalls(mut self, stalls: Vec<bool>) -> Self {
        self.pacing.stalls = Script::new(stalls, false);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.pacing.delay = Some(delay);
        self
    }

    /// Accepts this many bytes in total, then fails every write.
    pub fn fail_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    pub fn contents(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    /// `true` once a write has been refused.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

impl Sink for ScriptedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pacing.stall() {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        self.pacing.pause();
        let mut written = self.written.lock().unwrap();
        let mut n = self.pacing.chunk(buf.len());
        if let Some(limit) = self.fail_after {
            if written.len() >= limit {
                self.failed.store(true, Ordering::Release);
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            n = n.min(limit - written.len());
        }
        written.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
