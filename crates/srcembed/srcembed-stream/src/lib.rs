//! Asynchronous double-buffered byte streams.
//!
//! Each stream owns a buffer split into two equal halves and exactly one
//! background I/O thread. The caller copies into or out of one half while the
//! background thread fills ([`InputStream`]) or drains ([`OutputStream`]) the
//! other; when the caller's half is exhausted the two swap in a *handoff*.
//!
//! # Design
//! - **Ownership**: at every instant each half has exactly one owner. The
//!   caller owns the active half, the background thread owns the other while
//!   `pending` is raised. No lock protects the bytes themselves.
//! - **Visibility**: the handoff flags are atomics with acquire/release
//!   ordering, so a half is only touched after the other thread's work on it is
//!   observably complete.
//! - **Backpressure**: exactly one half of slack. The caller waits (spin or
//!   block, see [`WaitPolicy`]) only when it catches up with the background
//!   thread.
//! - **Failure**: the background thread never panics across the boundary; it
//!   records the error kind, raises `finalized` and releases the caller, which
//!   reports a sticky [`StreamError::Fatal`].
//!
//! # Thread Safety
//! - One producer and one consumer per stream: all operations take `&mut self`.
//! - `dispose` consumes the stream; dropping it performs the same shutdown.

mod buffer;
mod error;
mod handoff;
mod input;
mod io;
mod output;
mod wait;

pub use buffer::{DEFAULT_HALF_CAPACITY, StreamConfig};
pub use error::StreamError;
pub use input::InputStream;
pub use io::{IoSink, IoSource, Sink, Source};
pub use output::OutputStream;
pub use wait::WaitPolicy;
