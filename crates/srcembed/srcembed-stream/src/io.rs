//! Descriptor boundary consumed by the background threads.
//!
//! The engine never talks to the OS directly. A [`Source`] or [`Sink`] hides
//! the platform read/write call; the engine only interprets the outcome:
//! `WouldBlock` and `Interrupted` are retried, `Ok(0)` from a source is end of
//! stream, everything else is fatal.

use std::io::{self, Read, Write};

/// Byte source drained by an [`InputStream`](crate::InputStream) filler thread.
pub trait Source: Send + 'static {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Switches the underlying descriptor to non-blocking mode.
    ///
    /// Called once by `InputStream::initialize` before the priming fill.
    fn set_nonblocking(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Byte sink fed by an [`OutputStream`](crate::OutputStream) drainer thread.
pub trait Sink: Send + 'static {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Pushes anything the sink buffers internally. Called after every drain.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Adapts any [`Read`] into a [`Source`].
#[derive(Debug)]
pub struct IoSource<R>(pub R);

/// Adapts any [`Write`] into a [`Sink`].
#[derive(Debug)]
pub struct IoSink<W>(pub W);

impl<R: Read + Send + 'static> Source for IoSource<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<W: Write + Send + 'static> Sink for IoSink<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn set_nonblocking(&mut self) -> io::Result<()> {
        (**self).set_nonblocking()
    }
}

impl<K: Sink + ?Sized> Sink for Box<K> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// `true` for conditions the background thread retries without surfacing.
#[inline(always)]
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
