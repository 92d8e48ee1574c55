use memmap2::{Advice, Mmap};
use srcembed_stream::Source;
use std::{
    fs::File,
    io::{self, Read},
    os::fd::RawFd,
};
use tracing::debug;

/// Read-only mapping of a regular file.
pub struct MmapFile {
    _file: Option<File>,
    mmap: Mmap,
}

impl MmapFile {
    /// Open an existing file and map it read-only
    #[cfg(test)]
    pub(crate) fn open_ro<P: AsRef<std::path::Path>>(path: P) -> io::Result<Self> {
        use std::os::fd::AsRawFd;
        let file = File::open(path)?;
        let mmap = Self::map(file.as_raw_fd())?;
        Ok(Self {
            _file: Some(file),
            mmap,
        })
    }

    /// Map the regular file behind `fd`. The descriptor stays owned by the
    /// caller; the mapping remains valid after it is closed.
    pub fn from_fd(fd: RawFd) -> io::Result<Self> {
        let mmap = Self::map(fd)?;
        Ok(Self { _file: None, mmap })
    }

    fn map(fd: RawFd) -> io::Result<Mmap> {
        // Zero-length mappings are rejected by the kernel; report it uniformly.
        let mmap = unsafe { Mmap::map(fd) }.and_then(|m| {
            if m.is_empty() {
                Err(io::Error::new(io::ErrorKind::InvalidInput, "empty file"))
            } else {
                Ok(m)
            }
        })?;
        if let Err(e) = mmap.advise(Advice::Sequential) {
            debug!(error = %e, "madvise(SEQUENTIAL) ignored");
        }
        debug!(fd, len = mmap.len(), "file mapped");
        Ok(mmap)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

/// Cursor over a [`MmapFile`]: a plain [`Read`] for callers that want the
/// zero-copy path, and a [`Source`] so it can also feed an `InputStream`.
pub struct MappedReader {
    file: MmapFile,
    pos: usize,
}

impl MappedReader {
    pub fn new(file: MmapFile) -> Self {
        Self { file, pos: 0 }
    }

    /// Cursor positioned at `offset`, or `None` when the mapping has no
    /// bytes past it (the file may have shrunk since its length was read).
    pub fn starting_at(file: MmapFile, offset: usize) -> Option<Self> {
        (offset < file.len()).then_some(Self { file, pos: offset })
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &[u8] {
        &self.file.as_slice()[self.pos..]
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = self.remaining();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Source for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }
}
