use srcembed_stream::{Sink, Source};
use std::io;
use std::os::fd::RawFd;
use tracing::{debug, warn};

pub const STDIN: RawFd = libc::STDIN_FILENO;
pub const STDOUT: RawFd = libc::STDOUT_FILENO;

/// What sits behind a descriptor, as reported by `fstat`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorKind {
    Regular { len: u64 },
    Pipe,
    CharDevice,
    Socket,
    Other,
}

impl DescriptorKind {
    pub fn inspect(fd: RawFd) -> io::Result<Self> {
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::fstat(fd, &mut st) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        let kind = match st.st_mode & libc::S_IFMT {
            libc::S_IFREG => Self::Regular {
                len: st.st_size as u64,
            },
            libc::S_IFIFO => Self::Pipe,
            libc::S_IFCHR => Self::CharDevice,
            libc::S_IFSOCK => Self::Socket,
            _ => Self::Other,
        };
        Ok(kind)
    }
}

/// Borrowed raw descriptor usable as an engine [`Source`] or [`Sink`].
///
/// The descriptor is never closed here. If [`Source::set_nonblocking`] changed
/// its status flags, the original flags are put back on drop, since the open
/// file description is usually shared with the parent shell.
#[derive(Debug)]
pub struct Fd {
    raw: RawFd,
    restore: Option<libc::c_int>,
}

impl Fd {
    pub fn new(raw: RawFd) -> Self {
        Self { raw, restore: None }
    }

    pub fn stdin() -> Self {
        Self::new(STDIN)
    }

    pub fn stdout() -> Self {
        Self::new(STDOUT)
    }

    pub fn raw(&self) -> RawFd {
        self.raw
    }

    pub fn kind(&self) -> io::Result<DescriptorKind> {
        DescriptorKind::inspect(self.raw)
    }

    /// Current file offset. Fails with `ESPIPE` on pipes and sockets.
    pub fn offset(&self) -> io::Result<u64> {
        let pos = unsafe { libc::lseek(self.raw, 0, libc::SEEK_CUR) };
        if pos < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(pos as u64)
    }

    fn flags(&self) -> io::Result<libc::c_int> {
        let flags = unsafe { libc::fcntl(self.raw, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(flags)
    }

    fn set_flags(&self, flags: libc::c_int) -> io::Result<()> {
        let rc = unsafe { libc::fcntl(self.raw, libc::F_SETFL, flags) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Source for Fd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.raw, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn set_nonblocking(&mut self) -> io::Result<()> {
        let flags = self.flags()?;
        if flags & libc::O_NONBLOCK != 0 {
            return Ok(());
        }
        self.set_flags(flags | libc::O_NONBLOCK)?;
        if self.restore.is_none() {
            self.restore = Some(flags);
        }
        debug!(fd = self.raw, "descriptor switched to non-blocking");
        Ok(())
    }
}

impl Sink for Fd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.raw, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        if let Some(flags) = self.restore.take() {
            match self.set_flags(flags) {
                Ok(()) => debug!(fd = self.raw, "descriptor flags restored"),
                Err(e) => warn!(fd = self.raw, error = %e, "failed to restore descriptor flags"),
            }
        }
    }
}
