use std::os::fd::RawFd;
use tracing::debug;

/// Tells the kernel `fd` will be read front to back. Failures are ignored:
/// pipes and terminals reject the advice and nothing depends on it.
#[cfg(target_os = "linux")]
pub fn advise_sequential(fd: RawFd) {
    let rc = unsafe { libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_SEQUENTIAL) };
    if rc != 0 {
        debug!(fd, rc, "sequential advice rejected");
        return;
    }
    let rc = unsafe { libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_WILLNEED) };
    debug!(fd, rc, "read-ahead requested");
}

#[cfg(not(target_os = "linux"))]
pub fn advise_sequential(fd: RawFd) {
    debug!(fd, "read-ahead hint unsupported on this platform");
}
