use srcembed_config::InputMode;
use srcembed_mmap::{MappedReader, MmapFile};
use srcembed_stream::{InputStream, StreamConfig, StreamError};
use srcembed_sys::{DescriptorKind, Fd};
use tracing::{debug, warn};

/// Where the formatter pulls stdin from.
pub enum Stdin {
    /// Regular file mapped in full, positioned past the bytes already
    /// consumed by whoever handed us the descriptor.
    Mapped(MappedReader),
    Streamed(InputStream),
}

impl Stdin {
    pub fn open(mode: InputMode, config: StreamConfig) -> Result<Self, StreamError> {
        if mode != InputMode::Buffered {
            if let Some(reader) = try_map(&Fd::stdin()) {
                return Ok(Stdin::Mapped(reader));
            }
            if mode == InputMode::Mapped {
                warn!("stdin cannot be mapped, streaming instead");
            }
        }
        debug!(?mode, "stdin: double-buffered stream");
        InputStream::initialize(Fd::stdin(), config).map(Stdin::Streamed)
    }
}

/// Maps stdin when it is a regular file with unread bytes. Any failed
/// precondition returns `None` and the caller streams instead.
fn try_map(fd: &Fd) -> Option<MappedReader> {
    let kind = fd.kind().ok()?;
    let DescriptorKind::Regular { len } = kind else {
        debug!(?kind, "stdin: not mappable");
        return None;
    };
    let offset = fd.offset().ok()?;
    if offset >= len {
        return None;
    }
    let map = match MmapFile::from_fd(fd.raw()) {
        Ok(map) => map,
        Err(e) => {
            debug!(error = %e, "stdin: mapping failed");
            return None;
        }
    };
    let mapped_len = map.len();
    // the file may have been truncated after fstat
    let Some(reader) = MappedReader::starting_at(map, usize::try_from(offset).ok()?) else {
        debug!(offset, mapped_len, "stdin: nothing mapped past offset");
        return None;
    };
    debug!(len = mapped_len, offset, "stdin: mapped");
    Some(reader)
}
