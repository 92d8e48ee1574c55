use std::io;

/// Errors surfaced by [`InputStream`](crate::InputStream) and
/// [`OutputStream`](crate::OutputStream).
///
/// `Fatal` is sticky: once a background thread reports a non-recoverable
/// failure, every later call on the same stream returns it again.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("failed to prepare stream descriptor")]
    Io(#[from] io::Error),

    #[error("stream finalized after fatal I/O error ({kind})")]
    Fatal { kind: io::ErrorKind },

    #[error("failed to spawn background I/O thread")]
    Spawn(#[source] io::Error),
}

impl StreamError {
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            StreamError::Io(e) | StreamError::Spawn(e) => e.kind(),
            StreamError::Fatal { kind } => *kind,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StreamError::Fatal { .. })
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(e) => e,
            other => io::Error::new(other.kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_keeps_original_kind_through_io_conversion() {
        let err = StreamError::Fatal {
            kind: io::ErrorKind::BrokenPipe,
        };
        assert!(err.is_fatal());
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn io_errors_pass_through_unchanged() {
        let err = StreamError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!err.is_fatal());
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
