/// The error type returned by every fallible operation in this crate.
///
/// Use [`Error::kind`] to inspect what went wrong.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

impl Error {
    pub(crate) fn io(err: std::io::Error) -> Error {
        Error::from(ErrorKind::Io(err))
    }

    pub(crate) fn content(err: std::io::Error) -> Error {
        Error::from(ErrorKind::Source(err))
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Error {
        Error::from(ErrorKind::InvalidInput { msg: msg.into() })
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// Consumes the error and returns its kind.
    pub fn into_kind(self) -> ErrorKind {
        self.inner.kind
    }

    /// Errors raised before any byte reached the sink leave the writer usable.
    pub(crate) fn is_precondition(&self) -> bool {
        matches!(
            self.inner.kind,
            ErrorKind::ClosedStream | ErrorKind::InvalidInput { .. } | ErrorKind::Poisoned
        )
    }
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
}

/// The specific reason an operation failed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A write or close was attempted after the archive was closed.
    #[error("archive is already closed")]
    ClosedStream,

    /// The content did not have the size the caller declared.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The content did not hash to the checksum the caller declared.
    #[error("checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The output sink rejected a write.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The content reader reported a failure.
    #[error("content source failed: {0}")]
    Source(#[source] std::io::Error),

    /// A caller supplied value violates a format precondition.
    #[error("invalid input: {msg}")]
    InvalidInput { msg: String },

    /// A previous operation failed part way through writing; the output is
    /// unusable.
    #[error("archive is unusable after an earlier failure")]
    Poisoned,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.inner.kind)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: ErrorInner { kind },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::io(err)
    }
}
