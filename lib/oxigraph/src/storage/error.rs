use std::error::Error;
use std::fmt;
use std::io;

/// An error that occurred while reading or writing to the underlying key-value engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// A transaction tried to write through a read-only handle.
    #[error("transaction is read-only")]
    ReadOnly,
    /// The store's own data is no longer internally consistent (a token decoded from a table
    /// doesn't match any known shape, or an id2str lookup came back empty for a hashed term).
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
    /// Any other unexpected failure, kept opaque so this enum can grow without breaking callers.
    #[error(transparent)]
    #[doc(hidden)]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl From<StorageError> for io::Error {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::ReadOnly => Self::new(io::ErrorKind::PermissionDenied, error),
            StorageError::Corruption(error) => error.into(),
            StorageError::Other(error) => Self::new(io::ErrorKind::Other, error),
        }
    }
}

/// The store holds data that violates one of its own structural invariants.
#[derive(Debug)]
pub struct CorruptionError(CorruptionErrorKind);

#[derive(Debug)]
enum CorruptionErrorKind {
    Msg(String),
    Other(Box<dyn Error + Send + Sync + 'static>),
}

impl CorruptionError {
    pub(crate) fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(CorruptionErrorKind::Other(error.into()))
    }

    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        Self(CorruptionErrorKind::Msg(msg.into()))
    }
}

impl fmt::Display for CorruptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            CorruptionErrorKind::Msg(msg) => write!(f, "{msg}"),
            CorruptionErrorKind::Other(error) => error.fmt(f),
        }
    }
}

impl Error for CorruptionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.0 {
            CorruptionErrorKind::Msg(_) => None,
            CorruptionErrorKind::Other(error) => Some(error.as_ref()),
        }
    }
}

impl From<CorruptionError> for io::Error {
    fn from(error: CorruptionError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}
