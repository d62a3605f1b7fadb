//! Error types for design file extraction and inventory runs.
//!
//! The five failure categories an inventory distinguishes are exposed through
//! [`Error::kind`], so callers can decide per category whether to log, count
//! or ignore a failed entry.
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for extraction and inventory operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not start with the compound-file signature
    #[error("{} is not a structured storage file", path.display())]
    NotAContainer { path: PathBuf },

    /// Valid container without the requested stream
    #[error("{} doesn't contain the {stream} stream", path.display())]
    StreamNotFound { path: PathBuf, stream: String },

    /// Stream is larger than the configured sanity limit
    #[error("{stream} stream in {} is {size} bytes, limit is {limit}", path.display())]
    StreamTooLarge {
        path: PathBuf,
        stream: String,
        size: u64,
        limit: u64,
    },

    /// Path or name exceeds the platform or configured length limit
    #[error("The path or name of a file is too long in: {}", path.display())]
    PathTooLong { path: PathBuf },

    /// Any other failure, carrying the original message
    #[error("{0}")]
    Unexpected(String),

    /// IO error on the output side (ledger or error log)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// CSV ledger error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for extraction and inventory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    NotAContainer,
    StreamNotFound,
    StreamTooLarge,
    PathTooLong,
    Unexpected,
}

impl Error {
    /// Classify this error into one of the inventory failure categories.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::NotAContainer { .. } => FailureKind::NotAContainer,
            Error::StreamNotFound { .. } => FailureKind::StreamNotFound,
            Error::StreamTooLarge { .. } => FailureKind::StreamTooLarge,
            Error::PathTooLong { .. } => FailureKind::PathTooLong,
            Error::Unexpected(_) | Error::Io(_) | Error::Csv(_) => FailureKind::Unexpected,
        }
    }

    /// Map an IO error raised while touching `path` onto the taxonomy.
    ///
    /// The OS "file name too long" condition becomes [`Error::PathTooLong`]
    /// naming the containing directory; everything else is unexpected.
    pub(crate) fn from_io(err: io::Error, path: &Path) -> Self {
        if err.kind() == io::ErrorKind::InvalidFilename {
            Error::PathTooLong {
                path: path.parent().unwrap_or(path).to_path_buf(),
            }
        } else {
            Error::Unexpected(format!("{}: {}", path.display(), err))
        }
    }

    /// Convert an OLE parser error for the container at `path`.
    pub(crate) fn from_ole(err: crate::ole::OleError, path: &Path, stream: &str) -> Self {
        use crate::ole::OleError;

        match err {
            OleError::NotOleFile => Error::NotAContainer {
                path: path.to_path_buf(),
            },
            OleError::StreamNotFound => Error::StreamNotFound {
                path: path.to_path_buf(),
                stream: stream.to_string(),
            },
            OleError::Io(e) => Error::from_io(e, path),
            other => Error::Unexpected(format!("{}: {}", path.display(), other)),
        }
    }
}
