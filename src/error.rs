use core::fmt;
use std::io;
use std::path::PathBuf;

/// Result alias for `lloyd`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by loading, clustering and reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The record store holds no records.
    EmptyInput,

    /// Coordinate count mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of loaded records.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A file could not be opened, read or written.
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        kind: io::ErrorKind,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, err: &io::Error) -> Self {
        Error::Io {
            path: path.into(),
            kind: err.kind(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => write!(
                f,
                "cannot select {requested} centroids from {n_items} points"
            ),
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Io { path, kind } => write!(f, "{}: {kind}", path.display()),
        }
    }
}

impl std::error::Error for Error {}
