//! Error types for library-table calls and cache reads.
//!
//! Both are recovered locally: [`LoadError`] becomes an [`ErrorRecord`] in the collector,
//! [`CacheError`] becomes a stale catalog. Application code uses `anyhow`.

use thiserror::Error;

use crate::types::{ErrorKind, ErrorRecord, LibraryId};

/// Failure reported by a [`LibraryTable`](crate::table::LibraryTable) call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Library or part not found / could not be opened.
    #[error("lookup failed for {lib}: {detail}")]
    Lookup { lib: LibraryId, detail: String },

    /// Library or part could not be parsed.
    #[error("malformed data in {lib}: {detail}")]
    Format { lib: LibraryId, detail: String },

    /// Anything the table did not anticipate. Not for expected conditions.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl LoadError {
    pub fn lookup(lib: impl Into<LibraryId>, detail: impl std::fmt::Display) -> Self {
        LoadError::Lookup {
            lib: lib.into(),
            detail: detail.to_string(),
        }
    }

    pub fn format(lib: impl Into<LibraryId>, detail: impl std::fmt::Display) -> Self {
        LoadError::Format {
            lib: lib.into(),
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Lookup { .. } => ErrorKind::Lookup,
            LoadError::Format { .. } => ErrorKind::Format,
            LoadError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Normalize into a collector record attributed to `origin`.
    pub fn into_record(self, origin: &str) -> ErrorRecord {
        ErrorRecord {
            kind: self.kind(),
            message: self.to_string(),
            origin: Some(origin.to_string()),
        }
    }
}

/// Result alias for table calls.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Cache file could not be read back.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error")]
    Io(#[from] std::io::Error),

    /// Short record, bad integer, bad escape, or an empty list.
    #[error("corrupt cache at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}
