// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for fsrch

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type FsrchResult<T> = Result<T, FsrchError>;

/// Main error type
#[derive(Error, Debug)]
pub enum FsrchError {
    #[error("Traversal failed at {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Function {function} takes {expected} argument(s), got {got}")]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid select list: {0}")]
    InvalidSelect(String),

    #[error("Traversal task failed: {0}")]
    Task(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FsrchError {
    pub fn is_traversal(&self) -> bool {
        matches!(self, FsrchError::Traversal { .. })
    }

    /// The underlying I/O error kind, if this error wraps one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            FsrchError::Traversal { source, .. } => Some(source.kind()),
            FsrchError::Io(e) => Some(e.kind()),
            _ => None,
        }
    }
}
