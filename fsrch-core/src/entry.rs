// SPDX-License-Identifier: AGPL-3.0-or-later
//! File system entries visited during a walk

use crate::{schema::COLUMN_COUNT, Value};
use serde::{Deserialize, Serialize};

/// Entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        }
    }
}

/// One visited filesystem object. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDescriptor {
    name: String,
    rel_path: String,
    size: i64,
    kind: EntryKind,
}

impl EntryDescriptor {
    /// Builds a descriptor. Directories always report a size of 0.
    pub fn new(name: impl Into<String>, rel_path: impl Into<String>, size: i64, kind: EntryKind) -> Self {
        let size = if kind == EntryKind::Directory { 0 } else { size };
        Self {
            name: name.into(),
            rel_path: rel_path.into(),
            size,
            kind,
        }
    }

    /// Builds a descriptor from `lstat`-style metadata.
    pub fn from_metadata(name: impl Into<String>, rel_path: impl Into<String>, metadata: &std::fs::Metadata) -> Self {
        let size = i64::try_from(metadata.len()).unwrap_or(i64::MAX);
        Self::new(name, rel_path, size, EntryKind::from_file_type(metadata.file_type()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Anything that is not a directory counts as a file, symlinks and
    /// sockets included.
    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// Projects the entry onto the `fs` table columns, in column order.
    pub fn project(&self) -> [Value; COLUMN_COUNT] {
        [
            Value::Text(self.name.clone()),
            Value::Text(self.rel_path.clone()),
            Value::Int(self.size),
            Value::Bool(self.is_dir()),
            Value::Bool(self.is_file()),
        ]
    }
}
