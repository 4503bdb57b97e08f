// SPDX-License-Identifier: AGPL-3.0-or-later
//! Table schema exposed to query consumers

use crate::ValueType;
use serde::Serialize;

/// Name of the filesystem table
pub const TABLE_NAME: &str = "fs";

/// Number of columns in the filesystem table
pub const COLUMN_COUNT: usize = 5;

/// Column description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub value_type: ValueType,
    pub description: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, value_type: ValueType, description: &'static str) -> Self {
        Self { name, value_type, description }
    }
}

/// Columns of the filesystem table. Order and names are part of the
/// external contract.
pub const COLUMNS: [Column; COLUMN_COUNT] = [
    Column::new("name", ValueType::Text, "The base name of the object"),
    Column::new("relPath", ValueType::Text, "Path of the object, relative to the search root"),
    Column::new("size", ValueType::Int, "Size of the file (0 for directories)"),
    Column::new("isDir", ValueType::Bool, "Whether the object is a directory"),
    Column::new("isFile", ValueType::Bool, "Whether the object is a file"),
];

/// Position of a filesystem-table column by name
pub fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|c| c.name == name)
}

/// A named virtual table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub const fn new(name: &'static str, columns: &'static [Column]) -> Self {
        Self { name, columns }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// The filesystem table
pub static FS_TABLE: Table = Table::new(TABLE_NAME, &COLUMNS);
