// SPDX-License-Identifier: AGPL-3.0-or-later
//! fsrch core
//!
//! Entry descriptors, the `fs` table schema, cell values, and the traits
//! that connect row sources to their consumers.

pub mod entry;
pub mod error;
pub mod function;
pub mod options;
pub mod path;
pub mod schema;
pub mod source;
pub mod value;

pub use entry::{EntryDescriptor, EntryKind};
pub use error::{FsrchError, FsrchResult};
pub use function::{EvalContext, ScalarFn, ScalarFunction};
pub use options::ScanOptions;
pub use schema::{Column, Table, COLUMNS, FS_TABLE, TABLE_NAME};
pub use source::{Row, RowSource, RowStream};
pub use value::{Value, ValueType};
