// SPDX-License-Identifier: AGPL-3.0-or-later
//! Filesystem row source

use fsrch_core::{
    error::{FsrchError, FsrchResult},
    options::ScanOptions,
    RowSource, RowStream, Table, FS_TABLE, TABLE_NAME,
};
use tracing::debug;

use crate::walker::Walker;

/// Source with a single table, `fs`, that walks the directory tree under
/// the scan root.
#[derive(Debug, Clone, Default)]
pub struct FilesystemSource;

impl FilesystemSource {
    pub fn new() -> Self {
        Self
    }
}

impl RowSource for FilesystemSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn tables(&self) -> Vec<&'static str> {
        vec![TABLE_NAME]
    }

    fn table(&self, name: &str) -> FsrchResult<&'static Table> {
        if name != TABLE_NAME {
            return Err(FsrchError::TableNotFound(name.to_string()));
        }
        Ok(&FS_TABLE)
    }

    fn open(&self, table: &str, options: &ScanOptions) -> FsrchResult<Box<dyn RowStream>> {
        self.table(table)?;
        debug!(table, root = %options.root.display(), "opening filesystem table");
        Ok(Box::new(Walker::open(options.root.clone())))
    }
}
