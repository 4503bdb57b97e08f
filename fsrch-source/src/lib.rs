// SPDX-License-Identifier: AGPL-3.0-or-later
//! Row sources for fsrch
//!
//! The streaming filesystem [`Walker`], the [`FilesystemSource`] exposing it
//! as the `fs` table, and the [`Registry`] through which a query front end
//! discovers tables and scalar functions.

mod filesystem;
pub mod walker;

pub use filesystem::FilesystemSource;
pub use walker::{Walker, CHANNEL_CAPACITY};

use fsrch_core::{FsrchError, FsrchResult, RowSource, ScalarFunction};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of tables and scalar functions
///
/// Built explicitly and handed to whatever evaluates queries; there is no
/// process-wide table.
pub struct Registry {
    sources: HashMap<String, Arc<dyn RowSource>>,
    functions: HashMap<String, ScalarFunction>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Registers `source` under every table name it reports.
    pub fn register_source(&mut self, source: Arc<dyn RowSource>) {
        for table in source.tables() {
            self.sources.insert(table.to_string(), Arc::clone(&source));
        }
    }

    pub fn register_function(&mut self, function: ScalarFunction) {
        self.functions.insert(function.name.to_string(), function);
    }

    pub fn source_for(&self, table: &str) -> Option<Arc<dyn RowSource>> {
        self.sources.get(table).cloned()
    }

    pub fn source_for_or_err(&self, table: &str) -> FsrchResult<Arc<dyn RowSource>> {
        self.source_for(table)
            .ok_or_else(|| FsrchError::TableNotFound(table.to_string()))
    }

    pub fn function(&self, name: &str) -> Option<&ScalarFunction> {
        self.functions.get(name)
    }

    pub fn function_or_err(&self, name: &str) -> FsrchResult<&ScalarFunction> {
        self.function(name)
            .ok_or_else(|| FsrchError::FunctionNotFound(name.to_string()))
    }

    /// Table names, sorted
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.sources.keys().map(|s| s.as_str()).collect();
        tables.sort_unstable();
        tables
    }

    /// Registered functions, sorted by name
    pub fn functions(&self) -> Vec<&ScalarFunction> {
        let mut functions: Vec<&ScalarFunction> = self.functions.values().collect();
        functions.sort_unstable_by_key(|f| f.name);
        functions
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
