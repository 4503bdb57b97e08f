// SPDX-License-Identifier: AGPL-3.0-or-later
//! Row source and row stream traits

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    error::FsrchResult,
    options::ScanOptions,
    schema::{Column, Table},
    Value,
};

/// One row delivered by a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// 1-based ordinal within the stream that produced the row
    pub id: u64,
    pub values: Vec<Value>,
    #[serde(skip)]
    columns: &'static [Column],
}

impl Row {
    pub fn new(id: u64, columns: &'static [Column], values: Vec<Value>) -> Self {
        debug_assert!(
            values.len() == columns.len()
                && values.iter().zip(columns).all(|(v, c)| v.value_type() == c.value_type),
            "row values do not match their columns"
        );
        Self { id, values, columns }
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .and_then(|i| self.values.get(i))
    }
}

/// Pull-based stream of rows
///
/// `next_row` yields rows until the stream is exhausted, then `None`
/// forever. Failures are never reported mid-stream; they come back from
/// `close`, which stops any background work and waits for it to finish.
#[async_trait]
pub trait RowStream: Send {
    fn columns(&self) -> &'static [Column];

    async fn next_row(&mut self) -> Option<Row>;

    /// Stops the stream and reports the error that ended it, if any.
    /// Calling it again returns `Ok(())`.
    async fn close(&mut self) -> FsrchResult<()>;
}

/// A named provider of virtual tables
pub trait RowSource: Send + Sync {
    fn name(&self) -> &str;
    fn tables(&self) -> Vec<&'static str>;
    fn table(&self, name: &str) -> FsrchResult<&'static Table>;
    fn open(&self, table: &str, options: &ScanOptions) -> FsrchResult<Box<dyn RowStream>>;
}
