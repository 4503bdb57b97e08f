// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use clap::ValueEnum;
use console::style;
use fsrch_core::{EvalContext, FsrchError, FsrchResult, ScanOptions, Value};
use fsrch_functions::register_builtins;
use fsrch_source::{FilesystemSource, Registry};
use std::io::Write;
use std::sync::Arc;
use tabled::{builder::Builder, Table, Tabled};
use tracing::debug;

use crate::select::SelectList;

/// Initialize the registry with every available table and function
pub fn init_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_source(Arc::new(FilesystemSource::new()));
    register_builtins(&mut registry);
    registry
}

/// Row output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with a header line
    #[default]
    Csv,
    /// Aligned table
    Table,
    /// One JSON object per row
    Json,
}

/// Parameters of a `query` run
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub select: String,
    pub table: String,
    pub scan: ScanOptions,
    pub format: OutputFormat,
}

/// Render a cell for text output; absent values are empty
fn format_cell(cell: &Option<Value>) -> String {
    cell.as_ref().map(Value::to_string).unwrap_or_default()
}

fn to_json(cell: &Option<Value>) -> serde_json::Value {
    match cell {
        None => serde_json::Value::Null,
        Some(Value::Text(s)) => serde_json::Value::from(s.as_str()),
        Some(Value::Int(i)) => serde_json::Value::from(*i),
        Some(Value::Bool(b)) => serde_json::Value::from(*b),
        Some(Value::Bytes(b)) => serde_json::Value::from(String::from_utf8_lossy(b).into_owned()),
    }
}

/// Stream rows of a table through a select list
///
/// Rows are written as they arrive. When the limit is reached the stream
/// is closed early. A traversal error is returned after the rows that
/// preceded it have been written.
pub async fn query(registry: &Registry, request: &QueryRequest, out: &mut impl Write) -> FsrchResult<()> {
    let source = registry.source_for_or_err(&request.table)?;
    let table = source.table(&request.table)?;
    let select = SelectList::parse(&request.select, table, registry)?;
    let labels = select.labels();
    // relPath values are relative to the scan root
    let ctx = EvalContext::new(&request.scan.root);

    debug!(table = %request.table, root = %request.scan.root.display(), select = ?labels, "running query");

    let mut stream = source.open(&request.table, &request.scan)?;
    let mut builder = Builder::default();

    match request.format {
        OutputFormat::Csv => writeln!(out, "{}", labels.join(","))?,
        OutputFormat::Table => builder.push_record(labels.iter().copied()),
        OutputFormat::Json => {}
    }

    let mut emitted = 0usize;
    let mut failure = None;
    while request.scan.limit.map_or(true, |limit| emitted < limit) {
        let Some(row) = stream.next_row().await else {
            break;
        };
        let cells = match select.evaluate(&row, &ctx) {
            Ok(cells) => cells,
            Err(e) => {
                failure = Some(e);
                break;
            }
        };
        emitted += 1;

        match request.format {
            OutputFormat::Csv => {
                let line: Vec<String> = cells.iter().map(format_cell).collect();
                writeln!(out, "{}", line.join(","))?;
            }
            OutputFormat::Table => builder.push_record(cells.iter().map(format_cell)),
            OutputFormat::Json => {
                let object: serde_json::Map<String, serde_json::Value> = labels
                    .iter()
                    .zip(cells.iter())
                    .map(|(label, cell)| (label.to_string(), to_json(cell)))
                    .collect();
                let line = serde_json::to_string(&object)
                    .map_err(|e| FsrchError::Serialization(e.to_string()))?;
                writeln!(out, "{line}")?;
            }
        }
    }

    let closed = stream.close().await;
    debug!(rows = emitted, "query finished");

    match request.format {
        OutputFormat::Csv => writeln!(out)?,
        OutputFormat::Table => writeln!(out, "{}", builder.build())?,
        OutputFormat::Json => {}
    }

    if let Some(e) = failure {
        return Err(e);
    }
    closed
}

#[derive(Tabled)]
struct ColumnEntry {
    #[tabled(rename = "Column")]
    name: String,
    #[tabled(rename = "Type")]
    value_type: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// List tables and their columns
pub fn tables(registry: &Registry, out: &mut impl Write) -> FsrchResult<()> {
    for name in registry.tables() {
        let source = registry.source_for_or_err(name)?;
        let table = source.table(name)?;
        writeln!(out, "{} ({})", style(table.name).cyan().bold(), source.name())?;

        let entries: Vec<ColumnEntry> = table
            .columns
            .iter()
            .map(|c| ColumnEntry {
                name: c.name.to_string(),
                value_type: c.value_type.to_string(),
                description: c.description.to_string(),
            })
            .collect();
        writeln!(out, "{}", Table::new(entries))?;
    }
    Ok(())
}

/// List registered scalar functions
pub fn functions(registry: &Registry, out: &mut impl Write) -> FsrchResult<()> {
    for function in registry.functions() {
        let params = vec!["arg"; function.arity].join(", ");
        writeln!(
            out,
            "  {}({}) - {}",
            style(function.name).green(),
            params,
            function.description
        )?;
    }
    Ok(())
}
