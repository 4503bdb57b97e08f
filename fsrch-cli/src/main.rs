// SPDX-License-Identifier: AGPL-3.0-or-later
//! fsrch CLI
//!
//! Query filesystem metadata as rows of the `fs` table.

mod commands;
mod select;

use clap::{Parser, Subcommand};
use commands::{OutputFormat, QueryRequest};
use fsrch_core::{ScanOptions, TABLE_NAME};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "fsrch")]
#[command(author, version, about = "fsrch - query filesystem metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream rows of a table through a select list
    #[command(alias = "select")]
    Query {
        /// Comma-separated columns and function calls, e.g. "name, ext(relPath)"
        #[arg(default_value = "*")]
        select: String,

        /// Table to read
        #[arg(short, long, default_value = TABLE_NAME)]
        from: String,

        /// Directory to walk
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Stop after this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// List tables and their columns
    Tables,

    /// List scalar functions
    Functions,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = commands::init_registry();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match cli.command {
        Commands::Query { select, from, root, limit, format } => {
            let mut scan = ScanOptions::new(root);
            scan.limit = limit;
            let request = QueryRequest { select, table: from, scan, format };
            commands::query(&registry, &request, &mut out).await
        }
        Commands::Tables => commands::tables(&registry, &mut out),
        Commands::Functions => commands::functions(&registry, &mut out),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
