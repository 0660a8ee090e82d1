//! Command implementations for pgreconcile CLI.
//!
//! Each submodule is one subcommand: read the remote dump and the local
//! side, compare, write the generated file, print a summary. Commands
//! return the process exit code.

mod audit;
mod columns;
mod components;
mod data;
mod functions;
mod objects;
mod rewrite;
mod sync;

pub use audit::audit;
pub use columns::{columns, ColumnSource};
pub use components::components;
pub use data::data;
pub use functions::functions;
pub use objects::objects;
pub use rewrite::{extract, patch_nulls, strip_column};
pub use sync::sync;

use crate::catalog::ObjectFilter;
use crate::config::{redact_dsn, Config};
use crate::dump::{load_statements, Statement};
use crate::exit_codes;
use crate::migration::MigrationTarget;
use crate::output::Output;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_postgres::{Client, NoTls};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Connection
// =============================================================================

/// The local database could not be reached. Mapped to its own exit code.
#[derive(Debug)]
pub struct ConnectionError {
    pub target: String,
    pub reason: String,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to connect to {}: {}", self.target, self.reason)
    }
}

impl std::error::Error for ConnectionError {}

pub(crate) async fn connect(database_url: &str, output: &Output) -> Result<Client> {
    output.verbose(
        &format!("Connecting to {}...", redact_dsn(database_url))
            .dimmed()
            .to_string(),
    );

    let failed = |reason: String| ConnectionError {
        target: redact_dsn(database_url),
        reason,
    };
    let (client, connection) =
        match tokio::time::timeout(CONNECT_TIMEOUT, tokio_postgres::connect(database_url, NoTls))
            .await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(failed(e.to_string()).into()),
            Err(_) => {
                return Err(failed(format!("timed out after {:?}", CONNECT_TIMEOUT)).into())
            }
        };

    // Spawn the connection handler
    tokio::spawn(async move {
        let _ = connection.await;
    });

    let cancel_token = client.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nInterrupted (Ctrl+C). Cancelling query...");
        if let Err(e) = cancel_token.cancel_query(NoTls).await {
            eprintln!("Warning: Failed to cancel query: {}", e);
        }
        std::process::exit(exit_codes::INTERRUPTED);
    });

    Ok(client)
}

// =============================================================================
// Shared Command State
// =============================================================================

/// Settings resolved once in `main` and shared by every command.
pub struct Invocation<'a> {
    pub config: &'a Config,
    pub output: &'a Output,
    pub database_url: String,
    pub filter: ObjectFilter,
}

impl Invocation<'_> {
    /// Label for the local side: the dump file name, or the database name.
    pub fn local_label(&self, local_dump: Option<&Path>) -> String {
        match local_dump {
            Some(path) => file_label(path),
            None => format!("local database {}", database_name(&self.database_url)),
        }
    }

    /// Read and split a dump file, reporting progress.
    pub fn load_dump(&self, path: &Path) -> Result<Vec<Statement>> {
        self.output
            .info(&format!("Reading {}...", path.display()).dimmed().to_string());
        let stmts = load_statements(path)?;
        self.output
            .verbose(&format!("  {} statements", stmts.len()).dimmed().to_string());
        Ok(stmts)
    }

    /// Filter without the table prefix, for lookups by exact name.
    pub fn schema_filter(&self) -> ObjectFilter {
        ObjectFilter::new(self.filter.schema.clone(), None)
    }

    /// Resolve where a generated migration goes.
    ///
    /// `-o` wins, then `--supabase`, then `--migrations-dir` or the
    /// configured migrations directory, then `default_file`.
    pub fn migration_target(
        &self,
        args: &TargetArgs,
        name: &str,
        default_file: &str,
    ) -> MigrationTarget {
        if let Some(path) = &args.output {
            return MigrationTarget::File(path.clone());
        }
        if args.supabase {
            return MigrationTarget::Supabase {
                program: self.config.tool_path("supabase"),
                name: name.to_string(),
            };
        }
        let dir = args
            .migrations_dir
            .clone()
            .or_else(|| self.config.migrations_dir().map(PathBuf::from));
        match dir {
            Some(dir) => MigrationTarget::Directory {
                dir,
                name: name.to_string(),
            },
            None => MigrationTarget::File(PathBuf::from(default_file)),
        }
    }
}

/// Where migration-producing commands write their SQL.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Write the migration to this file
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        conflicts_with_all = ["migrations_dir", "supabase"]
    )]
    pub output: Option<PathBuf>,

    /// Write a timestamped migration into this directory
    #[arg(long = "migrations-dir", value_name = "DIR", conflicts_with = "supabase")]
    pub migrations_dir: Option<PathBuf>,

    /// Create the migration with `supabase migration new`
    #[arg(long)]
    pub supabase: bool,
}

pub(crate) fn exit_code(differences: bool) -> i32 {
    if differences {
        exit_codes::DIFFERENCES_FOUND
    } else {
        exit_codes::NO_DIFFERENCES
    }
}

/// Date stamped into generated migration headers.
pub(crate) fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Timestamp stamped into reports.
pub(crate) fn generated_at() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Database name from a connection URL, for display.
fn database_name(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let name = parsed.path().trim_start_matches('/');
            if name.is_empty() {
                parsed.host_str().unwrap_or("unknown").to_string()
            } else {
                name.to_string()
            }
        }
        Err(_) => "unknown".to_string(),
    }
}
