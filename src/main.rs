use anyhow::{bail, Result};
use clap::{error::ErrorKind, Parser, Subcommand};
use std::path::PathBuf;

mod catalog;
mod commands;
mod compare;
mod config;
mod dump;
mod exit_codes;
mod introspect;
mod migration;
mod output;
mod report;
mod rewrite;
mod sql;
use commands::{ColumnSource, ConnectionError, Invocation, TargetArgs};
use config::Config;
use output::{JsonError, Output};

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pgreconcile")]
#[command(version = VERSION)]
#[command(
    about = "Reconcile a local Postgres database with a remote dump",
    long_about = None
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Local database URL (overrides DATABASE_URL env var and config file)
    #[arg(short = 'd', long = "database-url", global = true)]
    database_url: Option<String>,

    /// Path to config file (default: ./pgreconcile.toml)
    #[arg(long = "config", global = true)]
    config_path: Option<PathBuf>,

    /// Schema to compare (default: public)
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Only compare tables whose names start with this prefix (e.g. rd_)
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Minimal output (results only)
    #[arg(long, global = true)]
    quiet: bool,

    /// Show queries and child processes being run
    #[arg(long, global = true)]
    verbose: bool,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ===== Comparison =====
    /// Compare function definitions and write a Markdown report
    Functions {
        /// Remote schema dump (default: [dumps] schema)
        #[arg(long, value_name = "FILE")]
        remote: Option<PathBuf>,
        /// Compare against another dump instead of the local database
        #[arg(long, value_name = "FILE")]
        local_dump: Option<PathBuf>,
        /// Report path
        #[arg(
            short = 'o',
            long = "output",
            default_value = "database_functions_comparison.md"
        )]
        output: PathBuf,
    },
    /// Compare tables, functions, triggers, policies and indexes
    Objects {
        /// Remote schema dump (default: [dumps] schema)
        #[arg(long, value_name = "FILE")]
        remote: Option<PathBuf>,
        /// Compare against another dump instead of the local database
        #[arg(long, value_name = "FILE")]
        local_dump: Option<PathBuf>,
        /// Report path
        #[arg(
            short = 'o',
            long = "output",
            default_value = "database_objects_comparison.md"
        )]
        output: PathBuf,
    },
    /// Find missing columns and generate ADD COLUMN statements
    Columns {
        /// Remote dump (default: [dumps] schema, or [dumps] data with --source inserts)
        #[arg(long, value_name = "FILE")]
        remote: Option<PathBuf>,
        /// Read remote columns from CREATE TABLE or from INSERT/COPY column lists
        #[arg(long, value_enum, default_value = "create-table")]
        source: ColumnSource,
        /// Compare against another dump instead of the local database
        #[arg(long, value_name = "FILE")]
        local_dump: Option<PathBuf>,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Compare row counts and generate an import file for missing data
    Data {
        /// Remote data dump (default: [dumps] data)
        #[arg(long, value_name = "FILE")]
        remote: Option<PathBuf>,
        /// Compare against another dump instead of the local database
        #[arg(long, value_name = "FILE")]
        local_dump: Option<PathBuf>,
        /// Also import tables that are only partially loaded
        #[arg(long)]
        include_partial: bool,
        /// Import file path
        #[arg(short = 'o', long = "output", default_value = "import_missing_tables.sql")]
        output: PathBuf,
    },

    // ===== Migrations =====
    /// Check a migration file or directory against the remote dump
    Audit {
        /// Remote schema dump (default: [dumps] schema)
        #[arg(long, value_name = "FILE")]
        remote: Option<PathBuf>,
        /// Migration file, or directory of .sql files applied in name order
        #[arg(long, value_name = "PATH")]
        against: PathBuf,
    },
    /// Generate structure and functions migrations (-o names a directory)
    Sync {
        /// Remote schema dump (default: [dumps] schema)
        #[arg(long, value_name = "FILE")]
        remote: Option<PathBuf>,
        /// Compare against another dump instead of the local database
        #[arg(long, value_name = "FILE")]
        local_dump: Option<PathBuf>,
        /// Write both migrations as timestamped files into this directory
        #[arg(
            short = 'o',
            long = "output",
            value_name = "DIR",
            conflicts_with_all = ["migrations_dir", "supabase"]
        )]
        output: Option<PathBuf>,
        /// Same as -o (default: [output] migrations)
        #[arg(long = "migrations-dir", value_name = "DIR", conflicts_with = "supabase")]
        migrations_dir: Option<PathBuf>,
        /// Create both migrations with `supabase migration new`
        #[arg(long)]
        supabase: bool,
    },
    /// Extract indexes, constraints, policies and triggers for the prefixed tables
    Components {
        /// Remote schema dump (default: [dumps] schema)
        #[arg(long, value_name = "FILE")]
        remote: Option<PathBuf>,
        /// Also add this table with its primary key (repeatable)
        #[arg(long = "table", value_name = "TABLE")]
        tables: Vec<String>,
        /// Include triggers and the functions they execute
        #[arg(long)]
        with_triggers: bool,
        #[command(flatten)]
        target: TargetArgs,
    },

    // ===== Data Files =====
    /// Write an import file with one table's INSERT/COPY statements
    Extract {
        /// Data dump to read
        #[arg(long, value_name = "FILE")]
        dump: PathBuf,
        /// Table to extract (name or schema.name; a bare name matches every schema)
        #[arg(long)]
        table: String,
        /// Output path (default: import_<table>.sql)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Remove a column from every INSERT/COPY statement for a table
    StripColumn {
        /// Data dump to rewrite
        #[arg(long, value_name = "FILE")]
        dump: PathBuf,
        /// Table whose statements are rewritten (name or schema.name; a bare
        /// name matches every schema)
        #[arg(long)]
        table: String,
        /// Column to remove
        #[arg(long)]
        column: String,
        /// Output path (default: <dump>_without_<column>.sql)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Replace NULLs in one column of a table's INSERT/COPY statements
    PatchNulls {
        /// Data dump to rewrite
        #[arg(long, value_name = "FILE")]
        dump: PathBuf,
        /// Table whose statements are rewritten (name or schema.name; a bare
        /// name matches every schema)
        #[arg(long)]
        table: String,
        /// Column to patch
        #[arg(long)]
        column: String,
        /// Replacement as a SQL literal, e.g. "'n/a'" or 0
        #[arg(long, value_name = "SQL")]
        value: String,
        /// Output path (default: <dump>_patched.sql)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before parsing CLI so env vars are available)
    let _ = dotenvy::dotenv();

    // Check for --json flag early (before full parsing) for error handling
    let json_mode = std::env::args().any(|arg| arg == "--json");

    // Use try_parse to handle clap errors in JSON mode
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let meta = matches!(
                e.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            );
            if json_mode && !meta {
                JsonError::new(e.to_string()).print();
                std::process::exit(exit_codes::USAGE_ERROR);
            }
            // Human mode: let clap print its formatted output
            e.exit();
        }
    };

    let output = Output::new(cli.json, cli.quiet, cli.verbose);

    let config = match Config::load(cli.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            if json_mode {
                JsonError::with_details(e.to_string(), format!("{e:#}"))
                    .with_code("config_error")
                    .print();
            } else {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    match run(cli, &config, &output).await {
        Ok(code) => {
            output.flush();
            std::process::exit(code);
        }
        Err(e) => {
            let connection_failed = e.downcast_ref::<ConnectionError>().is_some();
            if json_mode {
                // Use full error chain for details (same as human mode)
                let full_chain = format!("{e:#}");
                let mut json_err = JsonError::with_details(e.to_string(), full_chain);
                if connection_failed {
                    json_err = json_err.with_code("connection_error");
                }
                json_err.print();
            } else {
                // Human mode: error to stderr with full chain
                eprintln!("Error: {e:#}");
            }
            std::process::exit(if connection_failed {
                exit_codes::CONNECTION_FAILURE
            } else {
                exit_codes::OPERATIONAL_FAILURE
            });
        }
    }
}

async fn run(cli: Cli, config: &Config, output: &Output) -> Result<i32> {
    let inv = Invocation {
        config,
        output,
        database_url: config.get_database_url(cli.database_url.as_deref()),
        filter: config.object_filter(cli.schema.as_deref(), cli.prefix.as_deref()),
    };
    output.verbose(&format!(
        "Schema: {}, prefix: {}",
        inv.filter.schema,
        inv.filter.prefix.as_deref().unwrap_or("(none)")
    ));

    match cli.command {
        Commands::Functions {
            remote,
            local_dump,
            output: report,
        } => {
            let remote = config.dump_path(remote.as_deref(), false)?;
            commands::functions(&inv, &remote, local_dump.as_deref(), &report).await
        }
        Commands::Objects {
            remote,
            local_dump,
            output: report,
        } => {
            let remote = config.dump_path(remote.as_deref(), false)?;
            commands::objects(&inv, &remote, local_dump.as_deref(), &report).await
        }
        Commands::Columns {
            remote,
            source,
            local_dump,
            target,
        } => {
            let remote = config.dump_path(remote.as_deref(), source == ColumnSource::Inserts)?;
            commands::columns(&inv, &remote, source, local_dump.as_deref(), &target).await
        }
        Commands::Data {
            remote,
            local_dump,
            include_partial,
            output: import,
        } => {
            let remote = config.dump_path(remote.as_deref(), true)?;
            commands::data(&inv, &remote, local_dump.as_deref(), include_partial, &import).await
        }
        Commands::Audit { remote, against } => {
            let remote = config.dump_path(remote.as_deref(), false)?;
            commands::audit(&inv, &remote, &against).await
        }
        Commands::Sync {
            remote,
            local_dump,
            output,
            migrations_dir,
            supabase,
        } => {
            let remote = config.dump_path(remote.as_deref(), false)?;
            let target = TargetArgs {
                output,
                migrations_dir,
                supabase,
            };
            commands::sync(&inv, &remote, local_dump.as_deref(), &target).await
        }
        Commands::Components {
            remote,
            tables,
            with_triggers,
            target,
        } => {
            let remote = config.dump_path(remote.as_deref(), false)?;
            commands::components(&inv, &remote, &tables, with_triggers, &target).await
        }
        Commands::Extract {
            dump,
            table,
            output: out,
        } => commands::extract(&inv, &dump, &table, out.as_deref()).await,
        Commands::StripColumn {
            dump,
            table,
            column,
            output: out,
        } => commands::strip_column(&inv, &dump, &table, &column, out.as_deref()).await,
        Commands::PatchNulls {
            dump,
            table,
            column,
            value,
            output: out,
        } => {
            if value.trim().is_empty() {
                bail!("--value must be a SQL literal, e.g. \"'n/a'\" or 0");
            }
            commands::patch_nulls(&inv, &dump, &table, &column, &value, out.as_deref()).await
        }
    }
}
