//! Output layer for pgreconcile CLI.
//!
//! Centralizes stdout/stderr separation and human vs JSON output modes.
//! - stdout: data (the "answer" - summaries, JSON)
//! - stderr: diagnostics (progress, queries, human-mode errors)

use crate::catalog::ObjectKind;
use crate::compare::{CatalogComparison, ColumnComparison, Comparison, TableCount};
use crate::rewrite::RewriteStats;
use serde::Serialize;
use std::io::{self, Write};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Output helper that centralizes all CLI output
#[derive(Debug, Clone)]
pub struct Output {
    pub mode: OutputMode,
    pub quiet: bool,
    pub verbose: bool,
}

impl Output {
    pub fn new(json: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            mode: if json {
                OutputMode::Json
            } else {
                OutputMode::Human
            },
            quiet,
            verbose,
        }
    }

    /// Write data to stdout (the command's "answer")
    /// Suppressed in JSON mode, where the envelope is the only stdout output
    pub fn data(&self, message: &str) {
        if self.mode == OutputMode::Json {
            return;
        }
        println!("{}", message);
    }

    /// Write a diagnostic/progress message to stderr
    /// Suppressed in JSON mode and when --quiet is set
    pub fn info(&self, message: &str) {
        if self.mode == OutputMode::Json || self.quiet {
            return;
        }
        eprintln!("{}", message);
    }

    /// Write a verbose diagnostic message to stderr
    /// Only shown with --verbose in human mode
    pub fn verbose(&self, message: &str) {
        if self.mode == OutputMode::Json || self.quiet || !self.verbose {
            return;
        }
        eprintln!("{}", message);
    }

    /// Write a warning to stderr
    /// Shown in human mode unless --quiet, suppressed in JSON mode
    pub fn warn(&self, message: &str) {
        if self.mode == OutputMode::Json || self.quiet {
            return;
        }
        eprintln!("{}", message);
    }

    /// Check if we're in JSON mode
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Flush stdout (useful before exiting)
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

// =============================================================================
// JSON Envelope
// =============================================================================

/// Schema version for command JSON outputs.
/// Follows semver: breaking=major, additive=minor, bugfix=patch.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Tool version from Cargo.toml.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON error response using envelope structure (written to stdout with non-zero exit).
/// Matches CommandOutput structure so consumers get consistent envelope format.
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub ok: bool,
    pub schema_id: &'static str,
    pub schema_version: &'static str,
    pub tool_version: &'static str,
    pub generated_at: String,
    pub severity: &'static str,
    pub errors: Vec<JsonErrorInfo>,
    /// Always null for error responses
    pub data: Option<()>,
}

#[derive(Debug, Serialize)]
pub struct JsonErrorInfo {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JsonError {
    pub const SCHEMA_ID: &'static str = "pgreconcile.error";

    pub fn new(message: impl Into<String>) -> Self {
        Self::build("usage_error", message.into(), None)
    }

    pub fn with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::build("internal_error", message.into(), Some(details.into()))
    }

    /// Override the error code (`connection_error`, `config_error`, ...)
    pub fn with_code(mut self, code: &'static str) -> Self {
        for err in &mut self.errors {
            err.code = code;
        }
        self
    }

    fn build(code: &'static str, message: String, details: Option<String>) -> Self {
        Self {
            ok: false,
            schema_id: Self::SCHEMA_ID,
            schema_version: SCHEMA_VERSION,
            tool_version: TOOL_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            severity: "error",
            errors: vec![JsonErrorInfo {
                code,
                message,
                details,
            }],
            data: None,
        }
    }

    /// Print this error as JSON to stdout
    /// Panics if serialization fails (should never happen for JsonError)
    pub fn print(&self) {
        let json =
            serde_json::to_string_pretty(self).expect("JsonError serialization should never fail");
        println!("{}", json);
    }
}

/// Wrapper for command JSON output.
/// Includes schema metadata for stable automation and versioning.
#[derive(Debug, Serialize)]
pub struct CommandOutput<T: Serialize> {
    pub ok: bool,
    pub schema_id: &'static str,
    pub schema_version: &'static str,
    /// pgreconcile version that generated this output
    pub tool_version: &'static str,
    /// ISO 8601 timestamp when this output was generated
    pub generated_at: String,
    /// Whether the two sides disagree (mirrors exit code 1)
    pub differences: bool,
    /// Command-specific data payload
    pub data: T,
}

impl<T: Serialize> CommandOutput<T> {
    pub fn new(schema_id: &'static str, data: T, differences: bool) -> Self {
        Self {
            ok: true,
            schema_id,
            schema_version: SCHEMA_VERSION,
            tool_version: TOOL_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            differences,
            data,
        }
    }

    /// Print this output as JSON to stdout.
    pub fn print(&self) -> Result<(), serde_json::Error> {
        let json = serde_json::to_string_pretty(self)?;
        println!("{}", json);
        Ok(())
    }
}

/// Schema IDs for command outputs.
pub mod schema {
    pub const FUNCTIONS: &str = "pgreconcile.functions";
    pub const OBJECTS: &str = "pgreconcile.objects";
    pub const COLUMNS: &str = "pgreconcile.columns";
    pub const DATA: &str = "pgreconcile.data";
    pub const AUDIT: &str = "pgreconcile.audit";
    pub const SYNC: &str = "pgreconcile.sync";
    pub const COMPONENTS: &str = "pgreconcile.components";
    pub const EXTRACT: &str = "pgreconcile.extract";
    pub const STRIP_COLUMN: &str = "pgreconcile.strip_column";
    pub const PATCH_NULLS: &str = "pgreconcile.patch_nulls";
}

// =============================================================================
// Command Payloads
// =============================================================================

/// Object names per comparison bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BucketNames {
    pub same: Vec<String>,
    pub different: Vec<String>,
    pub remote_only: Vec<String>,
    pub local_only: Vec<String>,
}

impl From<&Comparison> for BucketNames {
    fn from(cmp: &Comparison) -> Self {
        Self {
            same: cmp.same.clone(),
            different: cmp.different.iter().map(|d| d.name.clone()).collect(),
            remote_only: cmp.remote_only.iter().map(|d| d.name.clone()).collect(),
            local_only: cmp.local_only.iter().map(|d| d.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FunctionsData {
    pub functions: BucketNames,
    pub issues: usize,
    pub report: String,
}

#[derive(Debug, Serialize)]
pub struct KindSummary {
    pub kind: ObjectKind,
    #[serde(flatten)]
    pub names: BucketNames,
}

#[derive(Debug, Serialize)]
pub struct ObjectsData {
    pub scope: String,
    pub kinds: Vec<KindSummary>,
    pub total_issues: usize,
    pub report: String,
}

impl ObjectsData {
    pub fn new(scope: &str, cmp: &CatalogComparison, report: String) -> Self {
        Self {
            scope: scope.to_string(),
            kinds: cmp
                .kinds
                .iter()
                .map(|(kind, c)| KindSummary {
                    kind: *kind,
                    names: c.into(),
                })
                .collect(),
            total_issues: cmp.total_issues(),
            report,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ColumnsData {
    pub source: &'static str,
    pub comparison: ColumnComparison,
    pub missing_columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataCountsData {
    pub tables: Vec<TableCount>,
    pub imported: Vec<String>,
    pub rows: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditData {
    pub against: String,
    pub files: usize,
    pub comparison: ColumnComparison,
}

#[derive(Debug, Serialize)]
pub struct SyncData {
    pub structure_issues: usize,
    pub function_issues: usize,
    pub structure: String,
    pub functions: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ComponentCounts {
    pub indexes: usize,
    pub constraints: usize,
    pub policies: usize,
    pub tables: usize,
    pub functions: usize,
    pub triggers: usize,
}

#[derive(Debug, Serialize)]
pub struct ComponentsData {
    pub scope: Vec<String>,
    pub counts: ComponentCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractData {
    pub table: String,
    pub statements: usize,
    pub rows: u64,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct RewriteData {
    pub table: String,
    pub column: String,
    #[serde(flatten)]
    pub stats: RewriteStats,
    pub output: String,
}
