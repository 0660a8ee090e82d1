//! Migration and import file generation.
//!
//! Generators return SQL text; [`write_migration`] decides where it lands
//! (a plain file, a timestamped file in a migrations directory, or a file
//! created by `supabase migration new`).

use crate::catalog::ObjectKind;
use crate::compare::{CatalogComparison, ColumnComparison, Comparison};
use crate::rewrite::TableData;
use crate::sql::display_ident;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::process::Command;

const BANNER: &str =
    "-- =============================================================================";

/// Append `;` unless the statement already ends with one.
fn terminated(sql: &str) -> String {
    let trimmed = sql.trim_end();
    if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{};", trimmed)
    }
}

/// Comment out every line of `sql`.
fn commented(sql: &str) -> String {
    terminated(sql)
        .lines()
        .map(|l| format!("-- {}", l).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn header(title: &str, purpose: &str, date: &str) -> String {
    format!("-- {}\n-- Purpose: {}\n-- Date: {}\n\n", title, purpose, date)
}

// =============================================================================
// Columns
// =============================================================================

/// `ALTER TABLE ... ADD COLUMN IF NOT EXISTS` for every remote column
/// missing locally. Columns without a known definition become `TEXT`.
pub fn add_columns_migration(cmp: &ColumnComparison, schema: &str, date: &str) -> String {
    let mut out = header(
        "Sync Remote Schema Differences",
        "Add missing columns found in remote dump",
        date,
    );
    out.push_str("BEGIN;\n\n");

    if !cmp.missing_tables.is_empty() {
        out.push_str("-- MISSING TABLES - these must be created before this migration:\n");
        for table in &cmp.missing_tables {
            out.push_str(&format!(
                "-- CREATE TABLE {}.{} (...);\n",
                display_ident(schema),
                display_ident(table)
            ));
        }
        out.push('\n');
    }

    let tables: Vec<_> = cmp.tables.iter().filter(|t| !t.missing.is_empty()).collect();
    if tables.is_empty() {
        out.push_str("-- No missing columns\n\n");
    }
    for table in tables {
        out.push_str(&format!("-- Add missing columns to {}\n", table.table));
        for col in &table.missing {
            let definition = if col.definition.is_empty() {
                "TEXT"
            } else {
                col.definition.as_str()
            };
            out.push_str(&format!(
                "ALTER TABLE {}.{} ADD COLUMN IF NOT EXISTS {} {};\n",
                display_ident(schema),
                display_ident(&table.table),
                display_ident(&col.name),
                definition
            ));
        }
        out.push('\n');
    }

    out.push_str("COMMIT;\n");
    out
}

// =============================================================================
// Structure and Functions
// =============================================================================

/// Missing tables, triggers, policies and indexes from an object comparison.
pub fn structure_migration(cmp: &CatalogComparison, date: &str) -> String {
    let mut out = header(
        "Sync Remote Database Structure",
        "Align local database structure with remote database",
        date,
    );
    out.push_str("-- Includes: Table changes, policies, triggers, indexes\n\n");
    out.push_str("BEGIN;\n\n");

    let mut changed = false;

    if let Some(tables) = cmp.get(ObjectKind::Tables) {
        let mut lines = Vec::new();
        for pair in &tables.different {
            lines.push(format!(
                "-- Table {} has differences - manual review needed",
                pair.name
            ));
        }
        for missing in &tables.remote_only {
            lines.push(format!("-- Create missing table: {}", missing.name));
            lines.push(terminated(&missing.definition));
        }
        if !lines.is_empty() {
            out.push_str("-- TABLE CHANGES\n");
            out.push_str(&lines.join("\n"));
            out.push_str("\n\n");
            changed = true;
        }
    }

    for (kind, title) in [
        (ObjectKind::Triggers, "MISSING TRIGGERS"),
        (ObjectKind::Policies, "MISSING RLS POLICIES"),
        (ObjectKind::Indexes, "MISSING INDEXES"),
    ] {
        let Some(c) = cmp.get(kind) else { continue };
        if c.remote_only.is_empty() {
            continue;
        }
        out.push_str(&format!("-- {}\n", title));
        for missing in &c.remote_only {
            out.push_str(&terminated(&missing.definition));
            out.push('\n');
        }
        out.push('\n');
        changed = true;
    }

    if !changed {
        out.push_str("-- No structural changes needed\n\n");
    }
    out.push_str("COMMIT;\n");
    out
}

/// Missing functions in full; differing functions as commented-out
/// remote definitions for manual review.
pub fn functions_migration(cmp: &Comparison, date: &str) -> String {
    let mut out = header(
        "Sync Remote Database Functions",
        "Add missing functions from remote database",
        date,
    );
    out.push_str("BEGIN;\n\n");

    if !cmp.remote_only.is_empty() {
        out.push_str(&format!("-- MISSING FUNCTIONS ({})\n", cmp.remote_only.len()));
        for func in &cmp.remote_only {
            out.push_str(&format!("-- Function: {}\n", func.name));
            out.push_str(&terminated(&func.definition));
            out.push_str("\n\n");
        }
    }

    if !cmp.different.is_empty() {
        out.push_str(&format!("-- DIFFERENT FUNCTIONS ({})\n", cmp.different.len()));
        out.push_str("-- These functions exist locally but differ from remote\n");
        out.push_str("-- Review and update as needed\n\n");
        for func in &cmp.different {
            out.push_str(&format!("-- Function: {} (REVIEW NEEDED)\n", func.name));
            out.push_str(&commented(&func.remote));
            out.push_str("\n\n");
        }
    }

    if cmp.remote_only.is_empty() && cmp.different.is_empty() {
        out.push_str("-- No function changes needed\n\n");
    }
    out.push_str("COMMIT;\n");
    out
}

// =============================================================================
// Data Import
// =============================================================================

/// Import file for the given tables with triggers disabled for the load.
pub fn import_script(tables: &[TableData], date: &str) -> String {
    let names: Vec<&str> = tables.iter().map(|t| t.table.as_str()).collect();
    let total: u64 = tables.iter().map(|t| t.rows).sum();

    let mut out = String::new();
    out.push_str("-- Import from remote database dump\n");
    out.push_str(&format!("-- Generated: {}\n", date));
    out.push_str(&format!("-- Tables: {}\n", names.join(", ")));
    out.push_str(&format!("-- Total records: {}\n\n", total));
    out.push_str("BEGIN;\n\n");
    out.push_str("-- Disable triggers during import\n");
    out.push_str("SET session_replication_role = replica;\n");

    for table in tables {
        out.push_str(&format!("\n-- {} data ({} records)\n", table.table, table.rows));
        for stmt in &table.statements {
            out.push_str(stmt);
            out.push('\n');
        }
    }

    out.push_str("\n-- Re-enable triggers\n");
    out.push_str("SET session_replication_role = DEFAULT;\n\n");
    out.push_str("COMMIT;\n");
    out
}

// =============================================================================
// Components
// =============================================================================

/// Statements pulled from a dump for the `components` migration.
#[derive(Debug, Clone, Default)]
pub struct ComponentSections {
    pub indexes: Vec<String>,
    /// Unique, check and exclusion constraints
    pub constraints: Vec<String>,
    pub policies: Vec<String>,
    /// Extra tables followed by their primary keys
    pub tables: Vec<String>,
    pub functions: Vec<String>,
    pub triggers: Vec<String>,
}

impl ComponentSections {
    pub fn total(&self) -> usize {
        self.indexes.len()
            + self.constraints.len()
            + self.policies.len()
            + self.tables.len()
            + self.functions.len()
            + self.triggers.len()
    }
}

/// Banner-separated sections; empty sections are omitted.
pub fn components_migration(sections: &ComponentSections, scope: &str, date: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "-- Add missing constraints, indexes, policies and triggers for {}\n",
        scope
    ));
    out.push_str("-- Extracted from remote schema dump\n");
    out.push_str(&format!("-- Date: {}\n\n", date));

    let parts: [(&str, &Vec<String>); 6] = [
        ("Missing tables", &sections.tables),
        ("Trigger functions", &sections.functions),
        ("Indexes", &sections.indexes),
        ("Additional constraints (non-FK, non-PK)", &sections.constraints),
        ("Row Level Security (RLS) policies", &sections.policies),
        ("Triggers", &sections.triggers),
    ];

    let mut number = 0;
    for (title, stmts) in parts {
        if stmts.is_empty() {
            continue;
        }
        number += 1;
        out.push_str(&format!("{}\n-- SECTION {}: {}\n{}\n\n", BANNER, number, title, BANNER));
        for stmt in stmts {
            out.push_str(&terminated(stmt));
            out.push_str("\n\n");
        }
    }

    if number == 0 {
        out.push_str("-- Nothing to add\n");
    }
    out
}

// =============================================================================
// Output Targets
// =============================================================================

/// Where a generated migration is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationTarget {
    /// Exact file path
    File(PathBuf),
    /// `<dir>/<YYYYMMDDHHMMSS>_<name>.sql`
    Directory { dir: PathBuf, name: String },
    /// File created by `<program> migration new <name>`
    Supabase { program: String, name: String },
}

/// Write `sql` to the target and return the path written.
pub async fn write_migration(target: &MigrationTarget, sql: &str) -> Result<PathBuf> {
    let path = match target {
        MigrationTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            path.clone()
        }
        MigrationTarget::Directory { dir, name } => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            timestamped_path(dir, name)
        }
        MigrationTarget::Supabase { program, name } => supabase_new(program, name).await?,
    };

    fs::write(&path, sql).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn timestamped_path(dir: &Path, name: &str) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    dir.join(format!("{}_{}.sql", timestamp, name))
}

async fn supabase_new(program: &str, name: &str) -> Result<PathBuf> {
    let output = Command::new(program)
        .args(["migration", "new", name])
        .output()
        .await
        .with_context(|| format!("Failed to run {} migration new", program))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        bail!("supabase migration new failed:\n{}", stderr);
    }

    stdout
        .lines()
        .chain(stderr.lines())
        .find_map(created_migration_path)
        .with_context(|| {
            format!(
                "Could not determine migration filename from supabase output:\n{}",
                stdout
            )
        })
}

/// Path from a `Created new migration at <path>` line.
fn created_migration_path(line: &str) -> Option<PathBuf> {
    let (_, rest) = line.split_once("Created new migration at")?;
    let path = rest.trim().trim_end_matches('.');
    (!path.is_empty()).then(|| PathBuf::from(path))
}
