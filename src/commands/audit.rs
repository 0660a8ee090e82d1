//! `audit`: check a migration file or directory against the remote dump.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{exit_code, file_label, Invocation};
use crate::catalog::{ObjectFilter, TableColumns};
use crate::compare::compare_columns;
use crate::dump::{added_columns, table_columns, Statement};
use crate::output::{schema, AuditData, CommandOutput};
use crate::report::format_column_comparison;

/// `.sql` files to audit, in name order. A file is returned as-is.
fn migration_files(against: &Path) -> Result<Vec<PathBuf>> {
    if against.is_file() {
        return Ok(vec![against.to_path_buf()]);
    }
    if !against.is_dir() {
        bail!("Migration path not found: {}", against.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(against).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to read {}", against.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Columns the migrations define: `CREATE TABLE` bodies plus later
/// `ALTER TABLE ... ADD COLUMN`. A table that is only altered still gets
/// an entry.
fn migration_columns(stmts: &[Statement], filter: &ObjectFilter) -> TableColumns {
    let mut columns = table_columns(stmts, filter);
    for (table, added) in added_columns(stmts, filter) {
        let existing = columns.entry(table).or_default();
        for col in added {
            if !existing.iter().any(|c| c.name == col.name) {
                existing.push(col);
            }
        }
    }
    columns
}

pub async fn audit(inv: &Invocation<'_>, remote: &Path, against: &Path) -> Result<i32> {
    let remote_columns = table_columns(&inv.load_dump(remote)?, &inv.filter);

    let files = migration_files(against)?;
    if files.is_empty() {
        bail!("No .sql files found in {}", against.display());
    }
    let mut stmts = Vec::new();
    for file in &files {
        stmts.extend(inv.load_dump(file)?);
    }
    let local_columns = migration_columns(&stmts, &inv.filter);

    inv.output.verbose(&format!(
        "  remote: {} tables, migrations: {} tables in {} file(s)",
        remote_columns.len(),
        local_columns.len(),
        files.len()
    ));

    let cmp = compare_columns(&remote_columns, &local_columns);
    let differences = !cmp.is_clean();

    if inv.output.is_json() {
        let data = AuditData {
            against: against.display().to_string(),
            files: files.len(),
            comparison: cmp,
        };
        CommandOutput::new(schema::AUDIT, data, differences).print()?;
        return Ok(exit_code(differences));
    }

    inv.output.data(&format_column_comparison(
        &cmp,
        &file_label(remote),
        &file_label(against),
    ));
    if differences {
        inv.output.info(
            &"Migrations would not reproduce the remote tables."
                .red()
                .to_string(),
        );
    } else {
        inv.output
            .info(&"All tables match the remote dump.".green().to_string());
    }

    Ok(exit_code(differences))
}
