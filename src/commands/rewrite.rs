//! `extract`, `strip-column` and `patch-nulls`: data dump rewriting.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{generated_at, Invocation};
use crate::exit_codes;
use crate::output::{schema, CommandOutput, ExtractData, RewriteData};
use crate::rewrite::{self, RewriteResult};

/// `<dir>/<stem><suffix>.sql` next to the input dump.
fn sibling_path(dump: &Path, suffix: &str) -> PathBuf {
    let stem = dump
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dump".to_string());
    dump.with_file_name(format!("{}{}.sql", stem, suffix))
}

fn write_file(path: &Path, sql: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, sql).with_context(|| format!("Failed to write {}", path.display()))
}

pub async fn extract(
    inv: &Invocation<'_>,
    dump: &Path,
    table: &str,
    output: Option<&Path>,
) -> Result<i32> {
    let stmts = inv.load_dump(dump)?;
    let (sql, data) = rewrite::extract_table(&stmts, table, &generated_at());
    if data.statements.is_empty() {
        inv.output
            .warn(&format!("Warning: no INSERT or COPY statements for {}", table));
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("import_{}.sql", table.replace('.', "_"))));
    write_file(&path, &sql)?;

    if inv.output.is_json() {
        let out = ExtractData {
            table: table.to_string(),
            statements: data.statements.len(),
            rows: data.rows,
            output: path.display().to_string(),
        };
        CommandOutput::new(schema::EXTRACT, out, false).print()?;
        return Ok(exit_codes::NO_DIFFERENCES);
    }

    inv.output.data(&format!(
        "{}: {} statement(s), {} row(s)",
        table,
        data.statements.len(),
        data.rows
    ));
    inv.output.info(&format!(
        "{} {}",
        "Import file written to".green(),
        path.display()
    ));
    Ok(exit_codes::NO_DIFFERENCES)
}

fn report_rewrite(
    inv: &Invocation<'_>,
    schema_id: &'static str,
    table: &str,
    column: &str,
    result: &RewriteResult,
    path: &Path,
    what: &str,
) -> Result<i32> {
    let stats = &result.stats;

    if inv.output.is_json() {
        let out = RewriteData {
            table: table.to_string(),
            column: column.to_string(),
            stats: stats.clone(),
            output: path.display().to_string(),
        };
        CommandOutput::new(schema_id, out, false).print()?;
        return Ok(exit_codes::NO_DIFFERENCES);
    }

    inv.output.data(&format!(
        "{}.{}: {} statement(s) rewritten, {} {}",
        table, column, stats.rewritten, stats.changed, what
    ));
    if stats.skipped > 0 {
        inv.output.warn(&format!(
            "{} {} statement(s) for {} left unchanged (no column list or unknown column)",
            "Warning:".yellow(),
            stats.skipped,
            table
        ));
    }
    inv.output.info(&format!(
        "{} {}",
        "Rewritten dump written to".green(),
        path.display()
    ));
    Ok(exit_codes::NO_DIFFERENCES)
}

pub async fn strip_column(
    inv: &Invocation<'_>,
    dump: &Path,
    table: &str,
    column: &str,
    output: Option<&Path>,
) -> Result<i32> {
    let stmts = inv.load_dump(dump)?;
    let result = rewrite::strip_column(&stmts, table, column);

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_path(dump, &format!("_without_{}", column)));
    write_file(&path, &result.to_sql())?;

    report_rewrite(
        inv,
        schema::STRIP_COLUMN,
        table,
        column,
        &result,
        &path,
        "value(s) removed",
    )
}

pub async fn patch_nulls(
    inv: &Invocation<'_>,
    dump: &Path,
    table: &str,
    column: &str,
    value: &str,
    output: Option<&Path>,
) -> Result<i32> {
    let stmts = inv.load_dump(dump)?;
    let result = rewrite::patch_nulls(&stmts, table, column, value);

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_path(dump, "_patched"));
    write_file(&path, &result.to_sql())?;

    report_rewrite(
        inv,
        schema::PATCH_NULLS,
        table,
        column,
        &result,
        &path,
        "NULL(s) replaced",
    )
}
