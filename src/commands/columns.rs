//! `columns`: find remote columns missing locally and emit ADD COLUMN
//! statements for them.

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use std::path::Path;

use super::{connect, exit_code, file_label, today, Invocation, TargetArgs};
use crate::catalog::TableColumns;
use crate::compare::compare_columns;
use crate::dump::{extract_insert_columns, table_columns};
use crate::introspect;
use crate::migration::{add_columns_migration, write_migration};
use crate::output::{schema, ColumnsData, CommandOutput};
use crate::report::format_column_comparison;

/// Where remote column lists come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColumnSource {
    /// `CREATE TABLE` bodies (full definitions)
    CreateTable,
    /// INSERT / COPY column lists of a data dump (names only)
    Inserts,
}

impl ColumnSource {
    fn as_str(&self) -> &'static str {
        match self {
            ColumnSource::CreateTable => "create-table",
            ColumnSource::Inserts => "inserts",
        }
    }
}

pub async fn columns(
    inv: &Invocation<'_>,
    remote: &Path,
    source: ColumnSource,
    local_dump: Option<&Path>,
    target: &TargetArgs,
) -> Result<i32> {
    let remote_stmts = inv.load_dump(remote)?;
    let remote_columns: TableColumns = match source {
        ColumnSource::CreateTable => table_columns(&remote_stmts, &inv.filter),
        ColumnSource::Inserts => extract_insert_columns(&remote_stmts, &inv.filter),
    };

    let local_columns = match local_dump {
        Some(path) => table_columns(&inv.load_dump(path)?, &inv.filter),
        None => {
            let client = connect(&inv.database_url, inv.output).await?;
            introspect::table_columns(&client, &inv.filter).await?
        }
    };
    inv.output.verbose(&format!(
        "  {} remote tables, {} local tables",
        remote_columns.len(),
        local_columns.len()
    ));

    let cmp = compare_columns(&remote_columns, &local_columns);

    // Only missing columns and tables need a migration; extra local columns
    // are reported but left alone.
    let needs_migration = cmp.missing_column_count() > 0 || !cmp.missing_tables.is_empty();
    let migration = if needs_migration {
        let sql = add_columns_migration(&cmp, &inv.filter.schema, &today());
        let target = inv.migration_target(target, "add_missing_columns", "add_missing_columns.sql");
        Some(write_migration(&target, &sql).await?)
    } else {
        None
    };

    let differences = !cmp.is_clean();

    if inv.output.is_json() {
        let data = ColumnsData {
            source: source.as_str(),
            missing_columns: cmp.missing_column_count(),
            comparison: cmp,
            migration: migration.map(|p| p.display().to_string()),
        };
        CommandOutput::new(schema::COLUMNS, data, differences).print()?;
        return Ok(exit_code(differences));
    }

    inv.output.data(&format_column_comparison(
        &cmp,
        &file_label(remote),
        &inv.local_label(local_dump),
    ));
    match migration {
        Some(path) => inv.output.info(&format!(
            "{} {}",
            "Migration written to".green(),
            path.display()
        )),
        None => inv.output.info("No missing columns; no migration written."),
    }

    Ok(exit_code(differences))
}
