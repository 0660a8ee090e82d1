//! `data`: compare row counts per table and write an import file for the
//! tables missing data locally.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::{connect, exit_code, today, Invocation};
use crate::compare::{compare_counts, DataStatus, TableCount};
use crate::dump::count_rows;
use crate::introspect;
use crate::migration::{import_script, write_migration, MigrationTarget};
use crate::output::{schema, CommandOutput, DataCountsData};
use crate::report::format_counts;
use crate::rewrite::{table_data, TableData};
use crate::sql::quote_ident;

/// Tables whose remote rows should be imported.
fn tables_to_import(counts: &[TableCount], include_partial: bool) -> Vec<String> {
    counts
        .iter()
        .filter(|c| match c.status {
            DataStatus::NeedsImport => true,
            DataStatus::PartialData => include_partial,
            _ => false,
        })
        .map(|c| c.table.clone())
        .collect()
}

pub async fn data(
    inv: &Invocation<'_>,
    remote: &Path,
    local_dump: Option<&Path>,
    include_partial: bool,
    import_path: &Path,
) -> Result<i32> {
    let remote_stmts = inv.load_dump(remote)?;
    let remote_counts = count_rows(&remote_stmts, &inv.filter);

    let local_counts = match local_dump {
        Some(path) => count_rows(&inv.load_dump(path)?, &inv.filter),
        None => {
            let client = connect(&inv.database_url, inv.output).await?;
            let tables = introspect::list_tables(&client, &inv.filter).await?;
            inv.output
                .info(&format!("Counting rows in {} local tables...", tables.len()).dimmed().to_string());
            introspect::row_counts(&client, &inv.filter.schema, &tables, inv.output).await?
        }
    };

    let counts = compare_counts(&remote_counts, &local_counts);
    let selected = tables_to_import(&counts, include_partial);

    let mut rows = 0;
    let written = if selected.is_empty() {
        None
    } else {
        let tables: Vec<_> = selected
            .iter()
            .map(|t| {
                // Qualified so same-named tables in other schemas (auth.users) stay out
                let qualified = format!("{}.{}", quote_ident(&inv.filter.schema), quote_ident(t));
                TableData {
                    table: t.clone(),
                    ..table_data(&remote_stmts, &qualified)
                }
            })
            .collect();
        rows = tables.iter().map(|t| t.rows).sum();
        let sql = import_script(&tables, &today());
        let target = MigrationTarget::File(import_path.to_path_buf());
        Some(write_migration(&target, &sql).await?)
    };

    let differences = counts.iter().any(|c| c.status.needs_rows());

    if inv.output.is_json() {
        let data = DataCountsData {
            tables: counts,
            imported: selected,
            rows,
            output: written.map(|p| p.display().to_string()),
        };
        CommandOutput::new(schema::DATA, data, differences).print()?;
        return Ok(exit_code(differences));
    }

    inv.output.data(&format_counts(&counts));
    match written {
        Some(path) => inv.output.info(&format!(
            "{} {} ({} tables, {} rows)",
            "Import file written to".green(),
            path.display(),
            selected.len(),
            rows
        )),
        None if differences => inv.output.info(
            "Only partially imported tables differ; rerun with --include-partial to import them.",
        ),
        None => inv.output.info("No tables need importing."),
    }

    Ok(exit_code(differences))
}
