//! `objects`: compare tables, functions, triggers, policies and indexes.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use super::{connect, exit_code, file_label, generated_at, Invocation};
use crate::catalog::{ObjectCatalog, ObjectFilter};
use crate::compare::{compare_catalogs, NormalizeOptions};
use crate::dump::extract_objects;
use crate::introspect;
use crate::output::{schema, CommandOutput, ObjectsData};
use crate::report::{format_catalog_summary, objects_report};

/// Report heading scope: `rd_*` for a prefix, `All` otherwise.
pub(crate) fn scope_label(filter: &ObjectFilter) -> String {
    match &filter.prefix {
        Some(prefix) => format!("{}*", prefix),
        None => "All".to_string(),
    }
}

/// Object catalog of the local side: another dump, or the database through
/// pg_dump and the catalogs.
pub(crate) async fn local_catalog(
    inv: &Invocation<'_>,
    local_dump: Option<&Path>,
) -> Result<ObjectCatalog> {
    match local_dump {
        Some(path) => Ok(extract_objects(&inv.load_dump(path)?, &inv.filter)),
        None => {
            let client = connect(&inv.database_url, inv.output).await?;
            introspect::local_objects(
                &client,
                &inv.config.tool_path("pg_dump"),
                &inv.database_url,
                &inv.filter,
                inv.output,
            )
            .await
        }
    }
}

pub async fn objects(
    inv: &Invocation<'_>,
    remote: &Path,
    local_dump: Option<&Path>,
    report_path: &Path,
) -> Result<i32> {
    let remote_catalog = extract_objects(&inv.load_dump(remote)?, &inv.filter);
    let local = local_catalog(inv, local_dump).await?;
    inv.output.verbose(&format!(
        "  {} remote objects, {} local objects",
        remote_catalog.total(),
        local.total()
    ));

    let cmp = compare_catalogs(
        &remote_catalog,
        &local,
        &NormalizeOptions::strip_schema(inv.filter.schema.clone()),
    );

    let scope = scope_label(&inv.filter);
    let report = objects_report(&cmp, &scope, &generated_at());
    fs::write(report_path, report)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    let differences = !cmp.is_clean();

    if inv.output.is_json() {
        let data = ObjectsData::new(&scope, &cmp, report_path.display().to_string());
        CommandOutput::new(schema::OBJECTS, data, differences).print()?;
        return Ok(exit_code(differences));
    }

    inv.output.data(&format_catalog_summary(
        &cmp,
        &file_label(remote),
        &inv.local_label(local_dump),
    ));
    inv.output.info(&format!(
        "{} {}",
        "Report written to".green(),
        report_path.display()
    ));

    Ok(exit_code(differences))
}
