//! `sync`: write a structure migration and a functions migration from an
//! object comparison.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::objects::local_catalog;
use super::{exit_code, file_label, today, Invocation, TargetArgs};
use crate::catalog::ObjectKind;
use crate::compare::{compare_catalogs, Comparison, NormalizeOptions};
use crate::dump::extract_objects;
use crate::migration::{functions_migration, structure_migration, write_migration, MigrationTarget};
use crate::output::{schema, CommandOutput, SyncData};
use crate::report::format_catalog_summary;

const STRUCTURE_NAME: &str = "sync_remote_database_structure";
const FUNCTIONS_NAME: &str = "sync_remote_database_functions";

/// With `-o`, the two migrations are written as timestamped files into
/// that directory instead of a single file.
fn sync_target(inv: &Invocation<'_>, args: &TargetArgs, name: &str) -> MigrationTarget {
    match &args.output {
        Some(dir) => MigrationTarget::Directory {
            dir: dir.clone(),
            name: name.to_string(),
        },
        None => inv.migration_target(args, name, &format!("{}.sql", name)),
    }
}

pub async fn sync(
    inv: &Invocation<'_>,
    remote: &Path,
    local_dump: Option<&Path>,
    target: &TargetArgs,
) -> Result<i32> {
    let remote_catalog = extract_objects(&inv.load_dump(remote)?, &inv.filter);
    let local = local_catalog(inv, local_dump).await?;

    let cmp = compare_catalogs(
        &remote_catalog,
        &local,
        &NormalizeOptions::strip_schema(inv.filter.schema.clone()),
    );
    let no_functions = Comparison::default();
    let function_cmp = cmp.get(ObjectKind::Functions).unwrap_or(&no_functions);

    let date = today();
    let structure = structure_migration(&cmp, &date);
    let functions = functions_migration(function_cmp, &date);

    let structure_path =
        write_migration(&sync_target(inv, target, STRUCTURE_NAME), &structure).await?;
    let functions_path =
        write_migration(&sync_target(inv, target, FUNCTIONS_NAME), &functions).await?;

    let function_issues = function_cmp.issues();
    let structure_issues = cmp.total_issues() - function_issues;
    let differences = !cmp.is_clean();

    if inv.output.is_json() {
        let data = SyncData {
            structure_issues,
            function_issues,
            structure: structure_path.display().to_string(),
            functions: functions_path.display().to_string(),
        };
        CommandOutput::new(schema::SYNC, data, differences).print()?;
        return Ok(exit_code(differences));
    }

    inv.output.data(&format_catalog_summary(
        &cmp,
        &file_label(remote),
        &inv.local_label(local_dump),
    ));
    inv.output.info(&format!(
        "{} {}",
        "Structure migration written to".green(),
        structure_path.display()
    ));
    inv.output.info(&format!(
        "{} {}",
        "Functions migration written to".green(),
        functions_path.display()
    ));

    Ok(exit_code(differences))
}
