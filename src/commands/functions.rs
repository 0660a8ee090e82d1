//! `functions`: compare function definitions and write a Markdown report.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use super::{connect, exit_code, file_label, generated_at, Invocation};
use crate::compare::{compare_definitions, NormalizeOptions};
use crate::dump::extract_functions;
use crate::introspect;
use crate::output::{schema, BucketNames, CommandOutput, FunctionsData};
use crate::report::{format_comparison, functions_report};

pub async fn functions(
    inv: &Invocation<'_>,
    remote: &Path,
    local_dump: Option<&Path>,
    report_path: &Path,
) -> Result<i32> {
    // Every function in the schema, regardless of the table prefix
    let filter = inv.schema_filter();

    let remote_stmts = inv.load_dump(remote)?;
    let remote_defs = extract_functions(&remote_stmts, &filter);
    inv.output
        .verbose(&format!("  {} remote functions", remote_defs.len()));

    let local_defs = match local_dump {
        Some(path) => extract_functions(&inv.load_dump(path)?, &filter),
        None => {
            let client = connect(&inv.database_url, inv.output).await?;
            introspect::functions(&client, &filter).await?
        }
    };
    inv.output
        .verbose(&format!("  {} local functions", local_defs.len()));

    let cmp = compare_definitions(
        &remote_defs,
        &local_defs,
        &NormalizeOptions::strip_schema(filter.schema.clone()),
    );

    let report = functions_report(&cmp, &generated_at());
    fs::write(report_path, report)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    let differences = !cmp.is_clean();

    if inv.output.is_json() {
        let data = FunctionsData {
            functions: BucketNames::from(&cmp),
            issues: cmp.issues(),
            report: report_path.display().to_string(),
        };
        CommandOutput::new(schema::FUNCTIONS, data, differences).print()?;
        return Ok(exit_code(differences));
    }

    inv.output.data(&format_comparison(
        &cmp,
        "Functions",
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
