//! `components`: pull indexes, constraints, policies and optionally
//! triggers for the prefixed tables out of the remote dump, plus whole
//! extra tables named on the command line.

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;

use super::objects::scope_label;
use super::{today, Invocation, TargetArgs};
use crate::dump::{
    extract_constraints, extract_functions, extract_indexes, extract_policies, extract_tables,
    triggers, ConstraintKind, Statement,
};
use crate::exit_codes;
use crate::migration::{components_migration, write_migration, ComponentSections};
use crate::output::{schema, CommandOutput, ComponentCounts, ComponentsData};

/// Collect the statements for each section of the components migration.
fn collect_sections(
    inv: &Invocation<'_>,
    stmts: &[Statement],
    extra_tables: &[String],
    with_triggers: bool,
) -> ComponentSections {
    let filter = &inv.filter;
    let mut sections = ComponentSections {
        indexes: extract_indexes(stmts, filter).into_values().collect(),
        policies: extract_policies(stmts, filter).into_values().collect(),
        ..Default::default()
    };

    // Primary keys come with the tables; foreign keys may point at tables
    // that do not exist yet.
    sections.constraints = extract_constraints(stmts, filter)
        .into_iter()
        .filter(|c| !matches!(c.kind, ConstraintKind::PrimaryKey | ConstraintKind::ForeignKey))
        .map(|c| c.definition)
        .collect();

    if !extra_tables.is_empty() {
        let all = inv.schema_filter();
        let tables = extract_tables(stmts, &all);
        let keys = extract_constraints(stmts, &all);
        for name in extra_tables {
            let Some(create) = tables.get(name) else {
                inv.output
                    .warn(&format!("Warning: table {} not found in remote dump", name));
                continue;
            };
            sections.tables.push(create.clone());
            sections.tables.extend(
                keys.iter()
                    .filter(|c| &c.table == name && c.kind == ConstraintKind::PrimaryKey)
                    .map(|c| c.definition.clone()),
            );
        }
    }

    if with_triggers {
        let found = triggers(stmts, filter);
        let wanted: BTreeSet<&str> = found.iter().filter_map(|t| t.function.as_deref()).collect();
        let functions = extract_functions(stmts, &inv.schema_filter());
        for name in &wanted {
            match functions.get(*name) {
                Some(def) => sections.functions.push(def.clone()),
                None => inv.output.warn(&format!(
                    "Warning: trigger function {} not found in remote dump",
                    name
                )),
            }
        }
        sections.triggers = found.into_iter().map(|t| t.definition).collect();
    }

    sections
}

pub async fn components(
    inv: &Invocation<'_>,
    remote: &Path,
    extra_tables: &[String],
    with_triggers: bool,
    target: &TargetArgs,
) -> Result<i32> {
    let stmts = inv.load_dump(remote)?;
    let sections = collect_sections(inv, &stmts, extra_tables, with_triggers);

    let counts = ComponentCounts {
        indexes: sections.indexes.len(),
        constraints: sections.constraints.len(),
        policies: sections.policies.len(),
        tables: sections.tables.len(),
        functions: sections.functions.len(),
        triggers: sections.triggers.len(),
    };
    let total = sections.total();

    let mut scope = vec![scope_label(&inv.filter)];
    scope.extend(extra_tables.iter().cloned());

    let written = if total == 0 {
        None
    } else {
        let sql = components_migration(&sections, &scope.join(", "), &today());
        let target =
            inv.migration_target(target, "add_missing_components", "add_missing_components.sql");
        Some(write_migration(&target, &sql).await?)
    };

    if inv.output.is_json() {
        let data = ComponentsData {
            scope,
            counts,
            output: written.map(|p| p.display().to_string()),
        };
        CommandOutput::new(schema::COMPONENTS, data, false).print()?;
        return Ok(exit_codes::NO_DIFFERENCES);
    }

    let mut lines = vec![format!("Components for {}:", scope.join(", "))];
    for (label, n) in [
        ("indexes", counts.indexes),
        ("constraints", counts.constraints),
        ("RLS policies", counts.policies),
        ("table statements", counts.tables),
        ("trigger functions", counts.functions),
        ("triggers", counts.triggers),
    ] {
        lines.push(format!("  {:<18} {:>4}", label, n));
    }
    lines.push(format!("  {:<18} {:>4}", "total".bold(), total));
    inv.output.data(&lines.join("\n"));

    match written {
        Some(path) => inv.output.info(&format!(
            "{} {}",
            "Migration written to".green(),
            path.display()
        )),
        None => inv.output.info("Nothing to extract; no migration written."),
    }

    Ok(exit_codes::NO_DIFFERENCES)
}
