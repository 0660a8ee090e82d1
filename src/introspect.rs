//! Local database introspection.
//!
//! Reads the local side of a comparison: table lists, column definitions and
//! row counts from the system catalogs, function bodies via
//! `pg_get_functiondef`, and everything else from `pg_dump --schema-only`
//! run through the same extractor as the remote dump.

use crate::catalog::{ColumnDef, Definitions, ObjectCatalog, ObjectFilter, TableColumns};
use crate::dump::{extract_objects, split_statements};
use crate::output::Output;
use crate::sql::quote_ident;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use tokio::process::Command;
use tokio_postgres::Client;

// =============================================================================
// Tables and Columns
// =============================================================================

/// Base tables in the filter's schema, restricted to the prefix when set.
pub async fn list_tables(client: &Client, filter: &ObjectFilter) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT table_name::text AS name
             FROM information_schema.tables
             WHERE table_schema = $1
               AND table_type = 'BASE TABLE'
               AND ($2::text IS NULL OR table_name LIKE $2 ESCAPE '\\')
             ORDER BY table_name",
            &[&filter.schema, &filter.like_pattern()],
        )
        .await
        .context("Failed to list local tables")?;

    Ok(rows.iter().map(|row| row.get("name")).collect())
}

/// Column definitions of every base table, in ordinal order.
pub async fn table_columns(client: &Client, filter: &ObjectFilter) -> Result<TableColumns> {
    let rows = client
        .query(
            "SELECT c.table_name::text AS table_name,
                    c.column_name::text AS column_name,
                    c.data_type::text AS data_type,
                    c.is_nullable::text AS is_nullable,
                    c.column_default::text AS column_default
             FROM information_schema.columns c
             JOIN information_schema.tables t
               ON t.table_schema = c.table_schema
              AND t.table_name = c.table_name
             WHERE c.table_schema = $1
               AND t.table_type = 'BASE TABLE'
               AND ($2::text IS NULL OR c.table_name LIKE $2 ESCAPE '\\')
             ORDER BY c.table_name, c.ordinal_position",
            &[&filter.schema, &filter.like_pattern()],
        )
        .await
        .context("Failed to read local columns")?;

    let mut columns = TableColumns::new();
    for row in rows {
        let table: String = row.get("table_name");
        let data_type: String = row.get("data_type");
        let is_nullable: String = row.get("is_nullable");
        let default: Option<String> = row.get("column_default");
        columns.entry(table).or_default().push(ColumnDef::new(
            row.get::<_, String>("column_name"),
            column_definition(&data_type, is_nullable == "YES", default.as_deref()),
        ));
    }
    Ok(columns)
}

/// `data_type [NOT NULL] [DEFAULT expr]`
fn column_definition(data_type: &str, nullable: bool, default: Option<&str>) -> String {
    let mut def = data_type.to_string();
    if !nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(expr) = default {
        def.push_str(" DEFAULT ");
        def.push_str(expr);
    }
    def
}

/// Row count per table, one `COUNT(*)` each.
///
/// A failing count (missing table, permissions) is reported and recorded as 0
/// so one bad table does not abort the whole comparison.
pub async fn row_counts(
    client: &Client,
    schema: &str,
    tables: &[String],
    output: &Output,
) -> Result<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for table in tables {
        let query = count_query(schema, table);
        output.verbose(&format!("  {}", query));
        let count = match client.query_one(query.as_str(), &[]).await {
            Ok(row) => row.get::<_, i64>(0).max(0) as u64,
            Err(e) => {
                output.warn(&format!("Warning: could not count {}: {}", table, e));
                0
            }
        };
        counts.insert(table.clone(), count);
    }
    Ok(counts)
}

fn count_query(schema: &str, table: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM {}.{}",
        quote_ident(schema),
        quote_ident(table)
    )
}

// =============================================================================
// Functions
// =============================================================================

/// Plain functions in the schema keyed by name, excluding extension members.
/// Overloads keep the last definition returned.
pub async fn functions(client: &Client, filter: &ObjectFilter) -> Result<Definitions> {
    let rows = client
        .query(
            "SELECT p.proname::text AS name,
                    pg_get_functiondef(p.oid) AS definition
             FROM pg_proc p
             JOIN pg_namespace n ON p.pronamespace = n.oid
             WHERE n.nspname = $1
               AND p.prokind = 'f'
               AND NOT EXISTS (
                   SELECT 1 FROM pg_depend d
                   WHERE d.objid = p.oid
                     AND d.deptype = 'e'
               )
             ORDER BY p.proname, p.oid",
            &[&filter.schema],
        )
        .await
        .context("Failed to read local functions")?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name: String = row.get("name");
            if filter.matches_function(&name) {
                Some((name, row.get("definition")))
            } else {
                None
            }
        })
        .collect())
}

// =============================================================================
// pg_dump
// =============================================================================

fn dump_schema_args(database_url: &str, filter: &ObjectFilter) -> Vec<String> {
    let mut args = vec![
        "--schema-only".to_string(),
        "--no-owner".to_string(),
        "--no-privileges".to_string(),
    ];
    match filter.pg_dump_pattern() {
        Some(pattern) => {
            args.push("-t".to_string());
            args.push(pattern);
        }
        None => {
            args.push("-n".to_string());
            args.push(filter.schema.clone());
        }
    }
    args.push(database_url.to_string());
    args
}

/// Schema-only dump of the local database.
pub async fn dump_schema(
    pg_dump: &str,
    database_url: &str,
    filter: &ObjectFilter,
    output: &Output,
) -> Result<String> {
    let args = dump_schema_args(database_url, filter);
    output.verbose(&format!(
        "  {} {}",
        pg_dump,
        args[..args.len() - 1].join(" ")
    ));

    let result = Command::new(pg_dump)
        .args(&args)
        .output()
        .await
        .with_context(|| format!("Failed to run {}", pg_dump))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        bail!("pg_dump failed:\n{}", stderr);
    }

    Ok(String::from_utf8_lossy(&result.stdout).into_owned())
}

/// Object catalog of the local database.
///
/// `pg_dump -t` only emits tables and what hangs off them, so functions
/// come from the catalog instead.
pub async fn local_objects(
    client: &Client,
    pg_dump: &str,
    database_url: &str,
    filter: &ObjectFilter,
    output: &Output,
) -> Result<ObjectCatalog> {
    let sql = dump_schema(pg_dump, database_url, filter, output).await?;
    let stmts = split_statements(&sql);
    let mut catalog = extract_objects(&stmts, filter);
    catalog.functions = functions(client, filter).await?;
    Ok(catalog)
}
