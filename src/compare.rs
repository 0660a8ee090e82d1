//! Comparison of remote and local definitions, columns and row counts.
//!
//! Inputs are the shapes from `catalog`; outputs are sorted buckets that the
//! report and migration generators render without further ordering.

use crate::catalog::{ColumnDef, Definitions, ObjectCatalog, ObjectKind, TableColumns};
use crate::dump::strip_comments;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

// =============================================================================
// Normalization
// =============================================================================

/// Options for [`normalize_definition`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Remove `schema.` qualifiers for this schema before comparing
    pub strip_schema: Option<String>,
}

impl NormalizeOptions {
    pub fn strip_schema(schema: impl Into<String>) -> Self {
        Self {
            strip_schema: Some(schema.into()),
        }
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn create_or_replace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bCREATE\s+OR\s+REPLACE\s+").expect("valid regex"))
}

/// Canonical form of a definition for equality checks.
///
/// Comments are dropped, whitespace runs collapse to one space,
/// `CREATE OR REPLACE` becomes `CREATE` and a trailing `;` is removed.
pub fn normalize_definition(sql: &str, opts: &NormalizeOptions) -> String {
    let d = strip_comments(&sql.replace("\r\n", "\n"));
    let d = whitespace_re().replace_all(d.trim(), " ");
    let d = create_or_replace_re().replace_all(&d, "CREATE ");
    let d = d.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    match &opts.strip_schema {
        Some(schema) => strip_qualifier(d, schema),
        None => d.to_string(),
    }
}

/// Drop `schema.` wherever it starts a qualified name.
fn strip_qualifier(sql: &str, schema: &str) -> String {
    let needle = format!("{}.", schema);
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for (pos, _) in sql.match_indices(&needle) {
        let prev = sql[..pos].chars().next_back();
        let at_boundary = prev.map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '"'));
        if at_boundary && pos >= last {
            out.push_str(&sql[last..pos]);
            last = pos + needle.len();
        }
    }
    out.push_str(&sql[last..]);
    out
}

// =============================================================================
// Definition Comparison
// =============================================================================

/// An object defined on both sides with different normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionPair {
    pub name: String,
    pub remote: String,
    pub local: String,
}

/// An object present on one side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDefinition {
    pub name: String,
    pub definition: String,
}

/// Objects bucketed by where they exist and whether they match.
///
/// Every name from either side lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    pub same: Vec<String>,
    pub different: Vec<DefinitionPair>,
    pub remote_only: Vec<NamedDefinition>,
    pub local_only: Vec<NamedDefinition>,
}

impl Comparison {
    pub fn total(&self) -> usize {
        self.same.len() + self.issues()
    }

    pub fn issues(&self) -> usize {
        self.different.len() + self.remote_only.len() + self.local_only.len()
    }

    pub fn is_clean(&self) -> bool {
        self.issues() == 0
    }
}

/// Bucket two definition maps.
pub fn compare_definitions(
    remote: &Definitions,
    local: &Definitions,
    opts: &NormalizeOptions,
) -> Comparison {
    let mut result = Comparison::default();

    for (name, remote_def) in remote {
        match local.get(name) {
            Some(local_def) => {
                if normalize_definition(remote_def, opts) == normalize_definition(local_def, opts) {
                    result.same.push(name.clone());
                } else {
                    result.different.push(DefinitionPair {
                        name: name.clone(),
                        remote: remote_def.clone(),
                        local: local_def.clone(),
                    });
                }
            }
            None => result.remote_only.push(NamedDefinition {
                name: name.clone(),
                definition: remote_def.clone(),
            }),
        }
    }

    for (name, local_def) in local {
        if !remote.contains_key(name) {
            result.local_only.push(NamedDefinition {
                name: name.clone(),
                definition: local_def.clone(),
            });
        }
    }

    // BTreeMap iteration already yields sorted names
    result
}

/// Per-kind comparisons of two object catalogs, in report order.
#[derive(Debug, Clone, Default)]
pub struct CatalogComparison {
    pub kinds: Vec<(ObjectKind, Comparison)>,
}

impl CatalogComparison {
    pub fn get(&self, kind: ObjectKind) -> Option<&Comparison> {
        self.kinds.iter().find(|(k, _)| *k == kind).map(|(_, c)| c)
    }

    pub fn total_issues(&self) -> usize {
        self.kinds.iter().map(|(_, c)| c.issues()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_issues() == 0
    }
}

pub fn compare_catalogs(
    remote: &ObjectCatalog,
    local: &ObjectCatalog,
    opts: &NormalizeOptions,
) -> CatalogComparison {
    CatalogComparison {
        kinds: ObjectKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    compare_definitions(remote.get(kind), local.get(kind), opts),
                )
            })
            .collect(),
    }
}

// =============================================================================
// Column Comparison
// =============================================================================

/// Column differences for a table present on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumnDiff {
    pub table: String,
    pub remote_columns: usize,
    pub local_columns: usize,
    /// Remote columns absent locally, in remote order
    pub missing: Vec<ColumnDef>,
    /// Local columns absent remotely, in local order
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnComparison {
    /// Tables that exist remotely but not locally
    pub missing_tables: Vec<String>,
    /// Tables that exist locally but not remotely
    pub local_only_tables: Vec<String>,
    /// Tables on both sides whose column sets differ
    pub tables: Vec<TableColumnDiff>,
    /// Tables on both sides with identical column sets
    pub matching: Vec<String>,
}

impl ColumnComparison {
    pub fn missing_column_count(&self) -> usize {
        self.tables.iter().map(|t| t.missing.len()).sum()
    }

    pub fn issues(&self) -> usize {
        self.missing_tables.len() + self.local_only_tables.len() + self.tables.len()
    }

    pub fn is_clean(&self) -> bool {
        self.issues() == 0
    }
}

/// Compare column name sets table by table.
pub fn compare_columns(remote: &TableColumns, local: &TableColumns) -> ColumnComparison {
    let mut result = ColumnComparison::default();

    for (table, remote_cols) in remote {
        let Some(local_cols) = local.get(table) else {
            result.missing_tables.push(table.clone());
            continue;
        };

        let local_names: BTreeSet<&str> = local_cols.iter().map(|c| c.name.as_str()).collect();
        let remote_names: BTreeSet<&str> = remote_cols.iter().map(|c| c.name.as_str()).collect();

        let missing: Vec<ColumnDef> = remote_cols
            .iter()
            .filter(|c| !local_names.contains(c.name.as_str()))
            .cloned()
            .collect();
        let extra: Vec<String> = local_cols
            .iter()
            .filter(|c| !remote_names.contains(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();

        if missing.is_empty() && extra.is_empty() {
            result.matching.push(table.clone());
        } else {
            result.tables.push(TableColumnDiff {
                table: table.clone(),
                remote_columns: remote_cols.len(),
                local_columns: local_cols.len(),
                missing,
                extra,
            });
        }
    }

    result.local_only_tables = local
        .keys()
        .filter(|t| !remote.contains_key(*t))
        .cloned()
        .collect();

    result
}

// =============================================================================
// Row Count Comparison
// =============================================================================

/// Import status of a table judged by row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataStatus {
    NeedsImport,
    PartialData,
    Complete,
    Empty,
    LocalOnly,
}

impl DataStatus {
    pub fn classify(remote: u64, local: u64) -> Self {
        if remote > 0 && local == 0 {
            DataStatus::NeedsImport
        } else if remote > local {
            DataStatus::PartialData
        } else if remote == local && remote > 0 {
            DataStatus::Complete
        } else if remote == 0 && local == 0 {
            DataStatus::Empty
        } else {
            DataStatus::LocalOnly
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataStatus::NeedsImport => "NEEDS IMPORT",
            DataStatus::PartialData => "PARTIAL DATA",
            DataStatus::Complete => "COMPLETE",
            DataStatus::Empty => "EMPTY",
            DataStatus::LocalOnly => "LOCAL ONLY",
        }
    }

    /// Whether rows are missing locally
    pub fn needs_rows(&self) -> bool {
        matches!(self, DataStatus::NeedsImport | DataStatus::PartialData)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub remote: u64,
    pub local: u64,
    pub status: DataStatus,
}

/// Classify every table seen on either side. Absent counts are zero.
pub fn compare_counts(
    remote: &BTreeMap<String, u64>,
    local: &BTreeMap<String, u64>,
) -> Vec<TableCount> {
    let tables: BTreeSet<&String> = remote.keys().chain(local.keys()).collect();
    tables
        .into_iter()
        .map(|table| {
            let r = remote.get(table).copied().unwrap_or(0);
            let l = local.get(table).copied().unwrap_or(0);
            TableCount {
                table: table.clone(),
                remote: r,
                local: l,
                status: DataStatus::classify(r, l),
            }
        })
        .collect()
}

// =============================================================================
// Line Diff
// =============================================================================

/// Positional line-by-line diff.
///
/// Lines at the same index are compared directly; there is no alignment.
/// Differing lines render as `- ` (from `a`) and `+ ` (from `b`), equal
/// non-blank lines with two leading spaces.
pub fn line_diff(a: &str, b: &str) -> String {
    let left: Vec<&str> = a.lines().collect();
    let right: Vec<&str> = b.lines().collect();
    let mut out = Vec::new();

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or("");
        let r = right.get(i).copied().unwrap_or("");
        if l != r {
            if !l.is_empty() {
                out.push(format!("- {}", l));
            }
            if !r.is_empty() {
                out.push(format!("+ {}", r));
            }
        } else if !l.trim().is_empty() {
            out.push(format!("  {}", l));
        }
    }

    out.join("\n")
}
