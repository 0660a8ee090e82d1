//! Data statement rewriting: extract one table's rows, strip a column,
//! patch NULLs.
//!
//! Rewrites only touch INSERT and COPY statements for the named table; every
//! other statement passes through as parsed.

use crate::dump::{
    parse_data_statement, split_top_level, statement_rows, table_data_statements, tuple_fields,
    values_tuples, DataKind, DataStatement, Statement,
};
use crate::migration::import_script;
use serde::Serialize;

/// Rows of one table ready to be written into an import file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub table: String,
    pub rows: u64,
    /// Verbatim INSERT / COPY statements
    pub statements: Vec<String>,
}

/// Collect the INSERT and COPY statements loading `table`.
pub fn table_data(stmts: &[Statement], table: &str) -> TableData {
    let mut data = TableData {
        table: table.to_string(),
        ..Default::default()
    };
    for stmt in table_data_statements(stmts, table) {
        if let Some(head) = parse_data_statement(stmt) {
            data.rows += statement_rows(stmt, &head);
        }
        data.statements.push(stmt.to_sql());
    }
    data
}

/// Import file containing only `table`'s data.
pub fn extract_table(stmts: &[Statement], table: &str, generated_at: &str) -> (String, TableData) {
    let data = table_data(stmts, table);
    let sql = import_script(std::slice::from_ref(&data), generated_at);
    (sql, data)
}

/// Outcome of a rewrite pass.
#[derive(Debug, Clone, Default)]
pub struct RewriteResult {
    pub statements: Vec<Statement>,
    pub stats: RewriteStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    /// Data statements for the table that were rewritten
    pub rewritten: usize,
    /// Rows (strip) or fields (patch) changed
    pub changed: u64,
    /// Data statements for the table left untouched because the column
    /// position could not be determined
    pub skipped: usize,
}

impl RewriteResult {
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for stmt in &self.statements {
            out.push_str(&stmt.to_sql());
            out.push('\n');
        }
        out
    }
}

/// Remove `column` from every INSERT and COPY statement for `table`.
pub fn strip_column(stmts: &[Statement], table: &str, column: &str) -> RewriteResult {
    rewrite_table(stmts, table, column, |stmt, head, idx, stats| {
        strip_statement(stmt, head, idx, stats)
    })
}

/// Replace NULLs in `column` of `table` with `literal`.
///
/// `literal` is SQL (`'n/a'`, `0`, `now()`); COPY data receives its unquoted
/// text form.
pub fn patch_nulls(stmts: &[Statement], table: &str, column: &str, literal: &str) -> RewriteResult {
    let copy_value = copy_text(literal);
    rewrite_table(stmts, table, column, |stmt, head, idx, stats| {
        patch_statement(stmt, head, idx, literal, &copy_value, stats)
    })
}

fn rewrite_table<F>(stmts: &[Statement], table: &str, column: &str, mut rewrite: F) -> RewriteResult
where
    F: FnMut(&Statement, &DataStatement, usize, &mut RewriteStats) -> Option<Statement>,
{
    let mut result = RewriteResult::default();
    for stmt in stmts {
        let target = parse_data_statement(stmt).filter(|head| head.is_for(table));
        let Some(head) = target else {
            result.statements.push(stmt.clone());
            continue;
        };
        let position = head
            .columns
            .as_ref()
            .and_then(|cols| cols.iter().position(|c| c == column));
        let rewritten = position.and_then(|idx| rewrite(stmt, &head, idx, &mut result.stats));
        match rewritten {
            Some(new_stmt) => {
                result.stats.rewritten += 1;
                result.statements.push(new_stmt);
            }
            None => {
                result.stats.skipped += 1;
                result.statements.push(stmt.clone());
            }
        }
    }
    result
}

fn strip_statement(
    stmt: &Statement,
    head: &DataStatement,
    idx: usize,
    stats: &mut RewriteStats,
) -> Option<Statement> {
    let span = head.columns_span.clone()?;
    let text = &stmt.text;
    let list: Vec<&str> = split_top_level(&text[span.clone()], b',')
        .into_iter()
        .map(str::trim)
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, c)| c)
        .collect();
    // `INSERT INTO t () VALUES ()` is not valid SQL
    if list.is_empty() {
        return None;
    }

    match head.kind {
        DataKind::Copy => {
            let rows = stmt.copy_rows.as_ref()?;
            let new_rows = rows
                .iter()
                .map(|row| {
                    let mut fields: Vec<&str> = row.split('\t').collect();
                    if idx < fields.len() {
                        fields.remove(idx);
                        stats.changed += 1;
                    }
                    fields.join("\t")
                })
                .collect();
            Some(Statement {
                text: format!("{}{}{}", &text[..span.start], list.join(", "), &text[span.end..]),
                line: stmt.line,
                copy_rows: Some(new_rows),
            })
        }
        DataKind::Insert => {
            let values_at = head.values_at?;
            let new_values = map_tuples(&text[values_at..], |fields| {
                if idx < fields.len() {
                    fields.remove(idx);
                    stats.changed += 1;
                }
            });
            Some(Statement {
                text: format!(
                    "{}{}{}{}",
                    &text[..span.start],
                    list.join(", "),
                    &text[span.end..values_at],
                    new_values
                ),
                line: stmt.line,
                copy_rows: None,
            })
        }
    }
}

fn patch_statement(
    stmt: &Statement,
    head: &DataStatement,
    idx: usize,
    literal: &str,
    copy_value: &str,
    stats: &mut RewriteStats,
) -> Option<Statement> {
    match head.kind {
        DataKind::Copy => {
            let rows = stmt.copy_rows.as_ref()?;
            let new_rows = rows
                .iter()
                .map(|row| {
                    let mut fields: Vec<&str> = row.split('\t').collect();
                    if fields.get(idx) == Some(&"\\N") {
                        fields[idx] = copy_value;
                        stats.changed += 1;
                    }
                    fields.join("\t")
                })
                .collect();
            Some(Statement {
                copy_rows: Some(new_rows),
                ..stmt.clone()
            })
        }
        DataKind::Insert => {
            let values_at = head.values_at?;
            let new_values = map_tuples(&stmt.text[values_at..], |fields| {
                if fields.get(idx).is_some_and(|f| f.eq_ignore_ascii_case("NULL")) {
                    fields[idx] = literal;
                    stats.changed += 1;
                }
            });
            Some(Statement {
                text: format!("{}{}", &stmt.text[..values_at], new_values),
                ..stmt.clone()
            })
        }
    }
}

/// Rebuild a VALUES list after editing each tuple's fields.
/// Text before the first tuple and after the last is preserved.
fn map_tuples<'a, F>(values: &'a str, mut edit: F) -> String
where
    F: FnMut(&mut Vec<&'a str>),
{
    let (tuples, end) = values_tuples(values);
    let Some(first) = tuples.first() else {
        return values.to_string();
    };
    let rebuilt: Vec<String> = tuples
        .iter()
        .map(|range| {
            let mut fields = tuple_fields(&values[range.clone()]);
            edit(&mut fields);
            format!("({})", fields.join(", "))
        })
        .collect();
    format!("{}{}{}", &values[..first.start], rebuilt.join(", "), &values[end..])
}

/// Text form of a SQL literal as it appears in COPY data.
fn copy_text(literal: &str) -> String {
    let trimmed = literal.trim();
    let raw = match trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) if trimmed.len() >= 2 => inner.replace("''", "'"),
        _ => trimmed.to_string(),
    };
    raw.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
