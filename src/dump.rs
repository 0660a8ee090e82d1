//! Dump file parsing: statement splitting, object extraction and data
//! statement analysis.
//!
//! Dumps are plain SQL as produced by `pg_dump` (schema, `--inserts` data or
//! COPY blocks). Nothing here talks to a database; every extractor works on
//! the statement list returned by [`split_statements`].

use crate::catalog::{ColumnDef, Definitions, ObjectCatalog, ObjectFilter, TableColumns};
use crate::sql::{split_qualified, unquote_ident};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

// =============================================================================
// Statements
// =============================================================================

/// One top-level SQL statement from a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Statement text including the terminating `;` when present
    pub text: String,
    /// 1-based line on which the statement starts
    pub line: usize,
    /// Data lines of a `COPY ... FROM stdin` block, without the `\.` terminator
    pub copy_rows: Option<Vec<String>>,
}

impl Statement {
    /// Render back to SQL, including a COPY data block if present.
    pub fn to_sql(&self) -> String {
        match &self.copy_rows {
            None => self.text.clone(),
            Some(rows) => {
                let mut out = self.text.clone();
                out.push('\n');
                for row in rows {
                    out.push_str(row);
                    out.push('\n');
                }
                out.push_str("\\.");
                out
            }
        }
    }
}

/// Read a dump file and split it into statements.
///
/// Invalid UTF-8 is replaced rather than rejected; dumps of legacy data
/// occasionally carry stray bytes in string literals.
pub fn load_statements(path: &Path) -> Result<Vec<Statement>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read dump file: {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(split_statements(&content))
}

/// Split SQL text into top-level statements.
///
/// Semicolons inside quoted strings, quoted identifiers, dollar-quoted
/// bodies and comments do not terminate a statement. A `COPY ... FROM stdin`
/// statement takes ownership of the data lines that follow it, up to `\.`.
pub fn split_statements(content: &str) -> Vec<Statement> {
    let bytes = content.as_bytes();
    let mut statements = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < bytes.len() {
        let start = skip_trivia(bytes, pos);
        line += count_newlines(&bytes[pos..start]);
        if start >= bytes.len() {
            break;
        }

        let mut i = start;
        let end = loop {
            if i >= bytes.len() {
                break bytes.len();
            }
            if let Some(next) = skip_quoted(bytes, i).or_else(|| skip_comment(bytes, i)) {
                i = next;
                continue;
            }
            if bytes[i] == b';' {
                break i + 1;
            }
            i += 1;
        };

        let text = content[start..end].trim_end().to_string();
        let start_line = line;
        line += count_newlines(&bytes[start..end]);
        pos = end;

        let mut copy_rows = None;
        if copy_re().is_match(&text) {
            let (rows, next) = read_copy_block(content, end);
            line += count_newlines(&bytes[end..next]);
            pos = next;
            copy_rows = Some(rows);
        }

        statements.push(Statement {
            text,
            line: start_line,
            copy_rows,
        });
    }

    statements
}

/// Collect COPY data lines starting on the line after `from`.
/// Returns the rows and the offset just past the `\.` line.
fn read_copy_block(content: &str, from: usize) -> (Vec<String>, usize) {
    let mut pos = match content[from..].find('\n') {
        Some(p) => from + p + 1,
        None => return (Vec::new(), content.len()),
    };
    let mut rows = Vec::new();
    while pos < content.len() {
        let line_end = content[pos..]
            .find('\n')
            .map_or(content.len(), |p| pos + p);
        let line = content[pos..line_end].trim_end_matches('\r');
        let next = (line_end + 1).min(content.len());
        if line == "\\." {
            return (rows, next);
        }
        rows.push(line.to_string());
        pos = next;
    }
    (rows, content.len())
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

// =============================================================================
// Lexing helpers
// =============================================================================

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Length of a dollar-quote tag (`$$`, `$body$`) opening at `i`, both `$` included.
fn dollar_tag_len(bytes: &[u8], i: usize) -> Option<usize> {
    if bytes.get(i) != Some(&b'$') {
        return None;
    }
    // `$` inside an identifier (`foo$bar`) does not open a quote
    if i > 0 && (is_ident_byte(bytes[i - 1]) || bytes[i - 1] == b'$') {
        return None;
    }
    let mut j = i + 1;
    while j < bytes.len() && bytes[j] != b'$' {
        if !is_ident_byte(bytes[j]) {
            return None;
        }
        j += 1;
    }
    if j >= bytes.len() {
        return None;
    }
    // positional parameters ($1) are not tags
    if j > i + 1 && bytes[i + 1].is_ascii_digit() {
        return None;
    }
    Some(j - i + 1)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Offset just past a quoted region opening at `i`, or `None` when no quote
/// opens there. Unterminated quotes run to the end of input.
fn skip_quoted(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        b'\'' => {
            let escapes = i > 0
                && matches!(bytes[i - 1], b'E' | b'e')
                && (i < 2 || !is_ident_byte(bytes[i - 2]));
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' if escapes => j += 2,
                    b'\'' if bytes.get(j + 1) == Some(&b'\'') => j += 2,
                    b'\'' => return Some(j + 1),
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        b'"' => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'"' if bytes.get(j + 1) == Some(&b'"') => j += 2,
                    b'"' => return Some(j + 1),
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        b'$' => {
            let len = dollar_tag_len(bytes, i)?;
            let tag = &bytes[i..i + len];
            let body = i + len;
            Some(find_subslice(&bytes[body..], tag).map_or(bytes.len(), |p| body + p + len))
        }
        _ => None,
    }
}

/// Offset just past a comment opening at `i`. Line comments stop before the
/// newline; block comments nest.
fn skip_comment(bytes: &[u8], i: usize) -> Option<usize> {
    match (bytes[i], bytes.get(i + 1)) {
        (b'-', Some(b'-')) => Some(
            bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| i + p),
        ),
        (b'/', Some(b'*')) => {
            let mut depth = 1;
            let mut j = i + 2;
            while j < bytes.len() {
                match (bytes[j], bytes.get(j + 1)) {
                    (b'/', Some(b'*')) => {
                        depth += 1;
                        j += 2;
                    }
                    (b'*', Some(b'/')) => {
                        depth -= 1;
                        j += 2;
                        if depth == 0 {
                            return Some(j);
                        }
                    }
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        _ => None,
    }
}

fn skip_trivia(bytes: &[u8], mut i: usize) -> usize {
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() {
            if let Some(next) = skip_comment(bytes, i) {
                i = next;
                continue;
            }
        }
        return i;
    }
}

/// Remove `--` and `/* */` comments that sit outside literals.
pub fn strip_comments(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_quoted(bytes, i) {
            i = next;
            continue;
        }
        if let Some(next) = skip_comment(bytes, i) {
            out.push_str(&sql[copied..i]);
            copied = next;
            i = next;
            continue;
        }
        i += 1;
    }
    out.push_str(&sql[copied..]);
    out
}

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_quoted(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split `s` at `sep` where it appears outside quotes, parentheses and brackets.
pub fn split_top_level(s: &str, sep: u8) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = skip_quoted(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b if b == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&s[start..]);
    parts
}

/// Locate the top-level tuples of a `VALUES` list.
///
/// Returns each tuple's byte range (parentheses included) and the offset at
/// which the list ends, so trailing clauses such as `ON CONFLICT DO NOTHING;`
/// can be preserved by callers that rebuild the statement.
pub fn values_tuples(s: &str) -> (Vec<Range<usize>>, usize) {
    let bytes = s.as_bytes();
    let skip_ws = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    };

    let mut tuples = Vec::new();
    let mut i = skip_ws(0);
    let mut end = i;
    while i < bytes.len() && bytes[i] == b'(' {
        let Some(close) = matching_paren(bytes, i) else {
            tuples.push(i..bytes.len());
            return (tuples, bytes.len());
        };
        tuples.push(i..close + 1);
        end = close + 1;
        let after = skip_ws(end);
        if after < bytes.len() && bytes[after] == b',' {
            i = skip_ws(after + 1);
        } else {
            break;
        }
    }
    (tuples, end)
}

/// Split one `( ... )` tuple into its trimmed top-level fields.
pub fn tuple_fields(tuple: &str) -> Vec<&str> {
    let inner = tuple.trim();
    let inner = inner.strip_prefix('(').unwrap_or(inner);
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    if inner.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(inner, b',')
        .into_iter()
        .map(str::trim)
        .collect()
}

// =============================================================================
// Statement patterns
// =============================================================================

const IDENT: &str = r#"(?:"(?:[^"]|"")+"|[A-Za-z_][\w$]*)"#;

fn qname() -> String {
    format!(r"{IDENT}(?:\.{IDENT})?")
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^CREATE\s+(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?({})\s*\(",
            qname()
        ))
        .expect("valid regex")
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?FUNCTION\s+({})\s*\(",
            qname()
        ))
        .expect("valid regex")
    })
}

fn trigger_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?(?:CONSTRAINT\s+)?TRIGGER\s+({IDENT})\s.*?\bON\s+(?:ONLY\s+)?({})",
            qname()
        ))
        .expect("valid regex")
    })
}

fn execute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)\bEXECUTE\s+(?:FUNCTION|PROCEDURE)\s+({})\s*\(",
            qname()
        ))
        .expect("valid regex")
    })
}

fn policy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^CREATE\s+POLICY\s+({IDENT})\s+ON\s+({})",
            qname()
        ))
        .expect("valid regex")
    })
}

fn index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^CREATE\s+(?:UNIQUE\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?({IDENT})\s+ON\s+(?:ONLY\s+)?({})",
            qname()
        ))
        .expect("valid regex")
    })
}

fn constraint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?({})\s+ADD\s+CONSTRAINT\s+({IDENT})\s+(\w+(?:\s+KEY)?)",
            qname()
        ))
        .expect("valid regex")
    })
}

fn insert_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^INSERT\s+INTO\s+({})(?:\s+AS\s+{IDENT})?\s*(?:\(([^)]*)\))?\s*(?:OVERRIDING\s+(?:SYSTEM|USER)\s+VALUE\s+)?(VALUES\b)?",
            qname()
        ))
        .expect("valid regex")
    })
}

fn copy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^COPY\s+({})\s*(?:\(([^)]*)\))?\s+FROM\s+stdin\b",
            qname()
        ))
        .expect("valid regex")
    })
}

/// Unqualified name of `raw` if it lives in the filter's schema.
fn in_schema(filter: &ObjectFilter, raw: &str) -> Option<String> {
    let (schema, name) = split_qualified(raw);
    filter.matches_schema(schema.as_deref()).then_some(name)
}

// =============================================================================
// Object extraction
// =============================================================================

/// `CREATE TABLE` statements keyed by table name.
pub fn extract_tables(stmts: &[Statement], filter: &ObjectFilter) -> Definitions {
    stmts
        .iter()
        .filter_map(|stmt| {
            let caps = table_re().captures(&stmt.text)?;
            let name = in_schema(filter, &caps[1])?;
            filter
                .matches_table(&name)
                .then(|| (name, stmt.text.clone()))
        })
        .collect()
}

/// `CREATE [OR REPLACE] FUNCTION` statements keyed by function name.
///
/// Overloads share a key; the last definition in the dump wins.
pub fn extract_functions(stmts: &[Statement], filter: &ObjectFilter) -> Definitions {
    stmts
        .iter()
        .filter_map(|stmt| {
            let caps = function_re().captures(&stmt.text)?;
            let name = in_schema(filter, &caps[1])?;
            filter
                .matches_function(&name)
                .then(|| (name, stmt.text.clone()))
        })
        .collect()
}

/// A `CREATE TRIGGER` statement with the table it fires on and the function
/// it executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDef {
    pub name: String,
    pub table: String,
    pub function: Option<String>,
    pub definition: String,
}

pub fn triggers(stmts: &[Statement], filter: &ObjectFilter) -> Vec<TriggerDef> {
    stmts
        .iter()
        .filter_map(|stmt| {
            let caps = trigger_re().captures(&stmt.text)?;
            let table = in_schema(filter, &caps[2])?;
            if !filter.matches_table(&table) {
                return None;
            }
            let function = execute_re()
                .captures(&stmt.text)
                .map(|c| split_qualified(&c[1]).1);
            Some(TriggerDef {
                name: unquote_ident(&caps[1]),
                table,
                function,
                definition: stmt.text.clone(),
            })
        })
        .collect()
}

/// `CREATE TRIGGER` statements keyed by trigger name.
pub fn extract_triggers(stmts: &[Statement], filter: &ObjectFilter) -> Definitions {
    triggers(stmts, filter)
        .into_iter()
        .map(|t| (t.name, t.definition))
        .collect()
}

/// `CREATE POLICY` statements keyed by `table.policy`.
pub fn extract_policies(stmts: &[Statement], filter: &ObjectFilter) -> Definitions {
    stmts
        .iter()
        .filter_map(|stmt| {
            let caps = policy_re().captures(&stmt.text)?;
            let table = in_schema(filter, &caps[2])?;
            filter.matches_table(&table).then(|| {
                (
                    format!("{}.{}", table, unquote_ident(&caps[1])),
                    stmt.text.clone(),
                )
            })
        })
        .collect()
}

/// `CREATE INDEX` statements keyed by index name.
pub fn extract_indexes(stmts: &[Statement], filter: &ObjectFilter) -> Definitions {
    stmts
        .iter()
        .filter_map(|stmt| {
            let caps = index_re().captures(&stmt.text)?;
            let table = in_schema(filter, &caps[2])?;
            filter
                .matches_table(&table)
                .then(|| (unquote_ident(&caps[1]), stmt.text.clone()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Exclude,
    Other,
}

impl ConstraintKind {
    fn from_keyword(kw: &str) -> Self {
        let kw = kw.split_whitespace().collect::<Vec<_>>().join(" ");
        match kw.to_ascii_uppercase().as_str() {
            "PRIMARY KEY" => ConstraintKind::PrimaryKey,
            "FOREIGN KEY" => ConstraintKind::ForeignKey,
            "UNIQUE" => ConstraintKind::Unique,
            "CHECK" => ConstraintKind::Check,
            "EXCLUDE" => ConstraintKind::Exclude,
            _ => ConstraintKind::Other,
        }
    }
}

/// An `ALTER TABLE ... ADD CONSTRAINT` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDef {
    pub table: String,
    pub name: String,
    pub kind: ConstraintKind,
    pub definition: String,
}

pub fn extract_constraints(stmts: &[Statement], filter: &ObjectFilter) -> Vec<ConstraintDef> {
    stmts
        .iter()
        .filter_map(|stmt| {
            let caps = constraint_re().captures(&stmt.text)?;
            let table = in_schema(filter, &caps[1])?;
            if !filter.matches_table(&table) {
                return None;
            }
            Some(ConstraintDef {
                table,
                name: unquote_ident(&caps[2]),
                kind: ConstraintKind::from_keyword(&caps[3]),
                definition: stmt.text.clone(),
            })
        })
        .collect()
}

/// Every object kind tracked by the object comparison.
pub fn extract_objects(stmts: &[Statement], filter: &ObjectFilter) -> ObjectCatalog {
    ObjectCatalog {
        tables: extract_tables(stmts, filter),
        functions: extract_functions(stmts, filter),
        triggers: extract_triggers(stmts, filter),
        policies: extract_policies(stmts, filter),
        indexes: extract_indexes(stmts, filter),
    }
}

// =============================================================================
// Columns
// =============================================================================

const TABLE_CONSTRAINT_WORDS: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY",
    "FOREIGN",
    "UNIQUE",
    "CHECK",
    "EXCLUDE",
    "LIKE",
];

/// Column definitions of a `CREATE TABLE` statement, in declaration order.
pub fn parse_table_columns(create_sql: &str) -> Vec<ColumnDef> {
    let Some(m) = table_re().find(create_sql) else {
        return Vec::new();
    };
    let open = m.end() - 1;
    let close = matching_paren(create_sql.as_bytes(), open).unwrap_or(create_sql.len());
    let body = &create_sql[open + 1..close];
    split_top_level(body, b',')
        .into_iter()
        .filter_map(parse_column_item)
        .collect()
}

fn parse_column_item(item: &str) -> Option<ColumnDef> {
    let item = item.trim();
    if item.is_empty() {
        return None;
    }
    let (name, rest) = if item.starts_with('"') {
        let end = skip_quoted(item.as_bytes(), 0).unwrap_or(item.len());
        (&item[..end], &item[end..])
    } else {
        let end = item
            .find(|c: char| c.is_whitespace() || c == '(')
            .unwrap_or(item.len());
        let word = &item[..end];
        if TABLE_CONSTRAINT_WORDS
            .iter()
            .any(|w| word.eq_ignore_ascii_case(w))
        {
            return None;
        }
        (word, &item[end..])
    };
    let definition = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(ColumnDef::new(unquote_ident(name), definition))
}

/// Columns of every extracted `CREATE TABLE`.
pub fn table_columns(stmts: &[Statement], filter: &ObjectFilter) -> TableColumns {
    extract_tables(stmts, filter)
        .into_iter()
        .map(|(table, sql)| {
            let columns = parse_table_columns(&sql);
            (table, columns)
        })
        .collect()
}

/// Union of the column names used by INSERT and COPY statements per table,
/// sorted by name. Definitions are unknown and left empty.
pub fn extract_insert_columns(stmts: &[Statement], filter: &ObjectFilter) -> TableColumns {
    let mut seen: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for data in data_statements(stmts, filter) {
        if let Some(columns) = data.columns {
            seen.entry(data.table).or_default().extend(columns);
        }
    }
    seen.into_iter()
        .map(|(table, cols)| (table, cols.into_iter().map(ColumnDef::name_only).collect()))
        .collect()
}

fn alter_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?is)^ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?({})\s+(ADD\b.*)$",
            qname()
        ))
        .expect("valid regex")
    })
}

fn add_column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^ADD\s+(?:COLUMN\s+)?(?:IF\s+NOT\s+EXISTS\s+)?(.+)$")
            .expect("valid regex")
    })
}

/// Columns added by `ALTER TABLE ... ADD [COLUMN]` statements, in order.
/// Constraint clauses are ignored.
pub fn added_columns(stmts: &[Statement], filter: &ObjectFilter) -> TableColumns {
    let mut columns = TableColumns::new();
    for stmt in stmts {
        let text = stmt.text.trim_end().trim_end_matches(';');
        let Some(caps) = alter_table_re().captures(text) else {
            continue;
        };
        let Some(table) = in_schema(filter, &caps[1]) else {
            continue;
        };
        if !filter.matches_table(&table) {
            continue;
        }
        for clause in split_top_level(caps.get(2).map_or("", |m| m.as_str()), b',') {
            let Some(add) = add_column_re().captures(clause.trim()) else {
                continue;
            };
            if let Some(col) = parse_column_item(&add[1]) {
                columns.entry(table.clone()).or_default().push(col);
            }
        }
    }
    columns
}

// =============================================================================
// Data statements
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Insert,
    Copy,
}

/// The parsed head of an INSERT or COPY statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStatement {
    pub kind: DataKind,
    pub schema: Option<String>,
    pub table: String,
    pub columns: Option<Vec<String>>,
    /// Byte range of the column list inside its parentheses
    pub columns_span: Option<Range<usize>>,
    /// Offset just past the `VALUES` keyword of an INSERT
    pub values_at: Option<usize>,
}

impl DataStatement {
    /// Whether this statement loads `table` (`name` or `schema.name`).
    pub fn is_for(&self, table: &str) -> bool {
        let (schema, name) = split_qualified(table);
        self.table == name
            && match (&schema, &self.schema) {
                (Some(want), Some(have)) => want == have,
                _ => true,
            }
    }
}

fn parse_column_list(list: &str) -> Vec<String> {
    split_top_level(list, b',')
        .into_iter()
        .map(unquote_ident)
        .filter(|c| !c.is_empty())
        .collect()
}

/// Parse an INSERT or COPY statement head; other statements yield `None`.
pub fn parse_data_statement(stmt: &Statement) -> Option<DataStatement> {
    let (kind, caps) = if let Some(caps) = insert_re().captures(&stmt.text) {
        (DataKind::Insert, caps)
    } else if stmt.copy_rows.is_some() {
        (DataKind::Copy, copy_re().captures(&stmt.text)?)
    } else {
        return None;
    };
    let (schema, table) = split_qualified(&caps[1]);
    let columns_match = caps.get(2);
    Some(DataStatement {
        kind,
        schema,
        table,
        columns: columns_match.map(|m| parse_column_list(m.as_str())),
        columns_span: columns_match.map(|m| m.range()),
        values_at: caps.get(3).map(|m| m.end()),
    })
}

/// Parsed data statements whose table passes the filter.
fn data_statements(stmts: &[Statement], filter: &ObjectFilter) -> Vec<DataStatement> {
    stmts
        .iter()
        .filter_map(parse_data_statement)
        .filter(|d| filter.matches_schema(d.schema.as_deref()) && filter.matches_table(&d.table))
        .collect()
}

/// Number of rows a data statement loads.
pub fn statement_rows(stmt: &Statement, data: &DataStatement) -> u64 {
    match data.kind {
        DataKind::Copy => stmt.copy_rows.as_ref().map_or(0, |r| r.len() as u64),
        DataKind::Insert => data
            .values_at
            .map_or(0, |at| values_tuples(&stmt.text[at..]).0.len() as u64),
    }
}

/// All INSERT and COPY statements for `table`, in dump order.
pub fn table_data_statements<'a>(stmts: &'a [Statement], table: &str) -> Vec<&'a Statement> {
    stmts
        .iter()
        .filter(|stmt| parse_data_statement(stmt).is_some_and(|d| d.is_for(table)))
        .collect()
}

/// Rows per table across all INSERT and COPY statements.
pub fn count_rows(stmts: &[Statement], filter: &ObjectFilter) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for stmt in stmts {
        let Some(data) = parse_data_statement(stmt) else {
            continue;
        };
        if !filter.matches_schema(data.schema.as_deref()) || !filter.matches_table(&data.table) {
            continue;
        }
        let rows = statement_rows(stmt, &data);
        *counts.entry(data.table).or_default() += rows;
    }
    counts
}
