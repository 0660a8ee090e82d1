//! Shared data model for dump extraction, local introspection and comparison.
//!
//! Both sides of a comparison (a remote dump file and the local database)
//! are reduced to the same shapes defined here, so the comparator never
//! needs to know where a definition came from.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Object name → raw SQL definition text.
pub type Definitions = BTreeMap<String, String>;

/// Table name → ordered column definitions.
pub type TableColumns = BTreeMap<String, Vec<ColumnDef>>;

/// Kinds of schema objects tracked by the object comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Tables,
    Functions,
    Triggers,
    Policies,
    Indexes,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Tables,
        ObjectKind::Functions,
        ObjectKind::Triggers,
        ObjectKind::Policies,
        ObjectKind::Indexes,
    ];

    /// Capitalized label for report headings
    pub fn title(&self) -> &'static str {
        match self {
            ObjectKind::Tables => "Tables",
            ObjectKind::Functions => "Functions",
            ObjectKind::Triggers => "Triggers",
            ObjectKind::Policies => "Policies",
            ObjectKind::Indexes => "Indexes",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::Tables => "tables",
            ObjectKind::Functions => "functions",
            ObjectKind::Triggers => "triggers",
            ObjectKind::Policies => "policies",
            ObjectKind::Indexes => "indexes",
        };
        write!(f, "{}", s)
    }
}

/// All extracted objects of one side, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectCatalog {
    pub tables: Definitions,
    pub functions: Definitions,
    pub triggers: Definitions,
    pub policies: Definitions,
    pub indexes: Definitions,
}

impl ObjectCatalog {
    pub fn get(&self, kind: ObjectKind) -> &Definitions {
        match kind {
            ObjectKind::Tables => &self.tables,
            ObjectKind::Functions => &self.functions,
            ObjectKind::Triggers => &self.triggers,
            ObjectKind::Policies => &self.policies,
            ObjectKind::Indexes => &self.indexes,
        }
    }

    /// Iterate kinds in report order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKind, &Definitions)> {
        ObjectKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn total(&self) -> usize {
        self.iter().map(|(_, defs)| defs.len()).sum()
    }
}

/// A single column as known from one side.
///
/// `definition` is everything after the column name (`text NOT NULL DEFAULT ''`).
/// It is empty when only the name is known, e.g. from an INSERT column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub definition: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }

    pub fn name_only(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }
}

/// Restricts extraction and introspection to one schema and, optionally,
/// to tables whose names share a prefix (e.g. `rd_`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFilter {
    pub schema: String,
    pub prefix: Option<String>,
}

impl Default for ObjectFilter {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            prefix: None,
        }
    }
}

impl ObjectFilter {
    pub fn new(schema: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            schema: schema.into(),
            prefix: prefix.filter(|p| !p.is_empty()),
        }
    }

    /// Unqualified names are taken to live in the target schema.
    pub fn matches_schema(&self, schema: Option<&str>) -> bool {
        schema.map_or(true, |s| s == self.schema)
    }

    pub fn matches_table(&self, table: &str) -> bool {
        self.prefix.as_deref().map_or(true, |p| table.starts_with(p))
    }

    /// Functions are related to the prefix when their name contains it
    /// anywhere (`update_rd_reports_updated_at`).
    pub fn matches_function(&self, name: &str) -> bool {
        self.prefix.as_deref().map_or(true, |p| name.contains(p))
    }

    /// SQL `LIKE` pattern for the prefix, with `_` and `%` escaped.
    pub fn like_pattern(&self) -> Option<String> {
        self.prefix.as_ref().map(|p| {
            let escaped = p
                .replace('\\', "\\\\")
                .replace('_', "\\_")
                .replace('%', "\\%");
            format!("{}%", escaped)
        })
    }

    /// Table pattern for `pg_dump -t`
    pub fn pg_dump_pattern(&self) -> Option<String> {
        self.prefix
            .as_ref()
            .map(|p| format!("{}.{}*", self.schema, p))
    }
}
