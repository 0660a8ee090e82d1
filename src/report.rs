//! Markdown reports and console summaries.

use crate::compare::{line_diff, CatalogComparison, ColumnComparison, Comparison, DataStatus, TableCount};
use colored::Colorize;

// =============================================================================
// Markdown Reports
// =============================================================================

/// Functions comparison report.
pub fn functions_report(cmp: &Comparison, generated_at: &str) -> String {
    let issues = cmp.issues();
    let mut r = String::new();

    r.push_str("# Database Functions Comparison Report\n\n");
    r.push_str(&format!("Generated on: {}\n\n", generated_at));
    r.push_str("## Summary\n\n");
    r.push_str("| Status | Count | Description |\n");
    r.push_str("|--------|-------|-------------|\n");
    r.push_str(&format!(
        "| ✅ Identical | {} | Functions that are exactly the same |\n",
        cmp.same.len()
    ));
    r.push_str(&format!(
        "| 🔄 Different | {} | Functions that exist in both but differ |\n",
        cmp.different.len()
    ));
    r.push_str(&format!(
        "| ➕ Remote Only | {} | Functions missing from local database |\n",
        cmp.remote_only.len()
    ));
    r.push_str(&format!(
        "| ➖ Local Only | {} | Functions missing from remote database |\n",
        cmp.local_only.len()
    ));
    r.push_str(&format!(
        "| **Total** | **{}** | **Total functions analyzed** |\n",
        cmp.total()
    ));
    r.push_str(&format!(
        "| **Issues** | **{}** | **Functions requiring attention** |\n\n",
        issues
    ));

    if issues == 0 {
        r.push_str("🎉 **All functions are synchronized!**\n\n");
    } else {
        r.push_str(&format!("⚠️ **{} functions need attention**\n\n", issues));
    }

    let priorities = [
        (
            "🔴 High Priority: Missing Functions",
            "exist in remote but not locally. These should be created",
            cmp.remote_only.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        ),
        (
            "🟡 Medium Priority: Different Functions",
            "have differences that should be reviewed",
            cmp.different.iter().map(|f| f.name.as_str()).collect(),
        ),
        (
            "🟢 Low Priority: Local Only Functions",
            "exist only locally. Review if needed",
            cmp.local_only.iter().map(|f| f.name.as_str()).collect(),
        ),
    ];
    for (title, description, names) in priorities {
        if names.is_empty() {
            continue;
        }
        r.push_str(&format!("### {}\n", title));
        r.push_str(&format!("**{} functions** {}:\n", names.len(), description));
        for name in names {
            r.push_str(&format!("- `{}`\n", name));
        }
        r.push('\n');
    }

    if !cmp.same.is_empty() {
        r.push_str(&format!("## ✅ Identical Functions ({})\n\n", cmp.same.len()));
        for name in &cmp.same {
            r.push_str(&format!("- `{}`\n", name));
        }
        r.push('\n');
    }

    if !cmp.different.is_empty() {
        r.push_str(&format!("## 🔄 Different Functions ({})\n\n", cmp.different.len()));
        for pair in &cmp.different {
            r.push_str(&format!("### `{}`\n\n", pair.name));
            r.push_str("**Differences:**\n```diff\n");
            r.push_str(&line_diff(&pair.remote, &pair.local));
            r.push_str("\n```\n\n");
        }
    }

    if !cmp.remote_only.is_empty() {
        r.push_str(&format!(
            "## ➕ Missing Functions (Remote Only) ({})\n\n",
            cmp.remote_only.len()
        ));
        for f in &cmp.remote_only {
            r.push_str(&format!("### `{}`\n\n", f.name));
            r.push_str("**Definition to add locally:**\n```sql\n");
            r.push_str(&f.definition);
            r.push_str("\n```\n\n");
        }
    }

    if !cmp.local_only.is_empty() {
        r.push_str(&format!("## ➖ Local Only Functions ({})\n\n", cmp.local_only.len()));
        for f in &cmp.local_only {
            r.push_str(&format!("### `{}`\n\n", f.name));
            r.push_str("**Local definition:**\n```sql\n");
            r.push_str(&f.definition);
            r.push_str("\n```\n\n");
        }
    }

    r
}

/// Status marker for a per-kind issue count.
fn status_marker(issues: usize) -> &'static str {
    match issues {
        0 => "✅",
        1..=4 => "⚠️",
        _ => "❌",
    }
}

/// Object comparison report across all kinds.
pub fn objects_report(cmp: &CatalogComparison, scope: &str, generated_at: &str) -> String {
    let mut r = String::new();

    r.push_str(&format!("# {} Database Objects Comparison Report\n\n", scope));
    r.push_str(&format!("Generated on: {}\n\n", generated_at));
    r.push_str("## Summary\n\n");
    r.push_str("| Object Type | Total | Same | Different | Remote Only | Local Only | Issues |\n");
    r.push_str("|-------------|-------|------|-----------|-------------|------------|--------|\n");
    for (kind, c) in &cmp.kinds {
        r.push_str(&format!(
            "| {} {} | {} | {} | {} | {} | {} | {} |\n",
            status_marker(c.issues()),
            kind.title(),
            c.total(),
            c.same.len(),
            c.different.len(),
            c.remote_only.len(),
            c.local_only.len(),
            c.issues()
        ));
    }
    r.push_str(&format!("\n**Total Issues: {}**\n", cmp.total_issues()));

    let mut high = Vec::new();
    let mut medium = Vec::new();
    for (kind, c) in &cmp.kinds {
        if !c.remote_only.is_empty() {
            high.push(format!(
                "**{} {}** missing locally - need to create",
                c.remote_only.len(),
                kind
            ));
        }
        if !c.different.is_empty() {
            medium.push(format!(
                "**{} {}** have differences - need to review and sync",
                c.different.len(),
                kind
            ));
        }
        if !c.local_only.is_empty() {
            medium.push(format!(
                "**{} {}** exist only locally - may need to remove or keep",
                c.local_only.len(),
                kind
            ));
        }
    }

    r.push_str("\n## Priority Actions\n\n");
    if high.is_empty() && medium.is_empty() {
        r.push_str("🎉 **All objects are synchronized!**\n\n");
    }
    for (title, items) in [("🔴 High Priority", &high), ("🟡 Medium Priority", &medium)] {
        if items.is_empty() {
            continue;
        }
        r.push_str(&format!("### {}\n", title));
        for item in items {
            r.push_str(&format!("- {}\n", item));
        }
        r.push('\n');
    }

    for (kind, c) in &cmp.kinds {
        if c.total() == 0 {
            continue;
        }
        r.push_str(&format!("\n## {}\n\n", kind.title()));

        if !c.same.is_empty() {
            r.push_str(&format!("### ✅ Identical ({})\n\n", c.same.len()));
            for name in &c.same {
                r.push_str(&format!("- `{}`\n", name));
            }
            r.push('\n');
        }

        if !c.different.is_empty() {
            r.push_str(&format!("### 🔄 Different ({})\n\n", c.different.len()));
            for pair in &c.different {
                r.push_str(&format!("#### `{}`\n\n", pair.name));
                r.push_str("**Difference:**\n```diff\n");
                r.push_str(&line_diff(&pair.local, &pair.remote));
                r.push_str("\n```\n\n");
            }
        }

        for (title, items) in [
            ("➕ Missing Locally", &c.remote_only),
            ("➖ Local Only", &c.local_only),
        ] {
            if items.is_empty() {
                continue;
            }
            r.push_str(&format!("### {} ({})\n\n", title, items.len()));
            for item in items {
                r.push_str(&format!("#### `{}`\n\n```sql\n", item.name));
                r.push_str(&item.definition);
                r.push_str("\n```\n\n");
            }
        }
    }

    r
}

// =============================================================================
// Console Summaries
// =============================================================================

fn legend(remote_label: &str, local_label: &str) -> Vec<String> {
    vec![
        format!("Comparing: {} → {}", remote_label, local_label),
        String::new(),
        "Legend:".to_string(),
        format!("  {} exists in remote only", "+".green()),
        format!("  {} exists locally only", "-".red()),
        format!("  {} exists in both but differs", "~".yellow()),
    ]
}

/// One line per object kind with bucket counts.
pub fn format_catalog_summary(cmp: &CatalogComparison, remote_label: &str, local_label: &str) -> String {
    let mut output = legend(remote_label, local_label);
    output.push(String::new());
    output.push(format!(
        "  {:<10} {:>6} {:>6} {:>9} {:>7} {:>6}",
        "", "total", "same", "different", "remote", "local"
    ));
    for (kind, c) in &cmp.kinds {
        output.push(format!(
            "  {:<10} {:>6} {:>6} {:>9} {:>7} {:>6}",
            kind.title(),
            c.total(),
            c.same.len(),
            c.different.len(),
            c.remote_only.len(),
            c.local_only.len()
        ));
    }
    output.push(String::new());
    output.push(issue_line(cmp.total_issues()));
    output.join("\n")
}

/// Names in each non-identical bucket of one comparison.
pub fn format_comparison(cmp: &Comparison, what: &str, remote_label: &str, local_label: &str) -> String {
    let mut output = legend(remote_label, local_label);
    if cmp.issues() > 0 {
        output.push(String::new());
        output.push(format!("{}:", what));
        for f in &cmp.remote_only {
            output.push(format!("  {} {}", "+".green(), f.name));
        }
        for f in &cmp.local_only {
            output.push(format!("  {} {}", "-".red(), f.name));
        }
        for f in &cmp.different {
            output.push(format!("  {} {} (differs)", "~".yellow(), f.name));
        }
    }
    output.push(String::new());
    output.push(format!(
        "Identical: {}  Different: {}  Remote only: {}  Local only: {}",
        cmp.same.len(),
        cmp.different.len(),
        cmp.remote_only.len(),
        cmp.local_only.len()
    ));
    output.push(issue_line(cmp.issues()));
    output.join("\n")
}

fn issue_line(issues: usize) -> String {
    if issues == 0 {
        format!("{}", "No differences found.".green())
    } else {
        format!("{}", format!("{} issue(s) found.", issues).yellow())
    }
}

/// Column differences, table by table.
pub fn format_column_comparison(cmp: &ColumnComparison, remote_label: &str, local_label: &str) -> String {
    let mut output = legend(remote_label, local_label);

    if !cmp.missing_tables.is_empty() || !cmp.local_only_tables.is_empty() {
        output.push(String::new());
        output.push("Tables:".to_string());
        for t in &cmp.missing_tables {
            output.push(format!("  {} {}", "+".green(), t));
        }
        for t in &cmp.local_only_tables {
            output.push(format!("  {} {}", "-".red(), t));
        }
    }

    if !cmp.tables.is_empty() {
        output.push(String::new());
        output.push("Columns:".to_string());
        for t in &cmp.tables {
            output.push(format!(
                "  {} {} (remote {} columns, local {} columns)",
                "~".yellow(),
                t.table,
                t.remote_columns,
                t.local_columns
            ));
            for col in &t.missing {
                if col.definition.is_empty() {
                    output.push(format!("      {} column: {}", "+".green(), col.name));
                } else {
                    output.push(format!(
                        "      {} column: {} ({})",
                        "+".green(),
                        col.name,
                        col.definition
                    ));
                }
            }
            for name in &t.extra {
                output.push(format!("      {} column: {}", "-".red(), name));
            }
        }
    }

    output.push(String::new());
    output.push(format!(
        "Matching tables: {}  Missing tables: {}  Tables with column differences: {}  Missing columns: {}",
        cmp.matching.len(),
        cmp.missing_tables.len(),
        cmp.tables.len(),
        cmp.missing_column_count()
    ));
    output.push(issue_line(cmp.issues()));
    output.join("\n")
}

fn colored_status(status: DataStatus) -> String {
    let label = format!("{:<12}", status.label());
    match status {
        DataStatus::NeedsImport => label.red().bold().to_string(),
        DataStatus::PartialData => label.yellow().to_string(),
        DataStatus::Complete => label.green().to_string(),
        DataStatus::Empty => label.dimmed().to_string(),
        DataStatus::LocalOnly => label.cyan().to_string(),
    }
}

/// Aligned row-count table.
pub fn format_counts(counts: &[TableCount]) -> String {
    let width = counts
        .iter()
        .map(|c| c.table.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = Vec::new();
    output.push(format!(
        "  {:<width$}  {:>10}  {:>10}  {}",
        "Table",
        "Remote",
        "Local",
        "Status",
        width = width
    ));
    output.push(format!("  {}", "-".repeat(width + 38)));
    for c in counts {
        output.push(format!(
            "  {:<width$}  {:>10}  {:>10}  {}",
            c.table,
            c.remote,
            c.local,
            colored_status(c.status),
            width = width
        ));
    }

    let needs = counts.iter().filter(|c| c.status == DataStatus::NeedsImport).count();
    let partial = counts.iter().filter(|c| c.status == DataStatus::PartialData).count();
    let missing_rows: u64 = counts
        .iter()
        .filter(|c| c.status.needs_rows())
        .map(|c| c.remote - c.local)
        .sum();
    output.push(String::new());
    output.push(format!(
        "Tables needing import: {}  Partial: {}  Missing records: {}",
        needs, partial, missing_rows
    ));
    output.join("\n")
}
