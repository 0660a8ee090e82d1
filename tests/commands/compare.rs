//! Integration tests for the comparison commands run against dump files:
//! `functions`, `objects`, `columns` and `data`.

use crate::common::{names, parse_json, stderr, stdout, TestProject};

// ============================================================================
// functions
// ============================================================================

#[test]
fn test_functions_buckets_and_report() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &["functions", "--remote", "remote.sql", "--local-dump", "local.sql"],
        1,
    );

    let out = stdout(&output);
    assert!(out.contains("+ rd_client_count"), "remote-only missing: {}", out);
    assert!(out.contains("- local_debug"), "local-only missing: {}", out);
    assert!(out.contains("~ shared_helper"), "different missing: {}", out);
    assert!(stderr(&output).contains("Report written to"));

    let report = project.read_file("database_functions_comparison.md");
    assert!(report.starts_with("# Database Functions Comparison Report"));
    assert!(report.contains("| **Issues** | **3** |"));
    assert!(report.contains("```diff"));
}

#[test]
fn test_functions_json_ignores_prefix() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "--json",
            "--prefix",
            "rd_",
            "functions",
            "--remote",
            "remote.sql",
            "--local-dump",
            "local.sql",
            "-o",
            "functions.md",
        ],
        1,
    );

    let json = parse_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["schema_id"], "pgreconcile.functions");
    assert_eq!(json["differences"], true);

    let functions = &json["data"]["functions"];
    // CREATE OR REPLACE and the public. qualifier do not count as differences
    assert_eq!(names(&functions["same"]), vec!["touch_updated_at"]);
    assert_eq!(names(&functions["different"]), vec!["shared_helper"]);
    assert_eq!(names(&functions["remote_only"]), vec!["rd_client_count"]);
    assert_eq!(names(&functions["local_only"]), vec!["local_debug"]);
    assert_eq!(json["data"]["issues"], 3);

    assert_eq!(json["data"]["report"], "functions.md");
    assert!(project.file_exists("functions.md"));
}

#[test]
fn test_functions_identical_dumps_exit_zero() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "functions",
        "--remote",
        "remote.sql",
        "--local-dump",
        "remote.sql",
    ]);

    assert!(stdout(&output).contains("Identical: 3"));
    let report = project.read_file("database_functions_comparison.md");
    assert!(report.contains("All functions are synchronized!"));
}

// ============================================================================
// objects
// ============================================================================

#[test]
fn test_objects_prefix_scope() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "--json",
            "--prefix",
            "rd_",
            "objects",
            "--remote",
            "remote.sql",
            "--local-dump",
            "local.sql",
        ],
        1,
    );

    let json = parse_json(&output);
    assert_eq!(json["schema_id"], "pgreconcile.objects");
    assert_eq!(json["data"]["scope"], "rd_*");

    let kinds = json["data"]["kinds"].as_array().expect("kinds array");
    let kind = |name: &str| {
        kinds
            .iter()
            .find(|k| k["kind"] == name)
            .unwrap_or_else(|| panic!("kind {} missing: {:?}", name, kinds))
    };

    let tables = kind("tables");
    assert_eq!(names(&tables["remote_only"]), vec!["rd_reports"]);
    assert_eq!(names(&tables["different"]), vec!["rd_clients"]);
    // users is outside the prefix
    assert!(names(&tables["same"]).is_empty());

    assert_eq!(names(&kind("functions")["remote_only"]), vec!["rd_client_count"]);
    assert_eq!(names(&kind("triggers")["remote_only"]), vec!["rd_clients_touch"]);
    assert_eq!(
        names(&kind("policies")["remote_only"]),
        vec!["rd_clients.Clients are readable"]
    );
    assert_eq!(names(&kind("indexes")["remote_only"]), vec!["idx_rd_reports_client"]);

    let report = project.read_file("database_objects_comparison.md");
    assert!(report.starts_with("# rd_* Database Objects Comparison Report"));
    assert!(report.contains("## Priority Actions"));
}

#[test]
fn test_objects_without_prefix_is_all() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "objects",
            "--remote",
            "remote.sql",
            "--local-dump",
            "local.sql",
            "-o",
            "objects.md",
        ],
        1,
    );

    assert!(stdout(&output).contains("Comparing: remote.sql → local.sql"));
    let report = project.read_file("objects.md");
    assert!(report.starts_with("# All Database Objects Comparison Report"));
    assert!(report.contains("`users`"));
}

// ============================================================================
// columns
// ============================================================================

#[test]
fn test_columns_writes_add_column_migration() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "--prefix",
            "rd_",
            "columns",
            "--remote",
            "remote.sql",
            "--local-dump",
            "local.sql",
        ],
        1,
    );
    assert!(stderr(&output).contains("Migration written to"));

    let sql = project.read_file("add_missing_columns.sql");
    assert!(sql.contains("BEGIN;"));
    assert!(sql.contains("ALTER TABLE public.rd_clients ADD COLUMN IF NOT EXISTS email text;"));
    assert!(sql.contains(
        "ALTER TABLE public.rd_clients ADD COLUMN IF NOT EXISTS updated_at timestamp with time zone DEFAULT now();"
    ));
    assert!(sql.contains("-- CREATE TABLE public.rd_reports (...);"));
    // Extra local columns are never dropped
    assert!(!sql.contains("legacy_code"));
    assert!(sql.trim_end().ends_with("COMMIT;"));
}

#[test]
fn test_columns_json_payload() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "--json",
            "--prefix",
            "rd_",
            "columns",
            "--remote",
            "remote.sql",
            "--local-dump",
            "local.sql",
            "-o",
            "cols.sql",
        ],
        1,
    );

    let json = parse_json(&output);
    let data = &json["data"];
    assert_eq!(json["schema_id"], "pgreconcile.columns");
    assert_eq!(data["source"], "create-table");
    assert_eq!(data["missing_columns"], 2);
    assert_eq!(data["migration"], "cols.sql");
    assert_eq!(names(&data["comparison"]["missing_tables"]), vec!["rd_reports"]);

    let table = &data["comparison"]["tables"][0];
    assert_eq!(table["table"], "rd_clients");
    assert_eq!(table["missing"][0]["name"], "email");
    assert_eq!(names(&table["extra"]), vec!["legacy_code"]);
    assert!(project.file_exists("cols.sql"));
}

#[test]
fn test_columns_from_insert_lists() {
    let project = TestProject::with_dumps();

    project.run_expect(
        &[
            "--prefix",
            "rd_",
            "columns",
            "--source",
            "inserts",
            "--remote",
            "remote_data.sql",
            "--local-dump",
            "local.sql",
        ],
        1,
    );

    // Column types are unknown from INSERT lists
    let sql = project.read_file("add_missing_columns.sql");
    assert!(sql.contains("ALTER TABLE public.rd_clients ADD COLUMN IF NOT EXISTS email TEXT;"));
    assert!(!sql.contains("updated_at"));
}

#[test]
fn test_columns_clean_writes_nothing() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "columns",
        "--remote",
        "remote.sql",
        "--local-dump",
        "remote.sql",
    ]);

    assert!(stderr(&output).contains("no migration written"));
    assert!(!project.file_exists("add_missing_columns.sql"));
}

// ============================================================================
// data
// ============================================================================

#[test]
fn test_data_imports_missing_tables_only() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "--json",
            "--prefix",
            "rd_",
            "data",
            "--remote",
            "remote_data.sql",
            "--local-dump",
            "local_data.sql",
        ],
        1,
    );

    let json = parse_json(&output);
    let data = &json["data"];
    assert_eq!(json["schema_id"], "pgreconcile.data");
    assert_eq!(names(&data["imported"]), vec!["rd_reports"]);
    assert_eq!(data["rows"], 2);
    assert_eq!(data["output"], "import_missing_tables.sql");

    let tables = data["tables"].as_array().expect("tables array");
    let status = |name: &str| {
        tables
            .iter()
            .find(|t| t["table"] == name)
            .map(|t| t["status"].as_str().unwrap_or_default().to_string())
    };
    assert_eq!(status("rd_clients").as_deref(), Some("PARTIAL_DATA"));
    assert_eq!(status("rd_reports").as_deref(), Some("NEEDS_IMPORT"));
    assert_eq!(status("users"), None);

    let sql = project.read_file("import_missing_tables.sql");
    assert!(sql.contains("SET session_replication_role = replica;"));
    assert!(sql.contains("COPY public.rd_reports (id, client_id, body) FROM stdin;"));
    assert!(sql.contains("\\."));
    assert!(!sql.contains("INSERT INTO public.rd_clients"));
    assert!(sql.contains("SET session_replication_role = DEFAULT;"));
}

#[test]
fn test_data_include_partial() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "--prefix",
            "rd_",
            "data",
            "--remote",
            "remote_data.sql",
            "--local-dump",
            "local_data.sql",
            "--include-partial",
            "-o",
            "out/import.sql",
        ],
        1,
    );

    let out = stdout(&output);
    assert!(out.contains("NEEDS IMPORT"), "status table missing: {}", out);
    assert!(out.contains("PARTIAL DATA"), "status table missing: {}", out);

    let sql = project.read_file("out/import.sql");
    assert!(sql.contains("-- Tables: rd_clients, rd_reports"));
    assert!(sql.contains("-- Total records: 5"));
    // The semicolon inside the quoted name must not split the statement
    assert!(sql.contains("'O''Brien; Sons', NULL);"));
}

#[test]
fn test_data_import_ignores_same_named_tables_in_other_schemas() {
    let project = TestProject::new();
    project.write_file(
        "remote_data.sql",
        "INSERT INTO auth.users (id) VALUES (1), (2), (3);\n\
         INSERT INTO public.users (id) VALUES (10);\n",
    );
    project.write_file("local_data.sql", "");

    let output = project.run_expect(
        &[
            "--json",
            "data",
            "--remote",
            "remote_data.sql",
            "--local-dump",
            "local_data.sql",
        ],
        1,
    );

    let json = parse_json(&output);
    let data = &json["data"];
    assert_eq!(names(&data["imported"]), vec!["users"]);
    assert_eq!(data["tables"][0]["remote"], 1);
    // Import total agrees with the status table
    assert_eq!(data["rows"], 1);

    let sql = project.read_file("import_missing_tables.sql");
    assert!(sql.contains("-- Total records: 1"));
    assert!(sql.contains("INSERT INTO public.users (id) VALUES (10);"));
    assert!(!sql.contains("auth.users"), "other schema leaked: {}", sql);
}

#[test]
fn test_data_complete_exit_zero() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "--json",
        "data",
        "--remote",
        "remote_data.sql",
        "--local-dump",
        "remote_data.sql",
    ]);

    let json = parse_json(&output);
    assert_eq!(json["differences"], false);
    assert!(json["data"].get("output").is_none());
    assert!(!project.file_exists("import_missing_tables.sql"));
}
