//! Integration tests for data dump rewriting: `extract`, `strip-column`
//! and `patch-nulls`.

use crate::common::{parse_json, stderr, stdout, TestProject};

// ============================================================================
// extract
// ============================================================================

#[test]
fn test_extract_default_output() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&["extract", "--dump", "remote_data.sql", "--table", "rd_clients"]);
    assert!(stdout(&output).contains("rd_clients: 2 statement(s), 3 row(s)"));

    let sql = project.read_file("import_rd_clients.sql");
    assert!(sql.contains("-- Tables: rd_clients"));
    assert!(sql.contains("-- Total records: 3"));
    assert!(sql.contains("'O''Brien; Sons'"));
    assert!(!sql.contains("rd_reports"));
    assert!(!sql.contains("public.users"));
}

#[test]
fn test_extract_copy_block_json() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "--json",
        "extract",
        "--dump",
        "remote_data.sql",
        "--table",
        "public.rd_reports",
    ]);

    let json = parse_json(&output);
    assert_eq!(json["schema_id"], "pgreconcile.extract");
    assert_eq!(json["differences"], false);
    assert_eq!(json["data"]["statements"], 1);
    assert_eq!(json["data"]["rows"], 2);
    assert_eq!(json["data"]["output"], "import_public_rd_reports.sql");

    let sql = project.read_file("import_public_rd_reports.sql");
    assert!(sql.contains("COPY public.rd_reports (id, client_id, body) FROM stdin;\n1\t"));
    assert!(sql.contains("\n\\.\n"));
}

#[test]
fn test_extract_unknown_table_warns() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "extract",
        "--dump",
        "remote_data.sql",
        "--table",
        "rd_missing",
        "-o",
        "missing.sql",
    ]);

    assert!(stderr(&output).contains("no INSERT or COPY statements for rd_missing"));
    assert!(project.read_file("missing.sql").contains("-- Total records: 0"));
}

// ============================================================================
// strip-column
// ============================================================================

#[test]
fn test_strip_column_from_inserts() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "--json",
        "strip-column",
        "--dump",
        "remote_data.sql",
        "--table",
        "rd_clients",
        "--column",
        "email",
    ]);

    let json = parse_json(&output);
    assert_eq!(json["schema_id"], "pgreconcile.strip_column");
    assert_eq!(json["data"]["rewritten"], 2);
    assert_eq!(json["data"]["changed"], 3);
    assert_eq!(json["data"]["skipped"], 0);

    let sql = project.read_file("remote_data_without_email.sql");
    assert!(sql.contains(
        "INSERT INTO public.rd_clients (id, name) VALUES ('00000000-0000-0000-0000-000000000001', 'Acme'), ('00000000-0000-0000-0000-000000000002', 'Globex');"
    ));
    assert!(sql.contains("('00000000-0000-0000-0000-000000000003', 'O''Brien; Sons');"));
    // Other tables pass through untouched
    assert!(sql.contains("INSERT INTO public.users (id, email) VALUES"));
    assert!(sql.contains("COPY public.rd_reports (id, client_id, body) FROM stdin;"));
}

#[test]
fn test_strip_column_from_copy() {
    let project = TestProject::with_dumps();

    project.run_ok(&[
        "strip-column",
        "--dump",
        "remote_data.sql",
        "--table",
        "rd_reports",
        "--column",
        "body",
        "-o",
        "stripped.sql",
    ]);

    let sql = project.read_file("stripped.sql");
    assert!(sql.contains("COPY public.rd_reports (id, client_id) FROM stdin;"));
    assert!(sql.contains("\n1\t00000000-0000-0000-0000-000000000001\n"));
    assert!(sql.contains("\n2\t\\N\n"));
    assert!(!sql.contains("second"));
}

#[test]
fn test_strip_column_skips_statements_without_column_list() {
    let project = TestProject::new();
    project.write_file(
        "plain.sql",
        "INSERT INTO public.rd_notes VALUES (1, 'a');\n\
         INSERT INTO public.rd_notes (id, note) VALUES (2, 'b');\n",
    );

    let output = project.run_ok(&[
        "strip-column",
        "--dump",
        "plain.sql",
        "--table",
        "rd_notes",
        "--column",
        "note",
    ]);

    assert!(stderr(&output).contains("1 statement(s) for rd_notes left unchanged"));
    let sql = project.read_file("plain_without_note.sql");
    assert!(sql.contains("INSERT INTO public.rd_notes VALUES (1, 'a');"));
    assert!(sql.contains("INSERT INTO public.rd_notes (id) VALUES (2);"));
}

// ============================================================================
// patch-nulls
// ============================================================================

#[test]
fn test_patch_nulls_in_inserts() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "patch-nulls",
        "--dump",
        "remote_data.sql",
        "--table",
        "rd_clients",
        "--column",
        "email",
        "--value",
        "'unknown@example.test'",
    ]);
    assert!(stdout(&output).contains("rd_clients.email: 2 statement(s) rewritten, 2 NULL(s) replaced"));

    let sql = project.read_file("remote_data_patched.sql");
    assert!(sql.contains("('00000000-0000-0000-0000-000000000002', 'Globex', 'unknown@example.test')"));
    assert!(sql.contains("'O''Brien; Sons', 'unknown@example.test');"));
    assert!(sql.contains("'Acme', 'a@acme.test'"));
}

#[test]
fn test_patch_nulls_in_copy_block() {
    let project = TestProject::with_dumps();

    let output = project.run_ok(&[
        "--json",
        "patch-nulls",
        "--dump",
        "remote_data.sql",
        "--table",
        "rd_reports",
        "--column",
        "client_id",
        "--value",
        "'00000000-0000-0000-0000-000000000000'",
        "-o",
        "patched/data.sql",
    ]);

    let json = parse_json(&output);
    assert_eq!(json["schema_id"], "pgreconcile.patch_nulls");
    assert_eq!(json["data"]["changed"], 1);
    assert_eq!(json["data"]["output"], "patched/data.sql");

    let sql = project.read_file("patched/data.sql");
    assert!(sql.contains("\n2\t00000000-0000-0000-0000-000000000000\tsecond\n"));
}

#[test]
fn test_patch_nulls_rejects_empty_value() {
    let project = TestProject::with_dumps();

    let output = project.run_expect(
        &[
            "patch-nulls",
            "--dump",
            "remote_data.sql",
            "--table",
            "rd_clients",
            "--column",
            "email",
            "--value",
            " ",
        ],
        10,
    );
    assert!(stderr(&output).contains("--value must be a SQL literal"));
    assert!(!project.file_exists("remote_data_patched.sql"));
}
