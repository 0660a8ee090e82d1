//! Comparisons against a live local database.

use crate::common::{names, parse_json, TestDatabase, TestProject};

const LOCAL_TABLES: &str = "
CREATE TABLE public.rd_clients (id uuid NOT NULL PRIMARY KEY, name text NOT NULL, legacy_code text);
CREATE TABLE public.rd_reports (id integer NOT NULL, client_id uuid, body text);
CREATE TABLE public.users (id uuid NOT NULL, email text);
";

fn setup() -> (TestDatabase, TestProject) {
    let db = TestDatabase::new();
    db.run_sql_ok(LOCAL_TABLES);
    let project = TestProject::with_database(&db);
    for (name, contents) in [
        ("remote.sql", crate::common::REMOTE_SCHEMA),
        ("remote_data.sql", crate::common::REMOTE_DATA),
    ] {
        project.write_file(name, contents);
    }
    (db, project)
}

#[test]
fn test_columns_from_information_schema() {
    skip_if_no_db!();
    let (_db, project) = setup();

    let output = project.run_expect(
        &["--json", "--prefix", "rd_", "columns", "--remote", "remote.sql"],
        1,
    );

    let json = parse_json(&output);
    let data = &json["data"];
    assert_eq!(data["missing_columns"], 2);
    assert!(names(&data["comparison"]["missing_tables"]).is_empty());
    assert_eq!(names(&data["comparison"]["matching"]), vec!["rd_reports"]);

    let sql = project.read_file("add_missing_columns.sql");
    assert!(sql.contains("ADD COLUMN IF NOT EXISTS email text;"));
}

#[test]
fn test_data_counts_local_rows() {
    skip_if_no_db!();
    let (db, project) = setup();
    db.run_sql_ok(
        "INSERT INTO public.rd_clients (id, name) VALUES ('00000000-0000-0000-0000-000000000001', 'Acme')",
    );

    let output = project.run_expect(
        &["--json", "--prefix", "rd_", "data", "--remote", "remote_data.sql"],
        1,
    );

    let json = parse_json(&output);
    let tables = json["data"]["tables"].as_array().expect("tables");
    let row = |name: &str| {
        tables
            .iter()
            .find(|t| t["table"] == name)
            .unwrap_or_else(|| panic!("{} missing: {:?}", name, tables))
    };
    assert_eq!(row("rd_clients")["local"], 1);
    assert_eq!(row("rd_clients")["status"], "PARTIAL_DATA");
    assert_eq!(row("rd_reports")["local"], 0);
    assert_eq!(row("rd_reports")["status"], "NEEDS_IMPORT");
    assert_eq!(names(&json["data"]["imported"]), vec!["rd_reports"]);
}

#[test]
fn test_functions_from_catalog() {
    skip_if_no_db!();
    let (db, project) = setup();
    db.run_sql_ok(
        "CREATE FUNCTION public.shared_helper(x integer) RETURNS integer LANGUAGE sql AS $$ SELECT x + 1; $$",
    );

    let output = project.run_expect(&["--json", "functions", "--remote", "remote.sql"], 1);

    let json = parse_json(&output);
    let functions = &json["data"]["functions"];
    let remote_only = names(&functions["remote_only"]);
    assert!(remote_only.contains(&"rd_client_count".to_string()));
    assert!(remote_only.contains(&"touch_updated_at".to_string()));
    assert!(!remote_only.contains(&"shared_helper".to_string()));
    assert!(names(&functions["local_only"]).is_empty());
}

#[test]
fn test_objects_through_pg_dump() {
    skip_if_no_db!();
    let (_db, project) = setup();

    let output = project.run_expect(
        &["--json", "--prefix", "rd_", "objects", "--remote", "remote.sql"],
        1,
    );

    let json = parse_json(&output);
    let kinds = json["data"]["kinds"].as_array().expect("kinds");
    let tables = kinds
        .iter()
        .find(|k| k["kind"] == "tables")
        .expect("tables kind");
    assert!(names(&tables["remote_only"]).is_empty());
    let seen: Vec<String> = ["same", "different"]
        .iter()
        .flat_map(|bucket| names(&tables[*bucket]))
        .collect();
    assert!(seen.contains(&"rd_clients".to_string()));
    assert!(seen.contains(&"rd_reports".to_string()));
    assert!(!seen.contains(&"users".to_string()));
}
