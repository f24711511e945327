//! CLI integration tests
//!
//! Drive the built binary against temporary databases.

use rusqlite::Connection;
use std::process::Command;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tabula-cli"))
}

#[test]
fn test_compile_prints_clause_and_args() {
    let predicate = r#"{"compound":{"connector":"and","subexpressions":[
        {"comparison":{"left":{"key_path":"title"},"operator":"begins_with","right":{"constant":{"text":"50%"}}}},
        {"comparison":{"left":{"key_path":"rank"},"operator":"between","right":{"aggregate":[{"constant":{"integer":1}},{"constant":{"integer":5}}]}}}
    ]}}"#;

    let output = cli()
        .args([
            "compile",
            predicate,
            "--map",
            "title=title_col",
            "--map",
            "rank=rank",
            "--sort",
            "rank:desc",
        ])
        .output()
        .expect("Failed to execute CLI");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["clause"],
        "(\"title_col\" GLOB ? AND \"rank\" BETWEEN ? AND ?)"
    );
    assert_eq!(json["args"], serde_json::json!(["50%*", 1, 5]));
    assert_eq!(json["order_by"], "ORDER BY \"rank\" DESC");
}

#[test]
fn test_compile_rejects_unmapped_property() {
    let predicate = r#"{"comparison":{"left":{"key_path":"title"},"operator":"equal","right":{"constant":{"text":"x"}}}}"#;
    let output = cli()
        .args(["compile", predicate])
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("title"));
}

#[test]
fn test_query_prints_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("store.db");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE notes (id INTEGER PRIMARY KEY, title TEXT, score REAL);
        INSERT INTO notes (title, score) VALUES ('first', 1.5), ('second', NULL), ('third', 3.0);
        "#,
    )
    .unwrap();
    drop(conn);

    let output = cli()
        .args([
            "query",
            "SELECT id, title, score FROM notes WHERE id >= ? ORDER BY id",
            "--db",
            db_path.to_str().unwrap(),
            "--arg",
            "2",
        ])
        .output()
        .expect("Failed to execute CLI");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["title"], "second");
    assert!(rows[0]["score"].is_null());
    assert_eq!(rows[1]["score"], 3.0);
}

#[test]
fn test_query_requires_a_database() {
    let output = cli()
        .args(["query", "SELECT 1"])
        .output()
        .expect("Failed to execute CLI");
    assert!(!output.status.success());
}
