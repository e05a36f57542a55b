// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fiscus::{cli, commands::exporter, db};
use rusqlite::{Connection, params};
use serde_json::json;
use tempfile::tempdir;

fn seeded_conn() -> Connection {
    let conn = db::open_in_memory().unwrap();
    let groceries: i64 = conn
        .query_row(
            "SELECT id FROM categories WHERE name='Groceries' AND is_default=1",
            [],
            |r| r.get(0),
        )
        .unwrap();
    conn.execute(
        "INSERT INTO transactions(date, amount, description, kind, payment_method, category_id, user_id)
         VALUES ('2025-01-02', '12.34', 'Corner Shop', 'expense', 'card', ?1, 'alice')",
        params![groceries],
    )
    .unwrap();
    // Another user's rows never leak into the export.
    conn.execute(
        "INSERT INTO transactions(date, amount, description, kind, user_id)
         VALUES ('2025-01-03', '99.00', 'Not yours', 'expense', 'bob')",
        [],
    )
    .unwrap();
    conn
}

fn run_export(conn: &Connection, format: &str, out: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().try_get_matches_from([
        "fiscus",
        "export",
        "transactions",
        "--user",
        "alice",
        "--format",
        format,
        "--out",
        out,
    ])
    .unwrap();
    let Some(("export", export_m)) = matches.subcommand() else {
        panic!("no export subcommand");
    };
    exporter::handle(conn, export_m)
}

#[test]
fn export_transactions_streams_pretty_json() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    run_export(&conn, "json", &out_str).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-01-02",
                "description": "Corner Shop",
                "amount": "12.34",
                "kind": "expense",
                "category": "Groceries",
                "method": "card",
                "schedule_id": null,
                "investment_id": null
            }
        ])
    );
}

#[test]
fn export_transactions_writes_csv_header_and_rows() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    run_export(&conn, "csv", &out_str).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "date,description,amount,kind,category,method,schedule_id,investment_id"
    );
    assert_eq!(
        lines.next().unwrap(),
        "2025-01-02,Corner Shop,12.34,expense,Groceries,card,,"
    );
    assert!(lines.next().is_none());
}

#[test]
fn export_transactions_rejects_unknown_format() {
    let conn = seeded_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    let out_str = out_path.to_string_lossy().to_string();

    assert!(run_export(&conn, "xml", &out_str).is_err());
    assert!(!out_path.exists());
}
