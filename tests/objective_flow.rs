// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fiscus::commands::reports::month_spend;
use fiscus::models::ObjectiveKind;
use fiscus::objective::{AlertStatus, alert_status, percent_attained, remaining_balance};
use fiscus::{cli, commands, db};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn run_objective(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["fiscus", "objective"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().try_get_matches_from(argv).unwrap();
    let Some(("objective", sub)) = matches.subcommand() else {
        panic!("expected objective subcommand");
    };
    commands::objectives::handle(conn, sub)
}

fn add_expense(conn: &Connection, user: &str, category_id: i64, date: &str, amount: &str) {
    conn.execute(
        "INSERT INTO transactions(date, amount, description, kind, category_id, user_id)
         VALUES (?1, ?2, 'spend', 'expense', ?3, ?4)",
        params![date, amount, category_id, user],
    )
    .unwrap();
}

fn groceries_id(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT id FROM categories WHERE name='Groceries' AND is_default=1",
        [],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn category_limit_requires_a_category() {
    let conn = db::open_in_memory().unwrap();
    let err = run_objective(
        &conn,
        &[
            "set", "--user", "alice", "--name", "Food cap", "--kind", "category-limit",
            "--target", "1000", "--period", "2025-08",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("requires --category"));
}

#[test]
fn set_upserts_and_progress_accumulates() {
    let conn = db::open_in_memory().unwrap();
    run_objective(
        &conn,
        &[
            "set", "--user", "alice", "--name", "Emergency fund", "--kind", "monthly-savings",
            "--target", "1000", "--period", "2025-08",
        ],
    )
    .unwrap();
    run_objective(
        &conn,
        &[
            "progress", "--user", "alice", "--name", "Emergency fund", "--period", "2025-08",
            "--amount", "400",
        ],
    )
    .unwrap();
    run_objective(
        &conn,
        &[
            "progress", "--user", "alice", "--name", "Emergency fund", "--period", "2025-08",
            "--amount", "200",
        ],
    )
    .unwrap();
    // Re-setting updates the target without resetting progress.
    run_objective(
        &conn,
        &[
            "set", "--user", "alice", "--name", "Emergency fund", "--kind", "monthly-savings",
            "--target", "1200", "--period", "2025-08",
        ],
    )
    .unwrap();

    let (target, current): (String, String) = conn
        .query_row(
            "SELECT target_amount, current_amount FROM objectives WHERE user_id='alice' AND name='Emergency fund'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(Decimal::from_str_exact(&target).unwrap(), Decimal::from(1200));
    assert_eq!(Decimal::from_str_exact(&current).unwrap(), Decimal::from(600));

    // One row only: the second set hit the upsert path.
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM objectives", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn progress_is_rejected_for_category_limits() {
    let conn = db::open_in_memory().unwrap();
    run_objective(
        &conn,
        &[
            "set", "--user", "alice", "--name", "Food cap", "--kind", "category-limit",
            "--target", "1000", "--period", "2025-08", "--category", "Groceries",
        ],
    )
    .unwrap();
    let err = run_objective(
        &conn,
        &[
            "progress", "--user", "alice", "--name", "Food cap", "--period", "2025-08",
            "--amount", "100",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("track spending"));
}

#[test]
fn category_limit_is_measured_against_the_ledger() {
    let conn = db::open_in_memory().unwrap();
    let groceries = groceries_id(&conn);

    add_expense(&conn, "alice", groceries, "2025-08-05", "600.00");
    add_expense(&conn, "alice", groceries, "2025-08-20", "900.00");
    // Out of scope for the 2025-08 window: other month, other user.
    add_expense(&conn, "alice", groceries, "2025-07-31", "250.00");
    add_expense(&conn, "bob", groceries, "2025-08-10", "999.00");
    // Income never counts toward spending.
    conn.execute(
        "INSERT INTO transactions(date, amount, description, kind, category_id, user_id)
         VALUES ('2025-08-12', '100.00', 'refund', 'income', ?1, 'alice')",
        params![groceries],
    )
    .unwrap();

    let spent = month_spend(&conn, "alice", groceries, "2025-08").unwrap();
    assert_eq!(spent, Decimal::from(1500));

    let target = Decimal::from(1000);
    assert_eq!(percent_attained(Some(spent), target), Decimal::new(15000, 2));
    assert_eq!(remaining_balance(Some(spent), target), Decimal::from(-500));
    // 150% over a limit warns, it never "completes".
    assert_eq!(
        alert_status(ObjectiveKind::CategoryLimit, Some(spent), target),
        AlertStatus::Red
    );
    assert_eq!(
        alert_status(ObjectiveKind::MonthlySavings, Some(spent), target),
        AlertStatus::Completed
    );
}
