// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fiscus::{cli, commands, db, synth};
use rusqlite::{Connection, params};

fn add_investment(conn: &Connection, user: &str, symbol: &str, name: &str) -> i64 {
    conn.execute(
        "INSERT INTO investments(symbol, name, user_id) VALUES (?1, ?2, ?3)",
        params![symbol, name, user],
    )
    .unwrap();
    conn.last_insert_rowid()
}

/// Drives the real CLI surface the way a user would.
fn run_investment(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["fiscus", "investment"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().try_get_matches_from(argv).unwrap();
    let Some(("investment", sub)) = matches.subcommand() else {
        panic!("expected investment subcommand");
    };
    commands::investments::handle(conn, sub)
}

#[test]
fn purchase_flow_updates_position_and_posts_expense_with_fees() {
    let mut conn = db::open_in_memory().unwrap();
    add_investment(&conn, "alice", "VWCE", "Vanguard FTSE All-World");

    run_investment(
        &mut conn,
        &[
            "movement", "--user", "alice", "--symbol", "vwce", "--kind", "purchase", "--date",
            "2025-06-01", "--quantity", "10", "--price", "100", "--fees", "10",
        ],
    )
    .unwrap();

    // Position reflects cost including fees.
    let (quantity, average, invested): (String, String, String) = conn
        .query_row(
            "SELECT quantity, average_price, total_invested FROM investments WHERE symbol='VWCE'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(quantity, "10");
    assert_eq!(
        rust_decimal::Decimal::from_str_exact(&average).unwrap(),
        rust_decimal::Decimal::from(101)
    );
    assert_eq!(invested, "1010.00");

    // The ledger counterpart is an expense of amount + fees, categorized
    // under a lazily created personal 'Investments' category.
    let (amount, kind, description, category_id): (String, String, String, i64) = conn
        .query_row(
            "SELECT amount, kind, description, category_id FROM transactions",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(amount, "1010.00");
    assert_eq!(kind, "expense");
    assert_eq!(description, "Purchase - Vanguard FTSE All-World (VWCE)");

    let (cat_name, cat_kind, cat_user, cat_default): (String, String, String, bool) = conn
        .query_row(
            "SELECT name, kind, user_id, is_default FROM categories WHERE id=?1",
            params![category_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(cat_name, "Investments");
    assert_eq!(cat_kind, "expense");
    assert_eq!(cat_user, "alice");
    assert!(!cat_default);
}

#[test]
fn sale_flow_posts_income_excluding_fees() {
    let mut conn = db::open_in_memory().unwrap();
    add_investment(&conn, "alice", "VWCE", "Vanguard FTSE All-World");
    run_investment(
        &mut conn,
        &[
            "movement", "--user", "alice", "--symbol", "VWCE", "--kind", "purchase", "--date",
            "2025-06-01", "--quantity", "10", "--price", "100",
        ],
    )
    .unwrap();

    run_investment(
        &mut conn,
        &[
            "movement", "--user", "alice", "--symbol", "VWCE", "--kind", "sale", "--date",
            "2025-07-01", "--quantity", "5", "--price", "100", "--fees", "5",
        ],
    )
    .unwrap();

    let (amount, kind): (String, String) = conn
        .query_row(
            "SELECT amount, kind FROM transactions WHERE kind='income'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(amount, "500.00");
    assert_eq!(kind, "income");

    let quantity: String = conn
        .query_row("SELECT quantity FROM investments WHERE symbol='VWCE'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(quantity, "5");
}

#[test]
fn adjustment_flow_shifts_quantity_but_posts_nothing() {
    let mut conn = db::open_in_memory().unwrap();
    add_investment(&conn, "alice", "VWCE", "Vanguard FTSE All-World");
    run_investment(
        &mut conn,
        &[
            "movement", "--user", "alice", "--symbol", "VWCE", "--kind", "purchase", "--date",
            "2025-06-01", "--quantity", "10", "--price", "100",
        ],
    )
    .unwrap();

    run_investment(
        &mut conn,
        &[
            "movement", "--user", "alice", "--symbol", "VWCE", "--kind", "adjustment", "--date",
            "2025-07-01", "--quantity", "-2", "--price", "0", "--amount", "0",
        ],
    )
    .unwrap();

    let movements: i64 = conn
        .query_row("SELECT COUNT(*) FROM investment_movements", [], |r| r.get(0))
        .unwrap();
    assert_eq!(movements, 2);
    // Only the purchase posted a transaction.
    let transactions: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(transactions, 1);

    let quantity: String = conn
        .query_row("SELECT quantity FROM investments WHERE symbol='VWCE'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(quantity, "8");
}

#[test]
fn oversell_is_rejected_and_nothing_is_recorded() {
    let mut conn = db::open_in_memory().unwrap();
    add_investment(&conn, "alice", "VWCE", "Vanguard FTSE All-World");
    run_investment(
        &mut conn,
        &[
            "movement", "--user", "alice", "--symbol", "VWCE", "--kind", "purchase", "--date",
            "2025-06-01", "--quantity", "3", "--price", "100",
        ],
    )
    .unwrap();

    let err = run_investment(
        &mut conn,
        &[
            "movement", "--user", "alice", "--symbol", "VWCE", "--kind", "sale", "--date",
            "2025-07-01", "--quantity", "5", "--price", "100",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("only 3 held"));

    // The rejected movement rolled back with the position update.
    let movements: i64 = conn
        .query_row("SELECT COUNT(*) FROM investment_movements", [], |r| r.get(0))
        .unwrap();
    assert_eq!(movements, 1);
    let quantity: String = conn
        .query_row("SELECT quantity FROM investments WHERE symbol='VWCE'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(quantity, "3");
}

#[test]
fn movements_of_one_user_reuse_one_category_per_side() {
    let mut conn = db::open_in_memory().unwrap();
    add_investment(&conn, "alice", "VWCE", "Vanguard FTSE All-World");
    add_investment(&conn, "alice", "AGGH", "iShares Global Aggregate Bond");

    for (symbol, date) in [("VWCE", "2025-06-01"), ("AGGH", "2025-06-02")] {
        run_investment(
            &mut conn,
            &[
                "movement", "--user", "alice", "--symbol", symbol, "--kind", "purchase", "--date",
                date, "--quantity", "1", "--price", "50",
            ],
        )
        .unwrap();
    }

    let categories: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM categories WHERE name='Investments'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(categories, 1);
}

#[test]
fn repost_is_idempotent_and_ownership_is_enforced() {
    let mut conn = db::open_in_memory().unwrap();
    let investment_id = add_investment(&conn, "alice", "VWCE", "Vanguard FTSE All-World");
    conn.execute(
        "INSERT INTO investment_movements(investment_id, kind, quantity, unit_price, amount, fees, date, user_id)
         VALUES (?1, 'dividend', '0', '0', '12.50', '0', '2025-06-15', 'alice')",
        params![investment_id],
    )
    .unwrap();
    let movement_id = conn.last_insert_rowid();

    // A stranger cannot trigger posting for someone else's movement.
    let err = synth::post_movement(&mut conn, movement_id, "mallory").unwrap_err();
    assert!(err.to_string().contains("does not own"));

    assert!(synth::post_movement(&mut conn, movement_id, "alice")
        .unwrap()
        .is_some());
    assert!(synth::post_movement(&mut conn, movement_id, "alice")
        .unwrap()
        .is_none());

    let transactions: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(transactions, 1);
}
