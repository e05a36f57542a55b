// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Fiscus", "fiscus"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("fiscus.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// In-memory database with the full schema. Test support.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("Open in-memory DB")?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    -- A NULL user_id with is_default=1 marks a category shared by everyone.
    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL COLLATE NOCASE,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        color TEXT NOT NULL DEFAULT '#607D8B',
        icon TEXT NOT NULL DEFAULT 'tag',
        user_id TEXT,
        is_default INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(user_id, name, kind)
    );

    CREATE TABLE IF NOT EXISTS recurring_schedules(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        user_id TEXT NOT NULL,
        frequency TEXT NOT NULL CHECK(frequency IN ('daily','weekly','monthly','annual')),
        day_of_month INTEGER CHECK(day_of_month BETWEEN 1 AND 31),
        start_date TEXT NOT NULL,
        end_date TEXT,
        next_occurrence TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        quantity TEXT NOT NULL DEFAULT '0',
        average_price TEXT NOT NULL DEFAULT '0',
        total_invested TEXT NOT NULL DEFAULT '0',
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(user_id, symbol)
    );

    CREATE TABLE IF NOT EXISTS investment_movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        investment_id INTEGER NOT NULL REFERENCES investments(id) ON DELETE CASCADE,
        kind TEXT NOT NULL CHECK(kind IN ('purchase','sale','dividend','yield','adjustment')),
        quantity TEXT NOT NULL,
        unit_price TEXT NOT NULL,
        amount TEXT NOT NULL,
        fees TEXT NOT NULL DEFAULT '0',
        date TEXT NOT NULL,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        payment_method TEXT,
        category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        user_id TEXT NOT NULL,
        schedule_id INTEGER REFERENCES recurring_schedules(id) ON DELETE SET NULL,
        due_date TEXT,
        investment_id INTEGER REFERENCES investments(id) ON DELETE SET NULL,
        movement_id INTEGER REFERENCES investment_movements(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
    -- At-most-once synthesis per (schedule, due date) and per movement.
    CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_schedule_due
        ON transactions(schedule_id, due_date) WHERE schedule_id IS NOT NULL;
    CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_movement
        ON transactions(movement_id) WHERE movement_id IS NOT NULL;

    CREATE TABLE IF NOT EXISTS objectives(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('category-limit','monthly-savings','investment-goal')),
        target_amount TEXT NOT NULL,
        current_amount TEXT,
        category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        period TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(user_id, name, period)
    );

    CREATE TABLE IF NOT EXISTS prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        investment_id INTEGER NOT NULL REFERENCES investments(id) ON DELETE CASCADE,
        as_of TEXT NOT NULL,
        price TEXT NOT NULL,
        source TEXT NOT NULL,
        UNIQUE(investment_id, as_of)
    );
    "#,
    )?;
    seed_default_categories(conn)?;
    Ok(())
}

/// Shared starter categories. The UNIQUE index does not dedupe NULL owners,
/// so seeding is guarded explicitly.
fn seed_default_categories(conn: &Connection) -> Result<()> {
    let already: i64 = conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE is_default=1",
        [],
        |r| r.get(0),
    )?;
    if already > 0 {
        return Ok(());
    }
    conn.execute_batch(
        r#"
        INSERT INTO categories(name, kind, color, icon, user_id, is_default) VALUES
            ('Salary', 'income', '#2E7D32', 'banknote', NULL, 1),
            ('Groceries', 'expense', '#EF6C00', 'cart', NULL, 1),
            ('Housing', 'expense', '#5D4037', 'home', NULL, 1),
            ('Transport', 'expense', '#1565C0', 'bus', NULL, 1),
            ('Leisure', 'expense', '#6A1B9A', 'ticket', NULL, 1);
        "#,
    )?;
    Ok(())
}
