// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{parse_date, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let as_of = match m.get_one::<String>("date") {
        Some(raw) => parse_date(raw.trim())?,
        None => chrono::Utc::now().date_naive(),
    };
    let mut rows = Vec::new();

    // 1) Movements left without their ledger counterpart. Downstream
    //    reconciliation expects movement and transaction counts to match.
    let mut stmt = conn.prepare(
        "SELECT m.id, i.symbol, m.kind, m.date
         FROM investment_movements m
         JOIN investments i ON m.investment_id=i.id
         LEFT JOIN transactions t ON t.movement_id=m.id
         WHERE m.kind != 'adjustment' AND t.id IS NULL
         ORDER BY m.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let symbol: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let date: String = r.get(3)?;
        rows.push(vec![
            "movement_unposted".into(),
            format!("movement {} ({} {} on {})", id, kind, symbol, date),
        ]);
    }

    // 2) Active schedules that missed a firing.
    let mut stmt2 = conn.prepare(
        "SELECT id, description, next_occurrence FROM recurring_schedules
         WHERE active=1 AND next_occurrence < ?1 ORDER BY id",
    )?;
    let mut cur2 = stmt2.query(params![as_of.to_string()])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let description: String = r.get(1)?;
        let next: String = r.get(2)?;
        rows.push(vec![
            "schedule_overdue".into(),
            format!("schedule {} ('{}') due since {}", id, description, next),
        ]);
    }

    // 3) Category limits that lost their category reference.
    let mut stmt3 = conn.prepare(
        "SELECT id, name, period FROM objectives
         WHERE kind='category-limit' AND category_id IS NULL ORDER BY id",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let period: String = r.get(2)?;
        rows.push(vec![
            "objective_missing_category".into(),
            format!("objective {} ('{}', {})", id, name, period),
        ]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
