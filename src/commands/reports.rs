// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-model queries over the posted ledger. Aggregations stay here, out of
//! the calculators.

use crate::utils::{maybe_print_json, parse_month, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("spend-by-category", sub)) => spend_by_category_cmd(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Total spent by a user in one category for a month.
pub fn month_spend(
    conn: &Connection,
    user: &str,
    category_id: i64,
    month: &str,
) -> Result<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE user_id=?1 AND category_id=?2 AND kind='expense' AND substr(date,1,7)=?3",
    )?;
    let mut rows = stmt.query(params![user, category_id, month])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(0)?;
        let amount = Decimal::from_str_exact(&amount_s)
            .with_context(|| format!("Invalid amount '{}' in transactions", amount_s))?;
        total += amount;
    }
    Ok(total)
}

fn spend_by_category_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let month = parse_month(sub.get_one::<String>("month").unwrap().trim())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT IFNULL(c.name, '(uncategorized)'), t.amount
         FROM transactions t LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.user_id=?1 AND t.kind='expense' AND substr(t.date,1,7)=?2",
    )?;
    let rows = stmt.query_map(params![user, &month], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut agg: std::collections::HashMap<String, Decimal> = std::collections::HashMap::new();
    for row in rows {
        let (category, amount_s) = row?;
        let amount = Decimal::from_str_exact(&amount_s)
            .with_context(|| format!("Invalid amount '{}' for {}", amount_s, category))?;
        *agg.entry(category).or_insert(Decimal::ZERO) += amount;
    }

    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    let data: Vec<Vec<String>> = items
        .into_iter()
        .map(|(category, spent)| vec![category, format!("{:.2}", spent)])
        .collect();

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Category", "Spent"], data));
    }
    Ok(())
}
