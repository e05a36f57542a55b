// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TransactionKind;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    if amount <= rust_decimal::Decimal::ZERO {
        anyhow::bail!("Amount must be positive (the kind carries the sign)");
    }
    let description = sub.get_one::<String>("description").unwrap();
    let kind = TransactionKind::try_from(sub.get_one::<String>("kind").unwrap().as_str())?;
    let method = sub.get_one::<String>("method");

    let category_id = match sub.get_one::<String>("category") {
        Some(name) => Some(visible_category_id(conn, user, name, kind)?),
        None => None,
    };

    conn.execute(
        "INSERT INTO transactions(date, amount, description, kind, payment_method, category_id, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            date.to_string(),
            crate::valuation::round_money(amount).to_string(),
            description,
            kind.as_str(),
            method,
            category_id,
            user
        ],
    )?;
    println!("Recorded {} {} on {} ('{}')", kind.as_str(), amount, date, description);
    Ok(())
}

/// Resolves a category name within the user's visible set (defaults plus
/// personal) for the given side.
pub fn visible_category_id(
    conn: &Connection,
    user: &str,
    name: &str,
    kind: TransactionKind,
) -> Result<i64> {
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories
             WHERE name=?1 AND kind=?2 AND (is_default=1 OR user_id=?3)
             ORDER BY is_default DESC LIMIT 1",
            params![name, kind.as_str(), user],
            |r| r.get(0),
        )
        .optional()?;
    id.ok_or_else(|| anyhow::anyhow!("Category '{}' ({}) not found for {}", name, kind.as_str(), user))
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub kind: String,
    pub category: String,
    pub origin: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.origin.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Description", "Amount", "Kind", "Category", "Origin"],
                rows,
            )
        );
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let user = sub.get_one::<String>("user").unwrap();
    let mut sql = String::from(
        "SELECT t.date, t.description, t.amount, t.kind, c.name, t.schedule_id, t.investment_id
         FROM transactions t LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.user_id=?",
    );
    let mut params_vec: Vec<String> = vec![user.clone()];

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(kind) = sub.get_one::<String>("kind") {
        sql.push_str(" AND t.kind=?");
        params_vec.push(kind.into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let date: String = r.get(0)?;
        let description: String = r.get(1)?;
        let amount: String = r.get(2)?;
        let kind: String = r.get(3)?;
        let category: Option<String> = r.get(4)?;
        let schedule_id: Option<i64> = r.get(5)?;
        let investment_id: Option<i64> = r.get(6)?;
        let origin = if schedule_id.is_some() {
            "recurring"
        } else if investment_id.is_some() {
            "investment"
        } else {
            "manual"
        };
        data.push(TransactionRow {
            date,
            description,
            amount,
            kind,
            category: category.unwrap_or_default(),
            origin: origin.to_string(),
        });
    }
    Ok(data)
}
