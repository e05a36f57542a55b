// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{ObjectiveKind, TransactionKind};
use crate::objective::{alert_status, percent_attained, remaining_balance};
use crate::utils::{maybe_print_json, parse_decimal, parse_month, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("progress", sub)) => progress(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("status", sub)) => status(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let name = sub.get_one::<String>("name").map(|s| s.trim()).unwrap();
    let kind = ObjectiveKind::try_from(sub.get_one::<String>("kind").unwrap().as_str())?;
    let target = parse_decimal(sub.get_one::<String>("target").unwrap().trim())?;
    if target < Decimal::ZERO {
        anyhow::bail!("Target amount cannot be negative");
    }
    let period = parse_month(sub.get_one::<String>("period").unwrap().trim())?;

    let category_id = match (kind, sub.get_one::<String>("category")) {
        (ObjectiveKind::CategoryLimit, Some(category)) => Some(
            super::transactions::visible_category_id(conn, user, category, TransactionKind::Expense)?,
        ),
        (ObjectiveKind::CategoryLimit, None) => {
            anyhow::bail!("A category-limit objective requires --category");
        }
        (_, Some(_)) => anyhow::bail!("--category only applies to category-limit objectives"),
        (_, None) => None,
    };

    conn.execute(
        "INSERT INTO objectives(name, kind, target_amount, category_id, period, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id, name, period) DO UPDATE SET
            kind=excluded.kind,
            target_amount=excluded.target_amount,
            category_id=excluded.category_id,
            active=1",
        params![name, kind.as_str(), target.to_string(), category_id, period, user],
    )?;
    println!("Objective '{}' set for {} (target {})", name, period, target);
    Ok(())
}

fn progress(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let name = sub.get_one::<String>("name").unwrap();
    let period = parse_month(sub.get_one::<String>("period").unwrap().trim())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;

    let row: Option<(i64, String, Option<String>)> = conn
        .query_row(
            "SELECT id, kind, current_amount FROM objectives
             WHERE user_id=?1 AND name=?2 AND period=?3",
            params![user, name, period],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let (id, kind_s, current_s) =
        row.ok_or_else(|| anyhow::anyhow!("Objective '{}' ({}) not found for {}", name, period, user))?;

    let kind = ObjectiveKind::try_from(kind_s.as_str())?;
    if kind == ObjectiveKind::CategoryLimit {
        anyhow::bail!("Category-limit objectives track spending; progress is not set manually");
    }

    let current = match current_s {
        Some(s) => Decimal::from_str_exact(&s)
            .with_context(|| format!("Invalid stored amount '{}'", s))?,
        None => Decimal::ZERO,
    };
    let updated = current + amount;
    conn.execute(
        "UPDATE objectives SET current_amount=?1 WHERE id=?2",
        params![updated.to_string(), id],
    )?;
    println!("Objective '{}' progress: {} -> {}", name, current, updated);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT o.name, o.kind, o.target_amount, o.current_amount, c.name, o.period, o.active
         FROM objectives o LEFT JOIN categories c ON o.category_id=c.id
         WHERE o.user_id=?1 ORDER BY o.period DESC, o.name",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, bool>(6)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (name, kind, target, current, category, period, active) = row?;
        data.push(vec![
            name,
            kind,
            target,
            current.unwrap_or_else(|| "0".into()),
            category.unwrap_or_default(),
            period,
            if active { "yes" } else { "no" }.to_string(),
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(
                &["Objective", "Kind", "Target", "Current", "Category", "Period", "Active"],
                data,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusRow {
    name: String,
    kind: String,
    target: String,
    current: String,
    percent: String,
    remaining: String,
    alert: String,
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let period = parse_month(sub.get_one::<String>("period").unwrap().trim())?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT name, kind, target_amount, current_amount, category_id
         FROM objectives WHERE user_id=?1 AND period=?2 AND active=1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![user, &period], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, Option<i64>>(4)?,
        ))
    })?;

    let mut data = Vec::new();
    for row in rows {
        let (name, kind_s, target_s, current_s, category_id) = row?;
        let kind = ObjectiveKind::try_from(kind_s.as_str())?;
        let target = Decimal::from_str_exact(&target_s)
            .with_context(|| format!("Invalid stored target '{}'", target_s))?;

        // A category limit is measured against actual spending; the other
        // kinds carry their own running amount.
        let current = match (kind, category_id) {
            (ObjectiveKind::CategoryLimit, Some(category_id)) => {
                Some(super::reports::month_spend(conn, user, category_id, &period)?)
            }
            _ => current_s
                .map(|s| {
                    Decimal::from_str_exact(&s)
                        .with_context(|| format!("Invalid stored amount '{}'", s))
                })
                .transpose()?,
        };

        let percent = percent_attained(current, target);
        let remaining = remaining_balance(current, target);
        let alert = alert_status(kind, current, target);
        data.push(StatusRow {
            name,
            kind: kind_s,
            target: format!("{:.2}", target),
            current: format!("{:.2}", current.unwrap_or(Decimal::ZERO)),
            percent: format!("{:.2}", percent),
            remaining: format!("{:.2}", remaining),
            alert: alert.as_str().to_string(),
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.kind.clone(),
                    r.target.clone(),
                    r.current.clone(),
                    r.percent.clone(),
                    r.remaining.clone(),
                    r.alert.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Objective", "Kind", "Target", "Current", "%", "Remaining", "Alert"],
                rows,
            )
        );
    }
    Ok(())
}
