// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TransactionKind;
use crate::ownership::assert_owned;
use crate::schedule::{self, Frequency};
use crate::synth;
use crate::utils::{maybe_print_json, parse_date, parse_day_of_month, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::warn;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("run", sub)) => run(conn, sub)?,
        Some(("pause", sub)) => set_active(conn, sub, false)?,
        Some(("resume", sub)) => set_active(conn, sub, true)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let description = sub.get_one::<String>("description").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    if amount <= rust_decimal::Decimal::ZERO {
        anyhow::bail!("Amount must be positive");
    }
    let kind = TransactionKind::try_from(sub.get_one::<String>("kind").unwrap().as_str())?;
    let frequency = Frequency::try_from(sub.get_one::<String>("frequency").unwrap().as_str())?;
    let start = parse_date(sub.get_one::<String>("start").unwrap().trim())?;
    let day_of_month = sub
        .get_one::<String>("day-of-month")
        .map(|s| parse_day_of_month(s.trim()))
        .transpose()?;
    let end = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s.trim()))
        .transpose()?;
    if let Some(end) = end {
        if end < start {
            anyhow::bail!("End date {} precedes start date {}", end, start);
        }
    }
    let category_id = match sub.get_one::<String>("category") {
        Some(name) => Some(super::transactions::visible_category_id(
            conn, user, name, kind,
        )?),
        None => None,
    };

    // The only writer of next_occurrence besides the synthesizer.
    let next = schedule::first_occurrence(start, day_of_month);
    conn.execute(
        "INSERT INTO recurring_schedules(description, amount, kind, category_id, user_id,
            frequency, day_of_month, start_date, end_date, next_occurrence)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            description,
            crate::valuation::round_money(amount).to_string(),
            kind.as_str(),
            category_id,
            user,
            frequency.as_str(),
            day_of_month,
            start.to_string(),
            end.map(|d| d.to_string()),
            next.to_string(),
        ],
    )?;
    println!(
        "Added {} schedule '{}', first occurrence {}",
        frequency.as_str(),
        description,
        next
    );
    Ok(())
}

#[derive(Serialize)]
struct ScheduleRow {
    id: i64,
    description: String,
    amount: String,
    kind: String,
    frequency: String,
    day_of_month: Option<i64>,
    next_occurrence: String,
    end_date: Option<String>,
    active: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT id, description, amount, kind, frequency, day_of_month, next_occurrence, end_date, active
         FROM recurring_schedules WHERE user_id=?1 ORDER BY next_occurrence, id",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok(ScheduleRow {
            id: r.get(0)?,
            description: r.get(1)?,
            amount: r.get(2)?,
            kind: r.get(3)?,
            frequency: r.get(4)?,
            day_of_month: r.get(5)?,
            next_occurrence: r.get(6)?,
            end_date: r.get(7)?,
            active: r.get(8)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.description.clone(),
                    s.amount.clone(),
                    s.kind.clone(),
                    s.frequency.clone(),
                    s.day_of_month.map(|d| d.to_string()).unwrap_or_default(),
                    s.next_occurrence.clone(),
                    s.end_date.clone().unwrap_or_default(),
                    if s.active { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Description", "Amount", "Kind", "Freq", "Day", "Next", "End", "Active"],
                rows,
            )
        );
    }
    Ok(())
}

/// Batch trigger: fires every due schedule once for the as-of date.
///
/// Each schedule is fired as its owner; one failure does not stop the batch.
fn run(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = match sub.get_one::<String>("date") {
        Some(raw) => parse_date(raw.trim())?,
        None => chrono::Utc::now().date_naive(),
    };
    let only_user = sub.get_one::<String>("user");

    let mut due = schedule::find_due(conn, as_of)?;
    if let Some(user) = only_user {
        due.retain(|s| s.user_id == *user);
    }

    let (mut posted, mut skipped, mut failed) = (0u32, 0u32, 0u32);
    for sched in &due {
        match synth::post_recurring(conn, sched.id, &sched.user_id, as_of) {
            Ok(Some(_)) => posted += 1,
            Ok(None) => skipped += 1,
            Err(e) => {
                warn!(schedule_id = sched.id, error = %e, "failed to fire schedule");
                failed += 1;
            }
        }
    }
    println!(
        "Fired {} of {} due schedules on {} ({} already posted, {} failed)",
        posted,
        due.len(),
        as_of,
        skipped,
        failed
    );
    if failed > 0 {
        anyhow::bail!("{} schedule(s) failed to fire; see log", failed);
    }
    Ok(())
}

fn set_active(conn: &Connection, sub: &clap::ArgMatches, active: bool) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let id = *sub.get_one::<i64>("id").unwrap();

    let sched = schedule::load(conn, id).with_context(|| format!("Schedule {}", id))?;
    assert_owned(&sched, user)?;

    conn.execute(
        "UPDATE recurring_schedules SET active=?1 WHERE id=?2",
        params![active, id],
    )?;
    println!(
        "Schedule {} ('{}') is now {}",
        id,
        sched.description,
        if active { "active" } else { "paused" }
    );
    Ok(())
}
