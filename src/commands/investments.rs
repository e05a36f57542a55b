// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Investment, InvestmentMovement, MovementKind};
use crate::ownership::assert_owned;
use crate::synth;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use crate::valuation::{self, apply_movement, round_money};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("movement", sub)) => movement(conn, sub)?,
        Some(("repost", sub)) => repost(conn, sub)?,
        Some(("value", sub)) => value(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let symbol = sub
        .get_one::<String>("symbol")
        .map(|s| s.trim().to_uppercase())
        .unwrap();
    let name = sub.get_one::<String>("name").map(|s| s.trim()).unwrap();
    conn.execute(
        "INSERT INTO investments(symbol, name, user_id) VALUES (?1, ?2, ?3)",
        params![symbol, name, user],
    )?;
    println!("Added investment {} ({})", symbol, name);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut stmt = conn.prepare(
        "SELECT symbol, name, quantity, average_price, total_invested
         FROM investments WHERE user_id=?1 ORDER BY symbol",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (symbol, name, quantity, average, invested) = row?;
        data.push(vec![symbol, name, quantity, average, invested]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Symbol", "Name", "Qty", "Avg Price", "Invested"], data)
        );
    }
    Ok(())
}

fn find_by_symbol(conn: &Connection, user: &str, symbol: &str) -> Result<Investment> {
    let raw = conn
        .query_row(
            "SELECT id, symbol, name, quantity, average_price, total_invested, user_id
             FROM investments WHERE user_id=?1 AND symbol=?2",
            params![user, symbol],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| anyhow!("Investment '{}' not found for {}", symbol, user))?;

    let (id, symbol, name, quantity, average_price, total_invested, user_id) = raw;
    Ok(Investment {
        id,
        symbol,
        name,
        quantity: parse_stored(&quantity)?,
        average_price: parse_stored(&average_price)?,
        total_invested: parse_stored(&total_invested)?,
        user_id,
    })
}

fn parse_stored(s: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s).with_context(|| format!("Invalid stored amount '{}'", s))
}

/// Records a movement, updates the position, then posts the ledger
/// counterpart. The movement and position update commit first; a posting
/// failure leaves them durable and is retried via `repost`.
fn movement(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap().clone();
    let symbol = sub
        .get_one::<String>("symbol")
        .map(|s| s.trim().to_uppercase())
        .unwrap();
    let kind = MovementKind::try_from(sub.get_one::<String>("kind").unwrap().as_str())?;
    let date = parse_date(sub.get_one::<String>("date").unwrap().trim())?;
    let quantity = parse_decimal(sub.get_one::<String>("quantity").unwrap().trim())?;
    let price = parse_decimal(sub.get_one::<String>("price").unwrap().trim())?;
    let fees = match sub.get_one::<String>("fees") {
        Some(raw) => parse_decimal(raw.trim())?,
        None => Decimal::ZERO,
    };
    let amount = match sub.get_one::<String>("amount") {
        Some(raw) => round_money(parse_decimal(raw.trim())?),
        None => round_money(quantity.abs() * price),
    };
    let fees = round_money(fees);

    let investment = find_by_symbol(conn, &user, &symbol)?;
    assert_owned(&investment, &user)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO investment_movements(investment_id, kind, quantity, unit_price, amount, fees, date, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            investment.id,
            kind.as_str(),
            quantity.to_string(),
            price.to_string(),
            amount.to_string(),
            fees.to_string(),
            date.to_string(),
            user,
        ],
    )?;
    let movement_id = tx.last_insert_rowid();

    let record = InvestmentMovement {
        id: movement_id,
        investment_id: investment.id,
        kind,
        quantity,
        unit_price: price,
        amount,
        fees,
        date,
        user_id: user.clone(),
    };
    let mut position = investment.clone();
    apply_movement(&mut position, &record)?;
    tx.execute(
        "UPDATE investments SET quantity=?1, average_price=?2, total_invested=?3 WHERE id=?4",
        params![
            position.quantity.to_string(),
            position.average_price.to_string(),
            position.total_invested.to_string(),
            position.id,
        ],
    )?;
    tx.commit()?;
    println!(
        "Recorded {} {} x {} @ {} (fees {})",
        kind.as_str(),
        quantity,
        symbol,
        price,
        fees
    );

    match synth::post_movement(conn, movement_id, &user) {
        Ok(Some(transaction_id)) => println!("Posted ledger transaction {}", transaction_id),
        Ok(None) => {}
        Err(e) => {
            let hint = if e.is_retryable() {
                format!(
                    "; retry with `fiscus investment repost --user {} --movement {}`",
                    user, movement_id
                )
            } else {
                String::new()
            };
            return Err(anyhow::Error::new(e)
                .context(format!("Movement {} saved but ledger posting failed{}", movement_id, hint)));
        }
    }
    Ok(())
}

fn repost(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let movement_id = *sub.get_one::<i64>("movement").unwrap();
    match synth::post_movement(conn, movement_id, user)? {
        Some(transaction_id) => println!("Posted ledger transaction {}", transaction_id),
        None => println!("Nothing to post (adjustment or already posted)"),
    }
    Ok(())
}

#[derive(Serialize)]
struct ValuationRow {
    symbol: String,
    name: String,
    quantity: String,
    total_invested: String,
    last_price: String,
    current_value: String,
    profit_loss: String,
    return_pct: String,
}

fn value(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    // Latest stored price per investment; unknown prices value to zero.
    let mut price_stmt = conn.prepare(
        "SELECT investment_id, price FROM (
             SELECT investment_id,
                    price,
                    ROW_NUMBER() OVER (
                        PARTITION BY investment_id
                        ORDER BY as_of DESC, rowid DESC
                    ) AS rn
             FROM prices
         ) WHERE rn = 1",
    )?;
    let price_rows =
        price_stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut last_prices: HashMap<i64, Decimal> = HashMap::new();
    for row in price_rows {
        let (investment_id, price_s) = row?;
        last_prices.insert(investment_id, parse_stored(&price_s)?);
    }

    let mut stmt = conn.prepare(
        "SELECT id, symbol, name, quantity, total_invested
         FROM investments WHERE user_id=?1 ORDER BY symbol",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;

    let mut data = Vec::new();
    for row in rows {
        let (id, symbol, name, quantity_s, invested_s) = row?;
        let quantity = parse_stored(&quantity_s)?;
        let invested = parse_stored(&invested_s)?;
        let last_price = last_prices.get(&id).copied().unwrap_or(Decimal::ZERO);

        let current = valuation::current_value(quantity, last_price)?;
        let pl = valuation::profit_loss(current, invested);
        let ret = valuation::return_percentage(pl, invested);

        data.push(ValuationRow {
            symbol,
            name,
            quantity: format!("{:.4}", quantity),
            total_invested: format!("{:.2}", invested),
            last_price: format!("{:.2}", last_price),
            current_value: format!("{:.2}", current),
            profit_loss: format!("{:.2}", pl),
            return_pct: format!("{:.2}", ret),
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.symbol.clone(),
                    r.name.clone(),
                    r.quantity.clone(),
                    r.total_invested.clone(),
                    r.last_price.clone(),
                    r.current_value.clone(),
                    r.profit_loss.clone(),
                    r.return_pct.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Symbol", "Name", "Qty", "Invested", "Price", "Value", "P/L", "Return %"],
                rows,
            )
        );
    }
    Ok(())
}
