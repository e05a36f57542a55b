// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The pricing-source collaborator. Prices land in the `prices` table and
//! reach the calculators as plain arguments; the engine never fetches.

use crate::utils::{http_client, parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("fetch", _)) => fetch_prices(conn)?,
        Some(("list", _)) => list(conn)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = sub.get_one::<String>("user").unwrap();
    let symbol = sub
        .get_one::<String>("symbol")
        .map(|s| s.trim().to_uppercase())
        .unwrap();
    let price = parse_decimal(sub.get_one::<String>("price").unwrap().trim())?;
    let as_of = match sub.get_one::<String>("date") {
        Some(raw) => crate::utils::parse_date(raw.trim())?.to_string(),
        None => Utc::now().to_rfc3339(),
    };

    let investment_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM investments WHERE user_id=?1 AND symbol=?2",
            params![user, symbol],
            |r| r.get(0),
        )
        .optional()?;
    let investment_id =
        investment_id.ok_or_else(|| anyhow!("Investment '{}' not found for {}", symbol, user))?;

    conn.execute(
        "INSERT INTO prices(investment_id, as_of, price, source) VALUES (?1, ?2, ?3, 'manual')
         ON CONFLICT(investment_id, as_of) DO UPDATE SET price=excluded.price, source='manual'",
        params![investment_id, as_of, price.to_string()],
    )?;
    println!("Price {} recorded for {} at {}", price, symbol, as_of);
    Ok(())
}

fn list(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT i.symbol, p.as_of, p.price, p.source
         FROM prices p JOIN investments i ON p.investment_id=i.id
         ORDER BY p.as_of DESC LIMIT 50",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (symbol, as_of, price, source) = row?;
        data.push(vec![symbol, as_of, price, source]);
    }
    println!(
        "{}",
        pretty_table(&["Symbol", "As Of", "Price", "Source"], data)
    );
    Ok(())
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct YahooResponse {
    quoteResponse: QuoteResponse,
}
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Vec<YahooQuote>,
}
#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    symbol: Option<String>,
}

fn fetch_prices(conn: &mut Connection) -> Result<()> {
    let mut stmt = conn.prepare_cached("SELECT id, symbol FROM investments ORDER BY symbol")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;

    // The same symbol may be held by several users; one quote covers all.
    let mut ids_by_symbol: HashMap<String, Vec<i64>> = HashMap::new();
    for row in rows {
        let (id, symbol) = row?;
        ids_by_symbol.entry(symbol).or_default().push(id);
    }
    drop(stmt);

    if ids_by_symbol.is_empty() {
        println!("No investments to fetch");
        return Ok(());
    }

    let symbols = ids_by_symbol.keys().cloned().collect::<Vec<_>>();
    let url = format!(
        "https://query1.finance.yahoo.com/v7/finance/quote?symbols={}",
        symbols.join(",")
    );
    let client = http_client()?;
    let resp = client.get(url).send()?.error_for_status()?;
    let yr: YahooResponse = resp.json()?;

    let mut updates = Vec::new();
    for q in yr.quoteResponse.result {
        if let (Some(symbol), Some(px)) = (q.symbol, q.regular_market_price) {
            if let Some(ids) = ids_by_symbol.get(symbol.as_str()) {
                if let Some(px_decimal) = Decimal::from_f64_retain(px) {
                    for id in ids {
                        updates.push((*id, px_decimal.to_string()));
                    }
                }
            }
        }
    }

    let now = Utc::now().to_rfc3339();
    if updates.is_empty() {
        println!("No prices updated at {}", now);
        return Ok(());
    }
    let total_updates = updates.len();

    let tx = conn.transaction()?;
    let mut insert = tx.prepare_cached(
        "INSERT INTO prices(investment_id, as_of, price, source) VALUES (?1, ?2, ?3, 'yahoo')",
    )?;
    for (investment_id, price) in updates {
        insert.execute(params![investment_id, &now, price])?;
    }
    drop(insert);
    tx.commit()?;

    println!("Fetched {} prices at {}", total_updates, now);
    Ok(())
}
