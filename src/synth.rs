// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction synthesis: turning due recurring schedules and recorded
//! investment movements into posted ledger transactions.
//!
//! Each entry point runs inside one SQL transaction covering the ownership
//! re-check, category resolution, ledger insert and (for schedules) the
//! next-occurrence advance, so partial application cannot be observed. The
//! unique indexes on `(schedule_id, due_date)` and `movement_id` make both
//! paths at-most-once; a conflicting post returns `Ok(None)` and mutates
//! nothing.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::models::{Investment, InvestmentMovement, MovementKind, TransactionKind};
use crate::ownership::assert_owned;
use crate::schedule::{self, next_occurrence};
use crate::valuation::round_money;

pub const INVESTMENT_CATEGORY: &str = "Investments";
const INVESTMENT_CATEGORY_COLOR: &str = "#00695C";
const INVESTMENT_CATEGORY_ICON: &str = "trending-up";

/// Posts the transaction for a due schedule and advances its
/// next-occurrence.
///
/// Returns the new transaction id, or `None` when this (schedule, due-date)
/// pair was already posted by another run.
pub fn post_recurring(
    conn: &mut Connection,
    schedule_id: i64,
    user_id: &str,
    today: NaiveDate,
) -> Result<Option<i64>, EngineError> {
    let tx = conn.transaction()?;

    let sched = schedule::load(&tx, schedule_id)?;
    assert_owned(&sched, user_id)?;
    if !sched.active {
        return Err(EngineError::InvalidState(format!(
            "recurring schedule {} is inactive",
            schedule_id
        )));
    }

    let due_date = sched.next_occurrence;
    let inserted = tx.execute(
        "INSERT INTO transactions(date, amount, description, kind, category_id, user_id, schedule_id, due_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT DO NOTHING",
        params![
            today.to_string(),
            round_money(sched.amount).to_string(),
            sched.description,
            sched.kind.as_str(),
            sched.category_id,
            sched.user_id,
            sched.id,
            due_date.to_string(),
        ],
    )?;
    if inserted == 0 {
        debug!(schedule_id, due_date = %due_date, "occurrence already posted, skipping");
        return Ok(None);
    }
    let transaction_id = tx.last_insert_rowid();

    let next = next_occurrence(due_date, sched.frequency, sched.day_of_month);
    tx.execute(
        "UPDATE recurring_schedules SET next_occurrence=?1 WHERE id=?2",
        params![next.to_string(), sched.id],
    )?;
    tx.commit()?;

    info!(
        schedule_id,
        transaction_id,
        next_occurrence = %next,
        "posted recurring occurrence"
    );
    Ok(Some(transaction_id))
}

/// Posts the ledger counterpart of a recorded investment movement.
///
/// Runs after the movement itself is durably saved; a failure here leaves
/// the movement without its ledger counterpart and is retryable (the call is
/// idempotent). Adjustments post nothing. Returns the new transaction id,
/// or `None` for adjustments and already-posted movements.
pub fn post_movement(
    conn: &mut Connection,
    movement_id: i64,
    user_id: &str,
) -> Result<Option<i64>, EngineError> {
    let tx = conn.transaction()?;

    let movement = load_movement(&tx, movement_id)?;
    assert_owned(&movement, user_id)?;
    let investment = load_investment(&tx, movement.investment_id)?;
    assert_owned(&investment, user_id)?;

    let Some(kind) = movement.kind.ledger_kind() else {
        debug!(movement_id, "adjustment movement posts no transaction");
        return Ok(None);
    };

    let category_id = resolve_investment_category(&tx, user_id, kind)?;

    // Fees are part of what the purchase cost; sale/dividend/yield proceeds
    // post without them.
    let amount = match kind {
        TransactionKind::Expense => round_money(movement.amount + movement.fees),
        TransactionKind::Income => round_money(movement.amount),
    };
    let description = format!(
        "{} - {} ({})",
        movement.kind.label(),
        investment.name,
        investment.symbol
    );

    let inserted = tx.execute(
        "INSERT INTO transactions(date, amount, description, kind, category_id, user_id, investment_id, movement_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT DO NOTHING",
        params![
            movement.date.to_string(),
            amount.to_string(),
            description,
            kind.as_str(),
            category_id,
            movement.user_id,
            movement.investment_id,
            movement.id,
        ],
    )?;
    if inserted == 0 {
        debug!(movement_id, "movement already posted, skipping");
        return Ok(None);
    }
    let transaction_id = tx.last_insert_rowid();
    tx.commit()?;

    info!(
        movement_id,
        transaction_id,
        kind = kind.as_str(),
        "posted movement to ledger"
    );
    Ok(Some(transaction_id))
}

/// Finds the "Investments" category visible to the user for the given side,
/// creating a personal one when absent.
///
/// Get-or-create is atomic under the `(user_id, name, kind)` unique index:
/// a concurrent first-use loses the insert race, hits the conflict, and
/// re-selects the winner's row.
pub fn resolve_investment_category(
    conn: &Connection,
    user_id: &str,
    kind: TransactionKind,
) -> Result<i64, EngineError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories
             WHERE name=?1 AND kind=?2 AND (is_default=1 OR user_id=?3)
             ORDER BY is_default DESC LIMIT 1",
            params![INVESTMENT_CATEGORY, kind.as_str(), user_id],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO categories(name, kind, color, icon, user_id, is_default)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)
         ON CONFLICT(user_id, name, kind) DO NOTHING",
        params![
            INVESTMENT_CATEGORY,
            kind.as_str(),
            INVESTMENT_CATEGORY_COLOR,
            INVESTMENT_CATEGORY_ICON,
            user_id,
        ],
    )?;
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE name=?1 AND kind=?2 AND user_id=?3",
            params![INVESTMENT_CATEGORY, kind.as_str(), user_id],
            |r| r.get(0),
        )
        .optional()?;
    let id = id.ok_or_else(|| {
        EngineError::InvalidState(format!(
            "category '{}' missing after creation",
            INVESTMENT_CATEGORY
        ))
    })?;
    info!(user_id, kind = kind.as_str(), "created personal 'Investments' category");
    Ok(id)
}

fn load_movement(conn: &Connection, movement_id: i64) -> Result<InvestmentMovement, EngineError> {
    let raw = conn
        .query_row(
            "SELECT id, investment_id, kind, quantity, unit_price, amount, fees, date, user_id
             FROM investment_movements WHERE id=?1",
            params![movement_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, String>(6)?,
                    r.get::<_, String>(7)?,
                    r.get::<_, String>(8)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| EngineError::not_found("investment movement", movement_id))?;

    let (id, investment_id, kind, quantity, unit_price, amount, fees, date, user_id) = raw;
    Ok(InvestmentMovement {
        id,
        investment_id,
        kind: MovementKind::try_from(kind.as_str())?,
        quantity: parse_amount(&quantity, "movement quantity")?,
        unit_price: parse_amount(&unit_price, "movement unit price")?,
        amount: parse_amount(&amount, "movement amount")?,
        fees: parse_amount(&fees, "movement fees")?,
        date: parse_date(&date)?,
        user_id,
    })
}

fn load_investment(conn: &Connection, investment_id: i64) -> Result<Investment, EngineError> {
    let raw = conn
        .query_row(
            "SELECT id, symbol, name, quantity, average_price, total_invested, user_id
             FROM investments WHERE id=?1",
            params![investment_id],
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
        .ok_or_else(|| EngineError::not_found("investment", investment_id))?;

    let (id, symbol, name, quantity, average_price, total_invested, user_id) = raw;
    Ok(Investment {
        id,
        symbol,
        name,
        quantity: parse_amount(&quantity, "investment quantity")?,
        average_price: parse_amount(&average_price, "investment average price")?,
        total_invested: parse_amount(&total_invested, "investment total invested")?,
        user_id,
    })
}

fn parse_amount(s: &str, what: &str) -> Result<Decimal, EngineError> {
    Decimal::from_str_exact(s)
        .map_err(|_| EngineError::InvalidState(format!("invalid {} '{}'", what, s)))
}

fn parse_date(s: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidState(format!("invalid date '{}'", s)))
}
