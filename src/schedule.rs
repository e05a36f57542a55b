// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurrence calculator and due-schedule selection.
//!
//! All calendar math goes through `chrono`; the only house rule is the
//! month-end clamp: a schedule pinned to day 31 fires on the 30th (or 28th,
//! 29th) in shorter months, and each occurrence is clamped independently so
//! no drift accumulates.

use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{RecurringSchedule, TransactionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Annual,
}

impl Frequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "annual" => Ok(Self::Annual),
            other => Err(EngineError::InvalidState(format!(
                "unknown frequency '{}'",
                other
            ))),
        }
    }
}

/// Computes the occurrence following `from` for the given frequency.
///
/// `day_of_month` pins monthly/annual schedules to a day, clamped to the
/// length of the target month. Idempotent for equal inputs.
pub fn next_occurrence(
    from: NaiveDate,
    frequency: Frequency,
    day_of_month: Option<u32>,
) -> NaiveDate {
    match frequency {
        Frequency::Daily => from + Duration::days(1),
        Frequency::Weekly => from + Duration::days(7),
        Frequency::Monthly => add_months_clamped(from, 1, day_of_month),
        Frequency::Annual => add_months_clamped(from, 12, day_of_month),
    }
}

/// The first occurrence of a newly created schedule.
///
/// Without a pinned day the schedule fires on its start date. With one, the
/// first firing is the pinned day in the start month if it has not passed
/// yet, otherwise the pinned day of the following month.
pub fn first_occurrence(start: NaiveDate, day_of_month: Option<u32>) -> NaiveDate {
    let Some(dom) = day_of_month else {
        return start;
    };
    let clamped = dom.min(days_in_month(start.year(), start.month()));
    if clamped >= start.day() {
        start.with_day(clamped).unwrap_or(start)
    } else {
        add_months_clamped(start, 1, Some(dom))
    }
}

/// True iff the schedule should fire on `today`.
pub fn due_on(schedule: &RecurringSchedule, today: NaiveDate) -> bool {
    schedule.active && schedule.next_occurrence <= today
}

/// True iff a firing was missed. Used for alerting, not firing.
pub fn is_overdue(schedule: &RecurringSchedule, today: NaiveDate) -> bool {
    schedule.next_occurrence < today
}

fn add_months_clamped(date: NaiveDate, months: i32, preferred_day: Option<u32>) -> NaiveDate {
    let mut month = date.month() as i32 + months;
    let mut year = date.year();
    while month > 12 {
        month -= 12;
        year += 1;
    }
    let month = month as u32;
    let day = preferred_day
        .unwrap_or_else(|| date.day())
        .clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

const SCHEDULE_COLUMNS: &str = "id, description, amount, kind, category_id, user_id, frequency, \
     day_of_month, start_date, end_date, next_occurrence, active";

struct ScheduleRow {
    id: i64,
    description: String,
    amount: String,
    kind: String,
    category_id: Option<i64>,
    user_id: String,
    frequency: String,
    day_of_month: Option<i64>,
    start_date: String,
    end_date: Option<String>,
    next_occurrence: String,
    active: bool,
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<ScheduleRow> {
    Ok(ScheduleRow {
        id: r.get(0)?,
        description: r.get(1)?,
        amount: r.get(2)?,
        kind: r.get(3)?,
        category_id: r.get(4)?,
        user_id: r.get(5)?,
        frequency: r.get(6)?,
        day_of_month: r.get(7)?,
        start_date: r.get(8)?,
        end_date: r.get(9)?,
        next_occurrence: r.get(10)?,
        active: r.get(11)?,
    })
}

fn parse_row(raw: ScheduleRow) -> Result<RecurringSchedule, EngineError> {
    let parse_date = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| EngineError::InvalidState(format!("invalid schedule date '{}'", s)))
    };
    Ok(RecurringSchedule {
        id: raw.id,
        amount: Decimal::from_str_exact(&raw.amount).map_err(|_| {
            EngineError::InvalidState(format!("invalid schedule amount '{}'", raw.amount))
        })?,
        kind: TransactionKind::try_from(raw.kind.as_str())?,
        frequency: Frequency::try_from(raw.frequency.as_str())?,
        day_of_month: raw
            .day_of_month
            .map(|d| {
                u32::try_from(d).map_err(|_| {
                    EngineError::InvalidState(format!("invalid day of month '{}'", d))
                })
            })
            .transpose()?,
        start_date: parse_date(&raw.start_date)?,
        end_date: raw.end_date.as_deref().map(parse_date).transpose()?,
        next_occurrence: parse_date(&raw.next_occurrence)?,
        description: raw.description,
        category_id: raw.category_id,
        user_id: raw.user_id,
        active: raw.active,
    })
}

pub fn load(conn: &Connection, schedule_id: i64) -> Result<RecurringSchedule, EngineError> {
    let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM recurring_schedules WHERE id=?1");
    let raw = conn
        .query_row(&sql, params![schedule_id], read_row)
        .optional()?
        .ok_or_else(|| EngineError::not_found("recurring schedule", schedule_id))?;
    parse_row(raw)
}

/// Schedules due to fire on `as_of`: active, inside their start/end window,
/// with next occurrence arrived. Firing at-most-once per due date is the
/// synthesizer's idempotency key, not a selector concern.
pub fn find_due(conn: &Connection, as_of: NaiveDate) -> Result<Vec<RecurringSchedule>, EngineError> {
    let sql = format!(
        "SELECT {SCHEDULE_COLUMNS} FROM recurring_schedules
         WHERE active=1
           AND start_date <= ?1
           AND (end_date IS NULL OR end_date >= ?1)
           AND next_occurrence <= ?1
         ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![as_of.to_string()], read_row)?;

    let mut due = Vec::new();
    for row in rows {
        due.push(parse_row(row?)?);
    }
    Ok(due)
}
