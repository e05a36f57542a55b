// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::schedule::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidState(format!(
                "unknown transaction kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Purchase,
    Sale,
    Dividend,
    Yield,
    Adjustment,
}

impl MovementKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Dividend => "dividend",
            Self::Yield => "yield",
            Self::Adjustment => "adjustment",
        }
    }

    /// Label used in synthesized ledger descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Purchase => "Purchase",
            Self::Sale => "Sale",
            Self::Dividend => "Dividend",
            Self::Yield => "Yield",
            Self::Adjustment => "Adjustment",
        }
    }

    /// The ledger side a movement posts to. Adjustments post nothing.
    pub const fn ledger_kind(self) -> Option<TransactionKind> {
        match self {
            Self::Purchase => Some(TransactionKind::Expense),
            Self::Sale | Self::Dividend | Self::Yield => Some(TransactionKind::Income),
            Self::Adjustment => None,
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "sale" => Ok(Self::Sale),
            "dividend" => Ok(Self::Dividend),
            "yield" => Ok(Self::Yield),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidState(format!(
                "unknown movement kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveKind {
    CategoryLimit,
    MonthlySavings,
    InvestmentGoal,
}

impl ObjectiveKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CategoryLimit => "category-limit",
            Self::MonthlySavings => "monthly-savings",
            Self::InvestmentGoal => "investment-goal",
        }
    }
}

impl TryFrom<&str> for ObjectiveKind {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "category-limit" => Ok(Self::CategoryLimit),
            "monthly-savings" => Ok(Self::MonthlySavings),
            "investment-goal" => Ok(Self::InvestmentGoal),
            other => Err(EngineError::InvalidState(format!(
                "unknown objective kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: TransactionKind,
    pub color: String,
    pub icon: String,
    pub user_id: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub kind: TransactionKind,
    pub payment_method: Option<String>,
    pub category_id: Option<i64>,
    pub user_id: String,
    pub schedule_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub investment_id: Option<i64>,
    pub movement_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub user_id: String,
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_occurrence: NaiveDate,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub total_invested: Decimal,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMovement {
    pub id: i64,
    pub investment_id: i64,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub fees: Decimal,
    pub date: NaiveDate,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub id: i64,
    pub name: String,
    pub kind: ObjectiveKind,
    pub target_amount: Decimal,
    pub current_amount: Option<Decimal>,
    pub category_id: Option<i64>,
    pub period: String, // YYYY-MM
    pub active: bool,
    pub user_id: String,
}
