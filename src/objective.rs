// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Objective progress and alert classification.
//!
//! Pure functions of (current, target, kind). A null current amount counts
//! as zero and a zero target is 0% attained, never a division by zero.

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ObjectiveKind;
use crate::valuation::round_money;

static WARNING_PERCENT: Lazy<Decimal> = Lazy::new(|| Decimal::from(80));
static LIMIT_PERCENT: Lazy<Decimal> = Lazy::new(|| Decimal::ONE_HUNDRED);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    None,
    Yellow,
    Red,
    Completed,
}

impl AlertStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Completed => "completed",
        }
    }
}

/// Percent of target attained, 2 decimals half-up.
pub fn percent_attained(current: Option<Decimal>, target: Decimal) -> Decimal {
    let current = current.unwrap_or(Decimal::ZERO);
    if target.is_zero() {
        return Decimal::ZERO;
    }
    round_money(current / target * Decimal::ONE_HUNDRED)
}

/// Balance left to reach the target. Negative on overshoot.
pub fn remaining_balance(current: Option<Decimal>, target: Decimal) -> Decimal {
    target - current.unwrap_or(Decimal::ZERO)
}

/// Four-state classification against the 80/100 thresholds.
///
/// A category limit never "completes": crossing it is an over-limit warning,
/// so it stays RED where a savings or investment goal reads COMPLETED.
pub fn alert_status(kind: ObjectiveKind, current: Option<Decimal>, target: Decimal) -> AlertStatus {
    let percent = percent_attained(current, target);
    if percent >= *LIMIT_PERCENT {
        if kind == ObjectiveKind::CategoryLimit {
            AlertStatus::Red
        } else {
            AlertStatus::Completed
        }
    } else if percent >= *WARNING_PERCENT {
        AlertStatus::Yellow
    } else {
        AlertStatus::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn percent_attained_basics() {
        assert_eq!(percent_attained(Some(Decimal::ZERO), dec("1000")), dec("0"));
        assert_eq!(percent_attained(Some(dec("800")), dec("1000")), dec("80.00"));
        assert_eq!(
            percent_attained(Some(dec("1200")), dec("1000")),
            dec("120.00")
        );
    }

    #[test]
    fn zero_target_is_zero_percent() {
        assert_eq!(percent_attained(Some(dec("500")), Decimal::ZERO), dec("0"));
    }

    #[test]
    fn null_current_counts_as_zero() {
        assert_eq!(percent_attained(None, dec("1000")), dec("0"));
        assert_eq!(remaining_balance(None, dec("1000")), dec("1000"));
    }

    #[test]
    fn percent_rounds_half_up_from_inner_precision() {
        // 333.33 / 1000 = 33.333% -> 33.33; 333.35 -> 33.335% -> 33.34
        assert_eq!(percent_attained(Some(dec("333.33")), dec("1000")), dec("33.33"));
        assert_eq!(percent_attained(Some(dec("333.35")), dec("1000")), dec("33.34"));
    }

    #[test]
    fn remaining_goes_negative_on_overshoot() {
        assert_eq!(remaining_balance(Some(dec("1200")), dec("1000")), dec("-200"));
    }

    #[test]
    fn savings_goal_completes_at_target() {
        assert_eq!(
            alert_status(ObjectiveKind::MonthlySavings, Some(dec("1000")), dec("1000")),
            AlertStatus::Completed
        );
        assert_eq!(
            alert_status(ObjectiveKind::InvestmentGoal, Some(dec("1500")), dec("1000")),
            AlertStatus::Completed
        );
    }

    #[test]
    fn category_limit_never_completes() {
        assert_eq!(
            alert_status(ObjectiveKind::CategoryLimit, Some(dec("1500")), dec("1000")),
            AlertStatus::Red
        );
        assert_eq!(
            alert_status(ObjectiveKind::CategoryLimit, Some(dec("1000")), dec("1000")),
            AlertStatus::Red
        );
    }

    #[test]
    fn warning_band_starts_at_eighty_percent() {
        assert_eq!(
            alert_status(ObjectiveKind::MonthlySavings, Some(dec("800")), dec("1000")),
            AlertStatus::Yellow
        );
        assert_eq!(
            alert_status(ObjectiveKind::CategoryLimit, Some(dec("950")), dec("1000")),
            AlertStatus::Yellow
        );
        assert_eq!(
            alert_status(ObjectiveKind::MonthlySavings, Some(dec("750")), dec("1000")),
            AlertStatus::None
        );
        // Rounding feeds the classification: 99.999% reads as 100.00%.
        assert_eq!(
            alert_status(ObjectiveKind::MonthlySavings, Some(dec("999.99")), dec("1000")),
            AlertStatus::Completed
        );
    }
}
