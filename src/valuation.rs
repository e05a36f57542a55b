// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Investment valuation and position maintenance.
//!
//! Pure arithmetic over caller-supplied decimals. The market price is always
//! injected (price store or caller); an unknown price is zero, never an
//! error, and zeroes every valuation output.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::EngineError;
use crate::models::{Investment, InvestmentMovement, MovementKind};

/// Monetary rounding: two decimals, half-up. The result carries scale 2 so
/// stored amounts read uniformly ("1010.00", not "1010").
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Market value of a position: `quantity × current_price`, 2 decimals.
///
/// Zero when the price is zero or unset. A negative quantity is a
/// precondition failure, not a valuation.
pub fn current_value(quantity: Decimal, current_price: Decimal) -> Result<Decimal, EngineError> {
    if quantity.is_sign_negative() {
        return Err(EngineError::InvalidState(format!(
            "cannot value a negative quantity ({})",
            quantity
        )));
    }
    if current_price <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    Ok(round_money(quantity * current_price))
}

pub fn profit_loss(current_value: Decimal, total_invested: Decimal) -> Decimal {
    round_money(current_value - total_invested)
}

/// Percentage return on the invested amount, 2 decimals. Zero when nothing
/// is invested.
pub fn return_percentage(profit_loss: Decimal, total_invested: Decimal) -> Decimal {
    if total_invested.is_zero() {
        return Decimal::ZERO;
    }
    round_money(profit_loss / total_invested * Decimal::ONE_HUNDRED)
}

/// Applies a movement to the parent position.
///
/// Purchases grow the position at cost including fees; sales release cost at
/// the running average price; dividends and yields are cash-only;
/// adjustments shift quantity without touching cost.
pub fn apply_movement(
    investment: &mut Investment,
    movement: &InvestmentMovement,
) -> Result<(), EngineError> {
    if movement.investment_id != investment.id {
        return Err(EngineError::InvalidState(format!(
            "movement {} does not belong to investment {}",
            movement.id, investment.id
        )));
    }

    match movement.kind {
        MovementKind::Purchase => {
            if movement.quantity <= Decimal::ZERO {
                return Err(EngineError::InvalidState(
                    "purchase quantity must be positive".to_string(),
                ));
            }
            investment.quantity += movement.quantity;
            investment.total_invested += movement.amount + movement.fees;
            investment.average_price = average(investment.total_invested, investment.quantity);
        }
        MovementKind::Sale => {
            if movement.quantity <= Decimal::ZERO {
                return Err(EngineError::InvalidState(
                    "sale quantity must be positive".to_string(),
                ));
            }
            if movement.quantity > investment.quantity {
                return Err(EngineError::InvalidState(format!(
                    "cannot sell {} of '{}', only {} held",
                    movement.quantity, investment.symbol, investment.quantity
                )));
            }
            investment.quantity -= movement.quantity;
            if investment.quantity.is_zero() {
                investment.total_invested = Decimal::ZERO;
                investment.average_price = Decimal::ZERO;
            } else {
                investment.total_invested -= investment.average_price * movement.quantity;
            }
        }
        MovementKind::Dividend | MovementKind::Yield => {}
        MovementKind::Adjustment => {
            let adjusted = investment.quantity + movement.quantity;
            if adjusted.is_sign_negative() {
                return Err(EngineError::InvalidState(format!(
                    "adjustment would leave '{}' with negative quantity",
                    investment.symbol
                )));
            }
            investment.quantity = adjusted;
            investment.average_price = average(investment.total_invested, investment.quantity);
        }
    }
    Ok(())
}

fn average(total: Decimal, quantity: Decimal) -> Decimal {
    if quantity.is_zero() {
        Decimal::ZERO
    } else {
        (total / quantity).round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
    }
}
