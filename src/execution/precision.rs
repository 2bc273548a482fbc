//! Rounding of prices and quantities to exchange-mandated increments

use rust_decimal::Decimal;

use crate::common::errors::{BotError, Result};
use crate::common::types::{OrderKind, OrderSpec, PrecisionRules};

/// Round a value down to the nearest multiple of the given step
///
/// Never rounds up: a submitted price must not exceed what the user stated,
/// and a quantity must not exceed exchange limits. Fails when the rounded
/// value collapses to zero or below.
pub fn adjust(value: Decimal, step: Decimal) -> Result<Decimal> {
    if step <= Decimal::ZERO {
        return Err(BotError::Precision(format!("Invalid step size: {}", step)));
    }

    let adjusted = ((value / step).floor() * step).normalize();
    if adjusted <= Decimal::ZERO {
        return Err(BotError::Precision(format!(
            "Value {} collapses to {} at step {}",
            value, adjusted, step
        )));
    }

    Ok(adjusted)
}

/// Produce a copy of the spec with quantity and prices conforming to the
/// symbol's step and tick sizes
///
/// Applying this twice is a no-op: a value already on the grid floors to
/// itself.
pub fn adjust_spec(spec: &OrderSpec, rules: &PrecisionRules) -> Result<OrderSpec> {
    let quantity = adjust(spec.quantity, rules.step_size)?;

    let kind = match &spec.kind {
        OrderKind::Market => OrderKind::Market,
        OrderKind::Limit {
            price,
            time_in_force,
        } => OrderKind::Limit {
            price: adjust(*price, rules.tick_size)?,
            time_in_force: *time_in_force,
        },
        OrderKind::StopLimit {
            stop_price,
            limit_price,
            working_type,
        } => OrderKind::StopLimit {
            stop_price: adjust(*stop_price, rules.tick_size)?,
            limit_price: adjust(*limit_price, rules.tick_size)?,
            working_type: *working_type,
        },
        OrderKind::TakeProfitLimit {
            stop_price,
            limit_price,
            working_type,
        } => OrderKind::TakeProfitLimit {
            stop_price: adjust(*stop_price, rules.tick_size)?,
            limit_price: adjust(*limit_price, rules.tick_size)?,
            working_type: *working_type,
        },
    };

    Ok(OrderSpec {
        symbol: spec.symbol.clone(),
        side: spec.side,
        kind,
        quantity,
        reduce_only: spec.reduce_only,
    })
}
