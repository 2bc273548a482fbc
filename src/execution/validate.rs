//! Pre-submission validation of order parameters
//!
//! Validation is fail-fast: the first violated rule is reported and checking
//! stops. All checks run before any order reaches the network.

use rust_decimal::Decimal;

use crate::common::errors::{BotError, Result};
use crate::common::types::{OrderKind, OrderSpec, PositionSide, PrecisionRules, Side};

/// Check that a symbol looks like a USDT-margined futures pair (e.g. BTCUSDT)
pub fn validate_symbol(symbol: &str) -> Result<()> {
    let upper = symbol.to_uppercase();
    if upper.len() < 6 || !upper.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(BotError::validation(
            "symbol",
            format!("{} is not a valid futures symbol", symbol),
        ));
    }
    if !upper.ends_with("USDT") {
        return Err(BotError::validation(
            "symbol",
            format!("{} must end with USDT", symbol),
        ));
    }
    Ok(())
}

/// Validate a precision-adjusted order spec against the symbol's rules
///
/// `reference_price` is the current mark price when it could be fetched;
/// price-relationship checks are skipped without it.
pub fn validate_spec(
    spec: &OrderSpec,
    rules: &PrecisionRules,
    reference_price: Option<Decimal>,
) -> Result<()> {
    validate_symbol(&spec.symbol)?;

    if spec.quantity <= Decimal::ZERO {
        return Err(BotError::validation(
            "quantity",
            format!("{} must be strictly positive", spec.quantity),
        ));
    }
    if let Some(price) = spec.kind.limit_price() {
        if price <= Decimal::ZERO {
            return Err(BotError::validation(
                "price",
                format!("{} must be strictly positive", price),
            ));
        }
    }
    if let Some(stop) = spec.kind.stop_price() {
        if stop <= Decimal::ZERO {
            return Err(BotError::validation(
                "stop_price",
                format!("{} must be strictly positive", stop),
            ));
        }
    }

    if spec.quantity < rules.min_qty {
        return Err(BotError::validation(
            "quantity",
            format!("{} is below minimum {}", spec.quantity, rules.min_qty),
        ));
    }

    if let Some(price) = spec.kind.limit_price() {
        let notional = spec.quantity * price;
        if notional < rules.min_notional {
            return Err(BotError::validation(
                "notional",
                format!(
                    "order value {} is below minimum {}",
                    notional, rules.min_notional
                ),
            ));
        }
    }

    if let Some(reference) = reference_price {
        validate_trigger_relation(spec, reference)?;
    }

    Ok(())
}

/// For triggered orders, both prices must sit on the side of the reference
/// price that the order side implies, otherwise the order would arm
/// immediately on submission.
fn validate_trigger_relation(spec: &OrderSpec, reference: Decimal) -> Result<()> {
    let (stop, limit, favorable) = match &spec.kind {
        OrderKind::StopLimit {
            stop_price,
            limit_price,
            ..
        } => (*stop_price, *limit_price, false),
        OrderKind::TakeProfitLimit {
            stop_price,
            limit_price,
            ..
        } => (*stop_price, *limit_price, true),
        _ => return Ok(()),
    };

    // A SELL stop arms below the reference, a SELL take-profit above;
    // BUY is the mirror image.
    let must_be_below = match (spec.side, favorable) {
        (Side::Sell, false) | (Side::Buy, true) => true,
        (Side::Sell, true) | (Side::Buy, false) => false,
    };

    let describe = if must_be_below { "below" } else { "above" };
    let ok = |price: Decimal| {
        if must_be_below {
            price < reference
        } else {
            price > reference
        }
    };

    if !ok(stop) {
        return Err(BotError::validation(
            "stop_price",
            format!(
                "{} must be {} current price {} for a {} {} order",
                stop,
                describe,
                reference,
                spec.side,
                spec.kind.wire_name()
            ),
        ));
    }
    if !ok(limit) {
        return Err(BotError::validation(
            "price",
            format!(
                "{} must be {} current price {} for a {} {} order",
                limit,
                describe,
                reference,
                spec.side,
                spec.kind.wire_name()
            ),
        ));
    }

    Ok(())
}

/// Validate the paired take-profit / stop-loss prices of an OCO placement
///
/// The two exit prices must straddle the current price in the direction the
/// position side implies: a LONG closes at profit above and at loss below,
/// a SHORT the other way around.
pub fn validate_oco(
    symbol: &str,
    position_side: PositionSide,
    quantity: Decimal,
    take_profit: Decimal,
    stop_loss: Decimal,
    rules: &PrecisionRules,
    reference_price: Decimal,
) -> Result<()> {
    validate_symbol(symbol)?;

    if quantity <= Decimal::ZERO {
        return Err(BotError::validation(
            "quantity",
            format!("{} must be strictly positive", quantity),
        ));
    }
    if take_profit <= Decimal::ZERO {
        return Err(BotError::validation(
            "take_profit_price",
            format!("{} must be strictly positive", take_profit),
        ));
    }
    if stop_loss <= Decimal::ZERO {
        return Err(BotError::validation(
            "stop_loss_price",
            format!("{} must be strictly positive", stop_loss),
        ));
    }

    if quantity < rules.min_qty {
        return Err(BotError::validation(
            "quantity",
            format!("{} is below minimum {}", quantity, rules.min_qty),
        ));
    }

    // Worst-case notional uses the lower of the two exit prices
    let check_price = take_profit.min(stop_loss);
    let notional = quantity * check_price;
    if notional < rules.min_notional {
        return Err(BotError::validation(
            "notional",
            format!(
                "order value {} is below minimum {}",
                notional, rules.min_notional
            ),
        ));
    }

    match position_side {
        PositionSide::Long => {
            if take_profit <= reference_price {
                return Err(BotError::validation(
                    "take_profit_price",
                    format!(
                        "{} must be above current price {} for a LONG position",
                        take_profit, reference_price
                    ),
                ));
            }
            if stop_loss >= reference_price {
                return Err(BotError::validation(
                    "stop_loss_price",
                    format!(
                        "{} must be below current price {} for a LONG position",
                        stop_loss, reference_price
                    ),
                ));
            }
        }
        PositionSide::Short => {
            if take_profit >= reference_price {
                return Err(BotError::validation(
                    "take_profit_price",
                    format!(
                        "{} must be below current price {} for a SHORT position",
                        take_profit, reference_price
                    ),
                ));
            }
            if stop_loss <= reference_price {
                return Err(BotError::validation(
                    "stop_loss_price",
                    format!(
                        "{} must be above current price {} for a SHORT position",
                        stop_loss, reference_price
                    ),
                ));
            }
        }
    }

    Ok(())
}
