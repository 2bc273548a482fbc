//! TWAP (time-weighted average price) slice execution
//!
//! Splits a parent quantity into time-spaced market-order slices. Slice
//! quantities are computed once, on the symbol's step grid, so that their sum
//! equals the step-adjusted parent quantity exactly; the final slice absorbs
//! the remainder instead of accumulating rounding drift.

use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::common::cancel::CancelToken;
use crate::common::errors::{BotError, Result};
use crate::common::traits::ExchangeGateway;
use crate::common::types::{OrderRecord, OrderSpec, OrderStatus, Side};
use crate::execution::precision::adjust;
use crate::execution::submit::OrderSubmitter;
use crate::execution::validate::validate_symbol;

/// Maximum admitted slice count
const MAX_SLICES: u32 = 100;

/// Bound of the random slice-size variation (fraction of the even slice)
const JITTER: f64 = 0.2;

/// User intent for a TWAP execution
#[derive(Debug, Clone)]
pub struct TwapParams {
    pub symbol: String,
    pub side: Side,
    pub total_quantity: Decimal,
    pub slice_count: u32,
    pub interval: Duration,
    pub randomize: bool,
    pub dry_run: bool,
}

/// What happened to one slice
#[derive(Debug, Clone)]
pub enum SliceOutcome {
    /// Submitted (or simulated) successfully
    Placed(OrderRecord),
    /// Submission failed; the remaining slices still ran
    Failed(String),
}

/// Per-slice entry of the final report, in execution order
#[derive(Debug, Clone)]
pub struct SliceReport {
    /// 1-based slice number
    pub index: usize,
    /// Intended quantity for this slice
    pub quantity: Decimal,
    pub outcome: SliceOutcome,
}

/// Partial-success summary of a TWAP invocation
#[derive(Debug, Clone)]
pub struct TwapReport {
    pub symbol: String,
    pub side: Side,
    /// Step-adjusted parent quantity the slices sum to
    pub planned_total: Decimal,
    /// Sum of executed quantities across successful slices
    pub executed_total: Decimal,
    /// Volume-weighted average fill price across successful slices
    pub average_price: Decimal,
    pub start_price: Option<Decimal>,
    pub end_price: Option<Decimal>,
    pub slices: Vec<SliceReport>,
    /// Whether a cancellation request stopped the plan early
    pub interrupted: bool,
}

impl TwapReport {
    /// Number of slices that were placed successfully
    pub fn placed_count(&self) -> usize {
        self.slices
            .iter()
            .filter(|s| matches!(s.outcome, SliceOutcome::Placed(_)))
            .count()
    }

    /// Number of slices that failed
    pub fn failed_count(&self) -> usize {
        self.slices.len() - self.placed_count()
    }
}

/// Executes a TWAP plan as a sequence of market-order slices
pub struct TwapScheduler<'a, G> {
    submitter: &'a OrderSubmitter<G>,
    cancel: CancelToken,
}

impl<'a, G: ExchangeGateway> TwapScheduler<'a, G> {
    pub fn new(submitter: &'a OrderSubmitter<G>) -> Self {
        Self {
            submitter,
            cancel: CancelToken::new(),
        }
    }

    /// Install a cancellation token checked between slices
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Validate the plan, compute slices, then execute them in order
    ///
    /// One rejected slice is reported and does not abort the remainder of
    /// the plan; already-submitted slices are never rolled back.
    pub async fn run(&self, params: TwapParams) -> Result<TwapReport> {
        self.validate_params(&params)?;

        let rules = self.submitter.rules_for(&params.symbol).await?;
        let start_price = self.submitter.reference_price(&params.symbol).await;

        let slices = {
            // Scoped so the thread-local RNG never lives across an await
            let mut rng = rand::thread_rng();
            compute_slices(
                params.total_quantity,
                params.slice_count,
                rules.step_size,
                params.randomize,
                &mut rng,
            )?
        };
        let planned_total: Decimal = slices.iter().sum();
        info!(
            "TWAP plan: {} {} {} in {} slices every {:?}{}",
            params.symbol,
            params.side,
            planned_total,
            slices.len(),
            params.interval,
            if params.dry_run { " (dry run)" } else { "" }
        );

        let mut report = TwapReport {
            symbol: params.symbol.clone(),
            side: params.side,
            planned_total,
            executed_total: Decimal::ZERO,
            average_price: Decimal::ZERO,
            start_price,
            end_price: None,
            slices: Vec::with_capacity(slices.len()),
            interrupted: false,
        };
        let mut total_cost = Decimal::ZERO;

        let last = slices.len();
        for (i, quantity) in slices.into_iter().enumerate() {
            let index = i + 1;
            if self.cancel.is_cancelled() {
                warn!("TWAP interrupted after {} of {} slices", i, last);
                report.interrupted = true;
                break;
            }

            let outcome = self
                .execute_slice(&params, quantity, index, last, start_price)
                .await;
            if let SliceOutcome::Placed(record) = &outcome {
                report.executed_total += record.executed_qty;
                total_cost += record.executed_qty * record.avg_price;
            }
            report.slices.push(SliceReport {
                index,
                quantity,
                outcome,
            });

            if index < last {
                info!("Waiting {:?} before next slice", params.interval);
                sleep(params.interval).await;
            }
        }

        if report.executed_total > Decimal::ZERO {
            report.average_price = total_cost / report.executed_total;
        }
        report.end_price = self.submitter.reference_price(&params.symbol).await;

        info!(
            "TWAP completed: {}/{} slices placed, executed {}",
            report.placed_count(),
            report.slices.len(),
            report.executed_total
        );
        Ok(report)
    }

    fn validate_params(&self, params: &TwapParams) -> Result<()> {
        validate_symbol(&params.symbol)?;
        if params.total_quantity <= Decimal::ZERO {
            return Err(BotError::validation(
                "total_quantity",
                format!("{} must be strictly positive", params.total_quantity),
            ));
        }
        if params.slice_count == 0 {
            return Err(BotError::validation("slice_count", "must be at least 1"));
        }
        if params.slice_count > MAX_SLICES {
            return Err(BotError::validation(
                "slice_count",
                format!("{} exceeds maximum {}", params.slice_count, MAX_SLICES),
            ));
        }
        if params.interval < Duration::from_secs(1) {
            return Err(BotError::validation(
                "interval_seconds",
                "must be at least 1 second",
            ));
        }
        Ok(())
    }

    async fn execute_slice(
        &self,
        params: &TwapParams,
        quantity: Decimal,
        index: usize,
        total: usize,
        start_price: Option<Decimal>,
    ) -> SliceOutcome {
        info!(
            "Executing TWAP slice {}/{}: {} {} {}",
            index, total, params.symbol, params.side, quantity
        );

        if params.dry_run {
            info!(
                "[dry run] Would execute slice {}/{}: {} {}",
                index, total, quantity, params.symbol
            );
            return SliceOutcome::Placed(OrderRecord {
                order_id: index as u64,
                symbol: params.symbol.clone(),
                status: OrderStatus::Simulated,
                executed_qty: quantity,
                avg_price: start_price.unwrap_or(Decimal::ZERO),
                side: params.side,
                order_type: "MARKET".to_string(),
            });
        }

        let spec = OrderSpec::market(params.symbol.clone(), params.side, quantity);
        match self.submitter.submit(&spec).await {
            Ok(record) => {
                info!(
                    "Slice {} executed: order {} filled {}",
                    index, record.order_id, record.executed_qty
                );
                SliceOutcome::Placed(record)
            }
            Err(e) => {
                error!("Failed to execute slice {}: {}", index, e);
                SliceOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Split a total quantity into `count` step-conforming slices
///
/// All slices are multiples of `step` and sum exactly to the step-adjusted
/// total. With `randomize`, the first `count - 1` slices vary around the even
/// split by up to +-20%, bounded so the final remainder slice stays at least
/// one step.
fn compute_slices<R: Rng>(
    total: Decimal,
    count: u32,
    step: Decimal,
    randomize: bool,
    rng: &mut R,
) -> Result<Vec<Decimal>> {
    let total = adjust(total, step)?;
    let count_dec = Decimal::from(count);

    if total < step * count_dec {
        return Err(BotError::validation(
            "slice_count",
            format!(
                "total {} cannot be split into {} slices of at least {}",
                total, count, step
            ),
        ));
    }

    let base = total / count_dec;
    let mut slices = Vec::with_capacity(count as usize);
    let mut remaining = total;

    for i in 0..count.saturating_sub(1) {
        let slices_after = Decimal::from(count - 1 - i);
        // Leave at least one step for every later slice
        let max_here = remaining - step * slices_after;

        let target = if randomize {
            let factor = Decimal::from_f64(rng.gen_range(1.0 - JITTER..=1.0 + JITTER))
                .unwrap_or(Decimal::ONE);
            base * factor
        } else {
            base
        };

        let slice = adjust(target.min(max_here).max(step), step)?;
        slices.push(slice);
        remaining -= slice;
    }
    slices.push(remaining);

    Ok(slices)
}
