//! OCO (one-cancels-the-other) exit pair placement and supervision
//!
//! The exchange has no native OCO linking for futures, so the pairing is
//! approximated client-side: both exit orders are placed reduce-only and a
//! polling loop cancels the survivor the moment one of them fills. Under
//! adverse timing both legs can fill before the cancel lands; that residual
//! double-fill risk is inherent to the client-side approach and is logged
//! as an anomaly rather than raised.

use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::common::cancel::CancelToken;
use crate::common::errors::Result;
use crate::common::traits::ExchangeGateway;
use crate::common::types::{OrderRecord, OrderSpec, PositionSide, WorkingType};
use crate::execution::precision::adjust;
use crate::execution::submit::OrderSubmitter;
use crate::execution::validate::validate_oco;

/// User intent for an OCO exit pair
#[derive(Debug, Clone)]
pub struct OcoParams {
    pub symbol: String,
    pub position_side: PositionSide,
    pub quantity: Decimal,
    pub take_profit_price: Decimal,
    pub stop_loss_price: Decimal,
}

/// Tuning for the monitoring loop
#[derive(Debug, Clone)]
pub struct OcoConfig {
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Total monitoring time before giving up with both legs open
    pub monitor_budget: Duration,
}

impl Default for OcoConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            monitor_budget: Duration::from_secs(600),
        }
    }
}

/// Which leg of the pair won the race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcoLeg {
    TakeProfit,
    StopLoss,
}

impl std::fmt::Display for OcoLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcoLeg::TakeProfit => write!(f, "take-profit"),
            OcoLeg::StopLoss => write!(f, "stop-loss"),
        }
    }
}

/// Terminal result of a monitored OCO pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcoOutcome {
    /// One leg filled and the sibling was canceled (or had already resolved)
    Resolved { filled: OcoLeg },
    /// Monitoring budget exhausted; both legs are still open on the exchange
    TimedOut,
    /// Cancellation requested; both legs are still open on the exchange
    Interrupted,
}

/// Final report for an OCO invocation
#[derive(Debug, Clone)]
pub struct OcoReport {
    pub take_profit: OrderRecord,
    pub stop_loss: OrderRecord,
    pub outcome: OcoOutcome,
}

/// Places a take-profit / stop-loss pair and supervises it to resolution
pub struct OcoMonitor<'a, G> {
    submitter: &'a OrderSubmitter<G>,
    config: OcoConfig,
    cancel: CancelToken,
}

impl<'a, G: ExchangeGateway> OcoMonitor<'a, G> {
    pub fn new(submitter: &'a OrderSubmitter<G>, config: OcoConfig) -> Self {
        Self {
            submitter,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Install a cancellation token checked on every poll iteration
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Validate, place both legs, then monitor until one resolves
    ///
    /// If the stop-loss leg fails to place, the already-placed take-profit
    /// leg is canceled so no half-pair is left behind.
    pub async fn run(&self, params: OcoParams) -> Result<OcoReport> {
        let rules = self.submitter.rules_for(&params.symbol).await?;
        // The straddle checks are meaningless without a reference price, so
        // unlike single-leg orders this strategy requires one.
        let reference = self.submitter.gateway().mark_price(&params.symbol).await?;
        info!("Current {} price: {}", params.symbol, reference);

        let quantity = adjust(params.quantity, rules.step_size)?;
        let take_profit_price = adjust(params.take_profit_price, rules.tick_size)?;
        let stop_loss_price = adjust(params.stop_loss_price, rules.tick_size)?;

        validate_oco(
            &params.symbol,
            params.position_side,
            quantity,
            take_profit_price,
            stop_loss_price,
            &rules,
            reference,
        )?;

        let side = params.position_side.closing_side();

        // Both legs are reduce-only so the pair can only ever close the
        // position, never open a new one.
        let tp_spec = OrderSpec::take_profit_limit(
            params.symbol.clone(),
            side,
            quantity,
            take_profit_price,
            take_profit_price,
            WorkingType::ContractPrice,
        )
        .with_reduce_only(true);
        let sl_spec = OrderSpec::stop_limit(
            params.symbol.clone(),
            side,
            quantity,
            stop_loss_price,
            stop_loss_price,
            WorkingType::ContractPrice,
        )
        .with_reduce_only(true);

        info!(
            "Placing OCO pair: {} {} {} TP@{} SL@{}",
            params.symbol, params.position_side, quantity, take_profit_price, stop_loss_price
        );

        let take_profit = self.submitter.place_with_retry(&tp_spec).await?;

        let stop_loss = match self.submitter.place_with_retry(&sl_spec).await {
            Ok(record) => record,
            Err(e) => {
                error!("Stop-loss leg failed, cancelling take-profit leg: {}", e);
                if let Err(cancel_err) = self
                    .submitter
                    .gateway()
                    .cancel_order(&params.symbol, take_profit.order_id)
                    .await
                {
                    error!(
                        "Failed to cancel orphaned take-profit order {}: {}",
                        take_profit.order_id, cancel_err
                    );
                }
                return Err(e);
            }
        };

        info!(
            "OCO pair placed: TP order {} / SL order {}",
            take_profit.order_id, stop_loss.order_id
        );

        self.monitor(&params.symbol, quantity, take_profit, stop_loss)
            .await
    }

    /// Poll both legs until one fills, the budget runs out, or cancellation
    async fn monitor(
        &self,
        symbol: &str,
        quantity: Decimal,
        mut take_profit: OrderRecord,
        mut stop_loss: OrderRecord,
    ) -> Result<OcoReport> {
        let deadline = Instant::now() + self.config.monitor_budget;

        loop {
            if self.cancel.is_cancelled() {
                warn!("OCO monitoring interrupted; both legs remain open");
                return Ok(OcoReport {
                    take_profit,
                    stop_loss,
                    outcome: OcoOutcome::Interrupted,
                });
            }
            if Instant::now() >= deadline {
                warn!(
                    "OCO monitoring budget exhausted; orders {} and {} remain open",
                    take_profit.order_id, stop_loss.order_id
                );
                return Ok(OcoReport {
                    take_profit,
                    stop_loss,
                    outcome: OcoOutcome::TimedOut,
                });
            }

            sleep(self.config.poll_interval).await;

            match self
                .submitter
                .gateway()
                .order_status(symbol, take_profit.order_id)
                .await
            {
                Ok(record) => take_profit = record,
                Err(e) => {
                    warn!("Poll failed for take-profit leg: {}", e);
                    continue;
                }
            }
            if take_profit.is_fully_filled(quantity) {
                info!("Take-profit leg {} filled", take_profit.order_id);
                let stop_loss = self.cancel_sibling(symbol, stop_loss).await?;
                return Ok(OcoReport {
                    take_profit,
                    stop_loss,
                    outcome: OcoOutcome::Resolved {
                        filled: OcoLeg::TakeProfit,
                    },
                });
            }

            match self
                .submitter
                .gateway()
                .order_status(symbol, stop_loss.order_id)
                .await
            {
                Ok(record) => stop_loss = record,
                Err(e) => {
                    warn!("Poll failed for stop-loss leg: {}", e);
                    continue;
                }
            }
            if stop_loss.is_fully_filled(quantity) {
                info!("Stop-loss leg {} filled", stop_loss.order_id);
                let take_profit = self.cancel_sibling(symbol, take_profit).await?;
                return Ok(OcoReport {
                    take_profit,
                    stop_loss,
                    outcome: OcoOutcome::Resolved {
                        filled: OcoLeg::StopLoss,
                    },
                });
            }
        }
    }

    /// Cancel the surviving leg after its sibling filled
    ///
    /// A cancel rejection is tolerated when the sibling has itself reached a
    /// terminal state in the meantime (both legs raced to fill); anything
    /// else propagates.
    async fn cancel_sibling(&self, symbol: &str, sibling: OrderRecord) -> Result<OrderRecord> {
        match self
            .submitter
            .gateway()
            .cancel_order(symbol, sibling.order_id)
            .await
        {
            Ok(record) => {
                info!("Sibling order {} cancelled", record.order_id);
                Ok(record)
            }
            Err(cancel_err) => {
                let current = self
                    .submitter
                    .gateway()
                    .order_status(symbol, sibling.order_id)
                    .await?;
                if current.status.is_terminal() {
                    warn!(
                        "Race anomaly: sibling order {} reached {} before the cancel landed",
                        current.order_id, current.status
                    );
                    Ok(current)
                } else {
                    error!(
                        "Failed to cancel sibling order {}: {}",
                        sibling.order_id, cancel_err
                    );
                    Err(cancel_err)
                }
            }
        }
    }
}
