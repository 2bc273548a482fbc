//! Grid trading setup and teardown
//!
//! Builds a ladder of evenly spaced limit orders inside a price range: BUY
//! orders below the current price, SELL orders above it. Successfully placed
//! order ids are recorded in a caller-owned `GridState`, the only registry
//! there is; the process holds it in memory and a crash loses it.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{error, info, warn};

use crate::common::errors::{BotError, Result};
use crate::common::traits::ExchangeGateway;
use crate::common::types::{OrderRecord, OrderSpec, OrderStatus, PrecisionRules, Side, TimeInForce};
use crate::execution::precision::adjust;
use crate::execution::submit::OrderSubmitter;
use crate::execution::validate::{validate_spec, validate_symbol};

/// Maximum admitted level count
const MAX_LEVELS: u32 = 50;

/// User intent for a grid setup
#[derive(Debug, Clone)]
pub struct GridParams {
    pub symbol: String,
    pub lower_price: Decimal,
    pub upper_price: Decimal,
    pub level_count: u32,
    pub quantity_per_level: Decimal,
    /// Skip the level that lands exactly on the reference price (default);
    /// when disabled that level joins the BUY side
    pub skip_at_reference: bool,
    pub dry_run: bool,
}

/// Registry of live grid order ids, owned by the caller
///
/// Persisting this across restarts is the caller's concern; the bot only
/// guarantees it within one process lifetime.
#[derive(Debug, Clone, Default)]
pub struct GridState {
    active_order_ids: BTreeSet<u64>,
}

impl GridState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, order_id: u64) {
        self.active_order_ids.insert(order_id);
    }

    pub fn active_count(&self) -> usize {
        self.active_order_ids.len()
    }

    pub fn active_order_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.active_order_ids.iter().copied()
    }

    pub fn clear(&mut self) {
        self.active_order_ids.clear();
    }
}

/// What happened at one grid level
#[derive(Debug, Clone)]
pub enum LevelOutcome {
    /// Order placed (or simulated for a dry run)
    Placed(OrderRecord),
    /// Level coincided with the reference price and was skipped
    Skipped,
    /// Placement failed; remaining levels were still attempted
    Failed(String),
}

/// Per-level entry of the setup report, in ladder order
#[derive(Debug, Clone)]
pub struct LevelReport {
    /// 1-based level number, counting up from the lower bound
    pub index: usize,
    /// Tick-adjusted level price
    pub price: Decimal,
    /// Side the level was assigned, when it was not skipped
    pub side: Option<Side>,
    pub outcome: LevelOutcome,
}

/// Summary of a grid setup invocation
#[derive(Debug, Clone)]
pub struct GridReport {
    pub symbol: String,
    pub reference_price: Decimal,
    pub quantity_per_level: Decimal,
    pub levels: Vec<LevelReport>,
}

impl GridReport {
    pub fn buy_count(&self) -> usize {
        self.placed_on(Side::Buy)
    }

    pub fn sell_count(&self) -> usize {
        self.placed_on(Side::Sell)
    }

    fn placed_on(&self, side: Side) -> usize {
        self.levels
            .iter()
            .filter(|l| l.side == Some(side) && matches!(l.outcome, LevelOutcome::Placed(_)))
            .count()
    }
}

/// Places and tears down price-grid ladders
pub struct GridManager<'a, G> {
    submitter: &'a OrderSubmitter<G>,
}

impl<'a, G: ExchangeGateway> GridManager<'a, G> {
    pub fn new(submitter: &'a OrderSubmitter<G>) -> Self {
        Self { submitter }
    }

    /// Validate the plan, compute the ladder, and place one order per level
    ///
    /// A failure at one level is logged and does not block the remaining
    /// levels. Successfully placed ids accumulate in `state`.
    pub async fn setup(&self, params: GridParams, state: &mut GridState) -> Result<GridReport> {
        self.validate_params(&params)?;

        let rules = self.submitter.rules_for(&params.symbol).await?;
        // Side assignment is meaningless without the reference price, so the
        // grid requires one even for dry runs.
        let reference = self.submitter.gateway().mark_price(&params.symbol).await?;
        info!("Current {} price: {}", params.symbol, reference);

        if reference < params.lower_price || reference > params.upper_price {
            warn!(
                "Current price {} is outside grid range [{}, {}]",
                reference, params.lower_price, params.upper_price
            );
        }

        let quantity = adjust(params.quantity_per_level, rules.step_size)?;
        let levels = compute_levels(params.lower_price, params.upper_price, params.level_count);

        info!(
            "Setting up {}-level grid on {} in [{}, {}], {} per level{}",
            params.level_count,
            params.symbol,
            params.lower_price,
            params.upper_price,
            quantity,
            if params.dry_run { " (dry run)" } else { "" }
        );

        let mut report = GridReport {
            symbol: params.symbol.clone(),
            reference_price: reference,
            quantity_per_level: quantity,
            levels: Vec::with_capacity(levels.len()),
        };

        for (i, raw_level) in levels.into_iter().enumerate() {
            let index = i + 1;
            let price = adjust(raw_level, rules.tick_size)?;

            let side = if price < reference {
                Side::Buy
            } else if price > reference {
                Side::Sell
            } else if params.skip_at_reference {
                info!("Skipping grid level {} at current price {}", index, price);
                report.levels.push(LevelReport {
                    index,
                    price,
                    side: None,
                    outcome: LevelOutcome::Skipped,
                });
                continue;
            } else {
                Side::Buy
            };

            let outcome = self
                .place_level(&params, &rules, state, side, quantity, price, index, reference)
                .await;
            report.levels.push(LevelReport {
                index,
                price,
                side: Some(side),
                outcome,
            });
        }

        info!(
            "Grid setup completed: {} BUY / {} SELL orders live, {} tracked",
            report.buy_count(),
            report.sell_count(),
            state.active_count()
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn place_level(
        &self,
        params: &GridParams,
        rules: &PrecisionRules,
        state: &mut GridState,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        index: usize,
        reference: Decimal,
    ) -> LevelOutcome {
        let spec = OrderSpec::limit(
            params.symbol.clone(),
            side,
            quantity,
            price,
            TimeInForce::Gtc,
        );

        if let Err(e) = validate_spec(&spec, rules, Some(reference)) {
            error!("Grid level {} invalid: {}", index, e);
            return LevelOutcome::Failed(e.to_string());
        }

        if params.dry_run {
            info!(
                "[dry run] Would place {} order at {} for {} {}",
                side, price, quantity, params.symbol
            );
            return LevelOutcome::Placed(OrderRecord {
                order_id: index as u64,
                symbol: params.symbol.clone(),
                status: OrderStatus::Simulated,
                executed_qty: Decimal::ZERO,
                avg_price: Decimal::ZERO,
                side,
                order_type: "LIMIT".to_string(),
            });
        }

        match self.submitter.place_with_retry(&spec).await {
            Ok(record) => {
                info!(
                    "Grid level {} placed: {} {} @ {} -> order {}",
                    index, side, quantity, price, record.order_id
                );
                state.register(record.order_id);
                LevelOutcome::Placed(record)
            }
            Err(e) => {
                error!("Failed to place grid level {}: {}", index, e);
                LevelOutcome::Failed(e.to_string())
            }
        }
    }

    /// Cancel every tracked order, best-effort
    ///
    /// "Already filled or canceled" rejections count as success. The registry
    /// is cleared only after every id has been attempted.
    pub async fn cancel_all(&self, symbol: &str, state: &mut GridState) -> Result<usize> {
        let ids: Vec<u64> = state.active_order_ids().collect();
        info!("Cancelling {} tracked grid orders for {}", ids.len(), symbol);

        let mut cancelled = 0;
        for order_id in ids {
            match self.submitter.gateway().cancel_order(symbol, order_id).await {
                Ok(_) => {
                    info!("Order {} cancelled", order_id);
                    cancelled += 1;
                }
                Err(BotError::OrderRejected { code, reason }) => {
                    // The order resolved on its own before teardown reached it
                    info!(
                        "Order {} already closed (code {}): {}",
                        order_id, code, reason
                    );
                    cancelled += 1;
                }
                Err(e) => {
                    error!("Failed to cancel order {}: {}", order_id, e);
                }
            }
        }

        state.clear();
        Ok(cancelled)
    }

    /// Cancel all open orders on the exchange for a symbol
    ///
    /// Used by the CLI teardown flag, where no in-memory registry survives
    /// from the setup invocation: the registry is rebuilt from the
    /// exchange's open-order list, then torn down as usual.
    pub async fn cancel_all_open(&self, symbol: &str) -> Result<usize> {
        let open = self.submitter.gateway().open_orders(symbol).await?;
        let mut state = GridState::new();
        for record in &open {
            state.register(record.order_id);
        }
        self.cancel_all(symbol, &mut state).await
    }

    fn validate_params(&self, params: &GridParams) -> Result<()> {
        validate_symbol(&params.symbol)?;
        if params.lower_price <= Decimal::ZERO {
            return Err(BotError::validation(
                "lower_price",
                format!("{} must be strictly positive", params.lower_price),
            ));
        }
        if params.lower_price >= params.upper_price {
            return Err(BotError::validation(
                "lower_price",
                format!(
                    "{} must be less than upper price {}",
                    params.lower_price, params.upper_price
                ),
            ));
        }
        if params.level_count < 2 {
            return Err(BotError::validation("level_count", "must be at least 2"));
        }
        if params.level_count > MAX_LEVELS {
            return Err(BotError::validation(
                "level_count",
                format!("{} exceeds maximum {}", params.level_count, MAX_LEVELS),
            ));
        }
        if params.quantity_per_level <= Decimal::ZERO {
            return Err(BotError::validation(
                "quantity_per_level",
                format!("{} must be strictly positive", params.quantity_per_level),
            ));
        }
        Ok(())
    }
}

/// Evenly spaced ladder of `count` prices from `lower` to `upper` inclusive
fn compute_levels(lower: Decimal, upper: Decimal, count: u32) -> Vec<Decimal> {
    let spacing = (upper - lower) / Decimal::from(count - 1);

    (0..count)
        .map(|i| {
            if i == count - 1 {
                // Pin the top level to the bound rather than accumulate
                // division dust
                upper
            } else {
                lower + spacing * Decimal::from(i)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::MockExchangeGateway;
    use rust_decimal_macros::dec;

    fn btc_rules() -> PrecisionRules {
        PrecisionRules {
            symbol: "BTCUSDT".to_string(),
            tick_size: dec!(0.1),
            step_size: dec!(0.001),
            min_qty: dec!(0.001),
            min_notional: dec!(100),
        }
    }

    fn grid_params(dry_run: bool) -> GridParams {
        GridParams {
            symbol: "BTCUSDT".to_string(),
            lower_price: dec!(48000),
            upper_price: dec!(52000),
            level_count: 5,
            quantity_per_level: dec!(0.01),
            skip_at_reference: true,
            dry_run,
        }
    }

    #[test]
    fn test_levels_are_uniform_and_hit_both_bounds() {
        let levels = compute_levels(dec!(48000), dec!(52000), 5);
        assert_eq!(
            levels,
            vec![
                dec!(48000),
                dec!(49000),
                dec!(50000),
                dec!(51000),
                dec!(52000)
            ]
        );
    }

    #[test]
    fn test_levels_strictly_increasing_for_awkward_ranges() {
        let levels = compute_levels(dec!(100), dec!(200), 7);
        assert_eq!(levels.len(), 7);
        assert_eq!(levels[0], dec!(100));
        assert_eq!(levels[6], dec!(200));
        for window in levels.windows(2) {
            assert!(window[0] < window[1]);
        }
    }

    fn live_record(spec: &OrderSpec, order_id: u64) -> OrderRecord {
        OrderRecord {
            order_id,
            symbol: spec.symbol.clone(),
            status: OrderStatus::New,
            executed_qty: dec!(0),
            avg_price: dec!(0),
            side: spec.side,
            order_type: "LIMIT".to_string(),
        }
    }

    #[tokio::test]
    async fn test_setup_assigns_sides_and_skips_reference_level() {
        let mut gateway = MockExchangeGateway::new();
        gateway
            .expect_symbol_filters()
            .returning(|_| Ok(btc_rules()));
        gateway.expect_mark_price().returning(|_| Ok(dec!(50000)));

        let mut next_id = 0;
        gateway
            .expect_place_order()
            .times(4)
            .returning(move |spec| {
                next_id += 1;
                let price = spec.kind.limit_price().unwrap();
                if price < dec!(50000) {
                    assert_eq!(spec.side, Side::Buy);
                } else {
                    assert_eq!(spec.side, Side::Sell);
                }
                Ok(live_record(spec, next_id))
            });

        let submitter = OrderSubmitter::new(gateway);
        let manager = GridManager::new(&submitter);
        let mut state = GridState::new();
        let report = manager.setup(grid_params(false), &mut state).await.unwrap();

        assert_eq!(report.buy_count(), 2);
        assert_eq!(report.sell_count(), 2);
        assert!(matches!(report.levels[2].outcome, LevelOutcome::Skipped));
        assert_eq!(state.active_count(), 4);
    }

    #[tokio::test]
    async fn test_reference_level_joins_buy_side_when_skip_disabled() {
        let mut gateway = MockExchangeGateway::new();
        gateway
            .expect_symbol_filters()
            .returning(|_| Ok(btc_rules()));
        gateway.expect_mark_price().returning(|_| Ok(dec!(50000)));

        let mut next_id = 0;
        gateway
            .expect_place_order()
            .times(5)
            .returning(move |spec| {
                next_id += 1;
                Ok(live_record(spec, next_id))
            });

        let submitter = OrderSubmitter::new(gateway);
        let manager = GridManager::new(&submitter);
        let mut state = GridState::new();
        let mut params = grid_params(false);
        params.skip_at_reference = false;
        let report = manager.setup(params, &mut state).await.unwrap();

        assert_eq!(report.buy_count(), 3);
        assert_eq!(report.sell_count(), 2);
        assert_eq!(report.levels[2].side, Some(Side::Buy));
        assert_eq!(state.active_count(), 5);
    }

    #[tokio::test]
    async fn test_level_failure_does_not_block_remaining_levels() {
        let mut gateway = MockExchangeGateway::new();
        gateway
            .expect_symbol_filters()
            .returning(|_| Ok(btc_rules()));
        gateway.expect_mark_price().returning(|_| Ok(dec!(50000)));

        let mut next_id = 0;
        gateway
            .expect_place_order()
            .times(4)
            .returning(move |spec| {
                if spec.kind.limit_price() == Some(dec!(49000)) {
                    return Err(BotError::OrderRejected {
                        code: -2019,
                        reason: "Margin is insufficient.".to_string(),
                    });
                }
                next_id += 1;
                Ok(live_record(spec, next_id))
            });

        let submitter = OrderSubmitter::new(gateway);
        let manager = GridManager::new(&submitter);
        let mut state = GridState::new();
        let report = manager.setup(grid_params(false), &mut state).await.unwrap();

        assert_eq!(report.buy_count(), 1);
        assert_eq!(report.sell_count(), 2);
        assert!(matches!(report.levels[1].outcome, LevelOutcome::Failed(_)));
        assert_eq!(state.active_count(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_simulates_without_registering() {
        let mut gateway = MockExchangeGateway::new();
        gateway
            .expect_symbol_filters()
            .returning(|_| Ok(btc_rules()));
        gateway.expect_mark_price().returning(|_| Ok(dec!(50000)));
        gateway.expect_place_order().times(0);

        let submitter = OrderSubmitter::new(gateway);
        let manager = GridManager::new(&submitter);
        let mut state = GridState::new();
        let report = manager.setup(grid_params(true), &mut state).await.unwrap();

        assert_eq!(report.buy_count(), 2);
        assert_eq!(report.sell_count(), 2);
        assert_eq!(state.active_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_tolerates_already_closed_orders() {
        let mut gateway = MockExchangeGateway::new();
        gateway
            .expect_cancel_order()
            .withf(|_, id| *id == 11)
            .times(1)
            .returning(|_, id| {
                Ok(OrderRecord {
                    order_id: id,
                    symbol: "BTCUSDT".to_string(),
                    status: OrderStatus::Canceled,
                    executed_qty: dec!(0),
                    avg_price: dec!(0),
                    side: Side::Buy,
                    order_type: "LIMIT".to_string(),
                })
            });
        gateway
            .expect_cancel_order()
            .withf(|_, id| *id == 12)
            .times(1)
            .returning(|_, _| {
                Err(BotError::OrderRejected {
                    code: -2011,
                    reason: "Unknown order sent.".to_string(),
                })
            });

        let submitter = OrderSubmitter::new(gateway);
        let manager = GridManager::new(&submitter);
        let mut state = GridState::new();
        state.register(11);
        state.register(12);

        let cancelled = manager.cancel_all("BTCUSDT", &mut state).await.unwrap();
        assert_eq!(cancelled, 2);
        assert_eq!(state.active_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_open_rebuilds_registry_from_exchange() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_open_orders().times(1).returning(|_| {
            Ok(vec![
                OrderRecord {
                    order_id: 21,
                    symbol: "BTCUSDT".to_string(),
                    status: OrderStatus::New,
                    executed_qty: dec!(0),
                    avg_price: dec!(0),
                    side: Side::Buy,
                    order_type: "LIMIT".to_string(),
                },
                OrderRecord {
                    order_id: 22,
                    symbol: "BTCUSDT".to_string(),
                    status: OrderStatus::New,
                    executed_qty: dec!(0),
                    avg_price: dec!(0),
                    side: Side::Sell,
                    order_type: "LIMIT".to_string(),
                },
            ])
        });
        gateway.expect_cancel_order().times(2).returning(|_, id| {
            Ok(OrderRecord {
                order_id: id,
                symbol: "BTCUSDT".to_string(),
                status: OrderStatus::Canceled,
                executed_qty: dec!(0),
                avg_price: dec!(0),
                side: Side::Buy,
                order_type: "LIMIT".to_string(),
            })
        });

        let submitter = OrderSubmitter::new(gateway);
        let manager = GridManager::new(&submitter);
        let cancelled = manager.cancel_all_open("BTCUSDT").await.unwrap();
        assert_eq!(cancelled, 2);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let gateway = MockExchangeGateway::new();
        let submitter = OrderSubmitter::new(gateway);
        let manager = GridManager::new(&submitter);
        let mut state = GridState::new();

        let mut params = grid_params(false);
        params.lower_price = dec!(52000);
        params.upper_price = dec!(48000);
        let err = manager.setup(params, &mut state).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
