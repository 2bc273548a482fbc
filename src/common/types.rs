//! Unified order types shared by all strategy components

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Position side for paired exit orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// The order side that closes a position of this side
    pub fn closing_side(&self) -> Side {
        match self {
            PositionSide::Long => Side::Sell,
            PositionSide::Short => Side::Buy,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// Time in force for limit-style orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good till canceled
    #[default]
    Gtc,
    /// Immediate or cancel
    Ioc,
    /// Fill or kill
    Fok,
    /// Good till crossing (post-only)
    Gtx,
}

impl std::fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeInForce::Gtc => write!(f, "GTC"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Fok => write!(f, "FOK"),
            TimeInForce::Gtx => write!(f, "GTX"),
        }
    }
}

/// Reference price basis used to evaluate stop triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkingType {
    /// Last traded (contract) price
    #[default]
    ContractPrice,
    /// Mark price
    MarkPrice,
}

impl std::fmt::Display for WorkingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkingType::ContractPrice => write!(f, "CONTRACT_PRICE"),
            WorkingType::MarkPrice => write!(f, "MARK_PRICE"),
        }
    }
}

/// The closed set of order shapes this bot can submit
///
/// Each variant carries exactly the price fields the exchange requires for
/// that shape, so construction and wire encoding stay exhaustive.
/// `TakeProfitLimit` is the trigger-mirrored sibling of `StopLimit` and is
/// produced by the OCO strategy for its take-profit leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Immediate execution at market
    Market,
    /// Resting limit order
    Limit {
        price: Decimal,
        time_in_force: TimeInForce,
    },
    /// Limit order armed when price crosses the stop in the adverse direction
    StopLimit {
        stop_price: Decimal,
        limit_price: Decimal,
        working_type: WorkingType,
    },
    /// Limit order armed when price crosses the stop in the favorable direction
    TakeProfitLimit {
        stop_price: Decimal,
        limit_price: Decimal,
        working_type: WorkingType,
    },
}

impl OrderKind {
    /// Exchange wire name for this order shape
    pub fn wire_name(&self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::Limit { .. } => "LIMIT",
            OrderKind::StopLimit { .. } => "STOP",
            OrderKind::TakeProfitLimit { .. } => "TAKE_PROFIT",
        }
    }

    /// Limit price, for shapes that carry one
    pub fn limit_price(&self) -> Option<Decimal> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit { price, .. } => Some(*price),
            OrderKind::StopLimit { limit_price, .. }
            | OrderKind::TakeProfitLimit { limit_price, .. } => Some(*limit_price),
        }
    }

    /// Stop/trigger price, for shapes that carry one
    pub fn stop_price(&self) -> Option<Decimal> {
        match self {
            OrderKind::StopLimit { stop_price, .. }
            | OrderKind::TakeProfitLimit { stop_price, .. } => Some(*stop_price),
            _ => None,
        }
    }
}

/// A fully specified order, immutable once constructed
///
/// Quantity and prices must already satisfy exchange precision before
/// submission; `execution::precision::adjust_spec` produces a conforming copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Trading pair symbol (e.g. BTCUSDT)
    pub symbol: String,
    /// Order side
    pub side: Side,
    /// Order shape and its price fields
    pub kind: OrderKind,
    /// Order quantity in base asset
    pub quantity: Decimal,
    /// Guarantee the order can only decrease an existing position
    pub reduce_only: bool,
}

impl OrderSpec {
    /// Market order
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: OrderKind::Market,
            quantity,
            reduce_only: false,
        }
    }

    /// Limit order with the given time in force
    pub fn limit(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: OrderKind::Limit {
                price,
                time_in_force,
            },
            quantity,
            reduce_only: false,
        }
    }

    /// Stop-limit order
    pub fn stop_limit(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
        working_type: WorkingType,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: OrderKind::StopLimit {
                stop_price,
                limit_price,
                working_type,
            },
            quantity,
            reduce_only: false,
        }
    }

    /// Take-profit limit order (used for the OCO take-profit leg)
    pub fn take_profit_limit(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
        working_type: WorkingType,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: OrderKind::TakeProfitLimit {
                stop_price,
                limit_price,
                working_type,
            },
            quantity,
            reduce_only: false,
        }
    }

    /// Builder-style setter for the reduce-only flag
    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }
}

/// Exchange order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    /// Synthesized locally for dry runs; never returned by the exchange
    Simulated,
}

impl OrderStatus {
    /// Whether this status is terminal (the order will never change again)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::Simulated => "SIMULATED",
        };
        write!(f, "{}", s)
    }
}

/// An order as the exchange reports it; read-only to the strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Exchange-assigned order id
    pub order_id: u64,
    /// Trading pair symbol
    pub symbol: String,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Quantity filled so far
    pub executed_qty: Decimal,
    /// Volume-weighted average fill price (zero until something fills)
    pub avg_price: Decimal,
    /// Order side
    pub side: Side,
    /// Exchange order type string (e.g. MARKET, LIMIT, STOP)
    pub order_type: String,
}

impl OrderRecord {
    /// Whether the order has filled its full quantity
    pub fn is_fully_filled(&self, quantity: Decimal) -> bool {
        self.status == OrderStatus::Filled
            || (self.status == OrderStatus::PartiallyFilled && self.executed_qty >= quantity)
    }
}

/// Per-symbol trading filters fetched from the exchange
///
/// Cached for the duration of one strategy invocation; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRules {
    /// Trading pair symbol
    pub symbol: String,
    /// Minimum price increment
    pub tick_size: Decimal,
    /// Minimum quantity increment
    pub step_size: Decimal,
    /// Minimum order quantity
    pub min_qty: Decimal,
    /// Minimum order notional (quantity x price)
    pub min_notional: Decimal,
}
