//! Trait definitions for exchange connectivity

use async_trait::async_trait;
use rust_decimal::Decimal;

#[cfg(test)]
use mockall::automock;

use super::errors::Result;
use super::types::{OrderRecord, OrderSpec, PrecisionRules};

/// Trait for the exchange order gateway
///
/// This is the only seam that touches the network. Strategy components are
/// generic over it so they can run against the live REST client or a mock.
/// Implementations handle authentication and transport; callers own retry
/// policy for order placement (see `execution::submit`).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Submit an order and return the exchange's view of it
    async fn place_order(&self, spec: &OrderSpec) -> Result<OrderRecord>;

    /// Cancel an open order by id
    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderRecord>;

    /// Query the current state of an order
    async fn order_status(&self, symbol: &str, order_id: u64) -> Result<OrderRecord>;

    /// Fetch tick/step/minimum filters for a symbol
    async fn symbol_filters(&self, symbol: &str) -> Result<PrecisionRules>;

    /// Current mark price for a symbol
    async fn mark_price(&self, symbol: &str) -> Result<Decimal>;

    /// All open orders for a symbol
    async fn open_orders(&self, symbol: &str) -> Result<Vec<OrderRecord>>;

    /// Exchange server time in milliseconds; used as a connectivity check
    async fn server_time(&self) -> Result<i64>;
}
