//! Binance-specific message types

use serde::{Deserialize, Serialize};

use crate::common::errors::{BotError, Result};
use crate::common::types::{OrderRecord, OrderStatus, Side};

/// Error body returned by the exchange on rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Server time response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

/// Mark price response from the premium index endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumIndexResponse {
    pub symbol: String,
    #[serde(rename = "markPrice")]
    pub mark_price: String,
}

/// Order response from place/cancel/status endpoints
///
/// Numeric quantities and prices arrive as strings; conversion to
/// `OrderRecord` parses them into decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub symbol: String,
    pub status: OrderStatus,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(rename = "executedQty", default)]
    pub executed_qty: Option<String>,
    #[serde(rename = "avgPrice", default)]
    pub avg_price: Option<String>,
}

impl OrderResponse {
    /// Convert the wire response into the unified OrderRecord type
    pub fn into_record(self) -> Result<OrderRecord> {
        let executed_qty = match self.executed_qty.as_deref() {
            Some(raw) => raw.parse().map_err(|e| {
                BotError::InvalidResponse(format!("Invalid executedQty: {}", e))
            })?,
            None => rust_decimal::Decimal::ZERO,
        };
        let avg_price = match self.avg_price.as_deref() {
            Some(raw) => raw.parse().map_err(|e| {
                BotError::InvalidResponse(format!("Invalid avgPrice: {}", e))
            })?,
            None => rust_decimal::Decimal::ZERO,
        };

        Ok(OrderRecord {
            order_id: self.order_id,
            symbol: self.symbol,
            status: self.status,
            executed_qty,
            avg_price,
            side: self.side,
            order_type: self.order_type,
        })
    }
}

/// Exchange info response carrying per-symbol trading filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

/// Per-symbol section of the exchange info response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// One entry of a symbol's filter list
///
/// Only the fields the bot consumes are modeled; unknown filter types
/// deserialize with all optionals empty and are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolFilter {
    #[serde(rename = "filterType")]
    pub filter_type: String,
    #[serde(rename = "tickSize", default)]
    pub tick_size: Option<String>,
    #[serde(rename = "stepSize", default)]
    pub step_size: Option<String>,
    #[serde(rename = "minQty", default)]
    pub min_qty: Option<String>,
    #[serde(default)]
    pub notional: Option<String>,
}
