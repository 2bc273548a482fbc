//! BinanceFuturesBot Library
//!
//! A Rust library for placing and supervising order strategies
//! (market, limit, stop-limit, OCO, TWAP, grid) on Binance USDT-M Futures.

pub mod binance;
pub mod common;
pub mod config;
pub mod execution;
pub mod strategy;

// Re-export commonly used types
pub use binance::rest::BinanceRestClient;
pub use common::cancel::CancelToken;
pub use common::errors::{BotError, Result};
pub use common::traits::ExchangeGateway;
pub use common::types::{
    OrderKind, OrderRecord, OrderSpec, OrderStatus, PositionSide, PrecisionRules, Side,
    TimeInForce, WorkingType,
};
pub use config::types::AppConfig;
pub use execution::submit::OrderSubmitter;

// Strategy types
pub use strategy::{
    GridManager, GridParams, GridReport, GridState, OcoConfig, OcoMonitor, OcoOutcome, OcoParams,
    OcoReport, TwapParams, TwapReport, TwapScheduler,
};
