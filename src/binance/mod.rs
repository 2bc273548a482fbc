//! Binance module - client implementation for the USDT-M Futures API

pub mod auth;
pub mod messages;
pub mod rest;

pub use rest::BinanceRestClient;
