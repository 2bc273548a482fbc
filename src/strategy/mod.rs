//! Strategy module - supervised order strategies
//!
//! Each strategy turns a user's trading intent into one or more exchange
//! orders and supervises their lifecycle:
//!
//! - [`OcoMonitor`]: paired take-profit / stop-loss exit with client-side
//!   one-cancels-the-other resolution
//! - [`TwapScheduler`]: a parent quantity executed as time-spaced market
//!   order slices
//! - [`GridManager`]: a ladder of alternating buy/sell limit orders across
//!   a price range
//!
//! Strategies never talk to the network directly; everything goes through
//! [`crate::execution::OrderSubmitter`] and the gateway it wraps. Each
//! invocation owns its own plan state exclusively and runs as one sequential
//! flow; the only suspension points are the sleeps between TWAP slices and
//! OCO polls, both of which honor a [`crate::common::cancel::CancelToken`].

pub mod grid;
pub mod oco;
pub mod twap;

pub use grid::{GridManager, GridParams, GridReport, GridState, LevelOutcome, LevelReport};
pub use oco::{OcoConfig, OcoLeg, OcoMonitor, OcoOutcome, OcoParams, OcoReport};
pub use twap::{SliceOutcome, SliceReport, TwapParams, TwapReport, TwapScheduler};
