//! Single point of contact between strategies and the exchange gateway

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::precision::adjust_spec;
use super::validate::validate_spec;
use crate::common::errors::Result;
use crate::common::traits::ExchangeGateway;
use crate::common::types::{OrderRecord, OrderSpec, PrecisionRules};

/// Retries after the initial attempt for transient failures
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (1s, 2s, 4s)
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Submits orders on behalf of all strategies
///
/// Every order passes through precision adjustment and validation before it
/// reaches the gateway. Transient failures (timeouts, 5xx, rate limits) are
/// retried with exponential backoff; exchange rejections are surfaced
/// immediately with the exchange's reason.
pub struct OrderSubmitter<G> {
    gateway: G,
    /// Symbol filters cached for the lifetime of this submitter, which is
    /// one strategy invocation
    rules_cache: Mutex<HashMap<String, PrecisionRules>>,
}

impl<G: ExchangeGateway> OrderSubmitter<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            rules_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Access the underlying gateway for non-order calls (status, cancel)
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Precision rules for a symbol, fetched once and cached
    pub async fn rules_for(&self, symbol: &str) -> Result<PrecisionRules> {
        let key = symbol.to_uppercase();
        let mut cache = self.rules_cache.lock().await;
        if let Some(rules) = cache.get(&key) {
            return Ok(rules.clone());
        }
        let rules = self.gateway.symbol_filters(&key).await?;
        cache.insert(key, rules.clone());
        Ok(rules)
    }

    /// Current mark price, or None when the exchange cannot provide one
    ///
    /// Price-relationship validation degrades gracefully without it, matching
    /// the tolerance for market-data hiccups during order entry.
    pub async fn reference_price(&self, symbol: &str) -> Option<Decimal> {
        match self.gateway.mark_price(symbol).await {
            Ok(price) => {
                info!("Current {} price: {}", symbol, price);
                Some(price)
            }
            Err(e) => {
                warn!("Could not fetch current price for {}: {}", symbol, e);
                None
            }
        }
    }

    /// Adjust and validate a spec without submitting it
    ///
    /// Used by dry runs, and by `submit` as its first step.
    pub async fn prepare(&self, spec: &OrderSpec) -> Result<OrderSpec> {
        let rules = self.rules_for(&spec.symbol).await?;
        let adjusted = adjust_spec(spec, &rules)?;
        let reference = self.reference_price(&spec.symbol).await;
        validate_spec(&adjusted, &rules, reference)?;
        Ok(adjusted)
    }

    /// Adjust, validate, and place an order
    pub async fn submit(&self, spec: &OrderSpec) -> Result<OrderRecord> {
        let adjusted = self.prepare(spec).await?;
        self.place_with_retry(&adjusted).await
    }

    /// Place an already-prepared order, retrying transient failures
    pub async fn place_with_retry(&self, spec: &OrderSpec) -> Result<OrderRecord> {
        let mut attempt = 0;
        loop {
            match self.gateway.place_order(spec).await {
                Ok(record) => {
                    info!(
                        "Order placed: {} {} {} -> id {} status {}",
                        spec.symbol, spec.side, spec.quantity, record.order_id, record.status
                    );
                    return Ok(record);
                }
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    let delay = BACKOFF_BASE * 2u32.pow(attempt);
                    attempt += 1;
                    warn!(
                        "Transient failure placing order (attempt {}/{}), retrying in {:?}: {}",
                        attempt, MAX_RETRIES, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
