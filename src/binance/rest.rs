//! REST API client for Binance USDT-M Futures

use async_trait::async_trait;
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::auth::{encode_params, request_timestamp, sign_query};
use super::messages::*;
use crate::common::errors::{BotError, Result};
use crate::common::traits::ExchangeGateway;
use crate::common::types::{OrderKind, OrderRecord, OrderSpec, PrecisionRules};
use crate::config::types::ApiCredentials;

/// REST API client for the Binance Futures order endpoints
#[derive(Debug, Clone)]
pub struct BinanceRestClient {
    /// HTTP client
    client: Client,
    /// Base URL for the futures API
    base_url: String,
    /// Optional API credentials for signed endpoints
    credentials: Option<ApiCredentials>,
}

impl BinanceRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Set API credentials for signed requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Send an unsigned request
    async fn public_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let query = encode_params(params);
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        };
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// Send a signed request with timestamp and HMAC signature appended
    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        mut params: Vec<(&str, String)>,
    ) -> Result<T> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            BotError::Configuration("API credentials required for signed request".to_string())
        })?;

        params.push(("timestamp", request_timestamp().to_string()));
        let query = encode_params(&params);
        let signature = sign_query(&credentials.api_secret, &query)?;
        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, endpoint, query, signature
        );
        debug!("{} {}", method, endpoint);

        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Map an HTTP response into a parsed body or the error taxonomy
    ///
    /// Rate limits (429/418) and 5xx map to the retryable class; other
    /// non-success statuses carry an exchange error body whose code and
    /// message are surfaced verbatim.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 || status.as_u16() == 418 || status.is_server_error() {
            return Err(BotError::Transient(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => Err(BotError::OrderRejected {
                code: err.code,
                reason: err.msg,
            }),
            Err(_) => Err(BotError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            ))),
        }
    }

    // ========================================================================
    // Order Endpoints (Signed)
    // ========================================================================

    /// Submit an order built from the given spec
    #[instrument(skip(self), fields(symbol = %spec.symbol))]
    pub async fn submit_order(&self, spec: &OrderSpec) -> Result<OrderRecord> {
        let params = Self::order_params(spec);
        info!("Placing order: {}", encode_params(&params));

        let response: OrderResponse = self
            .signed_request(Method::POST, "/fapi/v1/order", params)
            .await?;
        info!(
            "Order placed: id {} status {}",
            response.order_id, response.status
        );

        response.into_record()
    }

    /// Cancel an order by id
    #[instrument(skip(self))]
    pub async fn cancel(&self, symbol: &str, order_id: u64) -> Result<OrderRecord> {
        let params = vec![
            ("symbol", symbol.to_uppercase()),
            ("orderId", order_id.to_string()),
        ];

        let response: OrderResponse = self
            .signed_request(Method::DELETE, "/fapi/v1/order", params)
            .await?;
        info!("Order {} cancelled", order_id);

        response.into_record()
    }

    /// Query the current state of an order
    #[instrument(skip(self))]
    pub async fn query_order(&self, symbol: &str, order_id: u64) -> Result<OrderRecord> {
        let params = vec![
            ("symbol", symbol.to_uppercase()),
            ("orderId", order_id.to_string()),
        ];

        let response: OrderResponse = self
            .signed_request(Method::GET, "/fapi/v1/order", params)
            .await?;
        debug!("Order {} status: {}", order_id, response.status);

        response.into_record()
    }

    /// List all open orders for a symbol
    #[instrument(skip(self))]
    pub async fn query_open_orders(&self, symbol: &str) -> Result<Vec<OrderRecord>> {
        let params = vec![("symbol", symbol.to_uppercase())];

        let responses: Vec<OrderResponse> = self
            .signed_request(Method::GET, "/fapi/v1/openOrders", params)
            .await?;

        responses.into_iter().map(|r| r.into_record()).collect()
    }

    // ========================================================================
    // Market Data Endpoints (Public)
    // ========================================================================

    /// Exchange server time in milliseconds
    #[instrument(skip(self))]
    pub async fn get_server_time(&self) -> Result<i64> {
        let response: ServerTimeResponse = self.public_request("/fapi/v1/time", &[]).await?;
        Ok(response.server_time)
    }

    /// Current mark price for a symbol
    #[instrument(skip(self))]
    pub async fn get_mark_price(&self, symbol: &str) -> Result<Decimal> {
        let params = [("symbol", symbol.to_uppercase())];
        let response: PremiumIndexResponse = self
            .public_request("/fapi/v1/premiumIndex", &params)
            .await?;

        response
            .mark_price
            .parse()
            .map_err(|e| BotError::InvalidResponse(format!("Invalid mark price: {}", e)))
    }

    /// Fetch tick/step/minimum filters for a symbol
    #[instrument(skip(self))]
    pub async fn get_symbol_filters(&self, symbol: &str) -> Result<PrecisionRules> {
        let symbol = symbol.to_uppercase();
        let params = [("symbol", symbol.clone())];
        let info: ExchangeInfoResponse = self
            .public_request("/fapi/v1/exchangeInfo", &params)
            .await?;

        let symbol_info = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| BotError::InvalidResponse(format!("Symbol {} not found", symbol)))?;

        Self::rules_from_filters(symbol, &symbol_info.filters)
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Build the wire parameters for an order spec
    ///
    /// Parameter order is fixed so the signed query string is deterministic.
    fn order_params(spec: &OrderSpec) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", spec.symbol.to_uppercase()),
            ("side", spec.side.to_string()),
            ("type", spec.kind.wire_name().to_string()),
            ("quantity", spec.quantity.to_string()),
        ];

        match &spec.kind {
            OrderKind::Market => {}
            OrderKind::Limit {
                price,
                time_in_force,
            } => {
                params.push(("price", price.to_string()));
                params.push(("timeInForce", time_in_force.to_string()));
            }
            OrderKind::StopLimit {
                stop_price,
                limit_price,
                working_type,
            }
            | OrderKind::TakeProfitLimit {
                stop_price,
                limit_price,
                working_type,
            } => {
                params.push(("price", limit_price.to_string()));
                params.push(("stopPrice", stop_price.to_string()));
                params.push(("timeInForce", "GTC".to_string()));
                params.push(("workingType", working_type.to_string()));
            }
        }

        if spec.reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }

        params
    }

    /// Extract precision rules from a symbol's filter list
    fn rules_from_filters(symbol: String, filters: &[SymbolFilter]) -> Result<PrecisionRules> {
        let parse = |raw: &str, what: &str| -> Result<Decimal> {
            raw.parse()
                .map_err(|e| BotError::InvalidResponse(format!("Invalid {}: {}", what, e)))
        };

        let mut rules = PrecisionRules {
            symbol,
            tick_size: Decimal::new(1, 2),
            step_size: Decimal::new(1, 3),
            min_qty: Decimal::ZERO,
            min_notional: Decimal::ZERO,
        };

        for filter in filters {
            match filter.filter_type.as_str() {
                "PRICE_FILTER" => {
                    if let Some(raw) = &filter.tick_size {
                        rules.tick_size = parse(raw, "tickSize")?;
                    }
                }
                "LOT_SIZE" => {
                    if let Some(raw) = &filter.step_size {
                        rules.step_size = parse(raw, "stepSize")?;
                    }
                    if let Some(raw) = &filter.min_qty {
                        rules.min_qty = parse(raw, "minQty")?;
                    }
                }
                "MIN_NOTIONAL" => {
                    if let Some(raw) = &filter.notional {
                        rules.min_notional = parse(raw, "notional")?;
                    }
                }
                _ => {}
            }
        }

        Ok(rules)
    }
}

#[async_trait]
impl ExchangeGateway for BinanceRestClient {
    async fn place_order(&self, spec: &OrderSpec) -> Result<OrderRecord> {
        self.submit_order(spec).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderRecord> {
        self.cancel(symbol, order_id).await
    }

    async fn order_status(&self, symbol: &str, order_id: u64) -> Result<OrderRecord> {
        self.query_order(symbol, order_id).await
    }

    async fn symbol_filters(&self, symbol: &str) -> Result<PrecisionRules> {
        self.get_symbol_filters(symbol).await
    }

    async fn mark_price(&self, symbol: &str) -> Result<Decimal> {
        self.get_mark_price(symbol).await
    }

    async fn open_orders(&self, symbol: &str) -> Result<Vec<OrderRecord>> {
        self.query_open_orders(symbol).await
    }

    async fn server_time(&self) -> Result<i64> {
        self.get_server_time().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Side, TimeInForce, WorkingType};
    use rust_decimal_macros::dec;

    #[test]
    fn test_client_creation() {
        let client = BinanceRestClient::new("https://testnet.binancefuture.com");
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_normalization() {
        let client = BinanceRestClient::new("https://testnet.binancefuture.com/").unwrap();
        assert!(!client.base_url.ends_with('/'));
    }

    #[test]
    fn test_market_order_params() {
        let spec = OrderSpec::market("btcusdt", Side::Buy, dec!(0.01)).with_reduce_only(true);
        let params = BinanceRestClient::order_params(&spec);
        assert_eq!(
            encode_params(&params),
            "symbol=BTCUSDT&side=BUY&type=MARKET&quantity=0.01&reduceOnly=true"
        );
    }

    #[test]
    fn test_limit_order_params() {
        let spec = OrderSpec::limit(
            "BTCUSDT",
            Side::Buy,
            dec!(0.01),
            dec!(50000.0),
            TimeInForce::Ioc,
        );
        let params = BinanceRestClient::order_params(&spec);
        assert_eq!(
            encode_params(&params),
            "symbol=BTCUSDT&side=BUY&type=LIMIT&quantity=0.01&price=50000.0&timeInForce=IOC"
        );
    }

    #[test]
    fn test_stop_limit_order_params() {
        let spec = OrderSpec::stop_limit(
            "BTCUSDT",
            Side::Sell,
            dec!(0.01),
            dec!(48000),
            dec!(47900),
            WorkingType::MarkPrice,
        );
        let params = BinanceRestClient::order_params(&spec);
        let encoded = encode_params(&params);
        assert!(encoded.contains("type=STOP"));
        assert!(encoded.contains("price=47900"));
        assert!(encoded.contains("stopPrice=48000"));
        assert!(encoded.contains("workingType=MARK_PRICE"));
    }

    #[test]
    fn test_take_profit_order_params_use_take_profit_type() {
        let spec = OrderSpec::take_profit_limit(
            "BTCUSDT",
            Side::Sell,
            dec!(0.01),
            dec!(52000),
            dec!(52000),
            WorkingType::ContractPrice,
        )
        .with_reduce_only(true);
        let params = BinanceRestClient::order_params(&spec);
        let encoded = encode_params(&params);
        assert!(encoded.contains("type=TAKE_PROFIT"));
        assert!(encoded.contains("reduceOnly=true"));
    }

    #[test]
    fn test_rules_from_filters_defaults_when_missing() {
        let rules = BinanceRestClient::rules_from_filters("BTCUSDT".to_string(), &[]).unwrap();
        assert_eq!(rules.tick_size, dec!(0.01));
        assert_eq!(rules.step_size, dec!(0.001));
        assert_eq!(rules.min_qty, dec!(0));
    }
}
