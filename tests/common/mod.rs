//! Common test utilities and fixtures

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use binance_futures_bot::config::types::ApiCredentials;
use binance_futures_bot::BinanceRestClient;

/// Create a REST client with test credentials pointed at a mock server
pub fn test_client(base_url: &str) -> BinanceRestClient {
    BinanceRestClient::with_timeout(base_url, Duration::from_secs(5))
        .expect("Failed to create REST client")
        .with_credentials(ApiCredentials::new(
            "test_api_key".to_string(),
            "test_api_secret".to_string(),
        ))
}

/// Mount the public market-data endpoints every strategy flow touches
pub async fn mount_public_endpoints(server: &MockServer, symbol: &str, mark_price: &str) {
    Mock::given(method("GET"))
        .and(path("/fapi/v1/time"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(api_responses::SERVER_TIME, "application/json"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fapi/v1/exchangeInfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(api_responses::EXCHANGE_INFO, "application/json"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": symbol,
            "markPrice": mark_price,
        })))
        .mount(server)
        .await;
}

/// Responds to order placements with sequential ids, echoing the request
///
/// Lets one mock serve a whole ladder or slice sequence while the test
/// asserts on the received requests afterwards.
pub struct SequentialOrderResponder {
    next_id: AtomicU64,
    status: &'static str,
    fill_requested_qty: bool,
}

impl SequentialOrderResponder {
    /// Orders rest as NEW (limit-style placements)
    pub fn resting() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            status: "NEW",
            fill_requested_qty: false,
        }
    }

    /// Orders fill immediately for their full quantity (market-style)
    pub fn filling() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            status: "FILLED",
            fill_requested_qty: true,
        }
    }
}

impl Respond for SequentialOrderResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query: std::collections::HashMap<String, String> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let order_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let executed_qty = if self.fill_requested_qty {
            query.get("quantity").cloned().unwrap_or_default()
        } else {
            "0".to_string()
        };

        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "orderId": order_id,
            "symbol": query.get("symbol").cloned().unwrap_or_default(),
            "status": self.status,
            "side": query.get("side").cloned().unwrap_or_default(),
            "type": query.get("type").cloned().unwrap_or_default(),
            "executedQty": executed_qty,
            "avgPrice": "50000.0",
        }))
    }
}

/// Sample API responses for testing parsing
pub mod api_responses {
    /// Sample server time response
    pub const SERVER_TIME: &str = r#"{"serverTime": 1704067200000}"#;

    /// Sample exchange info response with the filters the bot consumes
    pub const EXCHANGE_INFO: &str = r#"{
        "symbols": [{
            "symbol": "BTCUSDT",
            "pricePrecision": 2,
            "quantityPrecision": 3,
            "filters": [
                {"filterType": "PRICE_FILTER", "tickSize": "0.10", "minPrice": "556.80", "maxPrice": "4529764"},
                {"filterType": "LOT_SIZE", "stepSize": "0.001", "minQty": "0.001", "maxQty": "1000"},
                {"filterType": "MIN_NOTIONAL", "notional": "100"},
                {"filterType": "PERCENT_PRICE", "multiplierUp": "1.0500", "multiplierDown": "0.9500"}
            ]
        }]
    }"#;

    /// Sample new-order response
    pub const ORDER_NEW: &str = r#"{
        "orderId": 123456,
        "symbol": "BTCUSDT",
        "status": "NEW",
        "side": "BUY",
        "type": "LIMIT",
        "executedQty": "0",
        "avgPrice": "0.00000"
    }"#;

    /// Sample canceled-order response
    pub const ORDER_CANCELED: &str = r#"{
        "orderId": 123456,
        "symbol": "BTCUSDT",
        "status": "CANCELED",
        "side": "BUY",
        "type": "LIMIT",
        "executedQty": "0",
        "avgPrice": "0.00000"
    }"#;

    /// Sample exchange rejection body
    pub const ERROR_INSUFFICIENT_MARGIN: &str =
        r#"{"code": -2019, "msg": "Margin is insufficient."}"#;
}
