//! Integration tests for the Binance Futures REST client
//!
//! These tests run the client against a local wiremock server and verify
//! request shape (signing, headers, parameters) and response mapping into
//! the error taxonomy. No real exchange is contacted.

mod common;

use rust_decimal_macros::dec;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use binance_futures_bot::common::errors::BotError;
use binance_futures_bot::common::traits::ExchangeGateway;
use binance_futures_bot::common::types::{OrderSpec, OrderStatus, Side, TimeInForce};

use common::{api_responses, test_client};

#[tokio::test]
async fn test_server_time_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/time"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(api_responses::SERVER_TIME, "application/json"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let time = client.server_time().await.unwrap();
    assert_eq!(time, 1704067200000);
}

#[tokio::test]
async fn test_mark_price_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "BTCUSDT",
            "markPrice": "50123.45000000",
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let price = client.mark_price("btcusdt").await.unwrap();
    assert_eq!(price, dec!(50123.45));
}

#[tokio::test]
async fn test_symbol_filters_extracted_from_exchange_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/exchangeInfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(api_responses::EXCHANGE_INFO, "application/json"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let rules = client.symbol_filters("BTCUSDT").await.unwrap();

    assert_eq!(rules.symbol, "BTCUSDT");
    assert_eq!(rules.tick_size, dec!(0.10));
    assert_eq!(rules.step_size, dec!(0.001));
    assert_eq!(rules.min_qty, dec!(0.001));
    assert_eq!(rules.min_notional, dec!(100));
}

#[tokio::test]
async fn test_place_order_is_signed_and_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(header("X-MBX-APIKEY", "test_api_key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(api_responses::ORDER_NEW, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let spec = OrderSpec::limit(
        "BTCUSDT",
        Side::Buy,
        dec!(0.01),
        dec!(50000),
        TimeInForce::Gtc,
    );
    let record = client.place_order(&spec).await.unwrap();
    assert_eq!(record.order_id, 123456);
    assert_eq!(record.status, OrderStatus::New);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.contains("symbol=BTCUSDT"));
    assert!(query.contains("side=BUY"));
    assert!(query.contains("type=LIMIT"));
    assert!(query.contains("price=50000"));
    assert!(query.contains("timeInForce=GTC"));
    assert!(query.contains("timestamp="));
    assert!(query.contains("signature="));
}

#[tokio::test]
async fn test_rejection_surfaces_exchange_code_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_raw(api_responses::ERROR_INSUFFICIENT_MARGIN, "application/json"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let spec = OrderSpec::market("BTCUSDT", Side::Buy, dec!(100));
    let err = client.place_order(&spec).await.unwrap_err();

    match err {
        BotError::OrderRejected { code, reason } => {
            assert_eq!(code, -2019);
            assert_eq!(reason, "Margin is insufficient.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_classified_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let spec = OrderSpec::market("BTCUSDT", Side::Buy, dec!(0.01));
    let err = client.place_order(&spec).await.unwrap_err();
    assert!(err.is_transient(), "expected transient, got {:?}", err);
}

#[tokio::test]
async fn test_rate_limit_classified_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/order"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_raw(r#"{"code": -1003, "msg": "Too many requests."}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.order_status("BTCUSDT", 1).await.unwrap_err();
    assert!(err.is_transient(), "expected transient, got {:?}", err);
}

#[tokio::test]
async fn test_cancel_order_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/fapi/v1/order"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("orderId", "123456"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(api_responses::ORDER_CANCELED, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = client.cancel_order("BTCUSDT", 123456).await.unwrap();
    assert_eq!(record.status, OrderStatus::Canceled);
}

#[tokio::test]
async fn test_open_orders_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/openOrders"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "orderId": 11,
                "symbol": "BTCUSDT",
                "status": "NEW",
                "side": "BUY",
                "type": "LIMIT",
                "executedQty": "0",
                "avgPrice": "0"
            },
            {
                "orderId": 12,
                "symbol": "BTCUSDT",
                "status": "PARTIALLY_FILLED",
                "side": "SELL",
                "type": "LIMIT",
                "executedQty": "0.005",
                "avgPrice": "51000.0"
            }
        ])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let orders = client.open_orders("BTCUSDT").await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].status, OrderStatus::PartiallyFilled);
    assert_eq!(orders[1].executed_qty, dec!(0.005));
}

#[tokio::test]
async fn test_signed_request_without_credentials_fails_locally() {
    let server = MockServer::start().await;

    let client = binance_futures_bot::BinanceRestClient::new(&server.uri()).unwrap();
    let spec = OrderSpec::market("BTCUSDT", Side::Buy, dec!(0.01));
    let err = client.place_order(&spec).await.unwrap_err();
    assert!(matches!(err, BotError::Configuration(_)));

    // Nothing must have reached the wire
    assert!(server.received_requests().await.unwrap().is_empty());
}
