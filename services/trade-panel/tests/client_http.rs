//! HTTP client tests against a wiremock server

use rust_decimal::Decimal;
use serde_json::json;
use std::time::Duration;
use trade_panel::client::OrderKind;
use trade_panel::{
    ApiError, BalanceSource, Instrument, TradeApi, TradeOrder, TradeSide, TradingApiClient,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WIF: &str = "EKpQGSJtjMFqKZ9KQbSqL2zPQCpA5xZKN2CjeJRdQpump";

fn client(server: &MockServer) -> TradingApiClient {
    TradingApiClient::new(&format!("{}/api/v1/", server.uri()), Duration::from_secs(5))
        .unwrap()
        .with_token(Some("session-token".to_string()))
}

async fn mount_balances(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/trade/amount"))
        .and(query_param("address", WIF))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sol_balance": 2.5,
            "token_balance": "1234.5"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/token/sol-price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "priceUSD": 148.2 })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/token/info"))
        .and(query_param("address", WIF))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "WIF",
            "address": WIF,
            "decimals": 6,
            "price": 0.31
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_balance_source_assembles_snapshot() {
    let server = MockServer::start().await;
    mount_balances(&server).await;

    let api = client(&server);
    let (snapshot, instrument) = tokio_test::assert_ok!(BalanceSource::load(&api, WIF).await);

    assert_eq!(snapshot.native_balance, Decimal::from_str_exact("2.5").unwrap());
    assert_eq!(snapshot.token_balance, Decimal::from_str_exact("1234.5").unwrap());
    assert_eq!(snapshot.native_to_fiat_rate, Decimal::from_str_exact("148.2").unwrap());
    assert_eq!(snapshot.token_price, Decimal::from_str_exact("0.31").unwrap());
    assert_eq!(snapshot.token_decimals, 6);
    assert_eq!(
        instrument,
        Instrument {
            symbol: "WIF".to_string(),
            address: WIF.to_string(),
        }
    );
}

#[tokio::test]
async fn test_create_trade_posts_order_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/trade/orders"))
        .and(header("authorization", "Bearer session-token"))
        .and(body_partial_json(json!({
            "order_trade_type": "buy",
            "order_type": "market",
            "order_token_name": "WIF",
            "order_token_address": WIF,
            "order_price": 225.0,
            "order_qlty": 1.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let order = TradeOrder::market(
        TradeSide::Buy,
        Instrument {
            symbol: "WIF".to_string(),
            address: WIF.to_string(),
        },
        Decimal::from_str_exact("1.5").unwrap(),
        Decimal::from(150),
    )
    .unwrap();
    assert_eq!(order.order_kind, OrderKind::Market);

    let resp = client(&server).create_trade(&order).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.message, None);
}

#[tokio::test]
async fn test_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/trade/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let order = TradeOrder::market(
        TradeSide::Sell,
        Instrument {
            symbol: "WIF".to_string(),
            address: WIF.to_string(),
        },
        Decimal::from(10),
        Decimal::from_str_exact("0.31").unwrap(),
    )
    .unwrap();

    match client(&server).create_trade(&order).await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/token/sol-price"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_native_price().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}
