//! HTTP tests for the ctrader API router
//!
//! Each test binds the router on an ephemeral port and talks to it with a
//! plain reqwest client.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use ctrader_api::{create_router, AppState, TickerHub};
use ctrader_core::{Campaign, DataPoint, TickerEvent};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(state);

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    addr
}

fn sample_event(price: f64, millis: i64) -> TickerEvent {
    TickerEvent {
        product: "BTC-EUR".into(),
        price,
        side: "sell".into(),
        time: Utc.timestamp_millis_opt(millis).unwrap(),
        size: 0.00371192,
    }
}

fn campaign_body(provider: &str, product_id: &str) -> serde_json::Value {
    json!({
        "provider": provider,
        "product_id": product_id,
        "volume": 0.5,
        "buy_limit": 13000.0,
        "sell_limit": 2.5,
        "sell_limit_unit": "%"
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let addr = spawn_server(AppState::new()).await;

    let body = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "OK");
}

// =============================================================================
// Campaigns
// =============================================================================

#[tokio::test]
async fn test_create_and_get_campaign() {
    let addr = spawn_server(AppState::new()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/api/v1/campaigns", addr))
        .json(&campaign_body("gdax", "BTC-EUR"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let created: Campaign = response.json().await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.state.as_str(), "buy");
    assert!(created.created_at.is_some());
    assert!(created.updated_at.is_none());

    let fetched: Campaign = client
        .get(format!("http://{}/api/v1/campaigns/1", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_list_campaigns_with_filters() {
    let addr = spawn_server(AppState::new()).await;
    let client = reqwest::Client::new();

    for (provider, product) in [("gdax", "BTC-EUR"), ("gdax", "ETH-EUR"), ("kraken", "BTC-EUR")] {
        client
            .post(format!("http://{}/api/v1/campaigns", addr))
            .json(&campaign_body(provider, product))
            .send()
            .await
            .unwrap();
    }

    let all: Vec<Campaign> = client
        .get(format!("http://{}/api/v1/campaigns", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let filtered: Vec<Campaign> = client
        .get(format!(
            "http://{}/api/v1/campaigns?provider=gdax&product_id=BTC-EUR",
            addr
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].provider, "gdax");
    assert_eq!(filtered[0].product_id, "BTC-EUR");

    // Repeated values of one property are alternatives
    let either: Vec<Campaign> = client
        .get(format!(
            "http://{}/api/v1/campaigns?provider=gdax&provider=kraken&product_id=BTC-EUR",
            addr
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(either.len(), 2);
}

#[tokio::test]
async fn test_update_keeps_identity() {
    let addr = spawn_server(AppState::new()).await;
    let client = reqwest::Client::new();

    let created: Campaign = client
        .post(format!("http://{}/api/v1/campaigns", addr))
        .json(&campaign_body("gdax", "BTC-EUR"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let mut body = campaign_body("gdax", "BTC-EUR");
    body["volume"] = json!(1.25);
    let updated: Campaign = client
        .put(format!("http://{}/api/v1/campaigns/{}", addr, created.id))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.volume, 1.25);
    assert_eq!(updated.state, created.state);
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn test_missing_campaign_is_not_found() {
    let addr = spawn_server(AppState::new()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/api/v1/campaigns/42", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let response = client
        .delete(format!("http://{}/api/v1/campaigns/42", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_returns_record() {
    let addr = spawn_server(AppState::new()).await;
    let client = reqwest::Client::new();

    client
        .post(format!("http://{}/api/v1/campaigns", addr))
        .json(&campaign_body("gdax", "BTC-EUR"))
        .send()
        .await
        .unwrap();

    let deleted: Campaign = client
        .delete(format!("http://{}/api/v1/campaigns/1", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted.id, 1);

    let response = client
        .get(format!("http://{}/api/v1/campaigns/1", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

// =============================================================================
// Timeseries events
// =============================================================================

#[tokio::test]
async fn test_invalid_product_is_rejected() {
    let addr = spawn_server(AppState::new()).await;

    for path in ["gdax/btceur", "gdax/BTC-EUR", "GDAX/btc-eur", "gdax/btc-3ur"] {
        let response = reqwest::get(format!("http://{}/api/v1/timeseries/{}/events", addr, path))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            reqwest::StatusCode::BAD_REQUEST,
            "path {}",
            path
        );
    }
}

#[tokio::test]
async fn test_event_stream_frames() {
    let hub = TickerHub::new();
    let addr = spawn_server(AppState::with_hub(hub.clone())).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/v1/timeseries/gdax/btc-eur/events", addr))
        .header("Last-Event-ID", "1513901000")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let key = TickerHub::key("gdax", "btc-eur");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while hub.subscriber_count(&key) == 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.subscriber_count(&key), 1);

    assert_eq!(hub.publish("gdax", sample_event(13470.1, 1_513_901_364_015)), 1);

    let mut body = String::new();
    let mut chunks = response.bytes_stream();
    tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(chunk) = chunks.next().await {
            body.push_str(&String::from_utf8_lossy(&chunk.unwrap()));
            if body.contains("\"price\"") && body.ends_with("\n\n") {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert!(body.contains("retry: 5000"));
    assert!(body.contains("id: 1513901364\n"));
    assert!(body.contains("data: {\"product\":\"BTC-EUR\",\"price\":13470.1"));
}

#[tokio::test]
async fn test_timeseries_history() {
    let hub = TickerHub::new();
    let addr = spawn_server(AppState::with_hub(hub.clone())).await;

    let response = reqwest::get(format!("http://{}/api/v1/timeseries/gdax/btc-eur", addr))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    hub.publish("gdax", sample_event(13470.1, 1_513_901_364_015));
    hub.publish("gdax", sample_event(13471.5, 1_513_901_365_000));

    let points: Vec<DataPoint> = reqwest::get(format!("http://{}/api/v1/timeseries/gdax/btc-eur", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        points,
        vec![
            DataPoint {
                time: 1_513_901_364,
                value: 13470.1
            },
            DataPoint {
                time: 1_513_901_365,
                value: 13471.5
            },
        ]
    );

    let response = reqwest::get(format!("http://{}/api/v1/timeseries/gdax/BTC-EUR", addr))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
