//! Plain endpoint tests against a wiremock upstream.
//!
//! These drive the full stack (router -> LlamaFeed -> UpstreamClient) and
//! check the post-processing and fail-silent contracts of each endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use llama_core::UpstreamConfig;
use llama_feed::LlamaFeed;
use llama_server::{create_router, AppState};

fn upstream_config(server_uri: &str) -> UpstreamConfig {
    UpstreamConfig {
        defi_base: server_uri.to_string(),
        coin_base: format!("{}/coins", server_uri),
        request_timeout_secs: 1,
        ..Default::default()
    }
}

fn router_for(config: &UpstreamConfig) -> Router {
    let feed = LlamaFeed::new(config).unwrap();
    create_router(AppState::new(Arc::new(feed), Duration::from_secs(1)))
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn records(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| json!({ "name": format!("protocol-{i}"), "tvl": i * 1000 }))
            .collect(),
    )
}

const ALL_ENDPOINTS: [&str; 4] = [
    "/api/protocols",
    "/api/protocol/aave",
    "/api/chain/Ethereum",
    "/api/token/coingecko:ethereum",
];

#[tokio::test]
async fn test_protocols_returns_first_20() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/protocols"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records(25)))
        .mount(&upstream)
        .await;

    let (status, body) = get(router_for(&upstream_config(&upstream.uri())), "/api/protocols").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, records(20));
}

#[tokio::test]
async fn test_protocol_returns_chain_tvls() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/protocol/aave"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Aave",
            "tvl": [],
            "currentChainTvls": { "Ethereum": 12.5, "Arbitrum": 3.25, "borrowed": 7.0 }
        })))
        .mount(&upstream)
        .await;

    let (status, body) = get(router_for(&upstream_config(&upstream.uri())), "/api/protocol/aave").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Ethereum": 12.5, "Arbitrum": 3.25, "borrowed": 7.0 }));
}

#[tokio::test]
async fn test_chain_returns_first_30() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/historicalChainTvl/Ethereum"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records(31)))
        .mount(&upstream)
        .await;

    let (status, body) = get(router_for(&upstream_config(&upstream.uri())), "/api/chain/Ethereum").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, records(30));
}

#[tokio::test]
async fn test_token_returns_payload_unmodified() {
    let upstream = MockServer::start().await;
    let payload = json!({
        "coins": {
            "coingecko:ethereum": {
                "price": 3120.5,
                "symbol": "ETH",
                "timestamp": 1_700_000_000u64,
                "confidence": 0.99
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/coins/prices/current/coingecko:ethereum"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .mount(&upstream)
        .await;

    let (status, body) = get(
        router_for(&upstream_config(&upstream.uri())),
        "/api/token/coingecko:ethereum",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, payload);
}

#[tokio::test]
async fn test_connection_error_returns_null_success() {
    let upstream = MockServer::start().await;
    let config = upstream_config(&upstream.uri());
    drop(upstream);

    for uri in ALL_ENDPOINTS {
        let (status, body) = get(router_for(&config), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, Value::Null, "{uri}");
    }
}

#[tokio::test]
async fn test_upstream_timeout_returns_null_success() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(records(5))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&upstream)
        .await;
    let config = upstream_config(&upstream.uri());

    for uri in ALL_ENDPOINTS {
        let (status, body) = get(router_for(&config), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, Value::Null, "{uri}");
    }
}

#[tokio::test]
async fn test_protocol_without_chain_tvls_faults() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/protocol/does-not-exist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": 400,
            "body": "{\"message\":\"Protocol is not in our database\"}"
        })))
        .mount(&upstream)
        .await;

    let (status, body) = get(
        router_for(&upstream_config(&upstream.uri())),
        "/api/protocol/does-not-exist",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("currentChainTvls"));
}

#[tokio::test]
async fn test_protocols_object_payload_faults() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/protocols"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "rate limited" })))
        .mount(&upstream)
        .await;

    let (status, _) = get(router_for(&upstream_config(&upstream.uri())), "/api/protocols").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
