//! scenario_match_source_http
//!
//! Invariants (no real network, httpmock only):
//! 1. The proxy transport sends name/tag/region/mode/size as query params.
//! 2. The direct transport puts the key in `Authorization` and the identity
//!    in the path.
//! 3. Batches preserve the provider's newest-first order.
//! 4. 401/403 map to `Auth`, 5xx to a transient `Api`, a body without
//!    `data` to `Decode`.
//! 5. A slow upstream surfaces as `Timeout`, never a hang.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use vlb_source::{HenrikMatchSource, MatchListRequest, MatchSource, ProxyMatchSource, SourceError};

fn req() -> MatchListRequest {
    MatchListRequest {
        name: "SuperLulino".into(),
        tag: "4088".into(),
        region: "eu".into(),
        mode: "custom".into(),
        size: 20,
    }
}

fn body() -> serde_json::Value {
    json!({
        "status": 200,
        "data": [
            { "metadata": { "matchid": "m-3", "mode": "Custom Game" } },
            { "metadata": { "matchid": "m-2", "mode": "Custom Game" } },
            { "metadata": { "matchid": "m-1", "mode": "Custom Game" } }
        ]
    })
}

#[tokio::test]
async fn proxy_forwards_query_params() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/henrik")
                .query_param("name", "SuperLulino")
                .query_param("tag", "4088")
                .query_param("region", "eu")
                .query_param("mode", "custom")
                .query_param("size", "20");
            then.status(200).json_body(body());
        })
        .await;

    let src = ProxyMatchSource::new(server.url("/api/henrik"), Duration::from_secs(5)).unwrap();
    let batch = src.fetch_match_list(&req()).await.unwrap();

    m.assert_async().await;
    let ids: Vec<_> = batch.matches.iter().filter_map(|m| m.match_id()).collect();
    assert_eq!(ids, vec!["m-3", "m-2", "m-1"]);
}

#[tokio::test]
async fn direct_sends_key_header_and_path() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/valorant/v3/matches/eu/SuperLulino/4088")
                .header("authorization", "HDEV-test-key")
                .query_param("mode", "custom");
            then.status(200).json_body(body());
        })
        .await;

    let src = HenrikMatchSource::new_with_base_url(
        "HDEV-test-key".into(),
        server.base_url(),
        Duration::from_secs(5),
    )
    .unwrap();
    let batch = src.fetch_match_list(&req()).await.unwrap();

    m.assert_async().await;
    assert_eq!(batch.len(), 3);
}

#[tokio::test]
async fn forbidden_maps_to_auth() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/henrik");
            then.status(403).json_body(json!({ "error": "invalid key" }));
        })
        .await;

    let src = ProxyMatchSource::new(server.url("/api/henrik"), Duration::from_secs(5)).unwrap();
    let err = src.fetch_match_list(&req()).await.unwrap_err();
    assert_eq!(err, SourceError::Auth("invalid key".into()));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn server_error_is_transient_api_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/henrik");
            then.status(503).body("upstream busy");
        })
        .await;

    let src = ProxyMatchSource::new(server.url("/api/henrik"), Duration::from_secs(5)).unwrap();
    let err = src.fetch_match_list(&req()).await.unwrap_err();
    assert!(matches!(err, SourceError::Api { status: 503, .. }), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn body_without_data_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/henrik");
            then.status(200).json_body(json!({ "status": 200 }));
        })
        .await;

    let src = ProxyMatchSource::new(server.url("/api/henrik"), Duration::from_secs(5)).unwrap();
    let err = src.fetch_match_list(&req()).await.unwrap_err();
    assert!(matches!(err, SourceError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/henrik");
            then.status(200)
                .delay(Duration::from_millis(800))
                .json_body(body());
        })
        .await;

    let src = ProxyMatchSource::new(server.url("/api/henrik"), Duration::from_millis(100)).unwrap();
    let err = src.fetch_match_list(&req()).await.unwrap_err();
    assert!(matches!(err, SourceError::Timeout(_)), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn fetch_raw_passes_body_through() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/valorant/v3/matches/eu/SuperLulino/4088");
            then.status(200).json_body(body());
        })
        .await;

    let src = HenrikMatchSource::new_with_base_url(
        "HDEV-test-key".into(),
        server.base_url(),
        Duration::from_secs(5),
    )
    .unwrap();
    let raw = src.fetch_raw(&req()).await.unwrap();
    assert_eq!(raw, body());
}
