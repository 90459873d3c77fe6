// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router tests driven in-process through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use smsgate_cache::MemoryCache;
use smsgate_config::model::IngressConfig;
use smsgate_core::{ClientAccount, MessageStatus, MessageStore, NewMessage};
use smsgate_gateway::{
    build_router, ClientDirectory, GatewayState, HealthState, IngressGate, WebhookAuth,
};
use smsgate_storage::{Database, QueueSettings, SqliteStorage};
use tower::ServiceExt;

struct Fixture {
    router: Router,
    storage: Arc<SqliteStorage>,
    _dir: tempfile::TempDir,
}

async fn fixture(webhook_token: Option<&str>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("gw.db").to_str().unwrap())
        .await
        .unwrap();
    let storage = Arc::new(SqliteStorage::with_database(db, QueueSettings::default()));
    let cache = Arc::new(MemoryCache::new());
    let ingress = IngressGate::new(
        cache,
        storage.clone(),
        storage.clone(),
        &IngressConfig::default(),
    );
    let clients = ClientDirectory::new([
        ClientAccount {
            name: "c1".into(),
            api_key: "key-c1".into(),
            is_active: true,
            daily_quota: 2,
        },
        ClientAccount {
            name: "c2".into(),
            api_key: "key-c2".into(),
            is_active: true,
            daily_quota: 2,
        },
        ClientAccount {
            name: "retired".into(),
            api_key: "key-retired".into(),
            is_active: false,
            daily_quota: 100,
        },
    ]);
    let state = GatewayState {
        ingress: Arc::new(ingress),
        store: storage.clone(),
        clients: Arc::new(clients),
        webhook: WebhookAuth {
            token: webhook_token.map(str::to_string),
        },
        health: HealthState::new(None),
    };
    Fixture {
        router: build_router(state),
        storage,
        _dir: dir,
    }
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn send(api_key: Option<&str>, idempotency: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/send")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    if let Some(key) = idempotency {
        builder = builder.header("Idempotency-Key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn report(provider: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/webhooks/delivery-report/{provider}"))
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("X-Webhook-Token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

const SEND_BODY: &str = r#"{"recipient":"+15550100","text":"hello"}"#;

async fn sent_message(storage: &SqliteStorage, tracking_id: &str, provider_ref: &str) {
    storage
        .create_message(&NewMessage {
            tracking_id: tracking_id.into(),
            client: Some("c1".into()),
            recipient: "+15550100".into(),
            text: "hello".into(),
        })
        .await
        .unwrap();
    storage.begin_processing(tracking_id).await.unwrap();
    assert!(storage.mark_sent(tracking_id, "p1", provider_ref).await.unwrap());
}

#[tokio::test]
async fn health_is_public() {
    let fx = fixture(None).await;
    let (status, body) = call(
        &fx.router,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_secs"].is_u64());
}

#[tokio::test]
async fn metrics_disabled_is_not_found() {
    let fx = fixture(None).await;
    let (status, _) = call(
        &fx.router,
        Request::get("/metrics").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_requires_active_api_key() {
    let fx = fixture(None).await;
    for key in [None, Some("wrong"), Some("key-retired")] {
        let (status, body) = call(&fx.router, send(key, None, SEND_BODY)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["success"], false);
    }
    assert_eq!(fx.storage.queue_depth().await.unwrap(), 0);
}

#[tokio::test]
async fn accepted_send_is_visible_in_status() {
    let fx = fixture(None).await;
    let (status, body) = call(&fx.router, send(Some("key-c1"), None, SEND_BODY)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "accepted");
    let tracking_id = body["tracking_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &fx.router,
        Request::get(format!("/status/{tracking_id}"))
            .header("X-API-Key", "key-c1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let message = json(&body);
    assert_eq!(message["status"], "QUEUED");
    assert_eq!(message["events"][0]["event"], "queued");
    assert_eq!(message["provider_ref"], "");
}

#[tokio::test]
async fn status_is_scoped_to_the_sending_client() {
    let fx = fixture(None).await;
    let (_, body) = call(&fx.router, send(Some("key-c1"), None, SEND_BODY)).await;
    let tracking_id = json(&body)["tracking_id"].as_str().unwrap().to_string();

    let lookup = |key: &'static str| {
        Request::get(format!("/status/{tracking_id}"))
            .header("X-API-Key", key)
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = call(&fx.router, lookup("key-c2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&fx.router, lookup("key-c1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn status_of_unknown_message_is_not_found() {
    let fx = fixture(None).await;
    let (status, body) = call(
        &fx.router,
        Request::get("/status/does-not-exist")
            .header("X-API-Key", "key-c1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["success"], false);
}

#[tokio::test]
async fn quota_and_idempotency_over_http() {
    let fx = fixture(None).await;

    let (first_status, first_body) =
        call(&fx.router, send(Some("key-c1"), Some("k1"), SEND_BODY)).await;
    assert_eq!(first_status, StatusCode::ACCEPTED);

    let (replay_status, replay_body) =
        call(&fx.router, send(Some("key-c1"), Some("k1"), SEND_BODY)).await;
    assert_eq!(replay_status, StatusCode::OK);
    assert_eq!(replay_body, first_body);

    let (status, _) = call(&fx.router, send(Some("key-c1"), None, SEND_BODY)).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = call(&fx.router, send(Some("key-c1"), None, SEND_BODY)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json(&body)["message"], "daily quota of 2 exceeded");

    assert_eq!(fx.storage.queue_depth().await.unwrap(), 2);
}

#[tokio::test]
async fn malformed_send_body_is_bad_request() {
    let fx = fixture(None).await;
    let (status, body) = call(&fx.router, send(Some("key-c1"), None, r#"{"text":5}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
    assert_eq!(fx.storage.queue_depth().await.unwrap(), 0);
}

#[tokio::test]
async fn delivery_report_finalizes_sent_message() {
    let fx = fixture(None).await;
    sent_message(&fx.storage, "t1", "R-1").await;

    let (status, body) = call(
        &fx.router,
        report("p1", None, r#"{"provider_ref":"R-1","status":"delivered"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({"status": "ok"}));

    let message = fx.storage.get_message("t1").await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Delivered);
    assert_eq!(
        message.events.last().map(|e| e.event.as_str()),
        Some("webhook from p1: delivered")
    );

    let (status, _) = call(
        &fx.router,
        report("p1", None, r#"{"provider_ref":"R-1","status":"undeliverable"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let again = fx.storage.get_message("t1").await.unwrap().unwrap();
    assert_eq!(again.status, MessageStatus::Delivered);
    assert_eq!(again.events.len(), message.events.len());
}

#[tokio::test]
async fn non_delivered_report_is_failed_delivery() {
    let fx = fixture(None).await;
    sent_message(&fx.storage, "t1", "R-1").await;

    let (status, _) = call(
        &fx.router,
        report("p1", None, r#"{"provider_ref":"R-1","status":"Delivered"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let message = fx.storage.get_message("t1").await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::FailedDelivery);
}

#[tokio::test]
async fn unknown_reference_is_not_found_and_mutates_nothing() {
    let fx = fixture(None).await;
    sent_message(&fx.storage, "t1", "R-1").await;

    let (status, _) = call(
        &fx.router,
        report("p1", None, r#"{"provider_ref":"R-404","status":"delivered"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let message = fx.storage.get_message("t1").await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Sent);
}

#[tokio::test]
async fn malformed_report_is_bad_request() {
    let fx = fixture(None).await;
    for body in ["nope", r#"{"status":"delivered"}"#, r#"{"provider_ref":"","status":"x"}"#] {
        let (status, _) = call(&fx.router, report("p1", None, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn webhook_token_is_enforced_when_configured() {
    let fx = fixture(Some("hook-secret")).await;
    sent_message(&fx.storage, "t1", "R-1").await;
    let body = r#"{"provider_ref":"R-1","status":"delivered"}"#;

    let (status, _) = call(&fx.router, report("p1", None, body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&fx.router, report("p1", Some("wrong"), body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&fx.router, report("p1", Some("hook-secret"), body)).await;
    assert_eq!(status, StatusCode::OK);
}
