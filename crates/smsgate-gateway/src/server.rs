// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use smsgate_config::model::GatewayConfig;
use smsgate_core::{MessageStore, SmsgateError};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{api_key_auth, webhook_auth, ClientDirectory, WebhookAuth};
use crate::handlers;
use crate::ingress::IngressGate;

/// Health state for unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub ingress: Arc<IngressGate>,
    /// Read side for status lookups and delivery reports.
    pub store: Arc<dyn MessageStore>,
    pub clients: Arc<ClientDirectory>,
    pub webhook: WebhookAuth,
    pub health: HealthState,
}

impl FromRef<GatewayState> for HealthState {
    fn from_ref(state: &GatewayState) -> Self {
        state.health.clone()
    }
}

/// Builds the full router.
///
/// - `GET /health`, `GET /metrics`: public
/// - `POST /send`: `X-API-Key`
/// - `GET /status/{tracking_id}`: `X-API-Key`
/// - `POST /webhooks/delivery-report/{provider}`: `X-Webhook-Token` when configured
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/send", post(handlers::post_send))
        .route("/status/{tracking_id}", get(handlers::get_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clients.clone(),
            api_key_auth,
        ))
        .with_state(state.clone());

    let webhook_routes = Router::new()
        .route(
            "/webhooks/delivery-report/{provider}",
            post(handlers::post_delivery_report),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.webhook.clone(),
            webhook_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `cancel` fires, then drains in-flight
/// requests.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), SmsgateError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SmsgateError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| SmsgateError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
