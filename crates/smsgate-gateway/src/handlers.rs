// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles POST /send, GET /status/{tracking_id},
//! POST /webhooks/delivery-report/{provider}, GET /health, GET /metrics.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use smsgate_core::{ClientAccount, Message, SmsgateError};

use crate::delivery;
use crate::error::ApiError;
use crate::ingress::Admission;
use crate::server::{GatewayState, HealthState};

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// POST /send
///
/// The response body is returned as stored so idempotent replays are
/// byte-identical to the original.
pub async fn post_send(
    State(state): State<GatewayState>,
    Extension(client): Extension<ClientAccount>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let idempotency = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok());

    let admission = state.ingress.accept(&client, idempotency, &body).await?;
    let status = match admission {
        Admission::Accepted { .. } => StatusCode::ACCEPTED,
        Admission::Replayed { .. } => StatusCode::OK,
    };
    let body = match admission {
        Admission::Accepted { body, .. } | Admission::Replayed { body } => body,
    };
    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// GET /status/{tracking_id}
///
/// A message owned by another client is reported as not found. Records
/// without an owner are readable by any authenticated client.
pub async fn get_status(
    State(state): State<GatewayState>,
    Extension(client): Extension<ClientAccount>,
    Path(tracking_id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    match state.store.get_message(&tracking_id).await? {
        Some(message) if message.client.as_ref().is_none_or(|owner| *owner == client.name) => {
            Ok(Json(message))
        }
        _ => Err(ApiError(SmsgateError::NotFound {
            kind: "message",
            id: tracking_id,
        })),
    }
}

/// POST /webhooks/delivery-report/{provider}
pub async fn post_delivery_report(
    State(state): State<GatewayState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    delivery::apply_report(state.store.as_ref(), &provider, &body).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// GET /health
pub async fn get_health(State(health): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text exposition, or `404` when metrics are disabled.
pub async fn get_metrics(State(health): State<HealthState>) -> Response {
    match health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
