// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingress gate: idempotency, daily quota, and publish for `POST /send`.
//!
//! Side effects happen in a fixed order. The quota counter is bumped before
//! the publish and is not rolled back if the publish fails. The idempotency
//! record is written only after a successful publish, so a caller may retry
//! a failed request with the same key.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smsgate_config::model::IngressConfig;
use smsgate_core::{
    ClientAccount, ExpiringCache, MessageStore, NewMessage, SmsgateError, TrackingId, WorkItem,
    WorkQueue,
};
use smsgate_prometheus::record_ingress;
use tracing::{debug, info, warn};

/// Request body for `POST /send`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub recipient: String,
    pub text: String,
    /// Ordered provider names to try instead of the default order.
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl SendRequest {
    fn validate(&self) -> Result<(), SmsgateError> {
        if self.recipient.trim().is_empty() {
            return Err(SmsgateError::Validation("recipient is required".into()));
        }
        if self.text.is_empty() {
            return Err(SmsgateError::Validation("text is required".into()));
        }
        if self.providers.iter().any(|p| p.trim().is_empty()) {
            return Err(SmsgateError::Validation(
                "provider names must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Body returned for an accepted request, and stored for idempotent replay.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse<'a> {
    pub success: bool,
    pub message: &'a str,
    pub tracking_id: &'a str,
}

/// Outcome of a successful admission. Both variants carry the exact JSON body
/// to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Newly enqueued (`202`).
    Accepted { tracking_id: String, body: String },
    /// Replay of a stored response for the same idempotency key (`200`).
    Replayed { body: String },
}

impl Admission {
    pub fn body(&self) -> &str {
        match self {
            Self::Accepted { body, .. } | Self::Replayed { body } => body,
        }
    }
}

pub fn quota_key(api_key: &str, day: chrono::NaiveDate) -> String {
    format!("quota:{api_key}:{}", day.format("%Y-%m-%d"))
}

pub fn idempotency_key(key: &str) -> String {
    format!("idem:{key}")
}

pub struct IngressGate {
    cache: Arc<dyn ExpiringCache>,
    queue: Arc<dyn WorkQueue>,
    store: Arc<dyn MessageStore>,
    idempotency_ttl: Duration,
    quota_ttl: Duration,
}

impl IngressGate {
    pub fn new(
        cache: Arc<dyn ExpiringCache>,
        queue: Arc<dyn WorkQueue>,
        store: Arc<dyn MessageStore>,
        config: &IngressConfig,
    ) -> Self {
        Self {
            cache,
            queue,
            store,
            idempotency_ttl: Duration::from_secs(config.idempotency_ttl_secs),
            quota_ttl: Duration::from_secs(config.quota_ttl_secs),
        }
    }

    /// Admits one send request from an authenticated client.
    ///
    /// `body` is the raw request body; it is only parsed once the idempotency
    /// lookup has missed.
    pub async fn accept(
        &self,
        client: &ClientAccount,
        idempotency: Option<&str>,
        body: &[u8],
    ) -> Result<Admission, SmsgateError> {
        let idem_key = idempotency.filter(|k| !k.is_empty()).map(idempotency_key);

        if let Some(ref key) = idem_key
            && let Some(stored) = self.cache.get(key).await?
        {
            debug!(client = %client.name, "replaying stored response for idempotency key");
            record_ingress("replayed");
            return Ok(Admission::Replayed { body: stored });
        }

        let request: SendRequest = serde_json::from_slice(body).map_err(|e| {
            record_ingress("invalid");
            SmsgateError::Validation(format!("malformed body: {e}"))
        })?;
        if let Err(e) = request.validate() {
            record_ingress("invalid");
            return Err(e);
        }

        let quota = quota_key(&client.api_key, chrono::Utc::now().date_naive());
        let count = self.cache.increment(&quota, self.quota_ttl).await?;
        if count > i64::from(client.daily_quota) {
            info!(client = %client.name, count, limit = client.daily_quota, "daily quota exceeded");
            record_ingress("quota_exceeded");
            return Err(SmsgateError::QuotaExceeded {
                limit: client.daily_quota,
            });
        }

        let tracking_id = TrackingId::generate().0;
        let item = WorkItem {
            tracking_id: tracking_id.clone(),
            recipient: request.recipient,
            text: request.text,
            providers: request.providers,
            ttl: request.ttl,
        };

        let new_message = NewMessage {
            client: Some(client.name.clone()),
            ..item.to_new_message()
        };
        if let Err(e) = self.store.create_message(&new_message).await {
            warn!(tracking_id = %tracking_id, error = %e, "failed to record queued message");
        }

        let payload = serde_json::to_string(&item)
            .map_err(|e| SmsgateError::Internal(format!("work item serialization: {e}")))?;
        if let Err(e) = self.queue.publish(&payload).await {
            if let Err(note_err) = self.store.append_event(&tracking_id, "enqueue failed").await {
                warn!(tracking_id = %tracking_id, error = %note_err, "failed to append message event");
            }
            record_ingress("publish_failed");
            return Err(match e {
                e @ SmsgateError::PublishFailure { .. } => e,
                other => SmsgateError::PublishFailure {
                    source: Box::new(other),
                },
            });
        }

        let response = serde_json::to_string(&AcceptedResponse {
            success: true,
            message: "accepted",
            tracking_id: &tracking_id,
        })
        .map_err(|e| SmsgateError::Internal(format!("response serialization: {e}")))?;

        if let Some(ref key) = idem_key {
            match self
                .cache
                .set_if_absent(key, &response, self.idempotency_ttl)
                .await
            {
                Ok(None) => {}
                Ok(Some(_)) => debug!(
                    tracking_id = %tracking_id,
                    "concurrent request stored the idempotent response first"
                ),
                Err(e) => warn!(tracking_id = %tracking_id, error = %e, "failed to store idempotent response"),
            }
        }

        info!(tracking_id = %tracking_id, client = %client.name, "message accepted");
        record_ingress("accepted");
        Ok(Admission::Accepted {
            tracking_id,
            body: response,
        })
    }
}
