// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the gateway.
//!
//! - `X-API-Key` identifies an active client for `/send`.
//! - `X-Webhook-Token` guards delivery reports when a token is configured.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use smsgate_core::{ClientAccount, SmsgateError};

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const WEBHOOK_TOKEN_HEADER: &str = "x-webhook-token";

/// Immutable lookup of configured clients by API key, built once at startup.
#[derive(Clone, Default)]
pub struct ClientDirectory {
    by_key: HashMap<String, ClientAccount>,
}

impl ClientDirectory {
    pub fn new(clients: impl IntoIterator<Item = ClientAccount>) -> Self {
        Self {
            by_key: clients
                .into_iter()
                .map(|c| (c.api_key.clone(), c))
                .collect(),
        }
    }

    /// Returns the client for `api_key` if it exists and is active.
    pub fn authenticate(&self, api_key: &str) -> Option<&ClientAccount> {
        self.by_key.get(api_key).filter(|c| c.is_active)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl std::fmt::Debug for ClientDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.by_key.values().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("ClientDirectory")
            .field("clients", &names)
            .finish()
    }
}

/// Shared secret for delivery reports. `None` accepts every report.
#[derive(Clone, Default)]
pub struct WebhookAuth {
    pub token: Option<String>,
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAuth")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Resolves `X-API-Key` to an active [`ClientAccount`] and stores it as a
/// request extension. Unknown or inactive keys get `401`.
pub async fn api_key_auth(
    State(clients): State<Arc<ClientDirectory>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|key| clients.authenticate(key))
        .cloned();

    match client {
        Some(client) => {
            request.extensions_mut().insert(client);
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("rejected request with missing or unknown api key");
            smsgate_prometheus::record_ingress("unauthorized");
            Err(ApiError(SmsgateError::AuthFailure))
        }
    }
}

/// Checks `X-Webhook-Token` when a token is configured.
pub async fn webhook_auth(
    State(auth): State<WebhookAuth>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(ref expected) = auth.token {
        let presented = request
            .headers()
            .get(WEBHOOK_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            tracing::warn!("rejected delivery report with bad webhook token");
            return Err(ApiError(SmsgateError::AuthFailure));
        }
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(name: &str, key: &str, active: bool) -> ClientAccount {
        ClientAccount {
            name: name.into(),
            api_key: key.into(),
            is_active: active,
            daily_quota: 10,
        }
    }

    #[test]
    fn directory_only_authenticates_active_clients() {
        let dir = ClientDirectory::new([client("c1", "k-1", true), client("c2", "k-2", false)]);
        assert_eq!(dir.authenticate("k-1").map(|c| c.name.as_str()), Some("c1"));
        assert!(dir.authenticate("k-2").is_none());
        assert!(dir.authenticate("nope").is_none());
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn debug_output_hides_keys() {
        let dir = ClientDirectory::new([client("c1", "very-secret", true)]);
        let debug = format!("{dir:?}");
        assert!(debug.contains("c1"));
        assert!(!debug.contains("very-secret"));

        let auth = WebhookAuth {
            token: Some("hook-secret".into()),
        };
        assert!(!format!("{auth:?}").contains("hook-secret"));
    }
}
