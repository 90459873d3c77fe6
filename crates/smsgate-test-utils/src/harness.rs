// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the gateway router, the SQLite store/queue/cache,
//! the provider registry and the consumer over a temp database. Requests go
//! through the real router in-process; queued work is processed on demand
//! with [`TestHarness::drain`].

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::Router;
use smsgate_config::model::{IngressConfig, QueueConfig, StorageConfig};
use smsgate_core::{ClientAccount, Message, MessageStore, PluginAdapter, SmsgateError};
use smsgate_engine::{Consumer, ConsumerSettings, PolicyEngine};
use smsgate_gateway::{
    build_router, ClientDirectory, GatewayState, HealthState, IngressGate, WebhookAuth,
};
use smsgate_providers::ProviderRegistry;
use smsgate_storage::SqliteStorage;
use tower::ServiceExt;

use crate::mock_provider::MockProvider;

/// Per-send deadline for harness providers.
const PROVIDER_TIMEOUT: Duration = Duration::from_millis(250);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    clients: Vec<ClientAccount>,
    providers: Vec<Arc<MockProvider>>,
    requeue_on_exhaustion: bool,
    max_attempts: u32,
    webhook_token: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            clients: Vec::new(),
            providers: Vec::new(),
            requeue_on_exhaustion: false,
            max_attempts: QueueConfig::default().max_attempts,
            webhook_token: None,
        }
    }

    /// Add an active client.
    pub fn with_client(mut self, name: &str, api_key: &str, daily_quota: u32) -> Self {
        self.clients.push(ClientAccount {
            name: name.to_string(),
            api_key: api_key.to_string(),
            is_active: true,
            daily_quota,
        });
        self
    }

    /// Add a client whose key is configured but disabled.
    pub fn with_inactive_client(mut self, name: &str, api_key: &str) -> Self {
        self.clients.push(ClientAccount {
            name: name.to_string(),
            api_key: api_key.to_string(),
            is_active: false,
            daily_quota: 1,
        });
        self
    }

    /// Register a provider. Registration order is the default fallback order.
    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Requeue items whose fallback pass was exhausted. Off by default so a
    /// single drain settles every item.
    pub fn with_requeue(mut self, requeue: bool, max_attempts: u32) -> Self {
        self.requeue_on_exhaustion = requeue;
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_webhook_token(mut self, token: &str) -> Self {
        self.webhook_token = Some(token.to_string());
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, SmsgateError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| SmsgateError::Storage { source: e.into() })?;
        let storage_config = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };
        let queue_config = QueueConfig {
            max_attempts: self.max_attempts,
            ..QueueConfig::default()
        };
        let storage = Arc::new(SqliteStorage::open(&storage_config, &queue_config).await?);

        let mut registry = ProviderRegistry::new();
        for provider in &self.providers {
            registry.register(provider.clone(), PROVIDER_TIMEOUT)?;
        }
        let engine = Arc::new(PolicyEngine::new(Arc::new(registry), storage.clone()));
        let consumer = Arc::new(Consumer::new(
            storage.clone(),
            engine,
            ConsumerSettings {
                workers: 1,
                poll_interval: Duration::from_millis(10),
                requeue_on_exhaustion: self.requeue_on_exhaustion,
            },
        ));

        let ingress = IngressGate::new(
            storage.clone(),
            storage.clone(),
            storage.clone(),
            &IngressConfig::default(),
        );
        let state = GatewayState {
            ingress: Arc::new(ingress),
            store: storage.clone(),
            clients: Arc::new(ClientDirectory::new(self.clients)),
            webhook: WebhookAuth {
                token: self.webhook_token,
            },
            health: HealthState::new(None),
        };

        Ok(TestHarness {
            router: build_router(state),
            storage,
            consumer,
            providers: self.providers,
            _temp_dir: temp_dir,
        })
    }
}

/// Status and raw body of a response from the router.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    /// `tracking_id` from an accepted send.
    pub fn tracking_id(&self) -> Option<String> {
        self.json()
            .get("tracking_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// A complete pipeline over a temp database.
pub struct TestHarness {
    /// Router with every HTTP route mounted.
    pub router: Router,
    /// Message store, queue, and cache (one SQLite file).
    pub storage: Arc<SqliteStorage>,
    pub consumer: Arc<Consumer>,
    providers: Vec<Arc<MockProvider>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Registered provider by name.
    pub fn provider(&self, name: &str) -> Option<Arc<MockProvider>> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// POST /send with the given headers and JSON body.
    pub async fn send(
        &self,
        api_key: Option<&str>,
        idempotency_key: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<HttpReply, SmsgateError> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/send")
            .header("content-type", "application/json");
        if let Some(key) = api_key {
            builder = builder.header("X-API-Key", key);
        }
        if let Some(key) = idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .map_err(|e| SmsgateError::Internal(e.to_string()))?;
        self.call(request).await
    }

    /// GET /status/{tracking_id}.
    pub async fn status(&self, api_key: &str, tracking_id: &str) -> Result<HttpReply, SmsgateError> {
        let request = Request::builder()
            .method("GET")
            .uri(format!("/status/{tracking_id}"))
            .header("X-API-Key", api_key)
            .body(Body::empty())
            .map_err(|e| SmsgateError::Internal(e.to_string()))?;
        self.call(request).await
    }

    /// POST /webhooks/delivery-report/{provider}.
    pub async fn delivery_report(
        &self,
        provider: &str,
        provider_ref: &str,
        status: &str,
    ) -> Result<HttpReply, SmsgateError> {
        let body = serde_json::json!({ "provider_ref": provider_ref, "status": status });
        self.delivery_report_raw(provider, None, &body.to_string()).await
    }

    /// POST /webhooks/delivery-report/{provider} with a raw body.
    pub async fn delivery_report_raw(
        &self,
        provider: &str,
        token: Option<&str>,
        body: &str,
    ) -> Result<HttpReply, SmsgateError> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/webhooks/delivery-report/{provider}"))
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("X-Webhook-Token", token);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .map_err(|e| SmsgateError::Internal(e.to_string()))?;
        self.call(request).await
    }

    /// Stored message, read directly from the store.
    pub async fn message(&self, tracking_id: &str) -> Result<Option<Message>, SmsgateError> {
        self.storage.get_message(tracking_id).await
    }

    /// Process queued work until the queue is empty.
    pub async fn drain(&self) -> Result<usize, SmsgateError> {
        self.consumer.drain().await
    }

    async fn call(&self, request: Request<Body>) -> Result<HttpReply, SmsgateError> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| SmsgateError::Internal(e.to_string()))?;
        let status = response.status().as_u16();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| SmsgateError::Internal(e.to_string()))?;
        Ok(HttpReply {
            status,
            body: body.to_vec(),
        })
    }
}
