// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the smsgate delivery pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smsgate_core::ClientAccount;

/// Top-level smsgate configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmsgateConfig {
    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP listener settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// SQLite database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Work queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Quota and idempotency cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Ingress gate expiry windows.
    #[serde(default)]
    pub ingress: IngressConfig,

    /// Queue consumer settings.
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Prometheus metrics export.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// API clients allowed to submit messages.
    #[serde(default)]
    pub clients: Vec<ClientConfig>,

    /// Transmission providers, in default fallback order.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret providers must send in `X-Webhook-Token` with delivery
    /// reports. Reports are unauthenticated when unset.
    #[serde(default)]
    pub webhook_token: Option<String>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "webhook_token",
                &self.webhook_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("smsgate").join("smsgate.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("smsgate.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Work queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Logical queue name shared by the gateway and the consumer.
    #[serde(default = "default_queue_name")]
    pub name: String,

    /// Deliveries an item gets before it is parked as failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds an unacknowledged item stays invisible before redelivery.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    /// Idle wait between polls of an empty queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            max_attempts: default_max_attempts(),
            lock_timeout_secs: default_lock_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_queue_name() -> String {
    "sms_queue".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lock_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Which store backs quota counters and idempotency records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Shared SQLite table; counters are visible to every process on the database.
    Sqlite,
    /// Process-local map; only suitable for a single gateway instance.
    Memory,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,

    /// How often expired entries are swept.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Sqlite
}

fn default_purge_interval_secs() -> u64 {
    600
}

/// Ingress expiry windows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngressConfig {
    /// Lifetime of a stored idempotent response.
    #[serde(default = "default_day_secs")]
    pub idempotency_ttl_secs: u64,

    /// Lifetime of a daily quota counter, from its first increment.
    #[serde(default = "default_day_secs")]
    pub quota_ttl_secs: u64,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_secs: default_day_secs(),
            quota_ttl_secs: default_day_secs(),
        }
    }
}

fn default_day_secs() -> u64 {
    86_400
}

/// Queue consumer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerConfig {
    /// Number of concurrent queue workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Give exhausted items back to the queue for another fallback pass.
    #[serde(default = "default_requeue_on_exhaustion")]
    pub requeue_on_exhaustion: bool,

    /// Per-send timeout for providers that do not set their own.
    #[serde(default = "default_provider_timeout_ms")]
    pub default_provider_timeout_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            requeue_on_exhaustion: default_requeue_on_exhaustion(),
            default_provider_timeout_ms: default_provider_timeout_ms(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_requeue_on_exhaustion() -> bool {
    true
}

fn default_provider_timeout_ms() -> u64 {
    10_000
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Serve `/metrics` in Prometheus text format.
    #[serde(default = "default_prometheus_enabled")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: default_prometheus_enabled(),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    true
}

/// One API client entry.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub name: String,

    pub api_key: String,

    #[serde(default = "default_is_active")]
    pub is_active: bool,

    /// Maximum accepted sends per UTC day.
    pub daily_quota: u32,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("daily_quota", &self.daily_quota)
            .finish()
    }
}

impl From<&ClientConfig> for ClientAccount {
    fn from(c: &ClientConfig) -> Self {
        ClientAccount {
            name: c.name.clone(),
            api_key: c.api_key.clone(),
            is_active: c.is_active,
            daily_quota: c.daily_quota,
        }
    }
}

fn default_is_active() -> bool {
    true
}

/// Provider implementation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Generic JSON-over-HTTP SMS API.
    Http,
    /// In-process stand-in that accepts (or rejects) without network I/O.
    Simulated,
}

/// How an HTTP provider authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderAuth {
    #[default]
    None,
    /// HTTP basic auth from `username` / `password`.
    Basic,
    /// `api_key` sent in the `api_key_header` header.
    ApiKey,
    /// `api_key` sent as a bearer token.
    Bearer,
}

/// One transmission provider entry.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Name used in provider hints and recorded on sent messages.
    pub name: String,

    pub kind: ProviderKind,

    #[serde(default = "default_provider_enabled")]
    pub enabled: bool,

    /// Per-send timeout; falls back to `consumer.default_provider_timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,

    #[serde(default)]
    pub auth: ProviderAuth,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Sender number or line passed to the provider.
    #[serde(default)]
    pub sender: Option<String>,

    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    /// Simulated providers only: reject every send.
    #[serde(default)]
    pub fail_always: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .field("timeout_ms", &self.timeout_ms)
            .field("base_url", &self.base_url)
            .field("endpoint_path", &self.endpoint_path)
            .field("auth", &self.auth)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("sender", &self.sender)
            .field("fail_always", &self.fail_always)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// A simulated provider entry with default settings.
    pub fn simulated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProviderKind::Simulated,
            enabled: true,
            timeout_ms: None,
            base_url: None,
            endpoint_path: default_endpoint_path(),
            auth: ProviderAuth::None,
            username: None,
            password: None,
            api_key: None,
            api_key_header: default_api_key_header(),
            sender: None,
            extra_headers: BTreeMap::new(),
            fail_always: false,
        }
    }
}

fn default_provider_enabled() -> bool {
    true
}

fn default_endpoint_path() -> String {
    "/api/send".to_string()
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}
