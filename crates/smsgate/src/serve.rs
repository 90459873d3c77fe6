// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsgate serve`, `smsgate gateway` and `smsgate consume`.
//!
//! Opens the SQLite store (message records, work queue, shared cache), then
//! starts the HTTP gateway, the consumer worker pool, or both, until a
//! shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use smsgate_cache::{spawn_purge_task, MemoryCache};
use smsgate_config::model::{CacheBackend, SmsgateConfig};
use smsgate_core::{ClientAccount, ExpiringCache, PluginAdapter, SmsgateError};
use smsgate_engine::{Consumer, ConsumerSettings, PolicyEngine};
use smsgate_gateway::{ClientDirectory, GatewayState, HealthState, IngressGate, WebhookAuth};
use smsgate_prometheus::PrometheusAdapter;
use smsgate_providers::ProviderRegistry;
use smsgate_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::shutdown;

/// Which halves of the pipeline this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    GatewayOnly,
    ConsumerOnly,
}

impl Mode {
    fn runs_gateway(self) -> bool {
        matches!(self, Self::All | Self::GatewayOnly)
    }

    fn runs_consumer(self) -> bool {
        matches!(self, Self::All | Self::ConsumerOnly)
    }
}

pub async fn run_serve(config: SmsgateConfig, mode: Mode) -> Result<(), SmsgateError> {
    init_tracing(&config.logging.level);
    info!(?mode, version = env!("CARGO_PKG_VERSION"), "starting smsgate");

    let storage = Arc::new(SqliteStorage::open(&config.storage, &config.queue).await?);
    let cancel = shutdown::install_signal_handler();

    let prometheus = if config.prometheus.enabled {
        match PrometheusAdapter::new() {
            Ok(adapter) => Some(Arc::new(adapter)),
            Err(e) => {
                warn!(error = %e, "metrics disabled");
                None
            }
        }
    } else {
        None
    };

    let mut registry = None;
    let consumer_task = if mode.runs_consumer() {
        let providers = Arc::new(ProviderRegistry::from_config(
            &config.providers,
            Duration::from_millis(config.consumer.default_provider_timeout_ms),
        )?);
        if providers.is_empty() {
            warn!("no providers enabled, every message will fail");
        }
        registry = Some(providers.clone());

        let engine = Arc::new(PolicyEngine::new(providers, storage.clone()));
        let consumer = Arc::new(Consumer::new(
            storage.clone(),
            engine,
            ConsumerSettings::from_config(&config.consumer, &config.queue),
        ));
        Some(tokio::spawn(consumer.run(cancel.clone())))
    } else {
        None
    };

    let mut purge_task = None;
    let gateway_result = if mode.runs_gateway() {
        let cache: Arc<dyn ExpiringCache> = match config.cache.backend {
            CacheBackend::Sqlite => storage.clone() as Arc<dyn ExpiringCache>,
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
        };
        info!(cache = cache.name(), "quota and idempotency cache ready");
        purge_task = Some(spawn_purge_task(
            cache.clone(),
            Duration::from_secs(config.cache.purge_interval_secs),
            cancel.clone(),
        ));

        let state = gateway_state(&config, storage.clone(), cache, prometheus.clone());
        let result = smsgate_gateway::start_server(&config.gateway, state, cancel.clone()).await;
        if let Err(ref e) = result {
            error!(error = %e, "gateway failed, shutting down");
            cancel.cancel();
        }
        result
    } else {
        cancel.cancelled().await;
        Ok(())
    };

    shutdown_tasks(consumer_task, purge_task, &cancel).await;

    if let Some(registry) = registry {
        registry.shutdown_all().await;
    }
    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "database checkpoint on shutdown failed");
    }
    log_memory_stats();
    info!("smsgate stopped");

    gateway_result
}

fn gateway_state(
    config: &SmsgateConfig,
    storage: Arc<SqliteStorage>,
    cache: Arc<dyn ExpiringCache>,
    prometheus: Option<Arc<PrometheusAdapter>>,
) -> GatewayState {
    let clients = ClientDirectory::new(config.clients.iter().map(ClientAccount::from));
    if clients.is_empty() {
        warn!("no clients configured, every send request will be rejected");
    }

    let ingress = IngressGate::new(cache, storage.clone(), storage.clone(), &config.ingress);
    let prometheus_render = prometheus.map(|p| {
        Arc::new(move || p.render()) as Arc<dyn Fn() -> String + Send + Sync>
    });

    GatewayState {
        ingress: Arc::new(ingress),
        store: storage,
        clients: Arc::new(clients),
        webhook: WebhookAuth {
            token: config.gateway.webhook_token.clone(),
        },
        health: HealthState::new(prometheus_render),
    }
}

async fn shutdown_tasks(
    consumer: Option<tokio::task::JoinHandle<()>>,
    purge: Option<tokio::task::JoinHandle<()>>,
    cancel: &CancellationToken,
) {
    cancel.cancel();
    if let Some(handle) = consumer
        && let Err(e) = handle.await
    {
        error!(error = %e, "consumer task failed");
    }
    if let Some(handle) = purge
        && let Err(e) = handle.await
    {
        error!(error = %e, "cache purge task failed");
    }
}

#[cfg(not(target_env = "msvc"))]
fn log_memory_stats() {
    let _ = tikv_jemalloc_ctl::epoch::advance();
    let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
    let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
    tracing::debug!(allocated, resident, "final jemalloc stats");
}

#[cfg(target_env = "msvc")]
fn log_memory_stats() {}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smsgate={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_select_components() {
        assert!(Mode::All.runs_gateway() && Mode::All.runs_consumer());
        assert!(Mode::GatewayOnly.runs_gateway() && !Mode::GatewayOnly.runs_consumer());
        assert!(!Mode::ConsumerOnly.runs_gateway() && Mode::ConsumerOnly.runs_consumer());
    }

    #[tokio::test]
    async fn gateway_state_reflects_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = smsgate_config::load_and_validate_str(&format!(
            r#"
[storage]
database_path = "{}"

[gateway]
webhook_token = "hook"

[[clients]]
name = "c1"
api_key = "k1"
daily_quota = 3
"#,
            dir.path().join("serve.db").display()
        ))
        .unwrap();
        let storage = Arc::new(
            SqliteStorage::open(&config.storage, &config.queue)
                .await
                .unwrap(),
        );
        let state = gateway_state(&config, storage.clone(), storage, None);
        assert_eq!(state.clients.len(), 1);
        assert!(state.clients.authenticate("k1").is_some());
        assert_eq!(state.webhook.token.as_deref(), Some("hook"));
        assert!(state.health.prometheus_render.is_none());
    }
}
