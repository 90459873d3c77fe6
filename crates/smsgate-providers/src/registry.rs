// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named, ordered set of provider adapters.
//!
//! Registration order is the default fallback order used when a work item
//! carries no provider hints.

use std::sync::Arc;
use std::time::Duration;

use smsgate_config::model::{ProviderConfig, ProviderKind};
use smsgate_core::{ProviderAdapter, SmsgateError};
use tracing::info;

use crate::http::HttpProvider;
use crate::simulated::SimulatedProvider;

/// A registered adapter together with its per-send deadline.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub timeout: Duration,
}

impl RegisteredProvider {
    pub fn name(&self) -> &str {
        self.adapter.name()
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration, skipping disabled entries.
    pub fn from_config(
        providers: &[ProviderConfig],
        default_timeout: Duration,
    ) -> Result<Self, SmsgateError> {
        let mut registry = Self::new();
        for config in providers.iter().filter(|p| p.enabled) {
            let timeout = config
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default_timeout);
            let adapter: Arc<dyn ProviderAdapter> = match config.kind {
                ProviderKind::Http => Arc::new(HttpProvider::new(config, timeout)?),
                ProviderKind::Simulated => {
                    Arc::new(SimulatedProvider::new(&config.name, config.fail_always))
                }
            };
            registry.register(adapter, timeout)?;
        }
        info!(providers = ?registry.names(), "provider registry ready");
        Ok(registry)
    }

    /// Append an adapter to the fallback order. Names must be unique.
    pub fn register(
        &mut self,
        adapter: Arc<dyn ProviderAdapter>,
        timeout: Duration,
    ) -> Result<(), SmsgateError> {
        if self.get(adapter.name()).is_some() {
            return Err(SmsgateError::Config(format!(
                "provider `{}` registered twice",
                adapter.name()
            )));
        }
        self.entries.push(RegisteredProvider { adapter, timeout });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredProvider> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Providers in default fallback order.
    pub fn default_order(&self) -> &[RegisteredProvider] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shut down every adapter, logging failures.
    pub async fn shutdown_all(&self) {
        for entry in &self.entries {
            if let Err(e) = entry.adapter.shutdown().await {
                tracing::warn!(provider = entry.name(), error = %e, "provider shutdown failed");
            }
        }
    }
}
