// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process provider that accepts messages without network I/O.
//!
//! Used for local runs and staging: every accepted message gets a fresh
//! UUID reference, and `fail_always` turns it into a provider that always
//! rejects, which is handy for exercising fallback.

use async_trait::async_trait;
use tracing::debug;

use smsgate_core::{
    AdapterType, HealthStatus, OutboundSms, PluginAdapter, ProviderAdapter, ProviderRef,
    SmsgateError,
};

#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    name: String,
    fail_always: bool,
}

impl SimulatedProvider {
    pub fn new(name: impl Into<String>, fail_always: bool) -> Self {
        Self {
            name: name.into(),
            fail_always,
        }
    }
}

#[async_trait]
impl PluginAdapter for SimulatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SmsgateError> {
        if self.fail_always {
            Ok(HealthStatus::Degraded("configured to reject every send".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), SmsgateError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for SimulatedProvider {
    async fn send(&self, sms: &OutboundSms) -> Result<ProviderRef, SmsgateError> {
        if self.fail_always {
            return Err(SmsgateError::provider(&self.name, "simulated rejection", false));
        }
        let reference = uuid::Uuid::new_v4().to_string();
        debug!(provider = %self.name, tracking_id = %sms.tracking_id, %reference, "simulated send");
        Ok(ProviderRef(reference))
    }
}
