// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider adapter for deterministic testing.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use smsgate_core::{
    AdapterType, HealthStatus, OutboundSms, PluginAdapter, ProviderAdapter, ProviderRef,
    SmsgateError,
};

/// One scripted reaction to a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Accept with this reference.
    Accept(String),
    /// Reject with this message.
    Reject(String),
    /// Never answer; the engine's timeout must fire.
    Hang,
}

/// A provider that pops outcomes from a FIFO script.
///
/// When the script is empty it accepts with `"{name}-ref-{n}"`, where `n`
/// counts every send made so far, unless built with [`MockProvider::failing`].
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<MockOutcome>>,
    sent: Mutex<Vec<OutboundSms>>,
    reject_unscripted: bool,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self::with_script(name, Vec::new())
    }

    pub fn with_script(name: &str, script: Vec<MockOutcome>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::from(script)),
            sent: Mutex::new(Vec::new()),
            reject_unscripted: false,
        }
    }

    /// A provider that rejects every unscripted send.
    pub fn failing(name: &str) -> Self {
        Self {
            reject_unscripted: true,
            ..Self::new(name)
        }
    }

    pub async fn push(&self, outcome: MockOutcome) {
        self.script.lock().await.push_back(outcome);
    }

    /// Every message this provider was asked to send, in order.
    pub async fn sent(&self) -> Vec<OutboundSms> {
        self.sent.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
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
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmsgateError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn send(&self, sms: &OutboundSms) -> Result<ProviderRef, SmsgateError> {
        let n = {
            let mut sent = self.sent.lock().await;
            sent.push(sms.clone());
            sent.len()
        };
        let outcome = self.script.lock().await.pop_front();
        match outcome {
            Some(MockOutcome::Accept(reference)) => Ok(ProviderRef(reference)),
            Some(MockOutcome::Reject(message)) => {
                Err(SmsgateError::provider(&self.name, message, false))
            }
            Some(MockOutcome::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(SmsgateError::provider(&self.name, "hung", false))
            }
            None if self.reject_unscripted => {
                Err(SmsgateError::provider(&self.name, "unavailable", false))
            }
            None => Ok(ProviderRef(format!("{}-ref-{n}", self.name))),
        }
    }
}
