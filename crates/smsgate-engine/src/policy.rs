// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider fallback for a single work item.
//!
//! The engine fences the attempt against the stored status, then tries each
//! candidate provider in order under its own deadline. The first acceptance
//! wins; every failure is appended to the message's event log before moving
//! on. Store writes are best-effort: a failed write is logged and the pass
//! continues.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use smsgate_core::{
    MessageStatus, MessageStore, OutboundSms, ProcessingClaim, ProviderRef, SmsgateError, WorkItem,
};
use smsgate_prometheus::{record_delivery, record_provider_attempt, record_provider_latency};
use smsgate_providers::{ProviderRegistry, RegisteredProvider};
use tracing::{debug, info, warn};

/// How a fallback pass over a work item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// A provider accepted the message.
    Sent {
        provider: String,
        provider_ref: String,
    },
    /// Every candidate failed, or there were none.
    Exhausted,
    /// A provider had already accepted this message; nothing was sent.
    AlreadySettled(MessageStatus),
}

enum Candidate<'a> {
    Registered(&'a RegisteredProvider),
    Unknown(&'a str),
}

pub struct PolicyEngine {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn MessageStore>,
}

impl PolicyEngine {
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn MessageStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Runs one fallback pass for `item`.
    pub async fn process(&self, item: &WorkItem) -> DeliveryOutcome {
        let tracking_id = item.tracking_id.as_str();

        if let Some(status) = self.claim(item).await {
            info!(tracking_id, %status, "message already accepted by a provider, skipping");
            record_delivery("duplicate");
            return DeliveryOutcome::AlreadySettled(status);
        }

        let sms = item.outbound();
        for candidate in self.candidates(&item.providers) {
            let entry = match candidate {
                Candidate::Registered(entry) => entry,
                Candidate::Unknown(name) => {
                    warn!(tracking_id, provider = name, "requested provider is not registered");
                    self.note(tracking_id, &format!("provider {name} not registered"))
                        .await;
                    continue;
                }
            };

            match self.attempt(entry, &sms).await {
                Ok(reference) => {
                    let provider = entry.name().to_string();
                    match self
                        .store
                        .mark_sent(tracking_id, &provider, reference.as_str())
                        .await
                    {
                        Ok(true) => {}
                        Ok(false) => warn!(
                            tracking_id,
                            provider = %provider,
                            "message left PROCESSING before the acceptance was recorded"
                        ),
                        Err(e) => warn!(tracking_id, error = %e, "failed to record acceptance"),
                    }
                    info!(tracking_id, provider = %provider, provider_ref = %reference, "message sent");
                    record_delivery("sent");
                    return DeliveryOutcome::Sent {
                        provider,
                        provider_ref: reference.0,
                    };
                }
                Err(e) => {
                    let reason = match &e {
                        SmsgateError::Provider { message, .. } => message.clone(),
                        other => other.to_string(),
                    };
                    warn!(tracking_id, provider = entry.name(), error = %e, "provider attempt failed");
                    self.note(
                        tracking_id,
                        &format!("provider {} failed: {reason}", entry.name()),
                    )
                    .await;
                }
            }
        }

        match self.store.mark_failed(tracking_id).await {
            Ok(true) => {}
            Ok(false) => debug!(tracking_id, "message left PROCESSING before exhaustion was recorded"),
            Err(e) => warn!(tracking_id, error = %e, "failed to record exhaustion"),
        }
        warn!(tracking_id, "{}", SmsgateError::ProvidersExhausted);
        record_delivery("exhausted");
        DeliveryOutcome::Exhausted
    }

    /// Moves the message into PROCESSING.
    ///
    /// Returns the settled status when a provider already accepted it. A
    /// missing record is recreated from the work item first.
    async fn claim(&self, item: &WorkItem) -> Option<MessageStatus> {
        let tracking_id = item.tracking_id.as_str();
        let claim = match self.store.begin_processing(tracking_id).await {
            Ok(ProcessingClaim::Missing) => {
                debug!(tracking_id, "no stored record, recreating from work item");
                if let Err(e) = self.store.create_message(&item.to_new_message()).await {
                    warn!(tracking_id, error = %e, "failed to recreate message record");
                }
                self.store.begin_processing(tracking_id).await
            }
            other => other,
        };

        match claim {
            Ok(ProcessingClaim::AlreadySettled(status)) => Some(status),
            Ok(ProcessingClaim::Claimed) => None,
            Ok(ProcessingClaim::Missing) => {
                warn!(tracking_id, "message record still missing, delivering untracked");
                None
            }
            Err(e) => {
                warn!(tracking_id, error = %e, "failed to claim message, delivering anyway");
                None
            }
        }
    }

    /// Candidate providers in attempt order.
    ///
    /// Hints are tried as given, once each. No hints means the registry's
    /// default order.
    fn candidates<'a>(&'a self, hints: &'a [String]) -> Vec<Candidate<'a>> {
        if hints.is_empty() {
            return self
                .registry
                .default_order()
                .iter()
                .map(Candidate::Registered)
                .collect();
        }

        let mut seen = HashSet::new();
        hints
            .iter()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .map(|name| match self.registry.get(name) {
                Some(entry) => Candidate::Registered(entry),
                None => Candidate::Unknown(name),
            })
            .collect()
    }

    async fn attempt(
        &self,
        entry: &RegisteredProvider,
        sms: &OutboundSms,
    ) -> Result<ProviderRef, SmsgateError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(entry.timeout, entry.adapter.send(sms)).await {
            Ok(Ok(reference)) if reference.as_str().is_empty() => Err(SmsgateError::provider(
                entry.name(),
                "accepted without a message reference",
                false,
            )),
            Ok(result) => result,
            Err(_) => Err(SmsgateError::Timeout {
                duration: entry.timeout,
            }),
        };
        record_provider_latency(entry.name(), started.elapsed().as_secs_f64());
        record_provider_attempt(
            entry.name(),
            if result.is_ok() { "accepted" } else { "failed" },
        );
        result
    }

    async fn note(&self, tracking_id: &str, event: &str) {
        if let Err(e) = self.store.append_event(tracking_id, event).await {
            warn!(tracking_id, error = %e, "failed to append message event");
        }
    }
}
