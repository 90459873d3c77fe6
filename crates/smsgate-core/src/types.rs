// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the ingress gate, the queue consumer, and the storage layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque identifier assigned to a message at ingress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(pub String);

impl TrackingId {
    /// Generates a fresh random (v4 UUID) tracking id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference string returned by a provider when it accepts a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderRef(pub String);

impl ProviderRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Queue,
    Cache,
    Observability,
}

/// Lifecycle status of a single message.
///
/// ```text
/// QUEUED -> PROCESSING -> SENT -> DELIVERED
///                 |         \---> FAILED_DELIVERY
///                 \-> FAILED -> PROCESSING (redelivery)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Queued,
    Processing,
    Sent,
    Delivered,
    FailedDelivery,
    Failed,
}

impl MessageStatus {
    /// Statuses from which a delivery attempt may (re)start.
    pub fn accepts_attempt(self) -> bool {
        matches!(self, Self::Queued | Self::Processing | Self::Failed)
    }

    /// Whether a provider has already accepted the message.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Sent | Self::Delivered | Self::FailedDelivery)
    }

    /// Whether a delivery report has already been applied.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::FailedDelivery)
    }

    /// Maps a provider-reported delivery status onto the lifecycle.
    ///
    /// Only the exact string `"delivered"` counts as delivered; every other
    /// value is a delivery failure.
    pub fn from_delivery_report(status: &str) -> Self {
        if status == "delivered" {
            Self::Delivered
        } else {
            Self::FailedDelivery
        }
    }
}

/// One entry in a message's append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub event: String,
    pub created_at: String,
}

/// A message record as stored, together with its event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub tracking_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub recipient: String,
    pub text: String,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Empty until a provider accepts the message.
    pub provider_ref: String,
    pub created_at: String,
    pub updated_at: String,
    pub events: Vec<MessageEvent>,
}

/// Fields needed to create a message record in the `QUEUED` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub tracking_id: String,
    pub client: Option<String>,
    pub recipient: String,
    pub text: String,
}

/// The payload carried by the work queue from the ingress gate to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub tracking_id: String,
    pub recipient: String,
    pub text: String,
    /// Ordered provider names to try. Empty means the registry default order.
    #[serde(default)]
    pub providers: Vec<String>,
    /// Validity window in seconds. Carried through, not enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl WorkItem {
    /// The record to recreate when the consumer finds no stored message.
    pub fn to_new_message(&self) -> NewMessage {
        NewMessage {
            tracking_id: self.tracking_id.clone(),
            client: None,
            recipient: self.recipient.clone(),
            text: self.text.clone(),
        }
    }

    pub fn outbound(&self) -> OutboundSms {
        OutboundSms {
            tracking_id: self.tracking_id.clone(),
            recipient: self.recipient.clone(),
            text: self.text.clone(),
        }
    }
}

/// What a provider adapter is asked to transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSms {
    pub tracking_id: String,
    pub recipient: String,
    pub text: String,
}

/// An API client allowed to submit messages.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientAccount {
    pub name: String,
    pub api_key: String,
    pub is_active: bool,
    pub daily_quota: u32,
}

impl std::fmt::Debug for ClientAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientAccount")
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("daily_quota", &self.daily_quota)
            .finish()
    }
}

/// A work item handed out by the queue, pending ack or nack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDelivery {
    pub id: i64,
    pub payload: String,
    /// Number of previous requeues of this item.
    pub attempts: u32,
}

/// Result of trying to move a message into `PROCESSING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingClaim {
    /// The message is now `PROCESSING`.
    Claimed,
    /// A provider already accepted the message; no attempt should be made.
    AlreadySettled(MessageStatus),
    /// No record exists for the tracking id.
    Missing,
}

/// Result of applying a delivery report to the message store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReportOutcome {
    /// The report moved the message into the given final status.
    Applied { tracking_id: String, status: MessageStatus },
    /// The message already carries a final status; nothing changed.
    AlreadyFinal { tracking_id: String, status: MessageStatus },
    /// No `SENT` message carries the reported reference.
    NotFound,
}
