// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the smsgate delivery pipeline.

use thiserror::Error;

/// The primary error type used across all smsgate adapter traits and core operations.
///
/// Infrastructure failures carry their underlying source. The request-facing
/// taxonomy (`AuthFailure`, `QuotaExceeded`, `Validation`, `PublishFailure`,
/// `NotFound`) is surfaced synchronously by the ingress gate, while
/// `ProvidersExhausted` is only ever recorded on the message itself.
#[derive(Debug, Error)]
pub enum SmsgateError {
    /// Configuration errors (invalid TOML, missing required fields, bad provider setup).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Work queue errors other than a failed publish (dequeue, ack, nack).
    #[error("queue error: {message}")]
    Queue {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Quota/idempotency cache errors.
    #[error("cache error: {message}")]
    Cache {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A transmission provider rejected the message or could not be reached.
    #[error("provider {provider} failed: {message}")]
    Provider {
        provider: String,
        message: String,
        /// Whether the failure looks transient (408, 429, 5xx, transport).
        /// Logged only; the fallback pass treats every failure the same.
        retryable: bool,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Unknown or inactive API key.
    #[error("invalid api key")]
    AuthFailure,

    /// The client's daily send quota is used up.
    #[error("daily quota of {limit} exceeded")]
    QuotaExceeded { limit: u32 },

    /// Missing required fields or malformed payload.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The work item could not be handed to the queue.
    #[error("failed to publish message: {source}")]
    PublishFailure {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Every candidate provider failed, or none was available.
    #[error("all providers failed")]
    ProvidersExhausted,

    /// Unknown tracking ID or provider reference.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SmsgateError {
    /// Convenience constructor for a provider failure without an underlying source.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            retryable,
            source: None,
        }
    }

    /// Short, stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Storage { .. } => "storage",
            Self::Queue { .. } => "queue",
            Self::Cache { .. } => "cache",
            Self::Provider { .. } => "provider",
            Self::Timeout { .. } => "timeout",
            Self::AuthFailure => "auth_failure",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::Validation(_) => "validation",
            Self::PublishFailure { .. } => "publish_failure",
            Self::ProvidersExhausted => "providers_exhausted",
            Self::NotFound { .. } => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}
