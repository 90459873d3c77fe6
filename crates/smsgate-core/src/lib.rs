// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the smsgate delivery pipeline.
//!
//! This crate provides the trait definitions, error types, and domain types
//! shared by the ingress gate, the work queue, the policy engine, and the
//! provider adapters. Every backend implements traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::SmsgateError;
pub use types::{
    AdapterType, ClientAccount, DeliveryReportOutcome, HealthStatus, Message, MessageEvent,
    MessageStatus, NewMessage, OutboundSms, ProcessingClaim, ProviderRef, QueueDelivery,
    TrackingId, WorkItem,
};

pub use traits::{ExpiringCache, MessageStore, PluginAdapter, ProviderAdapter, WorkQueue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_distinct() {
        let errors = [
            SmsgateError::Config("x".into()),
            SmsgateError::Storage {
                source: Box::new(std::io::Error::other("x")),
            },
            SmsgateError::Queue {
                message: "x".into(),
                source: None,
            },
            SmsgateError::Cache {
                message: "x".into(),
                source: None,
            },
            SmsgateError::provider("p", "x", false),
            SmsgateError::Timeout {
                duration: std::time::Duration::from_secs(1),
            },
            SmsgateError::AuthFailure,
            SmsgateError::QuotaExceeded { limit: 1 },
            SmsgateError::Validation("x".into()),
            SmsgateError::PublishFailure {
                source: Box::new(std::io::Error::other("x")),
            },
            SmsgateError::ProvidersExhausted,
            SmsgateError::NotFound {
                kind: "message",
                id: "x".into(),
            },
            SmsgateError::Internal("x".into()),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn provider_error_display_names_provider() {
        let err = SmsgateError::provider("magfa", "HTTP 503", true);
        assert_eq!(err.to_string(), "provider magfa failed: HTTP 503");
    }

    #[test]
    fn auth_failure_message() {
        assert_eq!(SmsgateError::AuthFailure.to_string(), "invalid api key");
    }

    #[test]
    fn adapter_type_round_trips_through_str() {
        use std::str::FromStr;
        for t in [
            AdapterType::Provider,
            AdapterType::Storage,
            AdapterType::Queue,
            AdapterType::Cache,
            AdapterType::Observability,
        ] {
            assert_eq!(AdapterType::from_str(&t.to_string()).unwrap(), t);
        }
    }
}
