// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store trait: per-message status and event history.

use async_trait::async_trait;

use crate::error::SmsgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DeliveryReportOutcome, Message, NewMessage, ProcessingClaim};

/// Persistent record of every message and its lifecycle.
///
/// Every status change also appends an event, within the same write.
/// Transitions are fenced: a write whose precondition no longer holds
/// leaves the record untouched.
#[async_trait]
pub trait MessageStore: PluginAdapter {
    /// Creates a message in `QUEUED`. A record that already exists is left alone.
    async fn create_message(&self, message: &NewMessage) -> Result<(), SmsgateError>;

    /// Loads a message and its ordered events.
    async fn get_message(&self, tracking_id: &str) -> Result<Option<Message>, SmsgateError>;

    /// Moves a message into `PROCESSING` from `QUEUED`, `PROCESSING`, or `FAILED`.
    async fn begin_processing(&self, tracking_id: &str) -> Result<ProcessingClaim, SmsgateError>;

    /// Records provider acceptance (`PROCESSING` -> `SENT`).
    ///
    /// Returns `false` when the message was no longer `PROCESSING`.
    async fn mark_sent(
        &self,
        tracking_id: &str,
        provider: &str,
        provider_ref: &str,
    ) -> Result<bool, SmsgateError>;

    /// Records exhaustion of every candidate provider (`PROCESSING` -> `FAILED`).
    ///
    /// Returns `false` when the message was no longer `PROCESSING`.
    async fn mark_failed(&self, tracking_id: &str) -> Result<bool, SmsgateError>;

    /// Appends a free-form event without changing status.
    async fn append_event(&self, tracking_id: &str, event: &str) -> Result<(), SmsgateError>;

    /// Applies a delivery report to the `SENT` message carrying `provider_ref`.
    async fn apply_delivery_report(
        &self,
        provider: &str,
        provider_ref: &str,
        status: &str,
    ) -> Result<DeliveryReportOutcome, SmsgateError>;
}
