// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring key-value cache backing quota counters and idempotency records.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SmsgateError;
use crate::traits::adapter::PluginAdapter;

/// Key-value store whose entries expire after a time-to-live.
///
/// Expired entries behave as absent for every operation.
#[async_trait]
pub trait ExpiringCache: PluginAdapter {
    /// Returns the live value for `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, SmsgateError>;

    /// Stores `value` only when `key` holds no live entry.
    ///
    /// Returns the existing value when one was already present.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Option<String>, SmsgateError>;

    /// Atomically increments the integer counter at `key` and returns the new value.
    ///
    /// The expiry is set only when the counter is created, so a counter
    /// lives `ttl` from its first increment.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, SmsgateError>;

    /// Drops expired entries. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, SmsgateError>;
}
