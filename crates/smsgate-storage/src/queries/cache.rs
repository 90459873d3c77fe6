// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring key-value entries for quota counters and idempotency records.
//!
//! Expiry is stored as unix milliseconds. Reads filter on it, so an expired
//! row is invisible even before [`purge_expired`] removes it.

use std::time::Duration;

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use smsgate_core::SmsgateError;

use crate::database::{map_tr_err, Database};

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn ttl_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Live value for `key`.
pub async fn get(db: &Database, key: &str) -> Result<Option<String>, SmsgateError> {
    let key = key.to_string();
    let now = now_ms();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert `value` unless a live entry exists. Returns the live entry if one did.
pub async fn set_if_absent(
    db: &Database,
    key: &str,
    value: &str,
    ttl: Duration,
) -> Result<Option<String>, SmsgateError> {
    let key = key.to_string();
    let value = value.to_string();
    let now = now_ms();
    let expires_at = now.saturating_add(ttl_ms(ttl));
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2",
                params![key, now],
            )?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)",
                params![key, value, expires_at],
            )? > 0;
            let existing = if inserted {
                None
            } else {
                Some(tx.query_row(
                    "SELECT value FROM cache_entries WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )?)
            };
            tx.commit()?;
            Ok(existing)
        })
        .await
        .map_err(map_tr_err)
}

/// Increment the counter at `key`, creating it at 1 with a fresh expiry.
pub async fn increment(db: &Database, key: &str, ttl: Duration) -> Result<i64, SmsgateError> {
    let key = key.to_string();
    let now = now_ms();
    let expires_at = now.saturating_add(ttl_ms(ttl));
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2",
                params![key, now],
            )?;
            let count: i64 = tx.query_row(
                "INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, '1', ?2)
                 ON CONFLICT(key) DO UPDATE
                   SET value = CAST(CAST(value AS INTEGER) + 1 AS TEXT)
                 RETURNING CAST(value AS INTEGER)",
                params![key, expires_at],
                |row| row.get(0),
            )?;
            tx.commit()?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every expired entry. Returns how many rows were removed.
pub async fn purge_expired(db: &Database) -> Result<u64, SmsgateError> {
    let now = now_ms();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM cache_entries WHERE expires_at <= ?1",
                params![now],
            )?;
            Ok(removed as u64)
        })
        .await
        .map_err(map_tr_err)
}
