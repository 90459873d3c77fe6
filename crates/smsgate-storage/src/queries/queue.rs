// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue operations for crash-safe work item delivery.
//!
//! Status flow: `pending` -> `processing` -> `completed`, with `fail`
//! returning an item to `pending` until its attempt ceiling parks it as
//! `failed`, and `discard` dropping undecodable items. A `processing` item
//! whose lock has lapsed is handed out again.

use rusqlite::{params, OptionalExtension, TransactionBehavior};
use smsgate_core::SmsgateError;

use crate::database::{map_tr_err, Database};
use crate::models::QueueEntry;

/// Enqueue a new item. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
    max_attempts: u32,
) -> Result<i64, SmsgateError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO queue (queue_name, payload, max_attempts) VALUES (?1, ?2, ?3)",
                params![queue_name, payload, max_attempts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Take the oldest available entry from the named queue.
///
/// Available means `pending`, or `processing` with an expired lock. The entry
/// is locked for `lock_timeout_secs`. Returns `None` if nothing is available.
pub async fn dequeue(
    db: &Database,
    queue_name: &str,
    lock_timeout_secs: u64,
) -> Result<Option<QueueEntry>, SmsgateError> {
    let queue_name = queue_name.to_string();
    let lock_modifier = format!("+{lock_timeout_secs} seconds");
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let entry = tx
                .query_row(
                    "SELECT id, queue_name, payload, status, attempts, max_attempts,
                            created_at, updated_at, locked_until
                     FROM queue
                     WHERE queue_name = ?1
                       AND (status = 'pending'
                            OR (status = 'processing'
                                AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))
                     ORDER BY id ASC
                     LIMIT 1",
                    params![queue_name],
                    |row| {
                        Ok(QueueEntry {
                            id: row.get(0)?,
                            queue_name: row.get(1)?,
                            payload: row.get(2)?,
                            status: row.get(3)?,
                            attempts: row.get(4)?,
                            max_attempts: row.get(5)?,
                            created_at: row.get(6)?,
                            updated_at: row.get(7)?,
                            locked_until: row.get(8)?,
                        })
                    },
                )
                .optional()?;

            let Some(entry) = entry else {
                tx.commit()?;
                return Ok(None);
            };

            if entry.status == "processing" {
                tracing::warn!(id = entry.id, queue = %entry.queue_name, "reclaiming queue item with lapsed lock");
            }

            let locked_until: String = tx.query_row(
                "UPDATE queue SET status = 'processing',
                 locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1
                 RETURNING locked_until",
                params![entry.id, lock_modifier],
                |row| row.get(0),
            )?;
            tx.commit()?;

            Ok(Some(QueueEntry {
                status: "processing".to_string(),
                locked_until: Some(locked_until),
                ..entry
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Acknowledge successful processing. Marks the entry `completed`.
pub async fn ack(db: &Database, id: i64) -> Result<(), SmsgateError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Return an entry for another attempt.
///
/// Increments attempts. If attempts reach max_attempts the entry is parked as
/// `failed`; otherwise it goes back to `pending` with its lock cleared.
/// Returns `true` when the entry was requeued.
pub async fn fail(db: &Database, id: i64) -> Result<bool, SmsgateError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let (attempts, max_attempts): (u32, u32) = tx.query_row(
                "SELECT attempts, max_attempts FROM queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            let requeued = new_attempts < max_attempts;
            tx.execute(
                "UPDATE queue SET status = ?1, attempts = ?2, locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![if requeued { "pending" } else { "failed" }, new_attempts, id],
            )?;
            tx.commit()?;
            Ok(requeued)
        })
        .await
        .map_err(map_tr_err)
}

/// Drop an entry that can never be processed. Marks it `discarded`.
pub async fn discard(db: &Database, id: i64) -> Result<(), SmsgateError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE queue SET status = 'discarded', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of entries waiting in the named queue.
pub async fn pending_count(db: &Database, queue_name: &str) -> Result<i64, SmsgateError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM queue WHERE queue_name = ?1 AND status = 'pending'",
                params![queue_name],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
