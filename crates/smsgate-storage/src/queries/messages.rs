// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record and event log operations.
//!
//! Every status change runs in an immediate transaction that checks the
//! current status, writes the new one, and appends the matching event.

use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use smsgate_core::{
    DeliveryReportOutcome, Message, MessageEvent, MessageStatus, NewMessage, ProcessingClaim,
    SmsgateError,
};

use crate::database::{map_tr_err, Database};
use crate::models::status_column;

fn push_event(tx: &Transaction<'_>, tracking_id: &str, event: &str) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO message_events (tracking_id, event) VALUES (?1, ?2)",
        params![tracking_id, event],
    )?;
    Ok(())
}

fn current_status(tx: &Transaction<'_>, tracking_id: &str) -> rusqlite::Result<Option<MessageStatus>> {
    tx.query_row(
        "SELECT status FROM messages WHERE tracking_id = ?1",
        params![tracking_id],
        |row| status_column(row, 0),
    )
    .optional()
}

fn set_status(tx: &Transaction<'_>, tracking_id: &str, status: MessageStatus) -> rusqlite::Result<()> {
    tx.execute(
        "UPDATE messages SET status = ?1,
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE tracking_id = ?2",
        params![status.to_string(), tracking_id],
    )?;
    Ok(())
}

/// Insert a message in `QUEUED` with a `queued` event.
///
/// Returns `false` when a record with the same tracking id already existed.
pub async fn insert_message(db: &Database, message: &NewMessage) -> Result<bool, SmsgateError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO messages (tracking_id, client_name, recipient, text, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.tracking_id,
                    message.client,
                    message.recipient,
                    message.text,
                    MessageStatus::Queued.to_string(),
                ],
            )? > 0;
            if inserted {
                push_event(&tx, &message.tracking_id, "queued")?;
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

/// Load a message with its events in insertion order.
pub async fn get_message(db: &Database, tracking_id: &str) -> Result<Option<Message>, SmsgateError> {
    let tracking_id = tracking_id.to_string();
    db.connection()
        .call(move |conn| {
            let message = conn
                .query_row(
                    "SELECT tracking_id, client_name, recipient, text, status, provider,
                            provider_ref, created_at, updated_at
                     FROM messages WHERE tracking_id = ?1",
                    params![tracking_id],
                    |row| {
                        Ok(Message {
                            tracking_id: row.get(0)?,
                            client: row.get(1)?,
                            recipient: row.get(2)?,
                            text: row.get(3)?,
                            status: status_column(row, 4)?,
                            provider: row.get(5)?,
                            provider_ref: row.get(6)?,
                            created_at: row.get(7)?,
                            updated_at: row.get(8)?,
                            events: Vec::new(),
                        })
                    },
                )
                .optional()?;

            let Some(mut message) = message else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT event, created_at FROM message_events
                 WHERE tracking_id = ?1 ORDER BY id ASC",
            )?;
            message.events = stmt
                .query_map(params![tracking_id], |row| {
                    Ok(MessageEvent {
                        event: row.get(0)?,
                        created_at: row.get(1)?,
                    })
                })?
                .collect::<Result<_, _>>()?;
            Ok(Some(message))
        })
        .await
        .map_err(map_tr_err)
}

/// Move a message into `PROCESSING` if no provider has accepted it yet.
pub async fn claim_for_processing(
    db: &Database,
    tracking_id: &str,
) -> Result<ProcessingClaim, SmsgateError> {
    let tracking_id = tracking_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let claim = match current_status(&tx, &tracking_id)? {
                None => ProcessingClaim::Missing,
                Some(status) if status.accepts_attempt() => {
                    set_status(&tx, &tracking_id, MessageStatus::Processing)?;
                    push_event(&tx, &tracking_id, "processing")?;
                    ProcessingClaim::Claimed
                }
                Some(status) => ProcessingClaim::AlreadySettled(status),
            };
            tx.commit()?;
            Ok(claim)
        })
        .await
        .map_err(map_tr_err)
}

/// `PROCESSING` -> `SENT`, recording the accepting provider and its reference.
pub async fn mark_sent(
    db: &Database,
    tracking_id: &str,
    provider: &str,
    provider_ref: &str,
) -> Result<bool, SmsgateError> {
    let tracking_id = tracking_id.to_string();
    let provider = provider.to_string();
    let provider_ref = provider_ref.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE messages SET status = ?1, provider = ?2, provider_ref = ?3,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE tracking_id = ?4 AND status = ?5",
                params![
                    MessageStatus::Sent.to_string(),
                    provider,
                    provider_ref,
                    tracking_id,
                    MessageStatus::Processing.to_string(),
                ],
            )? > 0;
            if changed {
                push_event(&tx, &tracking_id, &format!("sent via {provider}"))?;
            }
            tx.commit()?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// `PROCESSING` -> `FAILED` after every candidate provider failed.
pub async fn mark_failed(db: &Database, tracking_id: &str) -> Result<bool, SmsgateError> {
    let tracking_id = tracking_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = current_status(&tx, &tracking_id)? == Some(MessageStatus::Processing);
            if changed {
                set_status(&tx, &tracking_id, MessageStatus::Failed)?;
                push_event(&tx, &tracking_id, "all providers failed")?;
            }
            tx.commit()?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Append an event to an existing message. Unknown tracking ids are ignored.
pub async fn append_event(db: &Database, tracking_id: &str, event: &str) -> Result<(), SmsgateError> {
    let tracking_id = tracking_id.to_string();
    let event = event.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_events (tracking_id, event)
                 SELECT tracking_id, ?2 FROM messages WHERE tracking_id = ?1",
                params![tracking_id, event],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a delivery report from `provider` to the message it sent as `provider_ref`.
///
/// References are only unique per provider. When several of that provider's
/// messages share the reference, the one still awaiting a report wins.
pub async fn apply_delivery_report(
    db: &Database,
    provider: &str,
    provider_ref: &str,
    reported_status: &str,
) -> Result<DeliveryReportOutcome, SmsgateError> {
    if provider_ref.is_empty() {
        return Ok(DeliveryReportOutcome::NotFound);
    }
    let provider = provider.to_string();
    let provider_ref = provider_ref.to_string();
    let reported_status = reported_status.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let found = tx
                .query_row(
                    "SELECT tracking_id, status FROM messages
                     WHERE provider = ?1 AND provider_ref = ?2
                     ORDER BY (status = ?3) DESC, updated_at DESC LIMIT 1",
                    params![provider, provider_ref, MessageStatus::Sent.to_string()],
                    |row| Ok((row.get::<_, String>(0)?, status_column(row, 1)?)),
                )
                .optional()?;

            let outcome = match found {
                Some((tracking_id, MessageStatus::Sent)) => {
                    let status = MessageStatus::from_delivery_report(&reported_status);
                    set_status(&tx, &tracking_id, status)?;
                    push_event(
                        &tx,
                        &tracking_id,
                        &format!("webhook from {provider}: {reported_status}"),
                    )?;
                    DeliveryReportOutcome::Applied {
                        tracking_id,
                        status,
                    }
                }
                Some((tracking_id, status)) if status.is_final() => {
                    DeliveryReportOutcome::AlreadyFinal {
                        tracking_id,
                        status,
                    }
                }
                _ => DeliveryReportOutcome::NotFound,
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}
