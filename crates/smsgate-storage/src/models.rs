// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for tables that have no counterpart in `smsgate-core`.

use std::str::FromStr;

use smsgate_core::MessageStatus;

/// A row of the `queue` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// Read a `MessageStatus` stored as text in column `idx`.
pub(crate) fn status_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<MessageStatus> {
    let raw: String = row.get(idx)?;
    MessageStatus::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
