// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsgate status <tracking_id>`: prints a message and its events straight
//! from the local database.

use smsgate_config::model::SmsgateConfig;
use smsgate_core::{Message, MessageStore, SmsgateError};
use smsgate_storage::SqliteStorage;

pub async fn run_status(
    config: &SmsgateConfig,
    tracking_id: &str,
    json: bool,
) -> Result<(), SmsgateError> {
    let storage = SqliteStorage::open(&config.storage, &config.queue).await?;
    let message = storage
        .get_message(tracking_id)
        .await?
        .ok_or_else(|| SmsgateError::NotFound {
            kind: "message",
            id: tracking_id.to_string(),
        })?;

    if json {
        let rendered = serde_json::to_string_pretty(&message)
            .map_err(|e| SmsgateError::Internal(format!("failed to render message: {e}")))?;
        println!("{rendered}");
    } else {
        print!("{}", render_message(&message));
    }
    Ok(())
}

fn render_message(message: &Message) -> String {
    let mut out = String::new();
    out.push_str(&format!("  tracking id:  {}\n", message.tracking_id));
    out.push_str(&format!("  status:       {}\n", message.status));
    if let Some(ref client) = message.client {
        out.push_str(&format!("  client:       {client}\n"));
    }
    out.push_str(&format!("  recipient:    {}\n", message.recipient));
    if let Some(ref provider) = message.provider {
        out.push_str(&format!("  provider:     {provider} ({})\n", message.provider_ref));
    }
    out.push_str(&format!("  created:      {}\n", message.created_at));
    out.push_str(&format!("  updated:      {}\n", message.updated_at));
    out.push_str("  events:\n");
    for event in &message.events {
        out.push_str(&format!("    {}  {}\n", event.created_at, event.event));
    }
    out
}
