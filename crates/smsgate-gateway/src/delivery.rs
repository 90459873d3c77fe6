// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-report webhook: finalizes `SENT` messages.

use serde::Deserialize;
use smsgate_core::{DeliveryReportOutcome, MessageStore, SmsgateError};
use smsgate_prometheus::record_delivery_report;
use tracing::{debug, info};

/// Request body for `POST /webhooks/delivery-report/{provider}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryReport {
    pub provider_ref: String,
    pub status: String,
}

/// Applies a raw delivery-report body posted by `provider`.
///
/// Reports for messages already in a final delivery state succeed without
/// changing anything. Unknown references, or references whose message is not
/// `SENT`, are `NotFound`.
pub async fn apply_report(
    store: &dyn MessageStore,
    provider: &str,
    body: &[u8],
) -> Result<DeliveryReportOutcome, SmsgateError> {
    let report: DeliveryReport = serde_json::from_slice(body)
        .map_err(|e| SmsgateError::Validation(format!("malformed delivery report: {e}")))?;
    if report.provider_ref.is_empty() {
        return Err(SmsgateError::Validation("provider_ref is required".into()));
    }

    let outcome = store
        .apply_delivery_report(provider, &report.provider_ref, &report.status)
        .await?;

    match &outcome {
        DeliveryReportOutcome::Applied {
            tracking_id,
            status,
        } => {
            info!(tracking_id = %tracking_id, provider, %status, "delivery report applied");
            record_delivery_report("applied");
        }
        DeliveryReportOutcome::AlreadyFinal {
            tracking_id,
            status,
        } => {
            debug!(tracking_id = %tracking_id, provider, %status, "repeated delivery report ignored");
            record_delivery_report("repeated");
        }
        DeliveryReportOutcome::NotFound => {
            debug!(provider, provider_ref = %report.provider_ref, "delivery report for unknown reference");
            record_delivery_report("unknown");
            return Err(SmsgateError::NotFound {
                kind: "provider reference",
                id: report.provider_ref,
            });
        }
    }
    Ok(outcome)
}
