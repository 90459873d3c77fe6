// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.

use metrics::{describe_counter, describe_histogram};

/// Register metric descriptions. Called once after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "smsgate_requests_total",
        "Send requests seen by the ingress gate, by outcome"
    );
    describe_counter!(
        "smsgate_provider_attempts_total",
        "Provider send attempts, by provider and outcome"
    );
    describe_counter!(
        "smsgate_deliveries_total",
        "Work items settled by the consumer, by outcome"
    );
    describe_counter!(
        "smsgate_delivery_reports_total",
        "Delivery reports received, by resulting status"
    );
    describe_histogram!(
        "smsgate_provider_latency_seconds",
        "Provider send latency in seconds"
    );
}

/// Count an ingress decision (`accepted`, `replayed`, `quota_exceeded`, ...).
pub fn record_ingress(outcome: &'static str) {
    metrics::counter!("smsgate_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_provider_attempt(provider: &str, outcome: &'static str) {
    metrics::counter!(
        "smsgate_provider_attempts_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_provider_latency(provider: &str, seconds: f64) {
    metrics::histogram!("smsgate_provider_latency_seconds", "provider" => provider.to_string())
        .record(seconds);
}

/// Count a consumer outcome (`sent`, `exhausted`, `skipped`, `discarded`).
pub fn record_delivery(outcome: &'static str) {
    metrics::counter!("smsgate_deliveries_total", "outcome" => outcome).increment(1);
}

pub fn record_delivery_report(status: &'static str) {
    metrics::counter!("smsgate_delivery_reports_total", "status" => status).increment(1);
}
