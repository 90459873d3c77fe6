// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the smsgate configuration system.

use std::io::Write;

use smsgate_config::diagnostic::ConfigError;
use smsgate_config::model::{CacheBackend, ProviderAuth, ProviderKind, SmsgateConfig};
use smsgate_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

const FULL_CONFIG: &str = r#"
[logging]
level = "debug"

[gateway]
host = "0.0.0.0"
port = 9090
webhook_token = "hook-secret"

[storage]
database_path = "/tmp/smsgate-test.db"
wal_mode = false

[queue]
name = "outbound"
max_attempts = 3
lock_timeout_secs = 60
poll_interval_ms = 50

[cache]
backend = "memory"
purge_interval_secs = 30

[ingress]
idempotency_ttl_secs = 3600
quota_ttl_secs = 7200

[consumer]
workers = 2
requeue_on_exhaustion = false
default_provider_timeout_ms = 2500

[prometheus]
enabled = false

[[clients]]
name = "c1"
api_key = "k1"
daily_quota = 2

[[clients]]
name = "c2"
api_key = "k2"
is_active = false
daily_quota = 100

[[providers]]
name = "magfa"
kind = "http"
base_url = "https://sms.example.com"
endpoint_path = "/api/http/sms/v2/send"
auth = "basic"
username = "user"
password = "pass"
sender = "3000"
timeout_ms = 4000

[providers.extra_headers]
"X-Trace" = "on"

[[providers]]
name = "provider-b"
kind = "simulated"
enabled = false
"#;

#[test]
fn full_config_deserializes() {
    let config = load_and_validate_str(FULL_CONFIG).expect("full config should validate");

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.gateway.port, 9090);
    assert_eq!(config.gateway.webhook_token.as_deref(), Some("hook-secret"));
    assert!(!config.storage.wal_mode);
    assert_eq!(config.queue.name, "outbound");
    assert_eq!(config.queue.max_attempts, 3);
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.ingress.quota_ttl_secs, 7200);
    assert_eq!(config.consumer.workers, 2);
    assert!(!config.consumer.requeue_on_exhaustion);
    assert!(!config.prometheus.enabled);

    assert_eq!(config.clients.len(), 2);
    assert!(config.clients[0].is_active, "is_active defaults to true");
    assert!(!config.clients[1].is_active);

    let magfa = &config.providers[0];
    assert_eq!(magfa.kind, ProviderKind::Http);
    assert_eq!(magfa.auth, ProviderAuth::Basic);
    assert_eq!(magfa.timeout_ms, Some(4000));
    assert_eq!(magfa.extra_headers.get("X-Trace").map(String::as_str), Some("on"));
    assert!(!config.providers[1].enabled);
}

#[test]
fn defaults_are_sensible() {
    let config = SmsgateConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8080);
    assert!(config.gateway.webhook_token.is_none());
    assert!(config.storage.database_path.ends_with("smsgate.db"));
    assert_eq!(config.queue.name, "sms_queue");
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
    assert_eq!(config.ingress.idempotency_ttl_secs, 86_400);
    assert_eq!(config.ingress.quota_ttl_secs, 86_400);
    assert!(config.consumer.requeue_on_exhaustion);
    assert!(config.clients.is_empty());
    assert!(config.providers.is_empty());
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("[gateway]\nport = 1234\n").expect("partial config");
    assert_eq!(config.gateway.port, 1234);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.queue.max_attempts, 5);
}

#[test]
fn dotted_override_reaches_nested_key() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    // Same shape the SMSGATE_QUEUE_MAX_ATTEMPTS variable produces after mapping.
    let config: SmsgateConfig = Figment::new()
        .merge(Serialized::defaults(SmsgateConfig::default()))
        .merge(Toml::string("[queue]\nmax_attempts = 2\n"))
        .merge(("queue.max_attempts", 9))
        .extract()
        .expect("override should merge");
    assert_eq!(config.queue.max_attempts, 9);
}

#[test]
fn unknown_key_gets_suggestion_and_valid_keys() {
    let errors = load_and_validate_str("[queue]\nmax_atempts = 3\n").expect_err("typo");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. }
            if key == "max_atempts"
                && suggestion.as_deref() == Some("max_attempts")
                && valid_keys.contains("poll_interval_ms"))
    });
    assert!(found, "expected UnknownKey for max_atempts, got: {errors:?}");
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n").expect_err("unknown section");
    assert!(err.to_string().contains("telemetry") || err.to_string().contains("unknown field"));
}

#[test]
fn unknown_provider_kind_is_reported() {
    let toml = r#"
[[providers]]
name = "p"
kind = "smpp"
"#;
    let errors = load_and_validate_str(toml).expect_err("unsupported kind");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownValue { value, .. } if value == "smpp")),
        "got: {errors:?}"
    );
}

#[test]
fn client_without_quota_is_missing_key() {
    let toml = r#"
[[clients]]
name = "c1"
api_key = "k1"
"#;
    let errors = load_and_validate_str(toml).expect_err("daily_quota is required");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key.ends_with("daily_quota"))),
        "got: {errors:?}"
    );
}

#[test]
fn invalid_type_is_reported() {
    let errors =
        load_and_validate_str("[gateway]\nport = \"eighty\"\n").expect_err("port must be a number");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "got: {errors:?}"
    );
}

#[test]
fn validation_errors_surface_through_loader() {
    let toml = r#"
[[clients]]
name = "a"
api_key = "same"
daily_quota = 1

[[clients]]
name = "b"
api_key = "same"
daily_quota = 1
"#;
    let errors = load_and_validate_str(toml).expect_err("duplicate keys");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("reuses an api_key"))));
}

#[test]
fn file_errors_point_at_the_offending_key() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[queue]\nname = \"q\"\nmax_atempts = 3").expect("write config");

    let errors = load_and_validate_path(file.path()).expect_err("typo in file");
    let spanned = errors
        .iter()
        .any(|e| matches!(e, ConfigError::UnknownKey { span: Some(_), src: Some(_), .. }));
    assert!(spanned, "unknown key in a file should carry a source span: {errors:?}");
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "nmae".to_string(),
        suggestion: Some("name".to_string()),
        valid_keys: "name, kind, enabled".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `name`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("nmae"));
}

#[test]
fn debug_output_redacts_secrets() {
    let config = load_config_from_str(FULL_CONFIG).expect("full config");
    let debug = format!("{config:?}");
    assert!(!debug.contains("hook-secret"));
    assert!(!debug.contains("\"pass\""));
    assert!(!debug.contains("\"k1\""));
}
