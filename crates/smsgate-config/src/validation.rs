// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: uniqueness of
//! client keys and provider names, provider credentials matching their auth
//! mode, and non-zero sizing values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{ProviderAuth, ProviderConfig, ProviderKind, SmsgateConfig};

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &SmsgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.queue.name.trim().is_empty() {
        errors.push(ConfigError::validation("queue.name must not be empty"));
    }

    if config.queue.max_attempts == 0 {
        errors.push(ConfigError::validation(
            "queue.max_attempts must be at least 1",
        ));
    }

    if config.queue.lock_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "queue.lock_timeout_secs must be at least 1",
        ));
    }

    if config.consumer.workers == 0 {
        errors.push(ConfigError::validation("consumer.workers must be at least 1"));
    }

    if config.consumer.default_provider_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "consumer.default_provider_timeout_ms must be at least 1",
        ));
    }

    if config.cache.purge_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "cache.purge_interval_secs must be at least 1",
        ));
    }

    if config.ingress.idempotency_ttl_secs == 0 || config.ingress.quota_ttl_secs == 0 {
        errors.push(ConfigError::validation(
            "ingress expiry windows must be at least one second",
        ));
    }

    if let Some(token) = &config.gateway.webhook_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "gateway.webhook_token must not be empty when set",
        ));
    }

    let mut client_names = HashSet::new();
    let mut api_keys = HashSet::new();
    for (i, client) in config.clients.iter().enumerate() {
        if client.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "clients[{i}].name must not be empty"
            )));
        } else if !client_names.insert(client.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate client name `{}` in [[clients]] array",
                client.name
            )));
        }
        if client.api_key.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "clients[{i}].api_key must not be empty"
            )));
        } else if !api_keys.insert(client.api_key.as_str()) {
            // The key itself is a secret; name the entry instead.
            errors.push(ConfigError::validation(format!(
                "client `{}` reuses an api_key already assigned to another client",
                client.name
            )));
        }
        if client.daily_quota == 0 {
            errors.push(ConfigError::validation(format!(
                "client `{}` must have a daily_quota of at least 1",
                client.name
            )));
        }
    }

    let mut provider_names = HashSet::new();
    for (i, provider) in config.providers.iter().enumerate() {
        if provider.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "providers[{i}].name must not be empty"
            )));
        } else if !provider_names.insert(provider.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate provider name `{}` in [[providers]] array",
                provider.name
            )));
        }
        if provider.timeout_ms == Some(0) {
            errors.push(ConfigError::validation(format!(
                "provider `{}` timeout_ms must be at least 1",
                provider.name
            )));
        }
        if provider.kind == ProviderKind::Http {
            validate_http_provider(provider, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_http_provider(provider: &ProviderConfig, errors: &mut Vec<ConfigError>) {
    let name = &provider.name;
    match provider.base_url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ConfigError::validation(format!(
            "http provider `{name}` requires base_url"
        ))),
        Some(url) => {
            let host = url
                .strip_prefix("https://")
                .or_else(|| url.strip_prefix("http://"));
            if host.is_none_or(|h| h.is_empty() || h.starts_with('/')) {
                errors.push(ConfigError::validation(format!(
                    "provider `{name}` base_url `{url}` must be an absolute http:// or https:// URL"
                )));
            }
        }
    }

    if !provider.endpoint_path.is_empty() && !provider.endpoint_path.starts_with('/') {
        errors.push(ConfigError::validation(format!(
            "provider `{name}` endpoint_path must start with `/`"
        )));
    }

    let missing = |field: &Option<String>| field.as_deref().is_none_or(|v| v.is_empty());
    match provider.auth {
        ProviderAuth::None => {}
        ProviderAuth::Basic => {
            if missing(&provider.username) || missing(&provider.password) {
                errors.push(ConfigError::validation(format!(
                    "provider `{name}` uses basic auth and needs username and password"
                )));
            }
        }
        ProviderAuth::ApiKey | ProviderAuth::Bearer => {
            if missing(&provider.api_key) {
                errors.push(ConfigError::validation(format!(
                    "provider `{name}` uses {:?} auth and needs api_key",
                    provider.auth
                )));
            }
            if provider.auth == ProviderAuth::ApiKey && provider.api_key_header.trim().is_empty()
            {
                errors.push(ConfigError::validation(format!(
                    "provider `{name}` api_key_header must not be empty"
                )));
            }
        }
    }
}
