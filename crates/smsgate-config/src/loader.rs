// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./smsgate.toml` > `~/.config/smsgate/smsgate.toml` > `/etc/smsgate/smsgate.toml`
//! with environment variable overrides via `SMSGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SmsgateConfig;

/// Table sections reachable through `SMSGATE_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "logging",
    "gateway",
    "storage",
    "queue",
    "cache",
    "ingress",
    "consumer",
    "prometheus",
];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/smsgate/smsgate.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "smsgate.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("smsgate/smsgate.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/smsgate/smsgate.toml` (system-wide)
/// 3. `~/.config/smsgate/smsgate.toml` (user XDG config)
/// 4. `./smsgate.toml` (local directory)
/// 5. `SMSGATE_*` environment variables
pub fn load_config() -> Result<SmsgateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<SmsgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmsgateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SmsgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SmsgateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SmsgateConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider with an explicit section-to-dot mapping.
///
/// `Env::split("_")` would turn `SMSGATE_QUEUE_MAX_ATTEMPTS` into
/// `queue.max.attempts`; only the first segment names the section.
fn env_provider() -> Env {
    Env::prefixed("SMSGATE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            .filter(|r| !r.is_empty())
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
