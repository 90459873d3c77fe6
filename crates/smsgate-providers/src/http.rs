// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic JSON-over-HTTP provider.
//!
//! Posts `{"senders": [..], "messages": [..], "recipients": [..]}` to
//! `base_url + endpoint_path` and reads the provider reference from the
//! response body. The shape matches Magfa-style bulk SMS APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use smsgate_config::model::{ProviderAuth, ProviderConfig};
use smsgate_core::{
    AdapterType, HealthStatus, OutboundSms, PluginAdapter, ProviderAdapter, ProviderRef,
    SmsgateError,
};

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    senders: [&'a str; 1],
    messages: [&'a str; 1],
    recipients: [&'a str; 1],
}

#[derive(Clone)]
enum Credentials {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

/// Provider adapter for HTTP SMS APIs.
#[derive(Clone)]
pub struct HttpProvider {
    name: String,
    client: reqwest::Client,
    url: String,
    sender: String,
    credentials: Credentials,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl HttpProvider {
    /// Build an adapter from its configuration entry.
    ///
    /// `timeout` bounds the whole request; the policy engine applies its own
    /// deadline on top.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, SmsgateError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                SmsgateError::Config(format!("http provider `{}` requires base_url", config.name))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("cache-control", HeaderValue::from_static("no-cache"));

        let credentials = match config.auth {
            ProviderAuth::None => Credentials::None,
            ProviderAuth::Basic => Credentials::Basic {
                username: config.username.clone().unwrap_or_default(),
                password: config.password.clone().unwrap_or_default(),
            },
            ProviderAuth::Bearer => Credentials::Bearer(config.api_key.clone().unwrap_or_default()),
            ProviderAuth::ApiKey => {
                let key = config.api_key.as_deref().unwrap_or_default();
                headers.insert(
                    header_name(&config.name, &config.api_key_header)?,
                    header_value(&config.name, key)?,
                );
                Credentials::None
            }
        };

        for (name, value) in &config.extra_headers {
            headers.insert(header_name(&config.name, name)?, header_value(&config.name, value)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SmsgateError::Provider {
                provider: config.name.clone(),
                message: format!("failed to build HTTP client: {e}"),
                retryable: false,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            name: config.name.clone(),
            client,
            url: format!("{base_url}{}", config.endpoint_path),
            sender: config.sender.clone().unwrap_or_default(),
            credentials,
        })
    }

    fn failure(&self, message: String, retryable: bool, source: Option<reqwest::Error>) -> SmsgateError {
        SmsgateError::Provider {
            provider: self.name.clone(),
            message,
            retryable,
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }
}

fn header_name(provider: &str, name: &str) -> Result<HeaderName, SmsgateError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        SmsgateError::Config(format!("provider `{provider}` has invalid header name `{name}`: {e}"))
    })
}

fn header_value(provider: &str, value: &str) -> Result<HeaderValue, SmsgateError> {
    HeaderValue::from_str(value).map_err(|e| {
        SmsgateError::Config(format!("provider `{provider}` has an invalid header value: {e}"))
    })
}

/// Statuses worth another attempt later: 408, 429, and any 5xx.
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Pull the provider's message reference out of a response body.
///
/// Checked in order: `ids[0]`, `ids`, `id`, `message_id`, `messages[0].id`.
/// Strings and numbers are both accepted.
pub fn extract_reference(body: &Value) -> Option<String> {
    fn scalar(v: &Value) -> Option<String> {
        match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Array(items) => items.first().and_then(scalar),
            _ => None,
        }
    }

    ["ids", "id", "message_id"]
        .iter()
        .find_map(|key| body.get(key).and_then(scalar))
        .or_else(|| {
            body.get("messages")
                .and_then(|m| m.get(0))
                .and_then(|m| m.get("id"))
                .and_then(scalar)
        })
}

#[async_trait]
impl PluginAdapter for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SmsgateError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmsgateError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for HttpProvider {
    async fn send(&self, sms: &OutboundSms) -> Result<ProviderRef, SmsgateError> {
        let body = SendBody {
            senders: [self.sender.as_str()],
            messages: [sms.text.as_str()],
            recipients: [sms.recipient.as_str()],
        };

        let mut request = self.client.post(&self.url).json(&body);
        request = match &self.credentials {
            Credentials::None => request,
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
            Credentials::Bearer(token) => request.bearer_auth(token),
        };

        let response = request.send().await.map_err(|e| {
            let retryable = e.is_timeout() || e.is_connect();
            self.failure(format!("HTTP request failed: {e}"), retryable, Some(e))
        })?;

        let status = response.status();
        debug!(provider = %self.name, tracking_id = %sms.tracking_id, status = %status, "provider responded");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.failure(
                format!("HTTP {}: {}", status.as_u16(), text.trim()),
                is_retryable(status),
                None,
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            self.failure(format!("unreadable response body: {e}"), false, Some(e))
        })?;

        extract_reference(&body).map(ProviderRef).ok_or_else(|| {
            self.failure(
                "accepted response carried no message reference".to_string(),
                false,
                None,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smsgate_config::model::ProviderKind;
    use wiremock::matchers::{basic_auth, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> ProviderConfig {
        let mut c = ProviderConfig::simulated("magfa");
        c.kind = ProviderKind::Http;
        c.base_url = Some(base_url.to_string());
        c.endpoint_path = "/api/http/sms/v2/send".to_string();
        c.sender = Some("3000".to_string());
        c
    }

    fn sms() -> OutboundSms {
        OutboundSms {
            tracking_id: "t1".into(),
            recipient: "+989120000000".into(),
            text: "hello".into(),
        }
    }

    #[test]
    fn reference_extraction() {
        assert_eq!(extract_reference(&json!({"ids": ["a", "b"]})).as_deref(), Some("a"));
        assert_eq!(extract_reference(&json!({"ids": [42]})).as_deref(), Some("42"));
        assert_eq!(extract_reference(&json!({"id": 7})).as_deref(), Some("7"));
        assert_eq!(extract_reference(&json!({"message_id": "m"})).as_deref(), Some("m"));
        assert_eq!(
            extract_reference(&json!({"status": 0, "messages": [{"id": 991, "status": 0}]})).as_deref(),
            Some("991")
        );
        assert_eq!(extract_reference(&json!({"ids": []})), None);
        assert_eq!(extract_reference(&json!({"id": ""})), None);
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(StatusCode::REQUEST_TIMEOUT));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn sends_magfa_shaped_body_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/http/sms/v2/send"))
            .and(basic_auth("user", "pass"))
            .and(header("x-trace", "on"))
            .and(body_json(json!({
                "senders": ["3000"],
                "messages": ["hello"],
                "recipients": ["+989120000000"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ids": [123456]})))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri());
        cfg.auth = ProviderAuth::Basic;
        cfg.username = Some("user".into());
        cfg.password = Some("pass".into());
        cfg.extra_headers.insert("X-Trace".into(), "on".into());

        let provider = HttpProvider::new(&cfg, Duration::from_secs(5)).unwrap();
        let reference = provider.send(&sms()).await.unwrap();
        assert_eq!(reference, ProviderRef("123456".into()));
    }

    #[tokio::test]
    async fn api_key_and_bearer_modes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "k-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri());
        cfg.auth = ProviderAuth::ApiKey;
        cfg.api_key = Some("k-1".into());
        let provider = HttpProvider::new(&cfg, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.send(&sms()).await.unwrap().0, "a1");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "b1"})))
            .mount(&server)
            .await;
        let mut cfg = config(&server.uri());
        cfg.auth = ProviderAuth::Bearer;
        cfg.api_key = Some("tok".into());
        let provider = HttpProvider::new(&cfg, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.send(&sms()).await.unwrap().0, "b1");
    }

    #[tokio::test]
    async fn server_error_is_retryable_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&config(&server.uri()), Duration::from_secs(5)).unwrap();
        match provider.send(&sms()).await.unwrap_err() {
            SmsgateError::Provider {
                provider,
                message,
                retryable,
                ..
            } => {
                assert_eq!(provider, "magfa");
                assert!(message.contains("503"));
                assert!(message.contains("maintenance"));
                assert!(retryable);
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_error_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad number"})))
            .mount(&server)
            .await;
        let provider = HttpProvider::new(&config(&server.uri()), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            provider.send(&sms()).await,
            Err(SmsgateError::Provider { retryable: false, .. })
        ));
    }

    #[tokio::test]
    async fn success_without_reference_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
            .mount(&server)
            .await;
        let provider = HttpProvider::new(&config(&server.uri()), Duration::from_secs(5)).unwrap();
        assert!(provider.send(&sms()).await.is_err());
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        let provider =
            HttpProvider::new(&config(&server.uri()), Duration::from_millis(100)).unwrap();
        assert!(matches!(
            provider.send(&sms()).await,
            Err(SmsgateError::Provider { retryable: true, .. })
        ));
    }

    #[test]
    fn missing_base_url_is_config_error() {
        let mut cfg = config("http://x");
        cfg.base_url = None;
        assert!(matches!(
            HttpProvider::new(&cfg, Duration::from_secs(1)),
            Err(SmsgateError::Config(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let provider = HttpProvider::new(&config("https://sms.example.com/"), Duration::from_secs(1)).unwrap();
        assert_eq!(provider.url, "https://sms.example.com/api/http/sms/v2/send");
    }
}
