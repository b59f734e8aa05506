//! reqwest-backed transport

use super::{ApiRequest, Transport};
use crate::config::Config;
use crate::error::{Result, VectoryError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Placeholder the server accepts when authentication is disabled
const NO_AUTH: &str = "NONE";

/// Authorization header value for an optional API key
pub fn auth_header_value(api_key: Option<&str>) -> String {
    match api_key.filter(|k| !k.is_empty()) {
        Some(key) => format!("Bearer {}", key),
        None => NO_AUTH.to_string(),
    }
}

/// Human-readable message for a failed response
///
/// Prefers the body's `message`, then the joined `error[].message` entries,
/// then the HTTP status line.
pub fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(message) = value.get("message") {
            return match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }

        if let Some(Value::Array(errors)) = value.get("error") {
            let messages: Vec<String> = errors
                .iter()
                .map(|err| match err.get("message") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => err.to_string(),
                })
                .collect();
            return messages.join("; ");
        }
    }

    status.to_string()
}

/// Transport talking to the vector database over HTTP
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&auth_header_value(config.api_key.as_deref()))
            .map_err(|_| {
                VectoryError::Config("API key contains characters not allowed in a header".into())
            })?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(concat!("vectory/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = self.url_for(&request.path);
        tracing::debug!("{} {}", request.method, url);

        let mut req = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = extract_error_message(status, &bytes);
            tracing::debug!("{} {} failed: {}", request.method, url, message);
            return Err(VectoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Object(Default::default()));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_header_with_key() {
        assert_eq!(auth_header_value(Some("secret")), "Bearer secret");
    }

    #[test]
    fn test_auth_header_without_key() {
        assert_eq!(auth_header_value(None), "NONE");
        assert_eq!(auth_header_value(Some("")), "NONE");
    }

    #[test]
    fn test_error_message_from_message_field() {
        let body = br#"{"message": "class Docs not found"}"#;
        assert_eq!(
            extract_error_message(StatusCode::NOT_FOUND, body),
            "class Docs not found"
        );
    }

    #[test]
    fn test_error_message_from_error_list() {
        let body = br#"{"error": [{"message": "bad id"}, {"message": "bad class"}]}"#;
        assert_eq!(
            extract_error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "bad id; bad class"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status_line() {
        assert_eq!(
            extract_error_message(StatusCode::NOT_FOUND, b""),
            "404 Not Found"
        );
        assert_eq!(
            extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>"),
            "500 Internal Server Error"
        );
    }

    #[test]
    fn test_base_url_from_config() {
        let config = Config {
            http_host: "db.internal".to_string(),
            http_port: "9090".to_string(),
            ..Config::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://db.internal:9090/v1");
        assert_eq!(
            transport.url_for("/schema/Docs"),
            "http://db.internal:9090/v1/schema/Docs"
        );
    }
}
