//! Transport layer
//!
//! Every accessor talks to the vector database through [`Transport`], so the
//! same accessor code runs against the real HTTP endpoint or an in-memory
//! [`MockTransport`].

mod http;
mod mock;

pub use http::{auth_header_value, extract_error_message, HttpTransport};
pub use mock::MockTransport;

use crate::error::Result;
use async_trait::async_trait;
pub use reqwest::Method;
use serde_json::Value;

/// One request against the REST API, relative to the base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            path: path.trim_start_matches('/').to_string(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present
    pub fn with_optional_query(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with_query(key, v),
            None => self,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a query parameter by key
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Request/response transport for the vector database API
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request; 2xx bodies decode to JSON (empty → `{}`), anything
    /// else is an [`crate::VectoryError::Api`]
    async fn send(&self, request: ApiRequest) -> Result<Value>;

    /// Base URL requests are resolved against
    fn base_url(&self) -> &str;

    async fn get(&self, path: &str) -> Result<Value> {
        self.send(ApiRequest::new(Method::GET, path)).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(ApiRequest::new(Method::POST, path).with_body(body))
            .await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.send(ApiRequest::new(Method::PUT, path).with_body(body))
            .await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value> {
        self.send(ApiRequest::new(Method::PATCH, path).with_body(body))
            .await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.send(ApiRequest::new(Method::DELETE, path)).await
    }
}
