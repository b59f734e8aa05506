//! In-memory transport replaying canned responses

use super::{ApiRequest, Method, Transport};
use crate::error::{Result, VectoryError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

enum Reply {
    Json(Value),
    Fail { status: u16, message: String },
}

struct Route {
    method: Method,
    path: String,
    body_contains: Option<String>,
    reply: Reply,
}

impl Route {
    fn matches(&self, request: &ApiRequest, body_text: &str) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .body_contains
                .as_deref()
                .map_or(true, |needle| body_text.contains(needle))
    }
}

/// Transport that answers from registered routes and records every request
///
/// Routes match on method and path (query parameters are ignored), optionally
/// narrowed by a substring of the serialized body. The first registered match
/// wins. Unmatched requests fail with a 404 API error.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, body_contains: Option<&str>, reply: Reply) {
        lock(&self.routes).push(Route {
            method,
            path: path.trim_start_matches('/').to_string(),
            body_contains: body_contains.map(str::to_string),
            reply,
        });
    }

    /// Answer `method path` with a JSON body
    pub fn respond(&self, method: Method, path: &str, body: Value) -> &Self {
        self.push(method, path, None, Reply::Json(body));
        self
    }

    /// Answer `method path` when the request body contains `needle`
    pub fn respond_when(&self, method: Method, path: &str, needle: &str, body: Value) -> &Self {
        self.push(method, path, Some(needle), Reply::Json(body));
        self
    }

    /// Fail `method path` with an API error
    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) -> &Self {
        self.push(
            method,
            path,
            None,
            Reply::Fail {
                status,
                message: message.to_string(),
            },
        );
        self
    }

    /// Every request sent so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    /// Requests sent to one path
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let body_text = request
            .body
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_default();

        let outcome = {
            let routes = lock(&self.routes);
            match routes.iter().find(|r| r.matches(&request, &body_text)) {
                Some(Route {
                    reply: Reply::Json(body),
                    ..
                }) => Ok(body.clone()),
                Some(Route {
                    reply: Reply::Fail { status, message },
                    ..
                }) => Err(VectoryError::Api {
                    status: *status,
                    message: message.clone(),
                }),
                None => Err(VectoryError::Api {
                    status: 404,
                    message: format!("no mock route for {} {}", request.method, request.path),
                }),
            }
        };

        lock(&self.requests).push(request);
        outcome
    }

    fn base_url(&self) -> &str {
        "mock://vectory/v1"
    }
}
