//! Liveness and readiness probes

use crate::transport::Transport;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.live && self.ready
    }
}

#[derive(Clone)]
pub struct HealthClient {
    transport: Arc<dyn Transport>,
}

impl HealthClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn probe(&self, path: &str) -> bool {
        match self.transport.get(path).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("{} probe failed: {}", path, e);
                false
            }
        }
    }

    pub async fn check_live(&self) -> bool {
        self.probe(".well-known/live").await
    }

    pub async fn check_ready(&self) -> bool {
        self.probe(".well-known/ready").await
    }

    pub async fn check_health(&self) -> HealthStatus {
        HealthStatus {
            live: self.check_live().await,
            ready: self.check_ready().await,
        }
    }
}
