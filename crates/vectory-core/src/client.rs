//! Client facade composing the accessors

use crate::config::Config;
use crate::error::Result;
use crate::health::HealthClient;
use crate::objects::ObjectsClient;
use crate::schema::SchemaClient;
use crate::search::SearchEngine;
use crate::transport::{HttpTransport, Transport};
use std::sync::Arc;

/// One transport shared by every accessor
#[derive(Clone)]
pub struct VectoryClient {
    pub schema: SchemaClient,
    pub objects: ObjectsClient,
    pub health: HealthClient,
    pub search: SearchEngine,
    transport: Arc<dyn Transport>,
}

impl VectoryClient {
    /// Connect over HTTP using `config`
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            schema: SchemaClient::new(transport.clone()),
            objects: ObjectsClient::new(transport.clone()),
            health: HealthClient::new(transport.clone()),
            search: SearchEngine::new(transport.clone()),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_accessors_share_transport() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::GET, "schema", json!({"classes": []}))
            .respond(Method::GET, ".well-known/live", json!({}));

        let client = VectoryClient::with_transport(mock.clone());
        assert_eq!(client.base_url(), "mock://vectory/v1");
        client.schema.list_collections().await.unwrap();
        assert!(client.health.check_live().await);
        assert_eq!(mock.request_count(), 2);
    }
}
