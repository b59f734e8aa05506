//! Schema and collection accessor

use crate::error::{Result, VectoryError};
use crate::objects::ObjectsClient;
use crate::shards::{apply_total_count, ShardInfo};
use crate::transport::Transport;
use crate::wire::null_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Vectorizer value meaning "no embedding model"
pub const NO_VECTORIZER: &str = "none";

const TEXT_TYPES: [&str; 4] = ["text", "string", "text[]", "string[]"];

/// Collection (class) definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    #[serde(rename = "class")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub properties: Vec<PropertyDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectorizer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_config: Option<ReplicationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharding_config: Option<ShardingConfig>,

    /// Everything else the server sends
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionSchema {
    pub fn has_vectorizer(&self) -> bool {
        self.vectorizer
            .as_deref()
            .map_or(false, |v| !v.is_empty() && v != NO_VECTORIZER)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    /// Names of text-bearing properties in declaration order
    pub fn text_properties(&self) -> Vec<String> {
        self.properties
            .iter()
            .filter(|p| p.is_text())
            .map(|p| p.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,

    #[serde(default, deserialize_with = "null_default")]
    pub data_type: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyDefinition {
    /// First listed data type
    pub fn primary_type(&self) -> Option<&str> {
        self.data_type.first().map(String::as_str)
    }

    pub fn is_text(&self) -> bool {
        self.primary_type()
            .map_or(false, |t| TEXT_TYPES.contains(&t))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReplicationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShardingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Collection statistics; every piece is best-effort
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CollectionStats {
    pub object_count: u64,
    pub meta: Value,
    pub replication: Option<ReplicationConfig>,
    pub sharding: Option<ShardingConfig>,
    pub shards: BTreeMap<String, ShardInfo>,
}

/// Schema-level operations
#[derive(Clone)]
pub struct SchemaClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) objects: ObjectsClient,
}

impl SchemaClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            objects: ObjectsClient::new(transport.clone()),
            transport,
        }
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionSchema>> {
        let mut response = self.transport.get("schema").await?;
        match response.get_mut("classes").map(Value::take) {
            Some(Value::Array(classes)) => classes
                .into_iter()
                .map(|c| serde_json::from_value(c).map_err(VectoryError::from))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    /// Look a collection up by exact name
    pub async fn get_collection(&self, name: &str) -> Result<Option<CollectionSchema>> {
        Ok(self
            .list_collections()
            .await?
            .into_iter()
            .find(|c| c.name == name))
    }

    /// Like [`Self::get_collection`] but absence is an error
    pub async fn require_collection(&self, name: &str) -> Result<CollectionSchema> {
        self.get_collection(name)
            .await?
            .ok_or_else(|| VectoryError::CollectionNotFound(name.to_string()))
    }

    /// False when the collection is missing or the lookup fails
    pub async fn has_vectorizer(&self, name: &str) -> bool {
        match self.get_collection(name).await {
            Ok(Some(schema)) => schema.has_vectorizer(),
            Ok(None) => false,
            Err(e) => {
                tracing::debug!("vectorizer lookup for {} failed: {}", name, e);
                false
            }
        }
    }

    pub async fn get_collection_stats(&self, name: &str) -> CollectionStats {
        let mut stats = CollectionStats::default();

        match self.objects.get_collection_count(name, None).await {
            Ok(count) => stats.object_count = count,
            Err(e) => tracing::warn!("object count for {} unavailable: {}", name, e),
        }

        let meta = match self
            .transport
            .get(&format!("schema/{}", urlencoding::encode(name)))
            .await
        {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("schema metadata for {} unavailable: {}", name, e);
                match self.get_collection(name).await {
                    Ok(Some(schema)) => serde_json::to_value(&schema).ok(),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!("schema listing unavailable: {}", e);
                        None
                    }
                }
            }
        };

        if let Some(meta) = meta {
            stats.replication = meta
                .get("replicationConfig")
                .and_then(|v| serde_json::from_value(v.clone()).ok());
            stats.sharding = meta
                .get("shardingConfig")
                .and_then(|v| serde_json::from_value(v.clone()).ok());
            stats.meta = meta;
        }

        match self.raw_shards(name).await {
            Ok(mut shards) => {
                apply_total_count(&mut shards, stats.object_count);
                stats.shards = shards;
            }
            Err(e) => tracing::warn!("shard listing for {} unavailable: {}", name, e),
        }

        stats
    }

    /// Removes the schema and all its objects
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.transport
            .delete(&format!("schema/{}", urlencoding::encode(name)))
            .await?;
        tracing::debug!("deleted collection {}", name);
        Ok(())
    }
}
