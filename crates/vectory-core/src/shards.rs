//! Shard and replica introspection

use crate::error::{Result, VectoryError};
use crate::schema::SchemaClient;
use crate::wire::{lenient_u64, null_default};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShardStatus {
    Ready,
    Creating,
    Pending,
    Error,
    Failed,
    /// Anything else, kept verbatim
    Unknown(String),
}

impl Default for ShardStatus {
    fn default() -> Self {
        Self::Unknown("UNKNOWN".to_string())
    }
}

impl From<String> for ShardStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "READY" => Self::Ready,
            "CREATING" => Self::Creating,
            "PENDING" => Self::Pending,
            "ERROR" => Self::Error,
            "FAILED" => Self::Failed,
            _ => Self::Unknown(s),
        }
    }
}

impl From<ShardStatus> for String {
    fn from(status: ShardStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for ShardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ready => "READY",
            Self::Creating => "CREATING",
            Self::Pending => "PENDING",
            Self::Error => "ERROR",
            Self::Failed => "FAILED",
            Self::Unknown(raw) => raw,
        })
    }
}

/// Coarse classification used for colouring statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Good,
    Busy,
    Bad,
    Neutral,
}

impl StatusTone {
    /// Classify shard, replica health and sync status strings
    pub fn of(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "READY" | "HEALTHY" | "IN_SYNC" => Self::Good,
            "CREATING" | "PENDING" | "SYNCING" => Self::Busy,
            "ERROR" | "FAILED" | "UNHEALTHY" => Self::Bad,
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaInfo {
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub sync_status: Option<String>,
    #[serde(default)]
    pub replication_lag: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Optional metrics reported by the metrics endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_on: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_indexing_status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing_progress: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_time_avg: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_in: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_out: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShardMetrics {
    /// Labelled metric values that are present, in display order
    pub fn entries(&self) -> Vec<(&'static str, &Value)> {
        [
            ("Hosted on", &self.hosted_on),
            ("Vector indexing", &self.vector_indexing_status),
            ("Memory usage", &self.memory_usage),
            ("Disk usage", &self.disk_usage),
            ("CPU usage", &self.cpu_usage),
            ("Indexing progress", &self.indexing_progress),
            ("Avg query time", &self.query_time_avg),
            ("Network in", &self.network_in),
            ("Network out", &self.network_out),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| (label, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardInfo {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub status: ShardStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub object_count: Option<u64>,

    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub replicas: Vec<ReplicaInfo>,

    #[serde(flatten)]
    pub metrics: ShardMetrics,
}

/// Key a shard listing by shard name
///
/// List entries without a name are keyed `shard_{n}` where `n` is the number
/// of entries keyed so far; mapping entries without a name take their key.
/// Entries that are not objects are skipped.
pub fn normalize_shards(raw: Value) -> Result<BTreeMap<String, ShardInfo>> {
    let mut shards = BTreeMap::new();

    match raw {
        Value::Array(items) => {
            for item in items {
                if !item.is_object() {
                    continue;
                }
                let mut shard: ShardInfo = serde_json::from_value(item)?;
                if shard.name.is_empty() {
                    shard.name = format!("shard_{}", shards.len());
                }
                shards.insert(shard.name.clone(), shard);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                if !item.is_object() {
                    continue;
                }
                let mut shard: ShardInfo = serde_json::from_value(item)?;
                if shard.name.is_empty() {
                    shard.name = key.clone();
                }
                shards.insert(key, shard);
            }
        }
        Value::Null => {}
        other => {
            return Err(VectoryError::InvalidInput(format!(
                "unexpected shard listing: {}",
                other
            )))
        }
    }

    Ok(shards)
}

/// With exactly one shard, the authoritative total replaces its count
pub fn apply_total_count(shards: &mut BTreeMap<String, ShardInfo>, total: u64) {
    if shards.len() == 1 && total > 0 {
        if let Some(shard) = shards.values_mut().next() {
            shard.object_count = Some(total);
        }
    }
}

fn shards_path(collection: &str) -> String {
    format!("schema/{}/shards", urlencoding::encode(collection))
}

impl SchemaClient {
    pub(crate) async fn raw_shards(&self, collection: &str) -> Result<BTreeMap<String, ShardInfo>> {
        let raw = self.transport.get(&shards_path(collection)).await?;
        normalize_shards(raw)
    }

    /// Shards of a collection keyed by name
    pub async fn get_shards(&self, collection: &str) -> Result<BTreeMap<String, ShardInfo>> {
        let mut shards = self.raw_shards(collection).await?;

        if shards.len() == 1 {
            match self.objects.get_collection_count(collection, None).await {
                Ok(total) => apply_total_count(&mut shards, total),
                Err(e) => tracing::warn!("total count for {} unavailable: {}", collection, e),
            }
        }

        Ok(shards)
    }

    /// One shard, merged with metrics where the server provides them
    pub async fn get_shard_details(&self, collection: &str, shard: &str) -> Result<ShardInfo> {
        let mut shards = self.get_shards(collection).await?;
        let base = shards
            .remove(shard)
            .ok_or_else(|| VectoryError::ShardNotFound(format!("{}/{}", collection, shard)))?;

        let metrics_path = format!(
            "{}/{}/metrics",
            shards_path(collection),
            urlencoding::encode(shard)
        );
        let metrics = match self.transport.get(&metrics_path).await {
            Ok(Value::Object(map)) if !map.is_empty() => map,
            Ok(_) => return Ok(base),
            Err(e) => {
                tracing::debug!("metrics for shard {} unavailable: {}", shard, e);
                return Ok(base);
            }
        };

        let mut merged = match serde_json::to_value(&base)? {
            Value::Object(map) => map,
            _ => return Ok(base),
        };
        merged.extend(metrics);

        match serde_json::from_value::<ShardInfo>(Value::Object(merged)) {
            Ok(mut detailed) => {
                if detailed.name.is_empty() {
                    detailed.name = base.name.clone();
                }
                if detailed.object_count.is_none() {
                    detailed.object_count = base.object_count;
                }
                Ok(detailed)
            }
            Err(e) => {
                tracing::warn!("metrics for shard {} could not be merged: {}", shard, e);
                Ok(base)
            }
        }
    }
}
