//! Collection, replication and shard commands

use super::confirm;
use super::schema::vectorizer_label;
use crate::app::{CollectionAction, CollectionArgs};
use crate::output::{display_value, Cell, Document, Output, Panel, Table};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use vectory_core::{ReplicaInfo, ShardInfo, VectoryClient};

#[derive(Serialize)]
struct CollectionSummary {
    name: String,
    vectorizer: String,
    object_count: u64,
    properties: usize,
}

pub async fn run(args: CollectionArgs, client: &VectoryClient, out: &Output) -> Result<()> {
    match args.action {
        CollectionAction::List => list(client, out).await,
        CollectionAction::Info { name } => info(client, out, &name).await,
        CollectionAction::Delete { name, force } => delete(client, out, &name, force).await,
        CollectionAction::Replication { name } => replication(client, out, &name).await,
        CollectionAction::Shards {
            name,
            detailed,
            shard,
        } => match shard {
            Some(shard) => shard_details(client, out, &name, &shard).await,
            None => shards(client, out, &name, detailed).await,
        },
    }
}

async fn list(client: &VectoryClient, out: &Output) -> Result<()> {
    let schemas = client.schema.list_collections().await?;

    let mut summaries = Vec::with_capacity(schemas.len());
    for schema in &schemas {
        let object_count = match client.objects.get_collection_count(&schema.name, None).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("count for {} unavailable: {}", schema.name, e);
                0
            }
        };
        summaries.push(CollectionSummary {
            name: schema.name.clone(),
            vectorizer: vectorizer_label(schema),
            object_count,
            properties: schema.properties.len(),
        });
    }

    if summaries.is_empty() {
        out.note("No collections found");
        return out.emit(&summaries, &Document::new());
    }

    let mut table = Table::new(["Collection", "Objects", "Vectorizer", "Properties"])
        .titled(format!("Collections ({})", summaries.len()));
    for summary in &summaries {
        table.row(vec![
            summary.name.as_str().into(),
            summary.object_count.to_string().into(),
            summary.vectorizer.as_str().into(),
            summary.properties.to_string().into(),
        ]);
    }
    out.emit(&summaries, &Document::new().table(table))
}

async fn info(client: &VectoryClient, out: &Output, name: &str) -> Result<()> {
    let schema = client.schema.require_collection(name).await?;
    let stats = client.schema.get_collection_stats(name).await;

    let mut panel = Panel::new(format!("Collection: {}", name))
        .field("Objects", stats.object_count.to_string())
        .field("Vectorizer", vectorizer_label(&schema))
        .field("Properties", schema.properties.len().to_string())
        .field("Shards", stats.shards.len().to_string());
    if let Some(factor) = stats.replication.as_ref().and_then(|r| r.factor) {
        panel.push("Replication factor", factor.to_string());
    }
    if let Some(count) = stats.sharding.as_ref().and_then(|s| s.desired_count) {
        panel.push("Desired shards", count.to_string());
    }
    if let Some(ref description) = schema.description {
        panel.push("Description", description.as_str());
    }

    let doc = Document::new().panel(panel).table(shard_table(&stats.shards));
    out.emit(&stats, &doc)
}

async fn delete(client: &VectoryClient, out: &Output, name: &str, force: bool) -> Result<()> {
    client.schema.require_collection(name).await?;
    let count = client
        .objects
        .get_collection_count(name, None)
        .await
        .unwrap_or_default();

    if !force
        && !confirm(&format!(
            "Delete collection '{}' with {} objects?",
            name, count
        ))?
    {
        out.note("Deletion cancelled");
        return Ok(());
    }

    client.schema.delete_collection(name).await?;
    out.success(&format!("Collection '{}' deleted", name))
}

async fn replication(client: &VectoryClient, out: &Output, name: &str) -> Result<()> {
    client.schema.require_collection(name).await?;
    let stats = client.schema.get_collection_stats(name).await;

    let mut panel = Panel::new(format!("Replication: {}", name)).field(
        "Factor",
        stats
            .replication
            .as_ref()
            .and_then(|r| r.factor)
            .map_or_else(|| "1".to_string(), |f| f.to_string()),
    );
    if let Some(ref config) = stats.replication {
        for (key, value) in &config.extra {
            panel.push(key.as_str(), display_value(value));
        }
    }

    let mut replicas = Table::new(["Shard", "Node", "Status", "Health", "Sync", "Lag"])
        .titled("Replicas");
    for (shard_name, shard) in &stats.shards {
        for replica in &shard.replicas {
            replicas.row(replica_row(shard_name, replica));
        }
    }

    let mut doc = Document::new().panel(panel);
    if replicas.rows.is_empty() {
        doc = doc.text("No replica information reported");
    } else {
        doc = doc.table(replicas);
    }
    out.emit(&stats, &doc)
}

async fn shards(client: &VectoryClient, out: &Output, name: &str, detailed: bool) -> Result<()> {
    let shards = client.schema.get_shards(name).await?;
    if shards.is_empty() {
        out.note(&format!("No shards found for '{}'", name));
        return out.emit(&shards, &Document::new());
    }

    let mut doc = Document::new().table(shard_table(&shards));
    if detailed {
        for shard in shards.values() {
            doc = append_detail(doc, shard);
        }
    }
    out.emit(&shards, &doc)
}

async fn shard_details(client: &VectoryClient, out: &Output, name: &str, shard: &str) -> Result<()> {
    let info = client.schema.get_shard_details(name, shard).await?;
    let doc = append_detail(Document::new(), &info);
    out.emit(&info, &doc)
}

fn optional(value: &Option<String>) -> Cell {
    value.as_deref().map_or_else(|| Cell::plain("-"), Cell::status)
}

fn replica_row(shard: &str, replica: &ReplicaInfo) -> Vec<Cell> {
    vec![
        shard.into(),
        replica.node.clone().unwrap_or_else(|| "-".into()).into(),
        optional(&replica.status),
        optional(&replica.health),
        optional(&replica.sync_status),
        replica
            .replication_lag
            .as_ref()
            .map_or_else(|| "-".to_string(), display_value)
            .into(),
    ]
}

pub(crate) fn shard_table(shards: &BTreeMap<String, ShardInfo>) -> Table {
    let mut table = Table::new(["Shard", "Status", "Node", "Objects", "Replicas"])
        .titled(format!("Shards ({})", shards.len()));
    for (name, shard) in shards {
        table.row(vec![
            name.as_str().into(),
            Cell::status(shard.status.to_string()),
            shard.node.clone().unwrap_or_else(|| "-".into()).into(),
            shard
                .object_count
                .map_or_else(|| "-".to_string(), |c| c.to_string())
                .into(),
            shard.replicas.len().to_string().into(),
        ]);
    }
    table
}

/// Status panel, replicas and metrics for one shard
fn append_detail(mut doc: Document, shard: &ShardInfo) -> Document {
    let mut panel = Panel::new(format!("Shard: {}", shard.name))
        .field("Status", Cell::status(shard.status.to_string()));
    if let Some(ref node) = shard.node {
        panel.push("Node", node.as_str());
    }
    if let Some(count) = shard.object_count {
        panel.push("Objects", count.to_string());
    }
    for (label, value) in shard.metrics.entries() {
        panel.push(label, display_value(value));
    }
    doc = doc.panel(panel);

    if !shard.replicas.is_empty() {
        let mut replicas = Table::new(["Shard", "Node", "Status", "Health", "Sync", "Lag"])
            .titled(format!("Replicas of {}", shard.name));
        for replica in &shard.replicas {
            replicas.row(replica_row(&shard.name, replica));
        }
        doc = doc.table(replicas);
    }
    doc
}
