//! Schema commands

use super::confirm;
use crate::app::{SchemaAction, SchemaArgs};
use crate::output::{display_value, Cell, Document, Output, Panel, Table};
use anyhow::Result;
use vectory_core::{CollectionSchema, VectoryClient};

pub async fn run(args: SchemaArgs, client: &VectoryClient, out: &Output) -> Result<()> {
    match args.action {
        SchemaAction::List => list(client, out).await,
        SchemaAction::Get { name } => get(client, out, &name).await,
        SchemaAction::Delete { name, force } => delete(client, out, &name, force).await,
    }
}

async fn list(client: &VectoryClient, out: &Output) -> Result<()> {
    let schemas = client.schema.list_collections().await?;
    if schemas.is_empty() {
        out.note("No schemas found");
        return out.emit(&schemas, &Document::new());
    }

    let mut table = Table::new(["Name", "Vectorizer", "Properties", "Description"])
        .titled(format!("Schemas ({})", schemas.len()));
    for schema in &schemas {
        table.row(vec![
            schema.name.as_str().into(),
            vectorizer_label(schema).into(),
            schema.properties.len().to_string().into(),
            schema.description.clone().unwrap_or_default().into(),
        ]);
    }
    out.emit(&schemas, &Document::new().table(table))
}

pub(crate) fn vectorizer_label(schema: &CollectionSchema) -> String {
    schema
        .vectorizer
        .clone()
        .unwrap_or_else(|| vectory_core::schema::NO_VECTORIZER.to_string())
}

/// Panel of schema settings followed by the property table
pub(crate) fn schema_document(schema: &CollectionSchema) -> Document {
    let mut panel = Panel::new(format!("Schema: {}", schema.name))
        .field("Name", schema.name.as_str())
        .field("Vectorizer", vectorizer_label(schema));
    if let Some(ref description) = schema.description {
        panel.push("Description", description.as_str());
    }
    if let Some(factor) = schema.replication_config.as_ref().and_then(|r| r.factor) {
        panel.push("Replication factor", factor.to_string());
    }
    if let Some(count) = schema.sharding_config.as_ref().and_then(|s| s.desired_count) {
        panel.push("Desired shards", count.to_string());
    }
    for key in ["multiTenancyConfig", "vectorIndexType"] {
        if let Some(value) = schema.extra.get(key) {
            panel.push(key, display_value(value));
        }
    }

    let mut properties = Table::new(["Property", "Type", "Description"]).titled("Properties");
    for property in &schema.properties {
        properties.row(vec![
            property.name.as_str().into(),
            property.data_type.join(", ").into(),
            property.description.clone().unwrap_or_default().into(),
        ]);
    }

    Document::new().panel(panel).table(properties)
}

async fn get(client: &VectoryClient, out: &Output, name: &str) -> Result<()> {
    let schema = client.schema.require_collection(name).await?;
    out.emit(&schema, &schema_document(&schema))
}

async fn delete(client: &VectoryClient, out: &Output, name: &str, force: bool) -> Result<()> {
    client.schema.require_collection(name).await?;

    if !force
        && !confirm(&format!(
            "Delete schema '{}' and all of its objects?",
            name
        ))?
    {
        out.note("Deletion cancelled");
        return Ok(());
    }

    client.schema.delete_collection(name).await?;
    out.success(&format!("Schema '{}' deleted", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Block;

    #[test]
    fn test_schema_document() {
        let schema: CollectionSchema = serde_json::from_value(serde_json::json!({
            "class": "Docs",
            "properties": [{"name": "text", "dataType": ["text"]}],
            "replicationConfig": {"factor": 3}
        }))
        .unwrap();

        let doc = schema_document(&schema);
        match &doc.blocks[0] {
            Block::Panel(panel) => {
                assert!(panel
                    .rows
                    .iter()
                    .any(|(k, v)| k == "Vectorizer" && v.text == "none"));
                assert!(panel
                    .rows
                    .iter()
                    .any(|(k, v)| k == "Replication factor" && v.text == "3"));
            }
            other => panic!("expected panel, got {:?}", other),
        }
        match &doc.blocks[1] {
            Block::Table(table) => assert_eq!(table.rows[0][1], Cell::plain("text")),
            other => panic!("expected table, got {:?}", other),
        }
    }
}
