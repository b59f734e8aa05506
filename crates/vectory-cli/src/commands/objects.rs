//! Object commands

use super::{confirm, read_json_file, read_properties};
use crate::app::{ObjectsAction, ObjectsArgs};
use crate::output::{display_value, format_timestamp, truncate, Cell, Document, Output, Panel, Table};
use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;
use vectory_core::objects::tally;
use vectory_core::{DataObject, NewObject, VectoryClient};

const CELL_WIDTH: usize = 40;

pub async fn run(args: ObjectsArgs, client: &VectoryClient, out: &Output) -> Result<()> {
    match args.action {
        ObjectsAction::List {
            collection,
            limit,
            offset,
            tenant,
        } => {
            let objects = client
                .objects
                .list_objects(&collection, limit, offset, tenant.as_deref())
                .await?;
            if objects.is_empty() {
                out.note(&format!("No objects found in '{}'", collection));
                return out.emit(&objects, &Document::new());
            }
            out.emit(&objects, &Document::new().table(object_table(&collection, &objects)))
        }
        ObjectsAction::Get {
            collection,
            id,
            tenant,
        } => {
            let object = client
                .objects
                .get_object(&collection, &id, tenant.as_deref())
                .await?;
            out.emit(&object, &object_document(&object))
        }
        ObjectsAction::Create {
            collection,
            input,
            id,
            tenant,
        } => {
            let properties = read_properties(&input)?;
            let object = client
                .objects
                .create_object(
                    NewObject::new(collection.as_str(), properties)
                        .with_id(id)
                        .with_tenant(tenant),
                )
                .await?;
            out.success(&format!("Created object {} in '{}'", object.id, collection))?;
            out.emit(&object, &object_document(&object))
        }
        ObjectsAction::Update {
            collection,
            id,
            input,
            tenant,
        } => {
            let properties = read_properties(&input)?;
            let object = client
                .objects
                .update_object(&collection, &id, properties, tenant.as_deref())
                .await?;
            out.success(&format!("Updated object {} in '{}'", id, collection))?;
            out.emit(&object, &object_document(&object))
        }
        ObjectsAction::Delete {
            collection,
            id,
            force,
            tenant,
        } => {
            let tenant = tenant.as_deref();
            client.objects.get_object(&collection, &id, tenant).await?;
            if !force && !confirm(&format!("Delete object {} from '{}'?", id, collection))? {
                out.note("Deletion cancelled");
                return Ok(());
            }
            client.objects.delete_object(&collection, &id, tenant).await?;
            out.success(&format!("Deleted object {} from '{}'", id, collection))
        }
        ObjectsAction::Count { collection, tenant } => {
            let count = client
                .objects
                .get_collection_count(&collection, tenant.as_deref())
                .await?;
            let doc = Document::new().text(format!("{} objects in '{}'", count, collection));
            out.emit(&json!({ "collection": collection, "count": count }), &doc)
        }
        ObjectsAction::Batch {
            collection,
            file,
            tenant,
        } => {
            let objects = load_batch(&file, &collection, tenant)?;
            out.note(&format!(
                "Importing {} objects into '{}'...",
                objects.len(),
                collection
            ));

            let results = client.objects.batch_create(objects).await?;
            let (ok, failed) = tally(&results);

            let mut doc = Document::new().text(format!("{} succeeded, {} failed", ok, failed));
            if failed > 0 {
                let mut table = Table::new(["Id", "Errors"]).titled("Failed objects");
                for result in results.iter().filter(|r| !r.is_success()) {
                    table.row(vec![
                        result.id.clone().unwrap_or_default().into(),
                        Cell::toned(result.errors.join("; "), vectory_core::StatusTone::Bad),
                    ]);
                }
                doc = doc.table(table);
            }
            out.emit(&results, &doc)
        }
    }
}

/// Objects from a JSON array file
///
/// Entries are either `{"properties": {...}, "id"?, "vector"?}` or a bare
/// properties object.
pub(crate) fn load_batch(
    path: &Path,
    collection: &str,
    tenant: Option<String>,
) -> Result<Vec<NewObject>> {
    let entries = match read_json_file(path)? {
        Value::Array(entries) => entries,
        _ => bail!("{} must hold a JSON array of objects", path.display()),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            batch_entry(entry, collection, tenant.clone())
                .with_context(|| format!("Invalid entry {} in {}", index, path.display()))
        })
        .collect()
}

fn batch_entry(entry: Value, collection: &str, tenant: Option<String>) -> Result<NewObject> {
    let mut map = match entry {
        Value::Object(map) => map,
        _ => bail!("entry must be a JSON object"),
    };

    let object = match map.remove("properties") {
        Some(Value::Object(properties)) => {
            let id = match map.remove("id") {
                Some(Value::String(id)) => Some(id),
                None | Some(Value::Null) => None,
                Some(_) => bail!("id must be a string"),
            };
            let vector = match map.remove("vector") {
                None | Some(Value::Null) => None,
                Some(value) => Some(
                    serde_json::from_value::<Vec<f32>>(value)
                        .context("vector must be an array of numbers")?,
                ),
            };
            NewObject::new(collection, properties)
                .with_id(id)
                .with_vector(vector)
        }
        Some(other) => {
            map.insert("properties".to_string(), other);
            NewObject::new(collection, map)
        }
        None => NewObject::new(collection, map),
    };
    Ok(object.with_tenant(tenant))
}

fn property_summary(properties: &Map<String, Value>) -> String {
    properties
        .iter()
        .map(|(k, v)| format!("{}={}", k, display_value(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn object_table(collection: &str, objects: &[DataObject]) -> Table {
    let mut table = Table::new(["Id", "Properties", "Created"])
        .titled(format!("Objects in '{}' ({})", collection, objects.len()));
    for object in objects {
        table.row(vec![
            object.id.as_str().into(),
            truncate(&property_summary(&object.properties), CELL_WIDTH).into(),
            object
                .creation_time_unix
                .map(format_timestamp)
                .unwrap_or_default()
                .into(),
        ]);
    }
    table
}

fn object_document(object: &DataObject) -> Document {
    let mut panel = Panel::new(format!("Object: {}", object.id))
        .field("Id", object.id.as_str())
        .field("Collection", object.collection.as_str());
    if let Some(ref tenant) = object.tenant {
        panel.push("Tenant", tenant.as_str());
    }
    if let Some(created) = object.creation_time_unix {
        panel.push("Created", format_timestamp(created));
    }
    if let Some(updated) = object.last_update_time_unix {
        panel.push("Updated", format_timestamp(updated));
    }
    if let Some(ref vector) = object.vector {
        panel.push("Vector", format!("{} dimensions", vector.len()));
    }

    let mut properties = Panel::new("Properties");
    for (key, value) in &object.properties {
        properties.push(key.as_str(), display_value(value));
    }
    Document::new().panel(panel).panel(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_batch_accepts_both_entry_shapes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            r#"[
                {"properties": {"text": "cats"}, "id": "abc", "vector": [0.1, 0.2]},
                {"text": "dogs"}
            ]"#,
        )
        .unwrap();

        let objects = load_batch(&path, "Docs", Some("t1".into())).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].id.as_deref(), Some("abc"));
        assert_eq!(objects[0].vector, Some(vec![0.1, 0.2]));
        assert_eq!(objects[0].properties["text"], "cats");
        assert!(objects[1].id.is_none());
        assert_eq!(objects[1].properties["text"], "dogs");
        assert!(objects.iter().all(|o| o.tenant.as_deref() == Some("t1")));
        assert!(objects.iter().all(|o| o.collection == "Docs"));
    }

    #[test]
    fn test_load_batch_rejects_non_arrays() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"{"text": "cats"}"#).unwrap();
        assert!(load_batch(&path, "Docs", None).is_err());

        std::fs::write(&path, r#"[{"properties": {}, "id": 7}]"#).unwrap();
        let err = load_batch(&path, "Docs", None).unwrap_err();
        assert!(format!("{:#}", err).contains("entry 0"));
    }

    #[test]
    fn test_object_table_formats_timestamps() {
        let object: DataObject = serde_json::from_value(json!({
            "id": "id-1",
            "class": "Docs",
            "properties": {"text": "cats"},
            "creationTimeUnix": 1_700_000_000_000i64
        }))
        .unwrap();

        let table = object_table("Docs", &[object]);
        assert_eq!(table.rows[0][1].text, "text=cats");
        assert_eq!(table.rows[0][2].text, "2023-11-14 22:13:20");
    }
}
