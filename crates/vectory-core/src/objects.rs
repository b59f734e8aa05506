//! Object accessor: CRUD, batch import and counts

use crate::error::{Result, VectoryError};
use crate::graphql::{self, AggregateQuery, GraphQlRequest};
use crate::transport::{ApiRequest, Method, Transport};
use crate::wire::{lenient_i64, lenient_vector, null_default, value_as_u64};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A stored object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataObject {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "class", default)]
    pub collection: String,

    #[serde(default, deserialize_with = "null_default")]
    pub properties: Map<String, Value>,

    #[serde(default, deserialize_with = "lenient_vector", skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,

    /// Epoch milliseconds
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub creation_time_unix: Option<i64>,

    /// Epoch milliseconds
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub last_update_time_unix: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional: Option<Value>,
}

/// Object to create; an id is generated when none is given
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NewObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "class")]
    pub collection: String,

    pub properties: Map<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl NewObject {
    pub fn new(collection: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            properties,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id.filter(|s| !s.is_empty());
        self
    }

    pub fn with_tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant.filter(|s| !s.is_empty());
        self
    }

    pub fn with_vector(mut self, vector: Option<Vec<f32>>) -> Self {
        self.vector = vector;
        self
    }

    /// Fill in a random UUID if no id was given
    pub fn ensure_id(&mut self) -> &str {
        self.id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .as_str()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Success,
    Failed,
}

/// Per-object outcome of a batch import
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchResult {
    pub id: Option<String>,
    pub status: BatchStatus,
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Success
    }

    fn from_json(value: &Value) -> Self {
        let id = value.get("id").and_then(Value::as_str).map(str::to_string);
        let result = value.get("result");
        let status = result
            .and_then(|r| r.get("status"))
            .and_then(Value::as_str);

        let errors: Vec<String> = result
            .and_then(|r| r.get("errors"))
            .and_then(|e| e.get("error"))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|err| match err.get("message") {
                        Some(Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                        None => err.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let ok = match status {
            Some(s) => s == "SUCCESS",
            None => errors.is_empty(),
        };

        Self {
            id,
            status: if ok {
                BatchStatus::Success
            } else {
                BatchStatus::Failed
            },
            errors,
        }
    }
}

/// Succeeded and failed counts
pub fn tally(results: &[BatchResult]) -> (usize, usize) {
    let ok = results.iter().filter(|r| r.is_success()).count();
    (ok, results.len() - ok)
}

pub(crate) fn object_path(collection: &str, id: &str) -> String {
    format!(
        "objects/{}/{}",
        urlencoding::encode(collection),
        urlencoding::encode(id)
    )
}

/// Object-level operations on one database
#[derive(Clone)]
pub struct ObjectsClient {
    transport: Arc<dyn Transport>,
}

impl ObjectsClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Page through a collection
    pub async fn list_objects(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
        tenant: Option<&str>,
    ) -> Result<Vec<DataObject>> {
        let request = ApiRequest::new(Method::GET, "objects")
            .with_query("class", collection)
            .with_query("limit", limit)
            .with_query("offset", offset)
            .with_optional_query("tenant", tenant);

        let mut response = self.transport.send(request).await?;
        match response.get_mut("objects").map(Value::take) {
            Some(Value::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<DataObject>(item) {
                    Ok(object) => Some(object),
                    Err(e) => {
                        tracing::warn!("skipping unreadable object in {}: {}", collection, e);
                        None
                    }
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn get_object(
        &self,
        collection: &str,
        id: &str,
        tenant: Option<&str>,
    ) -> Result<DataObject> {
        let request = ApiRequest::new(Method::GET, object_path(collection, id))
            .with_optional_query("tenant", tenant);

        let response = match self.transport.send(request).await {
            Ok(value) => value,
            Err(e) if e.status() == Some(404) => {
                return Err(VectoryError::ObjectNotFound(id.to_string()))
            }
            Err(e) => return Err(e),
        };

        if response.as_object().map_or(true, Map::is_empty) {
            return Err(VectoryError::ObjectNotFound(id.to_string()));
        }
        Ok(serde_json::from_value(response)?)
    }

    pub async fn create_object(&self, mut object: NewObject) -> Result<DataObject> {
        object.ensure_id();
        let response = self
            .transport
            .post("objects", serde_json::to_value(&object)?)
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Replace an object's properties (PUT, not merge)
    pub async fn update_object(
        &self,
        collection: &str,
        id: &str,
        properties: Map<String, Value>,
        tenant: Option<&str>,
    ) -> Result<DataObject> {
        let mut body = serde_json::json!({
            "class": collection,
            "id": id,
            "properties": properties,
        });
        if let Some(tenant) = tenant {
            body["tenant"] = Value::from(tenant);
        }

        let request = ApiRequest::new(Method::PUT, object_path(collection, id))
            .with_optional_query("tenant", tenant)
            .with_body(body);

        let response = match self.transport.send(request).await {
            Ok(value) => value,
            Err(e) if e.status() == Some(404) => {
                return Err(VectoryError::ObjectNotFound(id.to_string()))
            }
            Err(e) => return Err(e),
        };
        Ok(serde_json::from_value(response)?)
    }

    pub async fn delete_object(&self, collection: &str, id: &str, tenant: Option<&str>) -> Result<()> {
        let request = ApiRequest::new(Method::DELETE, object_path(collection, id))
            .with_optional_query("tenant", tenant);

        match self.transport.send(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(404) => Err(VectoryError::ObjectNotFound(id.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Submit all objects in one request and report each outcome
    pub async fn batch_create(&self, mut objects: Vec<NewObject>) -> Result<Vec<BatchResult>> {
        for object in &mut objects {
            object.ensure_id();
        }

        let response = self
            .transport
            .post("batch/objects", serde_json::json!({ "objects": objects }))
            .await?;

        let results: Vec<BatchResult> = match response {
            Value::Array(items) => items.iter().map(BatchResult::from_json).collect(),
            other => {
                tracing::warn!("batch response is not a list: {}", other);
                return Err(VectoryError::Other(anyhow::anyhow!(
                    "batch import returned no per-object results"
                )));
            }
        };

        let (ok, failed) = tally(&results);
        tracing::debug!("batch import: {} succeeded, {} failed", ok, failed);
        Ok(results)
    }

    /// Object count via an aggregate query
    ///
    /// A response without a usable count is 0. Transport failures and
    /// invalid collection names are errors.
    pub async fn get_collection_count(&self, collection: &str, tenant: Option<&str>) -> Result<u64> {
        let query = AggregateQuery::count(collection, tenant).render()?;
        let response = graphql::execute(self.transport.as_ref(), &GraphQlRequest::new(query)).await?;

        if let Some(error) = response.error_text() {
            tracing::debug!("count query for {} returned errors: {}", collection, error);
        }

        Ok(response
            .data
            .as_ref()
            .and_then(|d| d.get("Aggregate"))
            .and_then(|a| a.get(collection))
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.get("meta"))
            .and_then(|meta| meta.get("count"))
            .and_then(value_as_u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;

    fn client_with(mock: &Arc<MockTransport>) -> ObjectsClient {
        ObjectsClient::new(mock.clone())
    }

    #[tokio::test]
    async fn test_list_objects_query_params() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::GET,
            "objects",
            json!({"objects": [
                {"id": "a", "class": "Docs", "properties": {"text": "cats"}, "creationTimeUnix": 1700000000000i64},
                {"id": "b", "class": "Docs", "properties": null}
            ]}),
        );

        let objects = client_with(&mock)
            .list_objects("Docs", 5, 10, Some("t1"))
            .await
            .unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].properties["text"], "cats");
        assert_eq!(objects[0].creation_time_unix, Some(1700000000000));
        assert!(objects[1].properties.is_empty());

        let requests = mock.requests();
        let sent = &requests[0];
        assert_eq!(sent.query_param("class"), Some("Docs"));
        assert_eq!(sent.query_param("limit"), Some("5"));
        assert_eq!(sent.query_param("offset"), Some("10"));
        assert_eq!(sent.query_param("tenant"), Some("t1"));
    }

    #[tokio::test]
    async fn test_list_objects_missing_key() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::GET, "objects", json!({}));
        let objects = client_with(&mock).list_objects("Docs", 10, 0, None).await.unwrap();
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn test_get_object_not_found() {
        let mock = Arc::new(MockTransport::new());
        mock.fail(Method::GET, "objects/Docs/missing", 404, "404 Not Found");

        let err = client_with(&mock)
            .get_object("Docs", "missing", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VectoryError::ObjectNotFound(ref id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_get_object_empty_body_is_not_found() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::GET, "objects/Docs/x", json!({}));
        let err = client_with(&mock).get_object("Docs", "x", None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_generates_id() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::POST,
            "objects",
            json!({"id": "generated", "class": "Docs", "properties": {"text": "hi"}}),
        );

        let mut props = Map::new();
        props.insert("text".into(), json!("hi"));
        client_with(&mock)
            .create_object(NewObject::new("Docs", props))
            .await
            .unwrap();

        let body = mock.requests()[0].body.clone().unwrap();
        let id = body["id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(body["class"], "Docs");
    }

    #[tokio::test]
    async fn test_update_is_full_replace() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::PUT,
            "objects/Docs/abc",
            json!({"id": "abc", "class": "Docs", "properties": {"text": "new"}}),
        );

        let mut props = Map::new();
        props.insert("text".into(), json!("new"));
        let updated = client_with(&mock)
            .update_object("Docs", "abc", props, Some("t1"))
            .await
            .unwrap();

        assert_eq!(updated.properties["text"], "new");
        let requests = mock.requests();
        let sent = &requests[0];
        assert_eq!(sent.method, Method::PUT);
        assert_eq!(sent.query_param("tenant"), Some("t1"));
        assert_eq!(
            sent.body.as_ref().unwrap(),
            &json!({"class": "Docs", "id": "abc", "properties": {"text": "new"}, "tenant": "t1"})
        );
    }

    #[tokio::test]
    async fn test_delete_object_encodes_id() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::DELETE, "objects/Docs/a%2Fb", json!({}));
        client_with(&mock).delete_object("Docs", "a/b", None).await.unwrap();
        assert_eq!(mock.requests()[0].path, "objects/Docs/a%2Fb");
    }

    #[tokio::test]
    async fn test_batch_results() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::POST,
            "batch/objects",
            json!([
                {"id": "1", "result": {"status": "SUCCESS"}},
                {"id": "2", "result": {"errors": {"error": [{"message": "bad property"}]}}},
                {"id": "3", "result": {}},
                {"id": "4", "result": {"status": "FAILED"}}
            ]),
        );

        let objects = vec![NewObject::new("Docs", Map::new()); 4];
        let results = client_with(&mock).batch_create(objects).await.unwrap();

        assert_eq!(results.len(), 4);
        assert!(results[0].is_success());
        assert_eq!(results[1].status, BatchStatus::Failed);
        assert_eq!(results[1].errors, vec!["bad property"]);
        assert!(results[2].is_success());
        assert!(!results[3].is_success());
        assert_eq!(tally(&results), (2, 2));

        let body = mock.requests()[0].body.clone().unwrap();
        let sent = body["objects"].as_array().unwrap();
        assert!(sent.iter().all(|o| o["id"].is_string()));
    }

    #[tokio::test]
    async fn test_batch_rejects_non_list_response() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::POST, "batch/objects", json!({"error": "overloaded"}));

        let err = client_with(&mock)
            .batch_create(vec![NewObject::new("Docs", Map::new())])
            .await
            .unwrap_err();
        assert!(matches!(err, VectoryError::Other(_)));
    }

    #[tokio::test]
    async fn test_list_objects_tolerates_odd_records() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::GET,
            "objects",
            json!({"objects": [
                {"id": "a", "class": "Docs", "properties": {"text": "cats"}, "creationTimeUnix": "1700000000000"},
                {"id": "b", "class": "Docs", "properties": {"text": "dogs"}, "vector": [0.5, "x"], "lastUpdateTimeUnix": "soon"},
                {"id": 7, "class": "Docs", "properties": {"text": "birds"}}
            ]}),
        );

        let objects = client_with(&mock)
            .list_objects("Docs", 10, 0, None)
            .await
            .unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].creation_time_unix, Some(1_700_000_000_000));
        assert_eq!(objects[1].properties["text"], "dogs");
        assert!(objects[1].vector.is_none());
        assert!(objects[1].last_update_time_unix.is_none());
    }

    #[tokio::test]
    async fn test_collection_count_with_partial_errors_is_zero() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::POST,
            "graphql",
            json!({"errors": [{"message": "bad field", "locations": [{"line": 3}]}]}),
        );
        let count = client_with(&mock).get_collection_count("Docs", None).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_collection_count() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::POST,
            "graphql",
            json!({"data": {"Aggregate": {"Docs": [{"meta": {"count": 42}}]}}}),
        );
        let count = client_with(&mock).get_collection_count("Docs", None).await.unwrap();
        assert_eq!(count, 42);
    }

    #[tokio::test]
    async fn test_collection_count_silent_zero() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::POST,
            "graphql",
            json!({"data": {"Aggregate": {"Docs": []}}}),
        );
        let count = client_with(&mock)
            .get_collection_count("Docs", Some("other-tenant"))
            .await
            .unwrap();
        assert_eq!(count, 0);

        let query = mock.requests()[0].body.clone().unwrap()["query"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(query.contains(r#"Docs(tenant: "other-tenant")"#));
    }

    #[tokio::test]
    async fn test_collection_count_propagates_transport_failure() {
        let mock = Arc::new(MockTransport::new());
        mock.fail(Method::POST, "graphql", 503, "unavailable");
        let err = client_with(&mock).get_collection_count("Docs", None).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }
}
