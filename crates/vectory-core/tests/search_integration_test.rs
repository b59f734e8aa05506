//! Search scenarios driven through the in-memory transport
//!
//! Tests:
//! 1. Client-side substring search on a collection without a vectorizer
//! 2. Vector-bearing queries whenever a vector is supplied
//! 3. Fusion type rejected before any request
//! 4. GraphQL errors returned as data
//! 5. Field selection from the schema
//! 6. Tenant sent at the top level of the GraphQL body
//! 7. Partial GraphQL error entries and unreadable fallback records

use serde_json::{json, Value};
use std::sync::Arc;
use vectory_core::transport::Method;
use vectory_core::{
    HybridParams, MockTransport, SearchRequest, SearchStrategy, VectoryClient, VectoryError,
    WhereFilter,
};

fn schema_with(vectorizer: &str) -> Value {
    json!({"classes": [{
        "class": "Docs",
        "vectorizer": vectorizer,
        "properties": [
            {"name": "text", "dataType": ["text"]},
            {"name": "full_path", "dataType": ["text"]},
            {"name": "year", "dataType": ["int"]}
        ]
    }]})
}

fn pets() -> Value {
    json!({"objects": [
        {"id": "id-1", "class": "Docs", "properties": {"text": "cats", "year": 2001}},
        {"id": "id-2", "class": "Docs", "properties": {"text": "dogs", "year": 2002}},
        {"id": "id-3", "class": "Docs", "properties": {"text": "Cats and dogs", "year": 2003}}
    ]})
}

fn setup(vectorizer: &str) -> (Arc<MockTransport>, VectoryClient) {
    let mock = Arc::new(MockTransport::new());
    mock.respond(Method::GET, "schema", schema_with(vectorizer));
    let client = VectoryClient::with_transport(mock.clone());
    (mock, client)
}

fn sent_query(mock: &MockTransport) -> String {
    let requests = mock.requests_to("graphql");
    assert_eq!(requests.len(), 1, "expected exactly one GraphQL request");
    requests[0].body.as_ref().unwrap()["query"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_text_search_without_vectorizer() {
    let (mock, client) = setup("none");
    mock.respond(Method::GET, "objects", pets());

    let outcome = client
        .search
        .search(&SearchRequest::text("Docs", "cats"))
        .await
        .unwrap();

    assert_eq!(outcome.strategy, SearchStrategy::ClientSide);
    let ids: Vec<_> = outcome.objects.iter().map(|o| o.id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["id-1", "id-3"]);
    assert!(outcome.objects.iter().all(|o| o.additional.score == Some(1.0)));

    let listings = mock.requests_to("objects");
    assert_eq!(listings[0].query_param("limit"), Some("1000"));
    assert!(mock.requests_to("graphql").is_empty());
}

#[tokio::test]
async fn test_fallback_respects_limit_and_filter() {
    let (mock, client) = setup("none");
    mock.respond(Method::GET, "objects", pets());

    let filter = WhereFilter::parse(
        r#"{"path": ["year"], "operator": "GreaterThan", "valueInt": 2001}"#,
    )
    .unwrap();
    let outcome = client
        .search
        .search(
            &SearchRequest::hybrid("Docs", HybridParams::new("dogs"))
                .with_filter(Some(filter.clone()))
                .with_limit(1),
        )
        .await
        .unwrap();
    assert_eq!(outcome.objects.len(), 1);
    assert_eq!(outcome.objects[0].id.as_deref(), Some("id-2"));

    let filtered = client
        .search
        .search(&SearchRequest::filter("Docs", filter))
        .await
        .unwrap();
    assert_eq!(filtered.objects.len(), 2);
    assert!(filtered.objects.iter().all(|o| o.additional.score.is_none()));
}

#[tokio::test]
async fn test_supplied_vector_always_uses_vector_clause() {
    for vectorizer in ["none", "text2vec-openai"] {
        let (mock, client) = setup(vectorizer);
        mock.respond(Method::POST, "graphql", json!({"data": {"Get": {"Docs": []}}}));

        let outcome = client
            .search
            .search(&SearchRequest::text("Docs", "cats").with_vector(Some(vec![0.1, 0.2])))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, SearchStrategy::NearVector);
        assert!(sent_query(&mock).contains("nearVector: {vector: [0.1, 0.2]}"));
    }

    let (mock, client) = setup("none");
    mock.respond(Method::POST, "graphql", json!({"data": {"Get": {"Docs": []}}}));
    let request = SearchRequest::hybrid(
        "Docs",
        HybridParams::new("cats").properties(vec!["text".into()]),
    )
    .with_vector(Some(vec![1.0]));
    let outcome = client.search.search(&request).await.unwrap();

    assert_eq!(outcome.strategy, SearchStrategy::HybridVector);
    let query = sent_query(&mock);
    assert!(query.contains("hybrid: {"));
    assert!(query.contains("vector: [1.0]"));
    assert!(query.contains(r#"properties: ["text"]"#));
}

#[tokio::test]
async fn test_invalid_hybrid_params_send_nothing() {
    let (mock, client) = setup("text2vec-openai");

    let err = client
        .search
        .search(&SearchRequest::hybrid(
            "Docs",
            HybridParams::new("cats").fusion_type("rrf"),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, VectoryError::InvalidInput(_)));
    assert_eq!(mock.request_count(), 0);

    let err = client
        .search
        .search(&SearchRequest::hybrid(
            "Docs",
            HybridParams::new("cats").alpha(f64::NAN),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, VectoryError::InvalidInput(_)));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_graphql_errors_are_returned() {
    let (mock, client) = setup("text2vec-openai");
    mock.respond(
        Method::POST,
        "graphql",
        json!({"errors": [{
            "message": "Cannot query field \"nope\" on type \"Docs\".",
            "locations": [{"line": 9, "column": 7}]
        }]}),
    );

    let outcome = client
        .search
        .search(
            &SearchRequest::hybrid("Docs", HybridParams::new("cats"))
                .with_return_properties(vec!["nope".into()]),
        )
        .await
        .unwrap();

    assert!(outcome.objects.is_empty());
    let error = outcome.error.unwrap();
    assert!(error.starts_with("GraphQL error at line 9, column 7:"));
}

#[tokio::test]
async fn test_semantic_queries_select_schema_fields() {
    let (mock, client) = setup("text2vec-openai");
    mock.respond(
        Method::POST,
        "graphql",
        json!({"data": {"Get": {"Docs": [
            {"text": "cats", "full_path": "/a.md", "_additional": {"id": "id-1", "distance": "0.12"}}
        ]}}}),
    );

    let outcome = client
        .search
        .search(&SearchRequest::text("Docs", "felines").with_limit(3))
        .await
        .unwrap();

    assert_eq!(outcome.strategy, SearchStrategy::NearText);
    assert_eq!(outcome.objects[0].id.as_deref(), Some("id-1"));
    assert_eq!(outcome.objects[0].additional.distance, Some(0.12));
    assert_eq!(outcome.objects[0].properties["full_path"], "/a.md");

    let query = sent_query(&mock);
    assert!(query.contains(r#"nearText: {concepts: ["felines"]}"#));
    assert!(query.contains("limit: 3"));
    assert!(query.contains("      text\n      full_path\n"));
    assert!(!query.contains("chunk_index"));
}

#[tokio::test]
async fn test_tenant_and_filter_in_graphql_request() {
    let (mock, client) = setup("text2vec-openai");
    mock.respond(Method::POST, "graphql", json!({"data": {"Get": {"Docs": []}}}));

    let filter = WhereFilter::parse(
        r#"{"path": ["text"], "operator": "Equal", "valueText": "x\" } evil {"}"#,
    )
    .unwrap();
    client
        .search
        .search(&SearchRequest::filter("Docs", filter).with_tenant(Some("tenantA".into())))
        .await
        .unwrap();

    let requests = mock.requests_to("graphql");
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["tenant"], "tenantA");
    let query = body["query"].as_str().unwrap();
    assert!(query.contains(r#"valueText: "x\" } evil {""#));
    assert!(!query.contains("tenant"));
}

#[tokio::test]
async fn test_missing_schema_still_searches() {
    let mock = Arc::new(MockTransport::new());
    mock.fail(Method::GET, "schema", 500, "schema unavailable")
        .respond(Method::GET, "objects", pets());
    let client = VectoryClient::with_transport(mock.clone());

    let outcome = client
        .search
        .search(&SearchRequest::text("Docs", "dogs"))
        .await
        .unwrap();
    assert_eq!(outcome.strategy, SearchStrategy::ClientSide);
    assert_eq!(outcome.objects.len(), 2);
}

#[tokio::test]
async fn test_partial_graphql_errors_are_returned() {
    for (body, expected) in [
        (
            json!({"errors": [{"message": "bad field", "locations": [{"line": 3}]}]}),
            "GraphQL error at line 3, column ?: bad field",
        ),
        (
            json!({"errors": [{"message": null}]}),
            "GraphQL error: Unknown error",
        ),
    ] {
        let (mock, client) = setup("text2vec-openai");
        mock.respond(Method::POST, "graphql", body);

        let outcome = client
            .search
            .search(&SearchRequest::text("Docs", "cats"))
            .await
            .unwrap();

        assert!(outcome.objects.is_empty());
        assert_eq!(outcome.error.as_deref(), Some(expected));
    }
}

#[tokio::test]
async fn test_fallback_skips_unreadable_records() {
    let (mock, client) = setup("none");
    mock.respond(
        Method::GET,
        "objects",
        json!({"objects": [
            {"id": "id-1", "class": "Docs", "properties": {"text": "cats"}, "creationTimeUnix": "1700000000000"},
            {"id": ["not", "an", "id"], "class": "Docs", "properties": {"text": "cats too"}},
            {"id": "id-3", "class": "Docs", "properties": {"text": "more cats"}, "vector": ["x"]}
        ]}),
    );

    let outcome = client
        .search
        .search(&SearchRequest::text("Docs", "cats"))
        .await
        .unwrap();

    let ids: Vec<_> = outcome.objects.iter().map(|o| o.id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["id-1", "id-3"]);
}
