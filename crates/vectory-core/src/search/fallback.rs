//! Client-side search for collections without a vectorizer

use super::{HitMetadata, SearchHit, SearchMode, SearchRequest};
use crate::error::Result;
use crate::graphql::{FilterOperator, FilterValue, WhereFilter};
use crate::objects::ObjectsClient;
use crate::schema::CollectionSchema;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Upper bound on objects scanned per search
pub const FALLBACK_SCAN_LIMIT: usize = 1000;

const MATCH_SCORE: f64 = 1.0;

/// Properties searched for the query text
fn text_fields(request: &SearchRequest, schema: Option<&CollectionSchema>) -> Vec<String> {
    if let SearchMode::Hybrid(params) = &request.mode {
        if !params.properties.is_empty() {
            return params.properties.clone();
        }
    }

    let declared = schema.map(CollectionSchema::text_properties).unwrap_or_default();
    if declared.is_empty() {
        vec!["text".to_string()]
    } else {
        declared
    }
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|item| contains_text(item, needle)),
        _ => false,
    }
}

pub(crate) async fn search(
    objects: &ObjectsClient,
    request: &SearchRequest,
    schema: Option<&CollectionSchema>,
) -> Result<Vec<SearchHit>> {
    let candidates = objects
        .list_objects(
            &request.collection,
            FALLBACK_SCAN_LIMIT,
            0,
            request.tenant.as_deref(),
        )
        .await?;

    let needle = request.mode.query().map(str::to_lowercase);
    let fields = text_fields(request, schema);
    tracing::debug!(
        "client-side search over {} objects in {}, fields {:?}",
        candidates.len(),
        request.collection,
        fields
    );

    let hits = candidates
        .into_iter()
        .filter(|object| {
            request
                .filter
                .as_ref()
                .map_or(true, |f| filter_matches(f, &object.properties))
        })
        .filter(|object| match needle {
            Some(ref needle) => fields
                .iter()
                .filter_map(|field| object.properties.get(field))
                .any(|value| contains_text(value, needle)),
            None => true,
        })
        .take(request.limit)
        .map(|object| SearchHit {
            id: Some(object.id),
            properties: project(object.properties, &request.return_properties),
            additional: HitMetadata {
                score: needle.as_ref().map(|_| MATCH_SCORE),
                ..Default::default()
            },
        })
        .collect();

    Ok(hits)
}

fn project(properties: Map<String, Value>, keep: &[String]) -> Map<String, Value> {
    if keep.is_empty() {
        return properties;
    }
    properties
        .into_iter()
        .filter(|(key, _)| keep.contains(key))
        .collect()
}

/// Evaluate a filter tree against one object's properties
///
/// Strings compare case-insensitively. Array properties match when any
/// element does. `Like` strips `*` and `?` and tests for a substring.
pub fn filter_matches(filter: &WhereFilter, properties: &Map<String, Value>) -> bool {
    match filter.operator {
        FilterOperator::And => filter.operands.iter().all(|f| filter_matches(f, properties)),
        FilterOperator::Or => filter.operands.iter().any(|f| filter_matches(f, properties)),
        op => {
            let actual = filter
                .path
                .first()
                .and_then(|p| properties.get(p))
                .unwrap_or(&Value::Null);
            match filter.value {
                Some(ref expected) => compare_leaf(op, actual, expected),
                None => false,
            }
        }
    }
}

fn compare_leaf(op: FilterOperator, actual: &Value, expected: &FilterValue) -> bool {
    let expected = expected.to_json();
    match op {
        FilterOperator::IsNull => actual.is_null() == expected.as_bool().unwrap_or(true),
        FilterOperator::Equal => elements(actual).any(|a| scalar_eq(a, &expected)),
        FilterOperator::NotEqual => !elements(actual).any(|a| scalar_eq(a, &expected)),
        FilterOperator::GreaterThan => ordered(actual, &expected, |o| o == Ordering::Greater),
        FilterOperator::GreaterThanEqual => ordered(actual, &expected, |o| o != Ordering::Less),
        FilterOperator::LessThan => ordered(actual, &expected, |o| o == Ordering::Less),
        FilterOperator::LessThanEqual => ordered(actual, &expected, |o| o != Ordering::Greater),
        FilterOperator::Like => match expected.as_str() {
            Some(pattern) => {
                let needle = pattern.replace(['*', '?'], "").to_lowercase();
                contains_text(actual, &needle)
            }
            None => false,
        },
        FilterOperator::ContainsAny => {
            elements(&expected).any(|e| elements(actual).any(|a| scalar_eq(a, e)))
        }
        FilterOperator::ContainsAll => {
            elements(&expected).all(|e| elements(actual).any(|a| scalar_eq(a, e)))
        }
        FilterOperator::And | FilterOperator::Or => false,
    }
}

fn elements(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Null => Box::new(std::iter::empty()),
        other => Box::new(std::iter::once(other)),
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.to_lowercase() == y.to_lowercase(),
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn ordered<F>(actual: &Value, expected: &Value, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    elements(actual).any(|a| ordering(a, expected).map_or(false, &accept))
}
