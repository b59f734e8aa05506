//! Flatten `Get` responses into search hits

use super::{HitMetadata, SearchHit, SearchOutcome, SearchStrategy};
use crate::graphql::GraphQlResponse;
use crate::wire::value_as_f64;
use serde_json::{Map, Value};

/// Errors are checked before data; a response with errors has no hits
pub(crate) fn normalize(
    response: GraphQlResponse,
    collection: &str,
    strategy: SearchStrategy,
) -> SearchOutcome {
    if let Some(error) = response.error_text() {
        return SearchOutcome::failed(strategy, error);
    }

    let rows = response
        .data
        .and_then(|mut data| data.get_mut("Get").map(Value::take))
        .and_then(|mut get| get.get_mut(collection).map(Value::take));

    let hits = match rows {
        Some(Value::Array(rows)) => rows.into_iter().filter_map(to_hit).collect(),
        _ => {
            tracing::debug!("no results for {} in the GraphQL response", collection);
            Vec::new()
        }
    };

    SearchOutcome::hits(strategy, hits)
}

fn to_hit(row: Value) -> Option<SearchHit> {
    let Value::Object(mut properties) = row else {
        return None;
    };

    let additional = match properties.remove("_additional") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let metric = |key: &str| additional.get(key).and_then(value_as_f64);

    Some(SearchHit {
        id: additional
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string),
        additional: HitMetadata {
            score: metric("score"),
            distance: metric("distance"),
            certainty: metric("certainty"),
        },
        properties,
    })
}
