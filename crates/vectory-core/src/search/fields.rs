//! Return-field selection

use super::SearchStrategy;
use crate::schema::CollectionSchema;

/// Preferred return properties, in order
pub const PRIORITY_FIELDS: [&str; 5] = ["text", "full_path", "chunk_index", "total_chunks", "ts"];

/// Properties to request in a `Get` query
///
/// An explicit selection wins. Otherwise the priority fields the schema
/// declares are used, then its first property. Without a schema nothing but
/// `_additional` is requested.
pub fn select_fields(requested: &[String], schema: Option<&CollectionSchema>) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }

    let Some(schema) = schema else {
        return Vec::new();
    };

    let preferred: Vec<String> = PRIORITY_FIELDS
        .iter()
        .filter(|f| schema.property(f).is_some())
        .map(|f| f.to_string())
        .collect();
    if !preferred.is_empty() {
        return preferred;
    }

    schema
        .properties
        .first()
        .map(|p| vec![p.name.clone()])
        .unwrap_or_default()
}

/// `_additional` fields for a strategy
pub fn additional_fields(strategy: SearchStrategy) -> Vec<String> {
    let extra = match strategy {
        SearchStrategy::Hybrid | SearchStrategy::HybridVector => Some("score"),
        SearchStrategy::NearText | SearchStrategy::NearVector => Some("distance"),
        SearchStrategy::Where | SearchStrategy::ClientSide => None,
    };
    std::iter::once("id")
        .chain(extra)
        .map(str::to_string)
        .collect()
}
