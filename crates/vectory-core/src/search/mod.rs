//! Search over a collection
//!
//! A [`SearchRequest`] names a mode (text, hybrid, vector or filter) plus
//! optional modifiers. [`SearchEngine`] picks a strategy from the request and
//! the collection's schema, renders the typed GraphQL query or runs the
//! client-side emulation, and returns a uniform [`SearchOutcome`].

mod engine;
mod fallback;
mod fields;
mod normalize;

pub use crate::graphql::FusionType;
pub use engine::{plan_strategy, SearchEngine};
pub use fallback::{filter_matches, FALLBACK_SCAN_LIMIT};
pub use fields::{additional_fields, select_fields, PRIORITY_FIELDS};

use crate::graphql::WhereFilter;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Parameters of a hybrid (vector + keyword) search
#[derive(Debug, Clone, PartialEq)]
pub struct HybridParams {
    pub query: String,
    /// Passed through as given; the server enforces the range
    pub alpha: f64,
    /// Checked against [`FusionType::ACCEPTED`] before anything is sent
    pub fusion_type: String,
    /// Restrict keyword matching to these properties
    pub properties: Vec<String>,
}

impl HybridParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            alpha: DEFAULT_ALPHA,
            fusion_type: FusionType::default().to_string(),
            properties: Vec::new(),
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn fusion_type(mut self, fusion_type: impl Into<String>) -> Self {
        self.fusion_type = fusion_type.into();
        self
    }

    pub fn properties(mut self, properties: Vec<String>) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    Text { query: String },
    Hybrid(HybridParams),
    /// Requires [`SearchRequest::vector`]
    Vector,
    /// Requires [`SearchRequest::filter`]
    Filter,
}

impl SearchMode {
    /// Query text to match, if the mode has one
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Text { query } => Some(query),
            Self::Hybrid(params) => Some(&params.query),
            Self::Vector | Self::Filter => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Hybrid(_) => "hybrid",
            Self::Vector => "vector",
            Self::Filter => "filter",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub collection: String,
    pub mode: SearchMode,
    pub vector: Option<Vec<f32>>,
    pub filter: Option<WhereFilter>,
    pub limit: usize,
    pub tenant: Option<String>,
    /// Empty means "pick from the schema"
    pub return_properties: Vec<String>,
}

impl SearchRequest {
    pub fn new(collection: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            collection: collection.into(),
            mode,
            vector: None,
            filter: None,
            limit: DEFAULT_LIMIT,
            tenant: None,
            return_properties: Vec::new(),
        }
    }

    pub fn text(collection: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(collection, SearchMode::Text { query: query.into() })
    }

    pub fn hybrid(collection: impl Into<String>, params: HybridParams) -> Self {
        Self::new(collection, SearchMode::Hybrid(params))
    }

    pub fn vector(collection: impl Into<String>, vector: Vec<f32>) -> Self {
        Self::new(collection, SearchMode::Vector).with_vector(Some(vector))
    }

    pub fn filter(collection: impl Into<String>, filter: WhereFilter) -> Self {
        Self::new(collection, SearchMode::Filter).with_filter(Some(filter))
    }

    pub fn with_vector(mut self, vector: Option<Vec<f32>>) -> Self {
        self.vector = vector;
        self
    }

    pub fn with_filter(mut self, filter: Option<WhereFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant.filter(|t| !t.is_empty());
        self
    }

    pub fn with_return_properties(mut self, properties: Vec<String>) -> Self {
        self.return_properties = properties;
        self
    }
}

/// How a search was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    NearVector,
    HybridVector,
    NearText,
    Hybrid,
    Where,
    ClientSide,
}

impl SearchStrategy {
    pub fn uses_graphql(&self) -> bool {
        !matches!(self, Self::ClientSide)
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NearVector => "nearVector",
            Self::HybridVector => "hybrid+vector",
            Self::NearText => "nearText",
            Self::Hybrid => "hybrid",
            Self::Where => "where",
            Self::ClientSide => "client-side",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HitMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certainty: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub additional: HitMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub objects: Vec<SearchHit>,
    /// GraphQL-level errors, joined one per line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub strategy: SearchStrategy,
}

impl SearchOutcome {
    pub fn hits(strategy: SearchStrategy, objects: Vec<SearchHit>) -> Self {
        Self {
            objects,
            error: None,
            strategy,
        }
    }

    pub fn failed(strategy: SearchStrategy, error: String) -> Self {
        Self {
            objects: Vec::new(),
            error: Some(error),
            strategy,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
