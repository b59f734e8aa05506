//! Vectory Core Library
//!
//! Typed client for a vector database's REST and GraphQL API.
//!
//! # Features
//! - Collection, object, shard and health accessors over one shared transport
//! - Typed GraphQL query builder with escaped literals and validated names
//! - Text, hybrid, vector and filter search with a client-side fallback for
//!   collections that have no vectorizer

pub mod client;
pub mod config;
pub mod error;
pub mod graphql;
pub mod health;
pub mod objects;
pub mod schema;
pub mod search;
pub mod shards;
pub mod transport;
mod wire;

pub use client::VectoryClient;
pub use config::{Config, ConfigOverrides};
pub use error::{Error, Result, VectoryError};
pub use graphql::{FilterOperator, FilterValue, FusionType, GraphQlResponse, WhereFilter};
pub use health::{HealthClient, HealthStatus};
pub use objects::{BatchResult, BatchStatus, DataObject, NewObject, ObjectsClient};
pub use schema::{CollectionSchema, CollectionStats, PropertyDefinition, SchemaClient};
pub use search::{
    HybridParams, SearchEngine, SearchHit, SearchMode, SearchOutcome, SearchRequest,
    SearchStrategy,
};
pub use shards::{ReplicaInfo, ShardInfo, ShardMetrics, ShardStatus, StatusTone};
pub use transport::{HttpTransport, MockTransport, Transport};
pub use wire::{value_as_f64, value_as_u64};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "vectory";
