//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vectory_core::search::{DEFAULT_ALPHA, DEFAULT_LIMIT};
use vectory_core::ConfigOverrides;

#[derive(Parser)]
#[command(name = "vectory")]
#[command(
    author,
    version,
    about = "Inspect and search a vector database from the command line"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Connection settings; these win over the config file and environment
#[derive(Args, Clone, Default)]
pub struct ConnectionArgs {
    /// HTTP host of the vector database
    #[arg(long, global = true)]
    pub http_host: Option<String>,

    /// HTTP port of the vector database
    #[arg(long, global = true)]
    pub http_port: Option<String>,

    /// gRPC host of the vector database
    #[arg(long, global = true)]
    pub grpc_host: Option<String>,

    /// gRPC port of the vector database
    #[arg(long, global = true)]
    pub grpc_port: Option<String>,

    /// API key for authentication
    #[arg(long, global = true)]
    pub api_key: Option<String>,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            http_host: self.http_host.clone(),
            http_port: self.http_port.clone(),
            grpc_host: self.grpc_host.clone(),
            grpc_port: self.grpc_port.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check vector database health
    Health(HealthArgs),

    /// Inspect and delete schemas
    Schema(SchemaArgs),

    /// Inspect collections, shards and replication
    Collection(CollectionArgs),

    /// Manage objects
    Objects(ObjectsArgs),

    /// Search objects
    Search(SearchArgs),
}

#[derive(Args)]
pub struct HealthArgs {
    #[command(subcommand)]
    pub action: Option<HealthAction>,
}

#[derive(Subcommand, Clone, Copy)]
pub enum HealthAction {
    /// Check liveness
    Live,
    /// Check readiness
    Ready,
    /// Show both checks as a table
    Status,
}

#[derive(Args)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub action: SchemaAction,
}

#[derive(Subcommand)]
pub enum SchemaAction {
    /// List all schemas
    #[command(alias = "ls")]
    List,
    /// Show one schema
    Get { name: String },
    /// Delete a schema and all its objects
    #[command(alias = "rm")]
    Delete {
        name: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub action: CollectionAction,
}

#[derive(Subcommand)]
pub enum CollectionAction {
    /// List collections with object counts
    #[command(alias = "ls")]
    List,
    /// Show collection details
    Info { name: String },
    /// Delete a collection and all its objects
    #[command(alias = "rm")]
    Delete {
        name: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Show replication settings and replica placement
    Replication { name: String },
    /// Show shards
    Shards {
        name: String,
        /// Include replicas and metrics
        #[arg(long)]
        detailed: bool,
        /// Show a single shard
        #[arg(long)]
        shard: Option<String>,
    },
}

#[derive(Args)]
pub struct ObjectsArgs {
    #[command(subcommand)]
    pub action: ObjectsAction,
}

/// Object properties given inline or from a file
#[derive(Args, Clone)]
pub struct PropertiesInput {
    /// Properties as a JSON object
    #[arg(short, long, conflicts_with = "file")]
    pub properties: Option<String>,

    /// JSON file holding the properties
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ObjectsAction {
    /// List objects in a collection
    #[command(alias = "ls")]
    List {
        collection: String,
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
        #[arg(short, long)]
        tenant: Option<String>,
    },
    /// Show one object
    Get {
        collection: String,
        id: String,
        #[arg(short, long)]
        tenant: Option<String>,
    },
    /// Create an object
    Create {
        collection: String,
        #[command(flatten)]
        input: PropertiesInput,
        /// Object id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long)]
        tenant: Option<String>,
    },
    /// Replace an object's properties
    Update {
        collection: String,
        id: String,
        #[command(flatten)]
        input: PropertiesInput,
        #[arg(short, long)]
        tenant: Option<String>,
    },
    /// Delete an object
    #[command(alias = "rm")]
    Delete {
        collection: String,
        id: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
        #[arg(short, long)]
        tenant: Option<String>,
    },
    /// Count objects in a collection
    Count {
        collection: String,
        #[arg(short, long)]
        tenant: Option<String>,
    },
    /// Import objects from a JSON array file
    Batch {
        collection: String,
        file: PathBuf,
        #[arg(short, long)]
        tenant: Option<String>,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub action: SearchAction,
}

/// Options shared by every search mode
#[derive(Args, Clone)]
pub struct SearchCommon {
    /// Number of results
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    #[arg(short, long)]
    pub tenant: Option<String>,

    /// Properties to return (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub return_properties: Vec<String>,
}

#[derive(Subcommand)]
pub enum SearchAction {
    /// Text search (semantic when the collection has a vectorizer)
    Text {
        collection: String,
        query: String,
        /// Filter as JSON
        #[arg(short, long)]
        filter: Option<String>,
        /// JSON file holding a query vector
        #[arg(long)]
        vector_file: Option<PathBuf>,
        #[command(flatten)]
        common: SearchCommon,
    },
    /// Hybrid vector and keyword search
    Hybrid {
        collection: String,
        query: String,
        /// Weight of the vector score (0 = keyword only, 1 = vector only)
        #[arg(short, long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,
        /// rankedFusion or relativeScoreFusion
        #[arg(long, default_value = "rankedFusion")]
        fusion_type: String,
        /// Properties to search in (comma separated)
        #[arg(long, value_delimiter = ',')]
        properties: Vec<String>,
        /// Filter as JSON
        #[arg(short, long)]
        filter: Option<String>,
        /// JSON file holding a query vector
        #[arg(long)]
        vector_file: Option<PathBuf>,
        #[command(flatten)]
        common: SearchCommon,
    },
    /// Nearest-neighbour search with a query vector
    Vector {
        collection: String,
        /// JSON file holding the query vector
        vector_file: PathBuf,
        /// Filter as JSON
        #[arg(short, long)]
        filter: Option<String>,
        #[command(flatten)]
        common: SearchCommon,
    },
    /// Filter-only search
    Filter {
        collection: String,
        /// Filter as JSON
        filter: String,
        #[command(flatten)]
        common: SearchCommon,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
    Csv,
}
