//! Configuration management
//!
//! Settings are resolved once per process, in increasing precedence:
//! built-in defaults, the YAML config file, a `.env` file in the working
//! directory, `WEAVIATE_*` environment variables, then explicit overrides
//! (usually CLI flags).

use crate::error::{Result, VectoryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_HTTP_HOST: &str = "localhost";
pub const DEFAULT_HTTP_PORT: &str = "8080";
pub const DEFAULT_GRPC_HOST: &str = "localhost";
pub const DEFAULT_GRPC_PORT: &str = "50051";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "VECTORY_CONFIG";

/// Dotenv file read from the working directory
pub const DOTENV_FILE: &str = ".env";

/// Connection settings for the vector database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: String,

    /// Carried for completeness; the REST/GraphQL client never dials gRPC
    #[serde(default = "default_grpc_host")]
    pub grpc_host: String,

    #[serde(default = "default_grpc_port")]
    pub grpc_port: String,

    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_http_host() -> String {
    DEFAULT_HTTP_HOST.to_string()
}

fn default_http_port() -> String {
    DEFAULT_HTTP_PORT.to_string()
}

fn default_grpc_host() -> String {
    DEFAULT_GRPC_HOST.to_string()
}

fn default_grpc_port() -> String {
    DEFAULT_GRPC_PORT.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            grpc_host: default_grpc_host(),
            grpc_port: default_grpc_port(),
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Explicit values that win over file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub http_host: Option<String>,
    pub http_port: Option<String>,
    pub grpc_host: Option<String>,
    pub grpc_port: Option<String>,
    pub api_key: Option<String>,
}

impl Config {
    /// Load config from the default sources and apply overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);

        let dotenv = read_dotenv(Path::new(DOTENV_FILE));
        let env = layered_env(|key| std::env::var(key).ok(), dotenv);
        Self::resolve(Some(&path), env, overrides)
    }

    /// Resolve from an optional file, an environment lookup and overrides
    pub fn resolve<F>(file: Option<&Path>, env: F, overrides: &ConfigOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Config::default(),
        };

        let env_value = |key: &str| env(key).filter(|v| !v.is_empty());

        if let Some(v) = env_value("WEAVIATE_HTTP_HOST") {
            config.http_host = v;
        }
        if let Some(v) = env_value("WEAVIATE_HTTP_PORT") {
            config.http_port = v;
        }
        if let Some(v) = env_value("WEAVIATE_GRPC_HOST") {
            config.grpc_host = v;
        }
        if let Some(v) = env_value("WEAVIATE_GRPC_PORT") {
            config.grpc_port = v;
        }
        if let Some(v) = env_value("WEAVIATE_API_KEY") {
            config.api_key = Some(v);
        }
        if let Some(v) = env_value("VECTORY_TIMEOUT_SECS") {
            config.timeout_secs = v.parse().map_err(|_| {
                VectoryError::Config(format!("VECTORY_TIMEOUT_SECS is not a number: {}", v))
            })?;
        }

        config.apply(overrides);
        Ok(config)
    }

    /// Read a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply explicit overrides; empty strings are ignored
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                *target = v.to_string();
            }
        }

        set(&mut self.http_host, &overrides.http_host);
        set(&mut self.http_port, &overrides.http_port);
        set(&mut self.grpc_host, &overrides.grpc_host);
        set(&mut self.grpc_port, &overrides.grpc_port);
        if let Some(key) = overrides.api_key.as_deref().filter(|v| !v.is_empty()) {
            self.api_key = Some(key.to_string());
        }
    }

    /// Base URL of the REST API, without a trailing slash
    pub fn api_url(&self) -> String {
        let url = format!("http://{}:{}/v1", self.http_host, self.http_port);
        url.trim_end_matches('/').to_string()
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}

/// Key/value pairs from a dotenv file; a missing file reads as empty
pub fn read_dotenv(path: &Path) -> HashMap<String, String> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            if path.exists() {
                tracing::warn!("ignoring {}: {}", path.display(), e);
            }
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for entry in entries {
        match entry {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => tracing::warn!("skipping entry in {}: {}", path.display(), e),
        }
    }
    vars
}

/// Environment lookup falling back to dotenv values
///
/// A variable that is unset or empty in the process environment takes its
/// dotenv value.
pub fn layered_env<F>(process: F, dotenv: HashMap<String, String>) -> impl Fn(&str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    move |key| {
        process(key)
            .filter(|v| !v.is_empty())
            .or_else(|| dotenv.get(key).cloned())
    }
}
