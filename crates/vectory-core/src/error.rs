//! Error types for vectory

use thiserror::Error;

/// Result type alias using VectoryError
pub type Result<T> = std::result::Result<T, VectoryError>;

/// Error type alias for convenience
pub type Error = VectoryError;

/// Main error type for vectory
#[derive(Debug, Error)]
pub enum VectoryError {
    /// Non-2xx response from the vector database
    #[error("API Error: {message}")]
    Api { status: u16, message: String },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Shard not found: {0}")]
    ShardNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl VectoryError {
    /// HTTP status carried by an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for the not-found family, including a 404 from the server
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::CollectionNotFound(_) | Self::ObjectNotFound(_) | Self::ShardNotFound(_) => true,
            Self::Api { status, .. } => *status == 404,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = VectoryError::Api {
            status: 422,
            message: "class name is invalid".to_string(),
        };
        assert_eq!(err.to_string(), "API Error: class name is invalid");
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_source_conversions() {
        let io: VectoryError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(io, VectoryError::Io(_)));

        let json: VectoryError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(json, VectoryError::Serialization(_)));

        let yaml: VectoryError = serde_yaml::from_str::<u64>("[").unwrap_err().into();
        assert!(matches!(yaml, VectoryError::Yaml(_)));

        let other: VectoryError = anyhow::anyhow!("batch failed").into();
        assert_eq!(other.to_string(), "batch failed");
    }

    #[test]
    fn test_not_found_family() {
        assert!(VectoryError::ObjectNotFound("x".into()).is_not_found());
        assert!(VectoryError::ShardNotFound("s".into()).is_not_found());
        assert!(VectoryError::Api {
            status: 404,
            message: "404 Not Found".into()
        }
        .is_not_found());
        assert!(!VectoryError::InvalidInput("bad".into()).is_not_found());
    }
}
