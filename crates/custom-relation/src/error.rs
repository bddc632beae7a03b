//! Error types for custom relations
//!
//! The relation core raises almost nothing of its own: query, connection and
//! hydration failures come from the collaborators and are carried through
//! `ModelError` unchanged. The one local failure is asking the eager-load
//! registry for a relation name it does not know.

/// Result type alias for model and relation operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for model, query and relation operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(String),

    /// Query building or execution error
    #[error("Query error: {0}")]
    Query(String),

    /// Connection pool error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row hydration or value conversion error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested column is missing from a result row
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// No eager loader is registered under this name
    #[error("Relation '{relation}' is not registered on model '{model}'")]
    RelationNotFound { model: String, relation: String },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
