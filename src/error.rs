//! Application error types.

use thiserror::Error;

/// Errors raised while building, compiling, or executing graph queries.
///
/// Mapping errors are raised while a predicate or fragments bundle is being
/// assembled, before anything reaches the database. Driver errors are passed
/// through untouched and never retried.
#[derive(Error, Debug)]
pub enum AppError {
    // Driver errors
    #[error("Neo4j connection error: {0}")]
    Connection(#[from] neo4rs::Error),

    #[error("Cypher query error: {message}")]
    Query { message: String, query: String },

    #[error("Failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },

    // Mapping errors
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error("No mapped property '{path}' on {entity}")]
    MappingResolution { entity: String, path: String },

    #[error("Invalid example: {0}")]
    InvalidExample(String),

    // Execution errors
    #[error("Query for {entity} returned more than one result")]
    NonUniqueResult { entity: String },

    #[error("Statement returned more than one row: {query}")]
    NonUniqueRow { query: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true for errors caused by an example or sort that does not
    /// fit the mapping.
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self,
            AppError::UnknownEntity(_)
                | AppError::MappingResolution { .. }
                | AppError::InvalidExample(_)
        )
    }
}
