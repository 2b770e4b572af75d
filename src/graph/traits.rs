//! Core trait for graph database access.
//!
//! [`CypherExecutor`] is the only contract a backend has to fulfil. Everything
//! above it (templates, executors, fluent queries) talks to the database
//! exclusively through this trait.

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};

/// Executes Cypher statements against a graph database.
///
/// Implementations own whatever resource a statement needs (a pooled
/// connection, a session) for exactly as long as the returned stream is
/// alive. Dropping the stream, exhausting it, or hitting an error releases
/// the resource.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Executes a Cypher statement and returns a stream of result rows.
    ///
    /// # Arguments
    ///
    /// * `cypher` - The Cypher statement
    /// * `params` - Named parameters referenced as `$name` in the statement
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Executes a Cypher statement and discards any results.
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}

#[async_trait]
impl<E: CypherExecutor + ?Sized> CypherExecutor for std::sync::Arc<E> {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        (**self).execute_cypher(cypher, params).await
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        (**self).run_cypher(cypher, params).await
    }
}
