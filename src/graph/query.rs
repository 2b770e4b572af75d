//! Query builder for running parameterized Cypher statements.

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// A builder for binding parameters to a Cypher statement and running it.
///
/// Serialization failures while binding are remembered and reported when the
/// query is executed, so parameters can be chained without intermediate
/// `?`s.
///
/// # Example
///
/// ```ignore
/// let rows = Query::new(&client, "MATCH (n:Person) WHERE n.name = $name RETURN n")
///     .param("name", "Ada")
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    cypher: String,
    params: Params,
    bind_error: Option<AppError>,
}

impl<'a, E: CypherExecutor + ?Sized> Query<'a, E> {
    /// Creates a new query builder for `cypher`.
    pub fn new(executor: &'a E, cypher: &str) -> Self {
        Self {
            executor,
            cypher: cypher.to_string(),
            params: Params::new(),
            bind_error: None,
        }
    }

    /// Binds a serializable value to the parameter `name` (without the `$`).
    pub fn param<T: Serialize>(mut self, name: &str, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.params.insert(name.to_string(), value);
            }
            Err(e) => {
                self.bind_error.get_or_insert(AppError::Internal(format!(
                    "failed to serialize parameter '{}': {}",
                    name, e
                )));
            }
        }
        self
    }

    /// Binds a value that is already JSON.
    pub fn param_raw(mut self, name: &str, value: JsonValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Binds every entry of `params`, replacing parameters of the same name.
    pub fn bind_all(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Executes the query and returns a lazy stream of rows.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        if let Some(err) = self.bind_error {
            return Err(err);
        }
        tracing::debug!(target: "graphqbe::cypher", "Executing:\n{}", self.cypher);
        if !self.params.is_empty() {
            tracing::trace!(target: "graphqbe::cypher", "with parameters: {:?}", self.params);
        }
        self.executor
            .execute_cypher(&self.cypher, self.params)
            .await
    }

    /// Executes the query and collects all rows.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the query and returns its only row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NonUniqueRow`] if the statement yields more
    /// than one row. Only the first two rows are pulled from the database.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        let cypher = self.cypher.clone();
        let mut stream = self.execute().await?;
        let first = stream.next().await.transpose()?;
        if first.is_some() && stream.next().await.transpose()?.is_some() {
            return Err(AppError::NonUniqueRow { query: cypher });
        }
        Ok(first)
    }

    /// Executes the query without returning results.
    pub async fn run(self) -> Result<(), AppError> {
        if let Some(err) = self.bind_error {
            return Err(err);
        }
        tracing::debug!(target: "graphqbe::cypher", "Running:\n{}", self.cypher);
        self.executor.run_cypher(&self.cypher, self.params).await
    }
}

/// Extension trait providing `executor.query("...")`.
pub trait QueryExt: CypherExecutor {
    /// Creates a new query builder for this executor.
    fn query(&self, cypher: &str) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self, cypher)
    }
}

impl<E: CypherExecutor> QueryExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MockExecutor {
        expected_cypher: String,
        expected_params: Params,
        rows: Vec<Row>,
    }

    impl MockExecutor {
        fn new(cypher: &str, params: Params) -> Self {
            Self {
                expected_cypher: cypher.to_string(),
                expected_params: params,
                rows: Vec::new(),
            }
        }

        fn returning(mut self, rows: Vec<Row>) -> Self {
            self.rows = rows;
            self
        }
    }

    #[async_trait::async_trait]
    impl CypherExecutor for MockExecutor {
        async fn execute_cypher(
            &self,
            cypher: &str,
            params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            assert_eq!(cypher, self.expected_cypher);
            assert_eq!(params, self.expected_params);
            Ok(Box::pin(futures::stream::iter(
                self.rows.clone().into_iter().map(Ok::<Row, AppError>),
            )))
        }

        async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
            assert_eq!(cypher, self.expected_cypher);
            assert_eq!(params, self.expected_params);
            Ok(())
        }
    }

    fn count_row(count: i64) -> Row {
        [("count".to_string(), json!(count))].into_iter().collect()
    }

    #[tokio::test]
    async fn test_query_with_params() {
        let mut expected = HashMap::new();
        expected.insert("name".to_string(), json!("Ada"));
        expected.insert("limit".to_string(), json!(10));

        let executor = MockExecutor::new("MATCH (n) WHERE n.name = $name RETURN n LIMIT $limit", expected);

        let rows = executor
            .query("MATCH (n) WHERE n.name = $name RETURN n LIMIT $limit")
            .param("name", "Ada")
            .param("limit", 10)
            .fetch_all()
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_bind_all_merges_params() {
        let mut bound = Params::new();
        bound.insert("a".to_string(), json!(1));
        bound.insert("b".to_string(), json!(2));

        let executor = MockExecutor::new("RETURN $a + $b AS sum", bound.clone());

        executor
            .query("RETURN $a + $b AS sum")
            .param("a", 100)
            .bind_all(bound)
            .run()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_one_single_row() {
        let executor = MockExecutor::new("RETURN 1 AS count", Params::new())
            .returning(vec![count_row(1)]);

        let row = executor.query("RETURN 1 AS count").fetch_one().await.unwrap();
        assert_eq!(row.unwrap().get::<i64>("count").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_one_rejects_multiple_rows() {
        let executor = MockExecutor::new("UNWIND [1, 2] AS count RETURN count", Params::new())
            .returning(vec![count_row(1), count_row(2)]);

        let result = executor
            .query("UNWIND [1, 2] AS count RETURN count")
            .fetch_one()
            .await;
        let err = result.unwrap_err();
        assert!(
            matches!(err, AppError::NonUniqueRow { ref query } if query == "UNWIND [1, 2] AS count RETURN count")
        );
        assert_eq!(
            err.to_string(),
            "Statement returned more than one row: UNWIND [1, 2] AS count RETURN count"
        );
    }
}
