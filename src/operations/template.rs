//! Operations backed by a [`CypherExecutor`] and a [`StatementCompiler`].

use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use tokio::runtime::Runtime;

use crate::error::AppError;
use crate::graph::{CypherExecutor, Query};
use crate::operations::{GraphOperations, ReactiveGraphOperations, ResultStream};
use crate::query::cypher::{Statement, StatementCompiler, COUNT_COLUMN, RESULT_COLUMN};
use crate::query::{MatchingPredicate, QueryFragments};

/// Asynchronous operations that compile fragments to Cypher and run them.
///
/// # Example
///
/// ```ignore
/// let template = GraphTemplate::with_cypher(Neo4jClient::connect(&config.neo4j).await?);
/// let people: Vec<Person> = template.find_all(&fragments).try_collect().await?;
/// ```
pub struct GraphTemplate<C> {
    executor: C,
    compiler: Arc<dyn StatementCompiler>,
}

impl<C: CypherExecutor> GraphTemplate<C> {
    pub fn new(executor: C, compiler: Arc<dyn StatementCompiler>) -> Self {
        Self { executor, compiler }
    }

    /// Uses the default [`CypherGenerator`](crate::query::cypher::CypherGenerator).
    pub fn with_cypher(executor: C) -> Self {
        Self::new(executor, Arc::new(crate::query::cypher::CypherGenerator))
    }

    pub fn executor(&self) -> &C {
        &self.executor
    }
}

#[async_trait]
impl<C: CypherExecutor> ReactiveGraphOperations for GraphTemplate<C> {
    fn find_all<'a, R>(&'a self, fragments: &QueryFragments) -> ResultStream<'a, R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let Statement { cypher, params } = self.compiler.compile_match(fragments);

        Box::pin(try_stream! {
            let mut rows = Query::new(&self.executor, &cypher)
                .bind_all(params)
                .execute()
                .await?;
            while let Some(row) = rows.try_next().await? {
                yield row.get::<R>(RESULT_COLUMN)?;
            }
        })
    }

    async fn count(&self, predicate: &MatchingPredicate) -> Result<u64, AppError> {
        let Statement { cypher, params } = self.compiler.compile_count(predicate);
        let row = Query::new(&self.executor, &cypher)
            .bind_all(params)
            .fetch_one()
            .await?;
        match row {
            Some(row) => row.get(COUNT_COLUMN),
            None => Ok(0),
        }
    }
}

/// Blocking operations driving a [`GraphTemplate`] on a private
/// current-thread runtime.
///
/// Calls block the current thread and must not be made from within an async
/// context. Executors that hold runtime-bound resources (such as a
/// connection pool) should be created on [`runtime`](Self::runtime).
pub struct BlockingGraphTemplate<C> {
    inner: GraphTemplate<C>,
    runtime: Runtime,
}

impl<C: CypherExecutor> BlockingGraphTemplate<C> {
    /// Builds a template with a fresh runtime.
    pub fn new(executor: C, compiler: Arc<dyn StatementCompiler>) -> Result<Self, AppError> {
        Ok(Self::with_runtime(current_thread_runtime()?, executor, compiler))
    }

    pub fn with_runtime(
        runtime: Runtime,
        executor: C,
        compiler: Arc<dyn StatementCompiler>,
    ) -> Self {
        Self {
            inner: GraphTemplate::new(executor, compiler),
            runtime,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

fn current_thread_runtime() -> Result<Runtime, AppError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Internal(format!("failed to start runtime: {}", e)))
}

impl<C: CypherExecutor> GraphOperations for BlockingGraphTemplate<C> {
    fn find_all<R>(&self, fragments: &QueryFragments) -> Result<Vec<R>, AppError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.runtime
            .block_on(self.inner.find_all::<R>(fragments).try_collect())
    }

    fn find_one<R>(&self, fragments: &QueryFragments) -> Result<Option<R>, AppError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.runtime
            .block_on(ReactiveGraphOperations::find_one::<R>(&self.inner, fragments))
    }

    fn count(&self, predicate: &MatchingPredicate) -> Result<u64, AppError> {
        self.runtime
            .block_on(ReactiveGraphOperations::count(&self.inner, predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pageable, Sort};
    use crate::graph::{Params, Row, RowStream};
    use crate::mapping::{
        EntityDescriptor, PropertyDescriptor, PropertyFilter, SchemaMappingContext,
    };
    use crate::query::cypher::CypherGenerator;
    use crate::query::{Example, ExampleMatcher};
    use futures::stream;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
    }

    struct MockExecutor {
        rows: Vec<Row>,
        statements: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                rows,
                statements: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CypherExecutor for MockExecutor {
        async fn execute_cypher(
            &self,
            cypher: &str,
            _params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            self.statements.lock().unwrap().push(cypher.to_string());
            Ok(Box::pin(stream::iter(
                self.rows.clone().into_iter().map(Ok::<Row, AppError>),
            )))
        }

        async fn run_cypher(&self, _cypher: &str, _params: Params) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn person_row(name: &str) -> Row {
        [(RESULT_COLUMN.to_string(), json!({"name": name}))]
            .into_iter()
            .collect()
    }

    fn fragments() -> QueryFragments {
        let mapping = SchemaMappingContext::new([
            EntityDescriptor::new("Person").with_property(PropertyDescriptor::simple("name"))
        ])
        .unwrap();
        let example = Example::dynamic("Person", json!({}), ExampleMatcher::default()).unwrap();
        QueryFragments::for_example(
            &mapping,
            &example,
            &Sort::unsorted(),
            &Pageable::unpaged(),
            PropertyFilter::AcceptAll,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_all_decodes_result_column() {
        let template = GraphTemplate::with_cypher(MockExecutor::new(vec![
            person_row("Ada"),
            person_row("Grace"),
        ]));

        let people: Vec<Person> = template.find_all(&fragments()).try_collect().await.unwrap();

        assert_eq!(people.len(), 2);
        assert_eq!(people[1].name, "Grace");
        let statements = template.executor().statements.lock().unwrap();
        assert_eq!(
            statements[0],
            CypherGenerator.compile_match(&fragments()).cypher
        );
    }

    #[tokio::test]
    async fn test_find_all_is_lazy() {
        let template = GraphTemplate::with_cypher(MockExecutor::new(vec![person_row("Ada")]));

        let stream = template.find_all::<Person>(&fragments());
        assert!(template.executor().statements.lock().unwrap().is_empty());
        drop(stream);
        assert!(template.executor().statements.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_one_rejects_two_rows() {
        let template = GraphTemplate::with_cypher(MockExecutor::new(vec![
            person_row("Ada"),
            person_row("Grace"),
        ]));

        let err = ReactiveGraphOperations::find_one::<Person>(&template, &fragments())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NonUniqueResult { ref entity } if entity == "Person"));
    }

    #[tokio::test]
    async fn test_count_reads_count_column() {
        let row: Row = [(COUNT_COLUMN.to_string(), json!(5))].into_iter().collect();
        let template = GraphTemplate::with_cypher(MockExecutor::new(vec![row]));

        let total = template.count(fragments().predicate()).await.unwrap();

        assert_eq!(total, 5);
    }

    #[test]
    fn test_blocking_template() {
        let template = BlockingGraphTemplate::new(
            MockExecutor::new(vec![person_row("Ada")]),
            Arc::new(CypherGenerator),
        )
        .unwrap();

        let people: Vec<Person> = template.find_all(&fragments()).unwrap();
        let one: Option<Person> = GraphOperations::find_one(&template, &fragments()).unwrap();

        assert_eq!(people, vec![Person { name: "Ada".into() }]);
        assert_eq!(one, Some(Person { name: "Ada".into() }));
    }
}
