//! Asynchronous query-by-example executor.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::domain::{Page, Pageable, Sort};
use crate::error::AppError;
use crate::mapping::{MappingContext, PropertyFilter};
use crate::operations::{ReactiveGraphOperations, ResultStream};
use crate::query::fluent::ReactiveFinder;
use crate::query::{
    Example, FluentExecutor, FluentQuery, MatchingPredicate, QueryFragments, ReactiveFluentQuery,
};

/// Answers query-by-example requests with futures and streams.
///
/// Streams returned by [`find_all`](Self::find_all) are `'static` and lazy:
/// nothing is sent until they are polled, and a mapping error is their first
/// item.
pub struct ReactiveQueryByExampleExecutor<O> {
    operations: Arc<O>,
    mapping: Arc<dyn MappingContext>,
}

impl<O> Clone for ReactiveQueryByExampleExecutor<O> {
    fn clone(&self) -> Self {
        Self {
            operations: self.operations.clone(),
            mapping: self.mapping.clone(),
        }
    }
}

impl<O: ReactiveGraphOperations + 'static> ReactiveQueryByExampleExecutor<O> {
    pub fn new(operations: Arc<O>, mapping: Arc<dyn MappingContext>) -> Self {
        Self {
            operations,
            mapping,
        }
    }

    /// Returns the only match of `example`.
    ///
    /// # Errors
    ///
    /// [`AppError::NonUniqueResult`] if the example matches more than one
    /// node.
    pub async fn find_one<T>(&self, example: &Example<T>) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let fragments = self.fragments(example, &Sort::unsorted(), &Pageable::unpaged())?;
        self.operations.find_one(&fragments).await
    }

    pub fn find_all<T>(&self, example: &Example<T>) -> ResultStream<'static, T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.find_all_sorted(example, &Sort::unsorted())
    }

    pub fn find_all_sorted<T>(
        &self,
        example: &Example<T>,
        sort: &Sort,
    ) -> ResultStream<'static, T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let fragments = self.fragments(example, sort, &Pageable::unpaged());
        self.finder().all(fragments)
    }

    /// Returns one page of matches. Content and total are fetched
    /// concurrently.
    pub async fn find_page<T>(
        &self,
        example: &Example<T>,
        pageable: Pageable,
    ) -> Result<Page<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let fragments = self.fragments(example, &Sort::unsorted(), &pageable);
        self.finder().page(fragments, pageable).await
    }

    pub async fn count<T>(&self, example: &Example<T>) -> Result<u64, AppError> {
        let predicate = MatchingPredicate::create(self.mapping.as_ref(), example)?;
        self.operations.count(&predicate).await
    }

    /// Whether `example` has at least one match. Only the first result is
    /// pulled.
    pub async fn exists<T>(&self, example: &Example<T>) -> Result<bool, AppError> {
        let fragments = self.fragments(example, &Sort::unsorted(), &Pageable::unpaged());
        self.finder().exists(fragments).await
    }

    /// Passes a fluent query over `example` to `query` and returns its
    /// result, typically a future or stream built from one of the query's
    /// terminals.
    ///
    /// # Errors
    ///
    /// [`AppError::UnsupportedOperation`] if the operations do not support
    /// fluent queries.
    pub fn find_by<T, P, F>(&self, example: Example<T>, query: F) -> Result<P, AppError>
    where
        F: FnOnce(ReactiveFluentQuery<O, T>) -> P,
    {
        if !self.operations.supports_fluent_find() {
            return Err(AppError::UnsupportedOperation(
                "fluent queries are not supported by these graph operations".to_string(),
            ));
        }
        Ok(query(FluentQuery::new(
            example,
            self.mapping.clone(),
            self.finder(),
        )))
    }

    fn finder(&self) -> ReactiveFinder<O> {
        ReactiveFinder::new(self.operations.clone())
    }

    fn fragments<T>(
        &self,
        example: &Example<T>,
        sort: &Sort,
        pageable: &Pageable,
    ) -> Result<QueryFragments, AppError> {
        QueryFragments::for_example(
            self.mapping.as_ref(),
            example,
            sort,
            pageable,
            PropertyFilter::AcceptAll,
        )
    }
}
