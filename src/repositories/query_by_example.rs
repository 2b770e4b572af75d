//! Blocking query-by-example executor.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::domain::{Page, Pageable, Sort};
use crate::error::AppError;
use crate::mapping::{MappingContext, PropertyFilter};
use crate::operations::GraphOperations;
use crate::query::fluent::BlockingFinder;
use crate::query::{
    Example, FetchableFluentQuery, FluentExecutor, FluentQuery, MatchingPredicate, QueryFragments,
};

/// Answers query-by-example requests on the calling thread.
///
/// # Example
///
/// ```ignore
/// let executor = QueryByExampleExecutor::new(Arc::new(template), mapping);
/// let matcher = ExampleMatcher::default().with_ignore_paths(["firstName"]);
/// let example = Example::with_matcher(&probe, matcher)?;
/// let smiths: Vec<Person> = executor.find_all(&example)?;
/// ```
pub struct QueryByExampleExecutor<O> {
    operations: Arc<O>,
    mapping: Arc<dyn MappingContext>,
}

impl<O> Clone for QueryByExampleExecutor<O> {
    fn clone(&self) -> Self {
        Self {
            operations: self.operations.clone(),
            mapping: self.mapping.clone(),
        }
    }
}

impl<O: GraphOperations> QueryByExampleExecutor<O> {
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
    pub fn find_one<T>(&self, example: &Example<T>) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let fragments = self.fragments(example, &Sort::unsorted(), &Pageable::unpaged())?;
        self.operations.find_one(&fragments)
    }

    pub fn find_all<T>(&self, example: &Example<T>) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.find_all_sorted(example, &Sort::unsorted())
    }

    pub fn find_all_sorted<T>(
        &self,
        example: &Example<T>,
        sort: &Sort,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let fragments = self.fragments(example, sort, &Pageable::unpaged())?;
        self.operations.find_all(&fragments)
    }

    /// Returns one page of matches plus the total number of matches.
    pub fn find_page<T>(
        &self,
        example: &Example<T>,
        pageable: Pageable,
    ) -> Result<Page<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let fragments = self.fragments(example, &Sort::unsorted(), &pageable);
        self.finder().page(fragments, pageable)
    }

    pub fn count<T>(&self, example: &Example<T>) -> Result<u64, AppError> {
        let predicate = MatchingPredicate::create(self.mapping.as_ref(), example)?;
        self.operations.count(&predicate)
    }

    /// Whether `example` has at least one match.
    pub fn exists<T>(&self, example: &Example<T>) -> Result<bool, AppError> {
        let fragments = self.fragments(example, &Sort::unsorted(), &Pageable::unpaged());
        self.finder().exists(fragments)
    }

    /// Passes a fluent query over `example` to `query` and returns its
    /// result.
    ///
    /// # Errors
    ///
    /// [`AppError::UnsupportedOperation`] if the operations do not support
    /// fluent queries.
    pub fn find_by<T, P, F>(&self, example: Example<T>, query: F) -> Result<P, AppError>
    where
        F: FnOnce(FetchableFluentQuery<O, T>) -> P,
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

    fn finder(&self) -> BlockingFinder<O> {
        BlockingFinder::new(self.operations.clone())
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
