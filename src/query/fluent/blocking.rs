//! Fluent execution on the calling thread.

use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};

use crate::domain::{Page, Pageable};
use crate::error::AppError;
use crate::operations::GraphOperations;
use crate::query::fluent::FluentExecutor;
use crate::query::fragments::QueryFragments;
use crate::query::predicate::MatchingPredicate;

/// Runs fluent terminals through blocking [`GraphOperations`].
pub struct BlockingFinder<O> {
    operations: Arc<O>,
}

impl<O> BlockingFinder<O> {
    pub fn new(operations: Arc<O>) -> Self {
        Self { operations }
    }
}

impl<O> Clone for BlockingFinder<O> {
    fn clone(&self) -> Self {
        Self {
            operations: self.operations.clone(),
        }
    }
}

impl<O: GraphOperations> FluentExecutor for BlockingFinder<O> {
    type Single<R> = Result<Option<R>, AppError>;
    type Many<R> = Result<Vec<R>, AppError>;
    type Paged<R> = Result<Page<R>, AppError>;
    type Count = Result<u64, AppError>;
    type Exists = Result<bool, AppError>;

    fn one<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Single<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.operations.find_one(&fragments?)
    }

    fn first<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Single<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        Ok(self.operations.find_all(&fragments?)?.into_iter().next())
    }

    fn all<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Many<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.operations.find_all(&fragments?)
    }

    /// Fetches the window, then counts only if the total cannot be derived
    /// from the window's size.
    fn page<R>(
        &self,
        fragments: Result<QueryFragments, AppError>,
        pageable: Pageable,
    ) -> Self::Paged<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let fragments = fragments?;
        let content = self.operations.find_all(&fragments)?;
        Page::assemble(content, &pageable, || {
            self.operations.count(fragments.predicate())
        })
    }

    fn count(&self, predicate: Result<MatchingPredicate, AppError>) -> Self::Count {
        self.operations.count(&predicate?)
    }

    fn exists(&self, fragments: Result<QueryFragments, AppError>) -> Self::Exists {
        let found = self.operations.find_all::<IgnoredAny>(&fragments?)?;
        Ok(!found.is_empty())
    }
}
