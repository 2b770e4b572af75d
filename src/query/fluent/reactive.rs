//! Fluent execution producing futures and streams.

use std::sync::Arc;

use async_stream::try_stream;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, TryStreamExt};
use serde::de::{DeserializeOwned, IgnoredAny};

use crate::domain::{Page, Pageable};
use crate::error::AppError;
use crate::operations::ReactiveGraphOperations;
use crate::query::fluent::FluentExecutor;
use crate::query::fragments::QueryFragments;
use crate::query::predicate::MatchingPredicate;

/// Runs fluent terminals through [`ReactiveGraphOperations`].
///
/// Returned futures and streams own what they need and start no work until
/// polled. A mapping error surfaces on the first poll.
pub struct ReactiveFinder<O> {
    operations: Arc<O>,
}

impl<O> ReactiveFinder<O> {
    pub fn new(operations: Arc<O>) -> Self {
        Self { operations }
    }
}

impl<O> Clone for ReactiveFinder<O> {
    fn clone(&self) -> Self {
        Self {
            operations: self.operations.clone(),
        }
    }
}

impl<O: ReactiveGraphOperations + 'static> FluentExecutor for ReactiveFinder<O> {
    type Single<R> = BoxFuture<'static, Result<Option<R>, AppError>>;
    type Many<R> = BoxStream<'static, Result<R, AppError>>;
    type Paged<R> = BoxFuture<'static, Result<Page<R>, AppError>>;
    type Count = BoxFuture<'static, Result<u64, AppError>>;
    type Exists = BoxFuture<'static, Result<bool, AppError>>;

    fn one<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Single<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let operations = self.operations.clone();
        async move { operations.find_one::<R>(&fragments?).await }.boxed()
    }

    fn first<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Single<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let operations = self.operations.clone();
        async move {
            let fragments = fragments?;
            let mut results = operations.find_all::<R>(&fragments);
            results.try_next().await
        }
        .boxed()
    }

    fn all<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Many<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let operations = self.operations.clone();
        Box::pin(try_stream! {
            let fragments = fragments?;
            let mut results = operations.find_all::<R>(&fragments);
            while let Some(result) = results.try_next().await? {
                yield result;
            }
        })
    }

    /// Fetches the window and the total concurrently and joins them.
    fn page<R>(
        &self,
        fragments: Result<QueryFragments, AppError>,
        pageable: Pageable,
    ) -> Self::Paged<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let operations = self.operations.clone();
        async move {
            let fragments = fragments?;
            let content = operations.find_all::<R>(&fragments).try_collect::<Vec<R>>();
            let total = operations.count(fragments.predicate());
            let (content, total) = futures::try_join!(content, total)?;
            Ok(Page::new(content, &pageable, total))
        }
        .boxed()
    }

    fn count(&self, predicate: Result<MatchingPredicate, AppError>) -> Self::Count {
        let operations = self.operations.clone();
        async move { operations.count(&predicate?).await }.boxed()
    }

    fn exists(&self, fragments: Result<QueryFragments, AppError>) -> Self::Exists {
        let operations = self.operations.clone();
        async move {
            let fragments = fragments?;
            let mut results = operations.find_all::<IgnoredAny>(&fragments);
            Ok(results.try_next().await?.is_some())
        }
        .boxed()
    }
}
