//! Storage operations consumed by executors and fluent queries.
//!
//! Two flavors share the same shape: [`GraphOperations`] answers on the
//! calling thread, [`ReactiveGraphOperations`] hands out lazy streams and
//! futures. Both take fully assembled [`QueryFragments`], so no mapping work
//! happens below this layer.

mod template;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::query::{MatchingPredicate, QueryFragments};

pub use template::{BlockingGraphTemplate, GraphTemplate};

/// A lazy stream of decoded results.
pub type ResultStream<'a, T> = BoxStream<'a, Result<T, AppError>>;

/// Blocking storage operations.
pub trait GraphOperations: Send + Sync {
    /// Returns every match, in the fragments' order and window.
    fn find_all<R>(&self, fragments: &QueryFragments) -> Result<Vec<R>, AppError>
    where
        R: DeserializeOwned + Send + 'static;

    /// Returns the only match, if any.
    ///
    /// # Errors
    ///
    /// [`AppError::NonUniqueResult`] if more than one node matches.
    fn find_one<R>(&self, fragments: &QueryFragments) -> Result<Option<R>, AppError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let mut results = self.find_all::<R>(fragments)?.into_iter();
        let first = results.next();
        if results.next().is_some() {
            return Err(AppError::NonUniqueResult {
                entity: fragments.entity().to_string(),
            });
        }
        Ok(first)
    }

    fn count(&self, predicate: &MatchingPredicate) -> Result<u64, AppError>;

    /// Whether fluent queries can be run against these operations.
    fn supports_fluent_find(&self) -> bool {
        true
    }
}

/// Asynchronous storage operations.
///
/// Nothing is sent to the database until a returned stream is polled or a
/// returned future is awaited. Dropping either abandons the work.
#[async_trait]
pub trait ReactiveGraphOperations: Send + Sync {
    fn find_all<'a, R>(&'a self, fragments: &QueryFragments) -> ResultStream<'a, R>
    where
        R: DeserializeOwned + Send + 'static;

    /// Returns the only match, if any. At most two results are pulled.
    ///
    /// # Errors
    ///
    /// [`AppError::NonUniqueResult`] if more than one node matches.
    async fn find_one<R>(&self, fragments: &QueryFragments) -> Result<Option<R>, AppError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let mut results = self.find_all::<R>(fragments);
        let first = results.try_next().await?;
        if first.is_some() && results.try_next().await?.is_some() {
            return Err(AppError::NonUniqueResult {
                entity: fragments.entity().to_string(),
            });
        }
        Ok(first)
    }

    async fn count(&self, predicate: &MatchingPredicate) -> Result<u64, AppError>;

    fn supports_fluent_find(&self) -> bool {
        true
    }
}
