//! Fluent, immutable queries.
//!
//! A [`FluentQuery`] accumulates sort and projection refinements on top of an
//! example and runs through a [`FluentExecutor`] when a terminal method is
//! called. The query is the same for both execution models; only the executor
//! differs:
//!
//! - [`BlockingFinder`] returns plain `Result`s
//! - [`ReactiveFinder`] returns lazy futures and streams
//!
//! # Example
//!
//! ```ignore
//! let smiths: Vec<PersonName> = executor.find_by(example, |q| {
//!     q.sort_by(Sort::from(Order::asc("firstName")))
//!         .project(["firstName"])
//!         .as_type::<PersonName>()
//!         .all()
//! })??;
//! ```

mod blocking;
mod reactive;

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::domain::{Pageable, Sort};
use crate::error::AppError;
use crate::mapping::{MappingContext, PropertyFilter};
use crate::query::example::Example;
use crate::query::fragments::QueryFragments;
use crate::query::predicate::MatchingPredicate;

pub use blocking::BlockingFinder;
pub use reactive::ReactiveFinder;

/// A fluent query run on the calling thread.
pub type FetchableFluentQuery<O, T, R = T> = FluentQuery<BlockingFinder<O>, T, R>;

/// A fluent query producing futures and streams.
pub type ReactiveFluentQuery<O, T, R = T> = FluentQuery<ReactiveFinder<O>, T, R>;

/// Runs the terminal operations of a [`FluentQuery`].
///
/// Inputs arrive already assembled; a mapping failure is passed in as `Err`
/// and must be reported through the executor's own result type.
pub trait FluentExecutor: Clone + Send + Sync {
    type Single<R>;
    type Many<R>;
    type Paged<R>;
    type Count;
    type Exists;

    /// The only match; fails on more than one.
    fn one<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Single<R>
    where
        R: DeserializeOwned + Send + 'static;

    /// The first match in query order; never fails on multiplicity.
    fn first<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Single<R>
    where
        R: DeserializeOwned + Send + 'static;

    fn all<R>(&self, fragments: Result<QueryFragments, AppError>) -> Self::Many<R>
    where
        R: DeserializeOwned + Send + 'static;

    /// The fragments' window plus the total number of matches of their
    /// predicate, fetched separately.
    fn page<R>(
        &self,
        fragments: Result<QueryFragments, AppError>,
        pageable: Pageable,
    ) -> Self::Paged<R>
    where
        R: DeserializeOwned + Send + 'static;

    fn count(&self, predicate: Result<MatchingPredicate, AppError>) -> Self::Count;

    fn exists(&self, fragments: Result<QueryFragments, AppError>) -> Self::Exists;
}

/// An immutable query over entity `T`, decoding results as `R`.
///
/// Every refinement returns a new query and leaves the receiver
/// untouched, so one base query can be refined in several directions, also
/// from several threads. Terminal methods never cache: each call executes
/// again.
pub struct FluentQuery<E, T, R = T> {
    example: Arc<Example<T>>,
    mapping: Arc<dyn MappingContext>,
    executor: E,
    sort: Sort,
    properties: Option<Arc<HashSet<String>>>,
    _result: PhantomData<fn() -> R>,
}

impl<E: Clone, T, R> Clone for FluentQuery<E, T, R> {
    fn clone(&self) -> Self {
        Self {
            example: self.example.clone(),
            mapping: self.mapping.clone(),
            executor: self.executor.clone(),
            sort: self.sort.clone(),
            properties: self.properties.clone(),
            _result: PhantomData,
        }
    }
}

impl<E: FluentExecutor, T> FluentQuery<E, T, T> {
    pub fn new(example: Example<T>, mapping: Arc<dyn MappingContext>, executor: E) -> Self {
        Self {
            example: Arc::new(example),
            mapping,
            executor,
            sort: Sort::unsorted(),
            properties: None,
            _result: PhantomData,
        }
    }
}

impl<E: FluentExecutor, T, R> FluentQuery<E, T, R> {
    /// Appends `sort` to the accumulated sort.
    pub fn sort_by(&self, sort: Sort) -> Self {
        Self {
            sort: self.sort.and(&sort),
            ..self.clone()
        }
    }

    /// Decodes results as `NR` instead.
    ///
    /// The accumulated sort is kept; the projection is reset so that `NR`
    /// receives every mapped property unless `project` is called again.
    pub fn as_type<NR>(&self) -> FluentQuery<E, T, NR> {
        FluentQuery {
            example: self.example.clone(),
            mapping: self.mapping.clone(),
            executor: self.executor.clone(),
            sort: self.sort.clone(),
            properties: None,
            _result: PhantomData,
        }
    }

    /// Adds dotted property paths to the projection.
    pub fn project<I, S>(&self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: HashSet<String> = self
            .properties
            .as_deref()
            .cloned()
            .unwrap_or_default();
        merged.extend(properties.into_iter().map(Into::into));
        Self {
            properties: Some(Arc::new(merged)),
            ..self.clone()
        }
    }

    pub fn example(&self) -> &Example<T> {
        &self.example
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// The projected paths, or `None` when every property is returned.
    pub fn properties(&self) -> Option<&HashSet<String>> {
        self.properties.as_deref()
    }

    pub fn included_fields(&self) -> PropertyFilter {
        PropertyFilter::from_properties(self.properties())
    }

    /// Assembles the fragments a terminal call with `pageable` would run.
    pub fn fragments(&self, pageable: &Pageable) -> Result<QueryFragments, AppError> {
        QueryFragments::for_example(
            self.mapping.as_ref(),
            &self.example,
            &self.sort,
            pageable,
            self.included_fields(),
        )
    }

    pub fn one(&self) -> E::Single<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.executor.one(self.fragments(&Pageable::unpaged()))
    }

    pub fn first(&self) -> E::Single<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.executor.first(self.fragments(&Pageable::unpaged()))
    }

    pub fn all(&self) -> E::Many<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        self.executor.all(self.fragments(&Pageable::unpaged()))
    }

    /// Fetches one page. The page's own sort is applied after the
    /// accumulated sort.
    pub fn page(&self, pageable: Pageable) -> E::Paged<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let fragments = self.fragments(&pageable);
        self.executor.page(fragments, pageable)
    }

    pub fn count(&self) -> E::Count {
        self.executor
            .count(MatchingPredicate::create(self.mapping.as_ref(), &self.example))
    }

    pub fn exists(&self) -> E::Exists {
        self.executor.exists(self.fragments(&Pageable::unpaged()))
    }
}
