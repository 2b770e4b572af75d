//! Query construction: examples, matching predicates, query fragments, the
//! Cypher compiler and fluent queries.
//!
//! The pipeline is the same for every entry point:
//!
//! ```text
//! Example ──► MatchingPredicate ──► QueryFragments ──► Statement
//!                       (mapping)      (sort, page,      (compiler)
//!                                       projection)
//! ```

pub mod cypher;
mod example;
pub mod fluent;
mod fragments;
mod predicate;

pub use example::{
    Example, ExampleMatcher, MatchMode, NullHandler, PropertySpecifier, StringMatcher,
};
pub use fluent::{FetchableFluentQuery, FluentExecutor, FluentQuery, ReactiveFluentQuery};
pub use fragments::{Projected, QueryFragments, SortItem};
pub use predicate::{Condition, MatchingPredicate, Operator};
