//! Query-by-example entry points.
//!
//! Executors turn an [`Example`](crate::query::Example) into fragments and
//! run them through storage operations, or hand a fluent query to a caller
//! supplied continuation via `find_by`.

mod query_by_example;
mod reactive_query_by_example;

pub use query_by_example::QueryByExampleExecutor;
pub use reactive_query_by_example::ReactiveQueryByExampleExecutor;
