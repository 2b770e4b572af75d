//! graphqbe - Query by Example and fluent queries for Neo4j
//!
//! Turns partially populated example entities into Cypher, and runs them
//! through either a blocking or an asynchronous execution path that share
//! all query construction.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod mapping;
pub mod operations;
pub mod query;
pub mod repositories;
