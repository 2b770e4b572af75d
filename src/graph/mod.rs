//! Low-level client for running parameterized Cypher.
//!
//! # Architecture
//!
//! - [`CypherExecutor`] - Execute Cypher statements (implemented by backends)
//! - [`Query`] - Fluent parameter binding and result fetching on top of an executor
//! - [`Row`] / [`RowStream`] - Result rows as JSON values, decoded with serde
//!
//! # Usage
//!
//! ```ignore
//! use graphqbe::graph::{backends::neo4j::Neo4jClient, QueryExt};
//!
//! let client = Neo4jClient::connect(&config.neo4j).await?;
//!
//! let rows = client
//!     .query("MATCH (n:Person) WHERE n.name = $name RETURN n.age AS age")
//!     .param("name", "Ada")
//!     .fetch_all()
//!     .await?;
//! let age: i64 = rows[0].get("age")?;
//! ```

mod query;
mod row;
mod traits;

pub mod backends;

pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::CypherExecutor;
