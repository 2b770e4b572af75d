//! Backend implementations for graph databases.
//!
//! Each backend implements [`CypherExecutor`](crate::graph::CypherExecutor).
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | Neo4j (Bolt) | [`neo4j`] | Available |

pub mod neo4j;
