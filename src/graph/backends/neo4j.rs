//! Neo4j backend over the Bolt protocol.
//!
//! # Example
//!
//! ```ignore
//! use graphqbe::graph::backends::neo4j::Neo4jClient;
//! use graphqbe::graph::QueryExt;
//!
//! let client = Neo4jClient::connect(&config.neo4j).await?;
//! let rows = client.query("MATCH (n:Person) RETURN n.name AS name").fetch_all().await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder,
};
use serde_json::Value as JsonValue;

use crate::config::Neo4jConfig;
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// Neo4j graph client.
///
/// Wraps the pooled `neo4rs` driver. Cheap to clone; all clones share the
/// same pool.
#[derive(Clone)]
pub struct Neo4jClient {
    graph: Arc<neo4rs::Graph>,
}

impl Neo4jClient {
    /// Connects to Neo4j using the given configuration.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, AppError> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_deref().unwrap_or(""))
            .max_connections(config.max_connections);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }

        let graph = neo4rs::Graph::connect(builder.build()?).await?;
        tracing::info!("Connected to Neo4j at {}", config.uri);

        Ok(Self::from_graph(Arc::new(graph)))
    }

    /// Wraps an already connected driver.
    pub fn from_graph(graph: Arc<neo4rs::Graph>) -> Self {
        Self { graph }
    }

    /// Returns the underlying driver.
    pub fn graph(&self) -> &Arc<neo4rs::Graph> {
        &self.graph
    }
}

#[async_trait]
impl CypherExecutor for Neo4jClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let query = bolt_query(cypher, params);
        let graph = self.graph.clone();
        let cypher = cypher.to_string();

        // The driver stream, and with it the pooled connection, lives inside
        // the generator; it is released when the stream ends or is dropped.
        Ok(Box::pin(try_stream! {
            let mut result = graph.execute(query).await.map_err(|e| AppError::Query {
                message: format!("Cypher query failed: {}", e),
                query: cypher.clone(),
            })?;

            while let Some(row) = result.next().await? {
                yield parse_bolt_row(&row)?;
            }
        }))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.graph
            .run(bolt_query(cypher, params))
            .await
            .map_err(|e| AppError::Query {
                message: format!("Cypher statement failed: {}", e),
                query: cypher.to_string(),
            })
    }
}

/// Builds a driver query with every JSON parameter converted to Bolt.
fn bolt_query(cypher: &str, params: Params) -> neo4rs::Query {
    params
        .into_iter()
        .fold(neo4rs::query(cypher), |query, (name, value)| {
            query.param(&name, to_bolt(value))
        })
}

/// Converts a JSON value into its Bolt counterpart.
///
/// Integral numbers become Bolt integers; every other number is sent as a
/// float.
fn to_bolt(value: JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => BoltType::Boolean(BoltBoolean::new(b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or_default())),
        },
        JsonValue::String(s) => BoltType::String(BoltString::from(s.as_str())),
        JsonValue::Array(items) => {
            let items: Vec<BoltType> = items.into_iter().map(to_bolt).collect();
            BoltType::List(BoltList::from(items))
        }
        JsonValue::Object(entries) => {
            let mut map = BoltMap::new();
            for (key, value) in entries {
                map.put(BoltString::from(key.as_str()), to_bolt(value));
            }
            BoltType::Map(map)
        }
    }
}

/// Decodes every column of a driver row into JSON.
fn parse_bolt_row(row: &neo4rs::Row) -> Result<Row, AppError> {
    row.to::<HashMap<String, JsonValue>>()
        .map(Row::new)
        .map_err(|e| AppError::Decode {
            column: "*".to_string(),
            message: e.to_string(),
        })
}
