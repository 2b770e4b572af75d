//! Row and streaming types for query results.

use crate::error::AppError;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::pin::Pin;

/// Named parameters for Cypher statements.
pub type Params = HashMap<String, JsonValue>;

/// A stream of rows from a query result.
///
/// Rows are fetched on demand. Dropping the stream abandons the remaining
/// rows.
pub type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<Row, AppError>> + Send + 'a>>;

/// A single row from a query result, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    data: HashMap<String, JsonValue>,
}

impl Row {
    /// Creates a new row from a map of column names to values.
    pub fn new(data: HashMap<String, JsonValue>) -> Self {
        Self { data }
    }

    /// Decodes a column into the requested type.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] if the column is missing or its value
    /// does not deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, column: &str) -> Result<T, AppError> {
        let value = self.data.get(column).ok_or_else(|| AppError::Decode {
            column: column.to_string(),
            message: "column not found".to_string(),
        })?;
        decode(column, value.clone())
    }

    /// Decodes a column, treating a missing column or `null` as `None`.
    pub fn get_opt<T: DeserializeOwned>(&self, column: &str) -> Result<Option<T>, AppError> {
        match self.data.get(column) {
            Some(JsonValue::Null) | None => Ok(None),
            Some(value) => decode(column, value.clone()).map(Some),
        }
    }

    /// Returns the raw JSON value for a column, if it exists.
    pub fn get_raw(&self, column: &str) -> Option<&JsonValue> {
        self.data.get(column)
    }
}

impl From<HashMap<String, JsonValue>> for Row {
    fn from(data: HashMap<String, JsonValue>) -> Self {
        Self::new(data)
    }
}

impl FromIterator<(String, JsonValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn decode<T: DeserializeOwned>(column: &str, value: JsonValue) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Decode {
        column: column.to_string(),
        message: e.to_string(),
    })
}
