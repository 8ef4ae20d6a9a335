//! Row and streaming types for query results.

use crate::error::AppError;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::pin::Pin;

/// Variables for J1QL queries.
///
/// A map of variable names to JSON values passed alongside the query.
pub type Params = HashMap<String, JsonValue>;

/// A stream of rows from a query result.
///
/// Pages are fetched on demand as the stream is polled.
pub type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<Row, AppError>> + Send + 'a>>;

/// A single item from a query result.
///
/// Wraps the JSON object returned for each match, with typed extraction
/// via [`Row::get_path`] and [`Row::get_path_opt`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    data: Map<String, JsonValue>,
}

impl Row {
    /// Creates a new row from a JSON object.
    pub fn new(data: Map<String, JsonValue>) -> Self {
        Self { data }
    }

    /// Gets a nested value, e.g. `&["entity", "_key"]`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let key: String = row.get_path(&["entity", "_key"])?;
    /// ```
    pub fn get_path<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, AppError> {
        self.get_path_opt(path)?
            .ok_or_else(|| AppError::Internal(format!("field not found: {}", path.join("."))))
    }

    /// Gets a nested value, returning `None` if any segment is missing or null.
    ///
    /// Still returns an error if the value exists but deserialization fails.
    pub fn get_path_opt<T: DeserializeOwned>(&self, path: &[&str]) -> Result<Option<T>, AppError> {
        match self.lookup(path) {
            None => Ok(None),
            Some(v) if v.is_null() => Ok(None),
            Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
                AppError::Internal(format!("failed to deserialize '{}': {}", path.join("."), e))
            }),
        }
    }

    fn lookup(&self, path: &[&str]) -> Option<&JsonValue> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.data.get(*first)?, |value, segment| value.get(*segment))
    }
}

impl TryFrom<JsonValue> for Row {
    type Error = AppError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(data) => Ok(Self::new(data)),
            other => Err(AppError::Internal(format!(
                "expected a JSON object row, got {}",
                other
            ))),
        }
    }
}
