pub mod postgrest;

use crate::intent::Operator;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

/// One employee (or aggregate) row as returned by the store.
pub type Row = Map<String, Value>;

#[derive(Debug)]
pub enum StoreError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ConnectionError(msg) => write!(f, "Store connection error: {}", msg),
            StoreError::ResponseError(msg) => write!(f, "Store response error: {}", msg),
            StoreError::ConfigError(msg) => write!(f, "Store configuration error: {}", msg),
        }
    }
}

impl Error for StoreError {}

/// A column filter with its value already in wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFilter {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

/// Read-only access to the employee table and its stored functions.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Rows matching every filter. An empty `columns` selects all columns.
    async fn select(&self, columns: &[String], filters: &[StoreFilter]) -> Result<Vec<Row>, StoreError>;

    /// Exact number of rows in the table.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Calls a stored function and returns its result set.
    async fn rpc(&self, function: &str, params: &Value) -> Result<Vec<Row>, StoreError>;
}

/// Normalizes a function result into rows.
pub fn rows_from_json(value: Value) -> Result<Vec<Row>, StoreError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(row) => Ok(vec![row]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::ResponseError(format!(
                    "expected an object row, got {}",
                    other
                ))),
            })
            .collect(),
        other => Err(StoreError::ResponseError(format!(
            "expected rows, got {}",
            other
        ))),
    }
}
