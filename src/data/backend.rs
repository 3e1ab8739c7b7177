//! Hosted backend surface
//!
//! The data hooks only need two calls: a filtered row select and a named
//! remote procedure. Rows come back as raw JSON and are normalized by the
//! callers.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;

/// Equality filter on a column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether `row` has `value` in `column`
    ///
    /// For backends that filter rows in memory rather than in a query.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows of `table` matching every filter
    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, BackendError>;

    /// Call a stored procedure
    async fn rpc(&self, name: &str, args: Value) -> Result<Value, BackendError>;
}
