use async_trait::async_trait;
use serde_json::{Map, Value};

use super::manager::DatabaseError;
use crate::statement::Statement;

/// Driver result reduced to what handlers need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub row_count: u64,
    pub rows: Vec<Map<String, Value>>,
}

impl QueryOutcome {
    pub fn affected(row_count: u64) -> Self {
        Self { row_count, rows: Vec::new() }
    }

    pub fn with_rows(rows: Vec<Map<String, Value>>) -> Self {
        Self {
            row_count: rows.len() as u64,
            rows,
        }
    }

    pub fn first(&self) -> Option<&Map<String, Value>> {
        self.rows.first()
    }

    pub fn rows_value(self) -> Value {
        Value::Array(self.rows.into_iter().map(Value::Object).collect())
    }
}

/// Connection pool seen by handlers. Injected through application state.
#[async_trait]
pub trait Database: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<QueryOutcome, DatabaseError>;

    async fn begin(&self) -> Result<Box<dyn Transaction>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait Transaction: Send {
    async fn execute(&mut self, statement: &Statement) -> Result<QueryOutcome, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError>;
}
