//! Managed-backend access. Handlers only ever see `dyn Backend`; the entry point picks the implementation.

mod memory;
mod postgres;
mod rest;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;
pub use rest::RestBackend;
pub(crate) use rest::auth_headers;

use crate::error::BackendError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A stored record as returned by the backend (snake_case column keys).
pub type Row = Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Read query: exact-match filters, ordering and paging.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Select {
    pub filters: Vec<(String, Value)>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Select {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Column every table orders its listings by.
pub const CREATED_AT: &str = "created_at";
/// Primary key column of every table.
pub const ID: &str = "id";

#[async_trait]
pub trait Backend: Send + Sync {
    async fn select(&self, table: &str, query: &Select) -> Result<Vec<Row>, BackendError>;

    /// Insert one row. Returns what the backend stored (defaults filled in).
    async fn insert(&self, table: &str, row: &Row) -> Result<Vec<Row>, BackendError>;

    /// Overwrite the given columns of the row with primary key `id`. Empty when no such row.
    async fn update(&self, table: &str, id: &str, row: &Row) -> Result<Vec<Row>, BackendError>;

    /// Delete the row with primary key `id`. Empty when no such row.
    async fn delete(&self, table: &str, id: &str) -> Result<Vec<Row>, BackendError>;

    async fn ping(&self) -> Result<(), BackendError>;
}

/// Render a filter value the way text-comparing backends expect it (`"abc"` -> `abc`, `12` -> `12`).
pub(crate) fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
