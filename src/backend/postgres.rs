//! Direct SQL access to the platform's Postgres.

use super::{Backend, Row, Select};
use crate::error::{BackendError, ConfigError};
use crate::sql::{self, BindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

#[derive(Clone, Debug)]
pub struct PgBackend {
    pool: PgPool,
    schema: String,
}

impl PgBackend {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgBackend {
            pool,
            schema: schema.into(),
        }
    }

    pub async fn connect(
        database_url: &str,
        schema: &str,
        max_connections: u32,
    ) -> Result<Self, ConfigError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, schema))
    }

    async fn fetch_rows(&self, q: &QueryBuf) -> Result<Vec<Row>, BackendError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, Json<Value>>(&q.sql);
        for p in &q.params {
            query = match p {
                BindValue::Text(s) => query.bind(s.clone()),
                BindValue::Json(v) => query.bind(Json(v.clone())),
            };
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|Json(v)| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn select(&self, table: &str, query: &Select) -> Result<Vec<Row>, BackendError> {
        self.fetch_rows(&sql::select(&self.schema, table, query)).await
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<Vec<Row>, BackendError> {
        self.fetch_rows(&sql::insert(&self.schema, table, row)).await
    }

    async fn update(&self, table: &str, id: &str, row: &Row) -> Result<Vec<Row>, BackendError> {
        self.fetch_rows(&sql::update(&self.schema, table, id, row)).await
    }

    async fn delete(&self, table: &str, id: &str) -> Result<Vec<Row>, BackendError> {
        self.fetch_rows(&sql::delete(&self.schema, table, id)).await
    }

    async fn ping(&self) -> Result<(), BackendError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
