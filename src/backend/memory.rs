//! In-process tables standing in for the managed backend (tests, local runs).
//! Mirrors the storage defaults the real tables have: UUID `id`, `created_at` timestamp,
//! and optional unique columns that reject duplicates atomically.

use super::{filter_text, Backend, Row, Select, CREATED_AT, ID};
use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    last_created: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    unique: HashSet<(String, String)>,
    failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts/updates that would duplicate `column` within `table`.
    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique.insert((table.to_string(), column.to_string()));
        self
    }

    /// Make every subsequent call fail with `message` (None to recover).
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = message.map(str::to_string);
    }

    /// Make inserts, updates and deletes fail with `message` while reads keep working.
    pub fn set_write_failure(&self, message: Option<&str>) {
        *self.write_failure.lock().unwrap_or_else(|e| e.into_inner()) = message.map(str::to_string);
    }

    /// Store a row verbatim, bypassing defaults and constraints.
    pub fn seed(&self, table: &str, row: Row) {
        self.lock().rows.entry(table.to_string()).or_default().push(row);
    }

    pub fn len(&self, table: &str) -> usize {
        self.lock().rows.get(table).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failure(&self) -> Result<(), BackendError> {
        match self.failure.lock().unwrap_or_else(|e| e.into_inner()).as_deref() {
            Some(message) => Err(BackendError::transport(message)),
            None => Ok(()),
        }
    }

    fn check_write_failure(&self) -> Result<(), BackendError> {
        self.check_failure()?;
        match self.write_failure.lock().unwrap_or_else(|e| e.into_inner()).as_deref() {
            Some(message) => Err(BackendError::query(message)),
            None => Ok(()),
        }
    }

    fn check_unique(&self, table: &str, rows: &[Row], candidate: &Row, skip_id: Option<&Value>) -> Result<(), BackendError> {
        for (t, column) in &self.unique {
            if t != table {
                continue;
            }
            let Some(value) = candidate.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = rows
                .iter()
                .filter(|r| skip_id.map_or(true, |id| r.get(ID) != Some(id)))
                .any(|r| r.get(column) == Some(value));
            if clash {
                return Err(BackendError::unique_violation(format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    table, column
                )));
            }
        }
        Ok(())
    }
}

/// Strictly increasing timestamps so creation order is always observable.
fn next_created_at(tables: &mut Tables) -> String {
    let now = Utc::now();
    let at = match tables.last_created {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    };
    tables.last_created = Some(at);
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn matches(row: &Row, filters: &[(String, Value)]) -> bool {
    filters.iter().all(|(col, want)| match row.get(col) {
        Some(Value::Null) | None => false,
        Some(have) => filter_text(have) == filter_text(want),
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, _) => Ordering::Less,
        (_, Some(Value::Null) | None) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, table: &str, query: &Select) -> Result<Vec<Row>, BackendError> {
        self.check_failure()?;
        let tables = self.lock();
        let mut rows: Vec<Row> = tables
            .rows
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, &query.filters)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<Vec<Row>, BackendError> {
        self.check_write_failure()?;
        let mut tables = self.lock();
        let mut row = row.clone();
        {
            let existing = tables.rows.get(table).map(Vec::as_slice).unwrap_or(&[]);
            self.check_unique(table, existing, &row, None)?;
        }
        if !row.contains_key(ID) {
            row.insert(ID.into(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if !row.contains_key(CREATED_AT) {
            let at = next_created_at(&mut *tables);
            row.insert(CREATED_AT.into(), Value::String(at));
        }
        tables.rows.entry(table.to_string()).or_default().push(row.clone());
        Ok(vec![row])
    }

    async fn update(&self, table: &str, id: &str, row: &Row) -> Result<Vec<Row>, BackendError> {
        self.check_write_failure()?;
        let mut tables = self.lock();
        let Some(rows) = tables.rows.get_mut(table) else {
            return Ok(Vec::new());
        };
        let id_value = Value::String(id.to_string());
        let Some(pos) = rows.iter().position(|r| r.get(ID).map(filter_text).as_deref() == Some(id)) else {
            return Ok(Vec::new());
        };
        let mut updated = rows[pos].clone();
        for (k, v) in row {
            if k != ID {
                updated.insert(k.clone(), v.clone());
            }
        }
        let current_id = rows[pos].get(ID).cloned().unwrap_or(id_value);
        self.check_unique(table, rows, &updated, Some(&current_id))?;
        rows[pos] = updated.clone();
        Ok(vec![updated])
    }

    async fn delete(&self, table: &str, id: &str) -> Result<Vec<Row>, BackendError> {
        self.check_write_failure()?;
        let mut tables = self.lock();
        let Some(rows) = tables.rows.get_mut(table) else {
            return Ok(Vec::new());
        };
        let (gone, kept): (Vec<Row>, Vec<Row>) = rows
            .drain(..)
            .partition(|r| r.get(ID).map(filter_text).as_deref() == Some(id));
        *rows = kept;
        Ok(gone)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.check_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn insert_fills_defaults_and_orders_by_creation() {
        let backend = MemoryBackend::new();
        for name in ["a", "b", "c"] {
            backend.insert("clients", &row(json!({ "name": name }))).await.unwrap();
        }
        let rows = backend
            .select("clients", &Select::all().order_desc(CREATED_AT))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["c", "b", "a"]);
        assert!(rows.iter().all(|r| r.contains_key(ID)));
    }

    #[tokio::test]
    async fn unique_columns_reject_duplicates() {
        let backend = MemoryBackend::new().with_unique("clients", "email");
        let alice = row(json!({ "email": "a@x.com" }));
        backend.insert("clients", &alice).await.unwrap();
        let err = backend.insert("clients", &alice).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(backend.len("clients"), 1);
    }

    #[tokio::test]
    async fn update_and_delete_by_id() {
        let backend = MemoryBackend::new();
        let created = backend.insert("partners", &row(json!({ "nom": "AXA" }))).await.unwrap();
        let id = created[0][ID].as_str().unwrap().to_string();

        let updated = backend
            .update("partners", &id, &row(json!({ "nom": "Allianz", "id": "ignored" })))
            .await
            .unwrap();
        assert_eq!(updated[0]["nom"], json!("Allianz"));
        assert_eq!(updated[0][ID], json!(id));

        assert!(backend.update("partners", "missing", &Row::new()).await.unwrap().is_empty());
        assert_eq!(backend.delete("partners", &id).await.unwrap().len(), 1);
        assert!(backend.is_empty("partners"));
    }

    #[tokio::test]
    async fn filters_compare_as_text() {
        let backend = MemoryBackend::new();
        backend.seed("contracts", row(json!({ "id": "1", "montant_annuel": 1200 })));
        backend.seed("contracts", row(json!({ "id": "2", "montant_annuel": 800 })));
        let rows = backend
            .select("contracts", &Select::all().eq("montant_annuel", "1200"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!("1"));
    }

    #[tokio::test]
    async fn injected_failure_surfaces() {
        let backend = MemoryBackend::new();
        backend.set_failure(Some("connection refused"));
        let err = backend.select("clients", &Select::all()).await.unwrap_err();
        assert_eq!(err.message, "connection refused");
        backend.set_failure(None);
        assert!(backend.ping().await.is_ok());
    }

    #[tokio::test]
    async fn write_failure_leaves_reads_working() {
        let backend = MemoryBackend::new();
        backend.set_write_failure(Some("permission denied for table clients"));
        assert!(backend.select("clients", &Select::all()).await.unwrap().is_empty());
        let err = backend.insert("clients", &row(json!({ "name": "a" }))).await.unwrap_err();
        assert_eq!(err.message, "permission denied for table clients");
        assert!(backend.is_empty("clients"));
    }
}
