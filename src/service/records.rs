//! Record operations over any `Backend`: list, read, create, replace, delete.
//! Rows leave this layer with camelCase keys.

use crate::backend::{Backend, Row, Select, CREATED_AT, ID};
use crate::case::{object_keys_to_camel_case, to_snake_case};
use crate::config::EmailUniqueness;
use crate::error::{AppError, BackendError};
use crate::model::client::{self, NewClient};
use serde_json::Value;

/// Listing parameters taken from the query string.
#[derive(Clone, Debug, Default)]
pub struct ListParams {
    /// Wire (camelCase) field name and the text it must equal.
    pub filters: Vec<(String, String)>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn to_wire(mut row: Row) -> Value {
    object_keys_to_camel_case(&mut row);
    Value::Object(row)
}

pub struct RecordService;

impl RecordService {
    /// Rows ordered by creation time, newest first. No limit unless one is requested.
    pub async fn list(
        backend: &dyn Backend,
        table: &str,
        params: &ListParams,
    ) -> Result<Vec<Value>, AppError> {
        let mut query = Select::all().order_desc(CREATED_AT);
        for (field, value) in &params.filters {
            query = query.eq(to_snake_case(field), value.as_str());
        }
        query.limit = params.limit;
        query.offset = params.offset;
        let rows = backend.select(table, &query).await?;
        Ok(rows.into_iter().map(to_wire).collect())
    }

    pub async fn read(backend: &dyn Backend, table: &str, id: &str) -> Result<Option<Value>, AppError> {
        let rows = backend.select(table, &Select::all().eq(ID, id).limit(1)).await?;
        Ok(rows.into_iter().next().map(to_wire))
    }

    /// Insert and return the first stored row.
    pub async fn create(backend: &dyn Backend, table: &str, row: &Row) -> Result<Value, AppError> {
        let rows = backend.insert(table, row).await?;
        first_row(rows, "insert")
    }

    pub async fn replace(
        backend: &dyn Backend,
        table: &str,
        id: &str,
        row: &Row,
    ) -> Result<Option<Value>, AppError> {
        let rows = backend.update(table, id, row).await?;
        Ok(rows.into_iter().next().map(to_wire))
    }

    /// True when a row was deleted.
    pub async fn delete(backend: &dyn Backend, table: &str, id: &str) -> Result<bool, AppError> {
        Ok(!backend.delete(table, id).await?.is_empty())
    }
}

fn first_row(rows: Vec<Row>, op: &str) -> Result<Value, AppError> {
    rows.into_iter()
        .next()
        .map(to_wire)
        .ok_or_else(|| AppError::Backend(BackendError::query(format!("{} returned no row", op))))
}

/// Client writes: the storage constraint is authoritative, the lookup is optional.
pub struct ClientService;

impl ClientService {
    pub async fn create(
        backend: &dyn Backend,
        guard: EmailUniqueness,
        client: &NewClient,
    ) -> Result<Value, AppError> {
        if guard == EmailUniqueness::Precheck && Self::email_taken(backend, &client.email, None).await? {
            return Err(AppError::Conflict(client::DUPLICATE_EMAIL.into()));
        }
        let rows = backend
            .insert(client::TABLE, &client.to_row())
            .await
            .map_err(conflict_on_duplicate)?;
        tracing::info!(email = %client.email, "client created");
        first_row(rows, "insert")
    }

    pub async fn replace(
        backend: &dyn Backend,
        guard: EmailUniqueness,
        id: &str,
        client: &NewClient,
    ) -> Result<Option<Value>, AppError> {
        if guard == EmailUniqueness::Precheck && Self::email_taken(backend, &client.email, Some(id)).await? {
            return Err(AppError::Conflict(client::DUPLICATE_EMAIL.into()));
        }
        let rows = backend
            .update(client::TABLE, id, &client.to_row())
            .await
            .map_err(conflict_on_duplicate)?;
        Ok(rows.into_iter().next().map(to_wire))
    }

    /// Racy by nature: two requests can both see "free" before either inserts.
    async fn email_taken(
        backend: &dyn Backend,
        email: &str,
        except_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let rows = backend
            .select(client::TABLE, &Select::all().eq("email", email))
            .await?;
        Ok(rows.iter().any(|r| {
            let id = r.get(ID).map(crate::backend::filter_text);
            except_id.map_or(true, |except| id.as_deref() != Some(except))
        }))
    }
}

fn conflict_on_duplicate(e: BackendError) -> AppError {
    if e.is_unique_violation() {
        AppError::Conflict(client::DUPLICATE_EMAIL.into())
    } else {
        AppError::Backend(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;

    fn alice() -> NewClient {
        NewClient {
            name: "Alice".into(),
            email: "a@x.com".into(),
        }
    }

    #[tokio::test]
    async fn precheck_catches_duplicates_without_a_constraint() {
        let backend = MemoryBackend::new();
        ClientService::create(&backend, EmailUniqueness::Precheck, &alice()).await.unwrap();
        let err = ClientService::create(&backend, EmailUniqueness::Precheck, &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(backend.len("clients"), 1);
    }

    #[tokio::test]
    async fn default_guard_needs_no_constraint() {
        let backend = MemoryBackend::new();
        ClientService::create(&backend, EmailUniqueness::default(), &alice()).await.unwrap();
        let err = ClientService::create(&backend, EmailUniqueness::default(), &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn storage_constraint_maps_to_conflict() {
        let backend = MemoryBackend::new().with_unique("clients", "email");
        ClientService::create(&backend, EmailUniqueness::Storage, &alice()).await.unwrap();
        let err = ClientService::create(&backend, EmailUniqueness::Storage, &alice())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), client::DUPLICATE_EMAIL);
    }

    #[tokio::test]
    async fn replace_may_keep_its_own_email() {
        let backend = MemoryBackend::new();
        let created = ClientService::create(&backend, EmailUniqueness::Precheck, &alice()).await.unwrap();
        let id = created["id"].as_str().unwrap();
        let renamed = NewClient {
            name: "Alice Martin".into(),
            ..alice()
        };
        let updated = ClientService::replace(&backend, EmailUniqueness::Precheck, id, &renamed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["name"], json!("Alice Martin"));
    }

    #[tokio::test]
    async fn list_output_is_camel_case_and_newest_first() {
        let backend = MemoryBackend::new();
        backend.seed("contracts", crate::model::row_from(json!({ "id": "1", "date_debut": "2024-01-01", "created_at": "2024-01-01T00:00:00Z" })));
        backend.seed("contracts", crate::model::row_from(json!({ "id": "2", "date_debut": "2024-02-01", "created_at": "2024-03-01T00:00:00Z" })));
        let rows = RecordService::list(&backend, "contracts", &ListParams::default()).await.unwrap();
        assert_eq!(rows[0]["id"], json!("2"));
        assert_eq!(rows[1]["dateDebut"], json!("2024-01-01"));
        assert!(rows[0].get("createdAt").is_some());
    }
}
