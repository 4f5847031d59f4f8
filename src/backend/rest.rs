//! The platform's REST query API (`/rest/v1/{table}`).

use super::{filter_text, Backend, Row, Select, ID};
use crate::error::{BackendError, BackendErrorKind, ConfigError, PG_UNIQUE_VIOLATION};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;

/// Error document the query API answers with on failure.
#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RestBackend {
    base: String,
    http: reqwest::Client,
}

/// Headers carrying the access key, shared by the query API and the functions endpoint.
pub(crate) fn auth_headers(key: &str) -> Result<HeaderMap, ConfigError> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| ConfigError::Invalid {
        name: "BACKEND_KEY",
        reason: e.to_string(),
    };
    let mut headers = HeaderMap::new();
    let mut apikey = HeaderValue::from_str(key).map_err(invalid)?;
    apikey.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?;
    bearer.set_sensitive(true);
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

impl RestBackend {
    pub fn new(url: &str, key: &str) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .default_headers(auth_headers(key)?)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(RestBackend {
            base: format!("{}/rest/v1", url.trim_end_matches('/')),
            http,
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http.request(method, format!("{}/{}", self.base, table))
    }

    fn by_id(&self, method: Method, table: &str, id: &str) -> RequestBuilder {
        self.request(method, table)
            .query(&[(ID, format!("eq.{}", id))])
            .header("Prefer", "return=representation")
    }

    async fn rows(response: Response) -> Result<Vec<Row>, BackendError> {
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<Row>>().await?)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await?;
        let (kind, message) = match serde_json::from_str::<ApiError>(&text) {
            Ok(api) => {
                let kind = if api.code.as_deref() == Some(PG_UNIQUE_VIOLATION) {
                    BackendErrorKind::UniqueViolation
                } else {
                    BackendErrorKind::Query
                };
                (kind, api.message.unwrap_or_else(|| status.to_string()))
            }
            Err(_) if text.trim().is_empty() => (BackendErrorKind::Query, status.to_string()),
            Err(_) => (BackendErrorKind::Query, text),
        };
        Err(BackendError::new(kind, message))
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, table: &str, query: &Select) -> Result<Vec<Row>, BackendError> {
        let mut params: Vec<(String, String)> = vec![("select".into(), "*".into())];
        for (col, val) in &query.filters {
            params.push((col.clone(), format!("eq.{}", filter_text(val))));
        }
        if let Some(order) = &query.order {
            let dir = if order.descending { "desc" } else { "asc" };
            params.push(("order".into(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".into(), limit.min(crate::sql::MAX_LIMIT).to_string()));
        }
        if let Some(offset) = query.offset {
            params.push(("offset".into(), offset.to_string()));
        }
        tracing::debug!(table, ?params, "rest select");
        let response = self.request(Method::GET, table).query(&params).send().await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<Vec<Row>, BackendError> {
        tracing::debug!(table, "rest insert");
        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn update(&self, table: &str, id: &str, row: &Row) -> Result<Vec<Row>, BackendError> {
        tracing::debug!(table, id, "rest update");
        let mut row = row.clone();
        row.remove(ID);
        let response = self.by_id(Method::PATCH, table, id).json(&row).send().await?;
        Self::rows(response).await
    }

    async fn delete(&self, table: &str, id: &str) -> Result<Vec<Row>, BackendError> {
        tracing::debug!(table, id, "rest delete");
        let response = self.by_id(Method::DELETE, table, id).send().await?;
        Self::rows(response).await
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let response = self.http.get(format!("{}/", self.base)).send().await?;
        Self::check(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn select_sends_filters_order_and_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/clients")
            .match_header("apikey", "secret")
            .match_header("authorization", "Bearer secret")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*".into()),
                Matcher::UrlEncoded("email".into(), "eq.a@x.com".into()),
                Matcher::UrlEncoded("order".into(), "created_at.desc".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"1","name":"Alice","email":"a@x.com"}]"#)
            .create_async()
            .await;

        let backend = RestBackend::new(&server.url(), "secret").unwrap();
        let rows = backend
            .select(
                "clients",
                &Select::all().eq("email", "a@x.com").order_desc("created_at").limit(1),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Alice"));
    }

    #[tokio::test]
    async fn unique_violation_is_recognised() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/rest/v1/clients")
            .match_header("prefer", "return=representation")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code":"23505","message":"duplicate key value violates unique constraint \"clients_email_key\""}"#,
            )
            .create_async()
            .await;

        let backend = RestBackend::new(&format!("{}/", server.url()), "k").unwrap();
        let mut row = Row::new();
        row.insert("email".into(), json!("a@x.com"));
        let err = backend.insert("clients", &row).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert!(err.message.starts_with("duplicate key value"));
    }

    #[tokio::test]
    async fn plain_text_errors_pass_through() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/rest/v1/partners")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.p1".into()))
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let backend = RestBackend::new(&server.url(), "k").unwrap();
        let err = backend.delete("partners", "p1").await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Query);
        assert_eq!(err.message, "upstream unavailable");
    }

    #[test]
    fn rejects_keys_that_cannot_be_headers() {
        assert!(RestBackend::new("https://x.example", "bad\nkey").is_err());
    }
}
