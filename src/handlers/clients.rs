//! Client endpoints. Create and replace accept `{name, email}` only.

use super::list_params;
use crate::error::AppError;
use crate::model::client::{self, NewClient};
use crate::response::{created, ok};
use crate::service::{ClientService, RecordService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn new_client(body: Option<Json<Value>>) -> Result<NewClient, AppError> {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    NewClient::from_body(&body).ok_or_else(|| AppError::BadRequest(client::MISSING_FIELDS.into()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = list_params(query, client::FILTERS);
    let rows = RecordService::list(state.backend.as_ref(), client::TABLE, &params).await?;
    Ok(ok(rows))
}

pub async fn create(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let new = new_client(body)?;
    let row = ClientService::create(state.backend.as_ref(), state.email_uniqueness, &new).await?;
    Ok(created(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let row = RecordService::read(state.backend.as_ref(), client::TABLE, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(client::NOT_FOUND.into()))?;
    Ok(ok(row))
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let new = new_client(body)?;
    let row = ClientService::replace(state.backend.as_ref(), state.email_uniqueness, &id, &new)
        .await?
        .ok_or_else(|| AppError::NotFound(client::NOT_FOUND.into()))?;
    Ok(ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !RecordService::delete(state.backend.as_ref(), client::TABLE, &id).await? {
        return Err(AppError::NotFound(client::NOT_FOUND.into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
