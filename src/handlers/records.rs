//! Generic CRUD handlers for any schema-validated `Resource`.

use super::list_params;
use crate::error::AppError;
use crate::model::Resource;
use crate::response::{created, ok};
use crate::service::{RecordService, Violations};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn parse<R: Resource>(body: Option<Json<Value>>) -> Result<R, AppError> {
    let Some(Json(body)) = body else {
        let mut v = Violations::default();
        v.push("$", "corps JSON manquant ou invalide");
        return Err(AppError::Validation(v));
    };
    R::parse(&body).map_err(|violations| {
        tracing::debug!(table = R::TABLE, %violations, "payload rejected");
        AppError::Validation(violations)
    })
}

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = list_params(query, R::FILTERS);
    let rows = RecordService::list(state.backend.as_ref(), R::TABLE, &params).await?;
    Ok(ok(rows))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let record = parse::<R>(body)?;
    let row = RecordService::create(state.backend.as_ref(), R::TABLE, &record.to_row()).await?;
    Ok(created(row))
}

pub async fn read<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let row = RecordService::read(state.backend.as_ref(), R::TABLE, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(R::NOT_FOUND.into()))?;
    Ok(ok(row))
}

pub async fn replace<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let record = parse::<R>(body)?;
    let row = RecordService::replace(state.backend.as_ref(), R::TABLE, &id, &record.to_row())
        .await?
        .ok_or_else(|| AppError::NotFound(R::NOT_FOUND.into()))?;
    Ok(ok(row))
}

pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !RecordService::delete(state.backend.as_ref(), R::TABLE, &id).await? {
        return Err(AppError::NotFound(R::NOT_FOUND.into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
