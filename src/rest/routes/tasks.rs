// rest/routes/tasks.rs — task CRUD routes.
//
// Every handler threads the authenticated caller id into the storage layer;
// the engine's SQL scopes by it, so one user's tasks are unreachable through
// another user's token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::rest::{caller::Caller, error::ApiError};
use crate::tasks::{TaskPatch, TaskQuery};
use crate::AppContext;

/// Raw query params; coerced leniently (`?page=junk` falls back to 1) rather
/// than rejected, then normalized by `TaskQuery::from_params`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    #[serde(rename = "sortDirection")]
    pub sort_direction: Option<String>,
}

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    Caller(user_id): Caller,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = TaskQuery::from_params(
        q.page.as_deref(),
        q.limit.as_deref(),
        q.sort.as_deref(),
        q.sort_direction.as_deref(),
    );
    let page = ctx.tasks.list_page(user_id, &query).await?;
    Ok(Json(page.to_json()))
}

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Caller(user_id): Caller,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let title = body.title.as_deref().map(str::trim).unwrap_or("");
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".to_string()));
    }

    let task = ctx.tasks.create_task(user_id, title).await?;
    Ok((StatusCode::CREATED, Json(task.to_json())))
}

pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Caller(user_id): Caller,
    Path(id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Value>, ApiError> {
    let update = patch.resolve().map_err(ApiError::Validation)?;
    let found = ctx.tasks.update_task(user_id, id, &update).await?;
    if !found {
        return Err(ApiError::NotFound("task not found"));
    }
    Ok(Json(json!({ "message": "task updated" })))
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Caller(user_id): Caller,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let found = ctx.tasks.delete_task(user_id, id).await?;
    if !found {
        return Err(ApiError::NotFound("task not found"));
    }
    Ok(Json(json!({ "message": "task deleted" })))
}
