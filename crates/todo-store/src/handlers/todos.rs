//! Todo item handlers.
//!
//! - `GET /todos` - List the caller's items
//! - `POST /todos` - Create an item
//! - `PATCH /todos/{todo_id}` - Update an item
//! - `DELETE /todos/{todo_id}` - Delete an item
//! - `POST /todos/{todo_id}/attachment` - Presigned attachment upload URL
//!
//! Every handler runs behind [`require_principal`]; the principal is the
//! owner every storage call is scoped by.
//!
//! [`require_principal`]: crate::middleware::require_principal

use crate::errors::ApiError;
use crate::middleware::Principal;
use crate::models::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
use crate::routes::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Body of `GET /todos`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListTodosResponse {
    pub items: Vec<TodoItem>,
}

/// Body of `POST /todos`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTodoResponse {
    pub item: TodoItem,
}

/// Body of `POST /todos/{todo_id}/attachment`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
}

fn require_todo_id(todo_id: &str) -> Result<(), ApiError> {
    if todo_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Invalid todoId parameter".to_string()));
    }
    Ok(())
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(target: "store.http", error = %rejection, "Invalid request body");
        ApiError::BadRequest("Invalid request body".to_string())
    })
}

/// Handler for GET /todos
#[instrument(skip_all, name = "store.http.list_todos")]
pub async fn list_todos(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ListTodosResponse>, ApiError> {
    let items = state.service.list_items(&principal.user_id).await?;

    tracing::info!(target: "store.http", count = items.len(), "Todo items fetched");
    Ok(Json(ListTodosResponse { items }))
}

/// Handler for POST /todos
///
/// # Response
///
/// - 201 Created with the new item
/// - 400 Bad Request on an unparsable body or empty name
#[instrument(skip_all, name = "store.http.create_todo")]
pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTodoResponse>), ApiError> {
    let request = parse_body(payload)?;
    let item = state
        .service
        .create_item(&principal.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(CreateTodoResponse { item })))
}

/// Handler for PATCH /todos/{todo_id}
///
/// # Response
///
/// - 200 OK with an empty body
/// - 400 Bad Request on a blank id, unparsable body, or empty name
/// - 404 Not Found when the caller owns no such item
#[instrument(skip_all, name = "store.http.update_todo", fields(todo_id = %todo_id))]
pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    require_todo_id(&todo_id)?;
    let request = parse_body(payload)?;

    state
        .service
        .update_item(&principal.user_id, &todo_id, request)
        .await?;

    Ok(StatusCode::OK)
}

/// Handler for DELETE /todos/{todo_id}
///
/// Deleting an item the caller does not own is a no-op and still 200.
#[instrument(skip_all, name = "store.http.delete_todo", fields(todo_id = %todo_id))]
pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_todo_id(&todo_id)?;

    state
        .service
        .delete_item(&principal.user_id, &todo_id)
        .await?;

    Ok(StatusCode::OK)
}

/// Handler for POST /todos/{todo_id}/attachment
///
/// # Response
///
/// - 200 OK with `{"uploadUrl": ...}`
/// - 400 Bad Request on a blank id
/// - 404 Not Found when the caller owns no such item
#[instrument(skip_all, name = "store.http.generate_upload_url", fields(todo_id = %todo_id))]
pub async fn generate_upload_url(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    require_todo_id(&todo_id)?;

    let upload_url = state
        .service
        .attachment_upload_url(&principal.user_id, &todo_id)
        .await?
        .ok_or_else(|| {
            tracing::info!(target: "store.http", "Todo item does not exist");
            ApiError::NotFound("Todo item does not exist".to_string())
        })?;

    Ok(Json(UploadUrlResponse { upload_url }))
}
