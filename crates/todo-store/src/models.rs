//! Todo item models and request types.

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};

/// A todo item as stored and returned to clients.
///
/// Stored under `(user_id, created_at)`; `todo_id` is the external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub user_id: String,
    pub todo_id: String,
    /// RFC 3339 creation time. Part of the storage key.
    pub created_at: String,
    pub name: String,
    pub due_date: String,
    pub done: bool,
    /// Download URL, set at read time when an attachment exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Mutable fields of a todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemUpdate {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub name: String,
    pub due_date: String,
}

impl CreateTodoRequest {
    /// Reject an empty or whitespace-only name.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_name(&self.name)
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

impl UpdateTodoRequest {
    /// Reject an empty or whitespace-only name.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_name(&self.name)
    }
}

impl From<UpdateTodoRequest> for TodoItemUpdate {
    fn from(request: UpdateTodoRequest) -> Self {
        Self {
            name: request.name,
            due_date: request.due_date,
            done: request.done,
        }
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "name must not be empty".to_string(),
        ));
    }
    Ok(())
}
