//! Todo business layer.
//!
//! Owns id and timestamp generation and decorates listed items with
//! attachment download URLs. Storage goes through [`ItemStore`] and
//! [`ObjectStore`] so backends can be swapped.

use crate::attachments::ObjectStore;
use crate::errors::StoreError;
use crate::items::ItemStore;
use crate::models::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

pub struct TodoService {
    items: Arc<dyn ItemStore>,
    objects: Arc<dyn ObjectStore>,
}

impl TodoService {
    pub fn new(items: Arc<dyn ItemStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { items, objects }
    }

    /// List the owner's items, attaching a download URL to each item
    /// whose attachment exists.
    #[instrument(skip_all, name = "store.service.list_items")]
    pub async fn list_items(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        let mut items = self.items.list_by_owner(user_id).await?;

        for item in &mut items {
            if self.objects.exists(&item.todo_id).await {
                item.attachment_url = Some(self.objects.download_url(&item.todo_id));
            }
        }

        Ok(items)
    }

    #[instrument(skip_all, name = "store.service.create_item")]
    pub async fn create_item(
        &self,
        user_id: &str,
        request: CreateTodoRequest,
    ) -> Result<TodoItem, StoreError> {
        request.validate()?;

        let item = TodoItem {
            user_id: user_id.to_string(),
            todo_id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            name: request.name,
            due_date: request.due_date,
            done: false,
            attachment_url: None,
        };

        let item = self.items.create(item).await?;
        tracing::info!(target: "store.service", todo_id = %item.todo_id, "Todo item created");
        Ok(item)
    }

    /// Update an item. Fails with `NotFound` when the owner has no such item.
    #[instrument(skip_all, name = "store.service.update_item")]
    pub async fn update_item(
        &self,
        user_id: &str,
        todo_id: &str,
        request: UpdateTodoRequest,
    ) -> Result<(), StoreError> {
        request.validate()?;

        if !self.items.update(user_id, todo_id, &request.into()).await? {
            return Err(StoreError::NotFound(format!("todo item {todo_id}")));
        }

        tracing::info!(target: "store.service", todo_id = %todo_id, "Todo item updated");
        Ok(())
    }

    #[instrument(skip_all, name = "store.service.delete_item")]
    pub async fn delete_item(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError> {
        self.items.delete(user_id, todo_id).await?;
        tracing::info!(target: "store.service", todo_id = %todo_id, "Todo item deleted");
        Ok(())
    }

    /// Presigned upload URL for an item's attachment.
    ///
    /// `None` when the item does not belong to `user_id`.
    #[instrument(skip_all, name = "store.service.attachment_upload_url")]
    pub async fn attachment_upload_url(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let item = self
            .items
            .find_by_owner_and_external_id(user_id, todo_id)
            .await?;

        Ok(item.map(|item| self.objects.upload_url(&item.todo_id)))
    }
}
