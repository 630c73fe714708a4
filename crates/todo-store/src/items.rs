//! Todo item storage.
//!
//! Items are keyed by `(user_id, created_at)`. The external `todo_id` is
//! only reachable through the `(user_id, todo_id)` secondary index, so
//! every mutation addressed by `todo_id` first resolves the storage key
//! through the index and then writes by that key.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)
//! - Every lookup is scoped by `user_id`; one owner never reaches
//!   another's items

use crate::errors::StoreError;
use crate::models::{TodoItem, TodoItemUpdate};
use async_trait::async_trait;
use common::secret::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

/// Item storage backend.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items of one owner, oldest first.
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError>;

    /// Insert a new item.
    async fn create(&self, item: TodoItem) -> Result<TodoItem, StoreError>;

    /// Find one owner's item by external id.
    async fn find_by_owner_and_external_id(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<Option<TodoItem>, StoreError>;

    /// Update an item. Returns `false` when the owner has no such item.
    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoItemUpdate,
    ) -> Result<bool, StoreError>;

    /// Delete an item. Deleting a missing item is a no-op.
    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Postgres
// ============================================================================

/// Postgres-backed item store.
#[derive(Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

/// Database row for todo items.
#[derive(sqlx::FromRow)]
struct TodoItemRow {
    user_id: String,
    todo_id: String,
    created_at: String,
    name: String,
    due_date: String,
    done: bool,
}

impl From<TodoItemRow> for TodoItem {
    fn from(row: TodoItemRow) -> Self {
        TodoItem {
            user_id: row.user_id,
            todo_id: row.todo_id,
            created_at: row.created_at,
            name: row.name,
            due_date: row.due_date,
            done: row.done,
            attachment_url: None,
        }
    }
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool using the configured database URL.
    pub async fn connect(database_url: &common::secret::SecretString) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!(target: "store.items", error = %e, "Failed to connect to database");
                StoreError::from(e)
            })?;

        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Resolve `todo_id` to the storage key's `created_at` via the index.
    async fn resolve_created_at(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let created_at: Option<String> = sqlx::query_scalar(
            r#"
            SELECT created_at
            FROM todo_items
            WHERE user_id = $1 AND todo_id = $2
            "#,
        )
        .bind(user_id)
        .bind(todo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(created_at)
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    #[instrument(skip_all, name = "store.items.list")]
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        let rows: Vec<TodoItemRow> = sqlx::query_as(
            r#"
            SELECT user_id, todo_id, created_at, name, due_date, done
            FROM todo_items
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(target: "store.items", count = rows.len(), "Listed todo items");
        Ok(rows.into_iter().map(TodoItem::from).collect())
    }

    #[instrument(skip_all, name = "store.items.create")]
    async fn create(&self, item: TodoItem) -> Result<TodoItem, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO todo_items (user_id, created_at, todo_id, name, due_date, done)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&item.user_id) // $1
        .bind(&item.created_at) // $2
        .bind(&item.todo_id) // $3
        .bind(&item.name) // $4
        .bind(&item.due_date) // $5
        .bind(item.done) // $6
        .execute(&self.pool)
        .await?;

        tracing::debug!(target: "store.items", todo_id = %item.todo_id, "Created todo item");
        Ok(item)
    }

    #[instrument(skip_all, name = "store.items.find")]
    async fn find_by_owner_and_external_id(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<Option<TodoItem>, StoreError> {
        let row: Option<TodoItemRow> = sqlx::query_as(
            r#"
            SELECT user_id, todo_id, created_at, name, due_date, done
            FROM todo_items
            WHERE user_id = $1 AND todo_id = $2
            "#,
        )
        .bind(user_id)
        .bind(todo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TodoItem::from))
    }

    #[instrument(skip_all, name = "store.items.update")]
    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoItemUpdate,
    ) -> Result<bool, StoreError> {
        let Some(created_at) = self.resolve_created_at(user_id, todo_id).await? else {
            tracing::debug!(target: "store.items", todo_id = %todo_id, "Update target not found");
            return Ok(false);
        };

        let result = sqlx::query(
            r#"
            UPDATE todo_items
            SET name = $3, due_date = $4, done = $5
            WHERE user_id = $1 AND created_at = $2
            "#,
        )
        .bind(user_id) // $1
        .bind(&created_at) // $2
        .bind(&update.name) // $3
        .bind(&update.due_date) // $4
        .bind(update.done) // $5
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, name = "store.items.delete")]
    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError> {
        let Some(created_at) = self.resolve_created_at(user_id, todo_id).await? else {
            tracing::debug!(target: "store.items", todo_id = %todo_id, "Delete target not found");
            return Ok(());
        };

        sqlx::query(
            r#"
            DELETE FROM todo_items
            WHERE user_id = $1 AND created_at = $2
            "#,
        )
        .bind(user_id)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

type StorageKey = (String, String);

#[derive(Default)]
struct InMemoryTables {
    /// `(user_id, created_at)` -> item
    items: BTreeMap<StorageKey, TodoItem>,
    /// `(user_id, todo_id)` -> `created_at`
    by_todo_id: HashMap<StorageKey, String>,
}

/// In-memory item store with the same key/index layout as Postgres.
///
/// Used by tests and local runs without a database.
#[derive(Default)]
pub struct InMemoryItemStore {
    tables: RwLock<InMemoryTables>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn create(&self, item: TodoItem) -> Result<TodoItem, StoreError> {
        let mut tables = self.tables.write().await;
        let key = (item.user_id.clone(), item.created_at.clone());
        let index_key = (item.user_id.clone(), item.todo_id.clone());

        if tables.items.contains_key(&key) || tables.by_todo_id.contains_key(&index_key) {
            return Err(StoreError::Database(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }

        tables.by_todo_id.insert(index_key, item.created_at.clone());
        tables.items.insert(key, item.clone());
        Ok(item)
    }

    async fn find_by_owner_and_external_id(
        &self,
        user_id: &str,
        todo_id: &str,
    ) -> Result<Option<TodoItem>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_todo_id
            .get(&(user_id.to_string(), todo_id.to_string()))
            .and_then(|created_at| {
                tables
                    .items
                    .get(&(user_id.to_string(), created_at.clone()))
            })
            .cloned())
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoItemUpdate,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(created_at) = tables
            .by_todo_id
            .get(&(user_id.to_string(), todo_id.to_string()))
            .cloned()
        else {
            return Ok(false);
        };

        match tables.items.get_mut(&(user_id.to_string(), created_at)) {
            Some(item) => {
                item.name.clone_from(&update.name);
                item.due_date.clone_from(&update.due_date);
                item.done = update.done;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(created_at) = tables
            .by_todo_id
            .remove(&(user_id.to_string(), todo_id.to_string()))
        {
            tables.items.remove(&(user_id.to_string(), created_at));
        }
        Ok(())
    }
}
