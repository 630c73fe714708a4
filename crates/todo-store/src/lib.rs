//! Todo item and attachment storage, and the HTTP API over it.
//!
//! Items are owned by the principal the bearer-token authorizer resolves
//! and stored under `(user_id, created_at)` with a `(user_id, todo_id)`
//! secondary index. Attachments live in object storage behind presigned
//! URLs.
//!
//! # Modules
//!
//! - `items` - Item storage backends
//! - `attachments` - Presigned object storage
//! - `service` - Business layer over both stores
//! - `handlers`, `middleware`, `routes` - Axum HTTP surface

pub mod attachments;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod items;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;

pub use attachments::{ObjectStore, PresignMethod, PresignedObjectStore};
pub use config::{AttachmentsConfig, ConfigError, StoreConfig};
pub use errors::{ApiError, StoreError};
pub use items::{InMemoryItemStore, ItemStore, PgItemStore};
pub use models::{CreateTodoRequest, TodoItem, TodoItemUpdate, UpdateTodoRequest};
pub use service::TodoService;
