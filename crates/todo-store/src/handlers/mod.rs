//! HTTP request handlers for the todo API.

pub mod health;
pub mod todos;

pub use health::health_check;
pub use todos::{create_todo, delete_todo, generate_upload_url, list_todos, update_todo};
