//! HTTP routes for the todo API.
//!
//! Defines the Axum router and application state.

use crate::handlers;
use crate::middleware::require_principal;
use crate::service::TodoService;
use authorizer::auth::Authorizer;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Item and attachment operations.
    pub service: Arc<TodoService>,

    /// Resolves the request owner from the bearer token.
    pub authorizer: Arc<Authorizer>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness check (public)
/// - `/todos` - List and create items (authenticated)
/// - `/todos/:todo_id` - Update and delete an item (authenticated)
/// - `/todos/:todo_id/attachment` - Attachment upload URL (authenticated)
pub fn build_routes(state: Arc<AppState>) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::health_check));

    let protected_routes = Router::new()
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/:todo_id",
            patch(handlers::update_todo).delete(handlers::delete_todo),
        )
        .route(
            "/todos/:todo_id/attachment",
            post(handlers::generate_upload_url),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_principal,
        ))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details (outermost)
    public_routes
        .merge(protected_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
}
