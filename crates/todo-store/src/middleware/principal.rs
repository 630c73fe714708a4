//! Owner resolution for protected routes.
//!
//! Runs the bearer-token authorizer on the request's `Authorization` header
//! and, on Allow, stores the decision's principal in request extensions.
//! The principal is the owner (`user_id`) of every item the request touches.

use crate::errors::ApiError;
use crate::routes::AppState;
use authorizer::auth::Effect;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// Authenticated owner of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

/// Reject requests the authorizer denies; attach the [`Principal`] otherwise.
///
/// # Response
///
/// - 401 Unauthorized with `WWW-Authenticate` on a Deny decision
/// - Continues to the handler with the principal in extensions on Allow
#[instrument(skip_all, name = "store.middleware.principal")]
pub async fn require_principal(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let decision = state.authorizer.authorize(authorization).await;

    // The principal of a Deny is a sentinel, never an owner
    if decision.effect() != Effect::Allow {
        tracing::debug!(target: "store.http", "Request rejected by authorizer");
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(Principal {
        user_id: decision.principal_id,
    });

    Ok(next.run(req).await)
}
