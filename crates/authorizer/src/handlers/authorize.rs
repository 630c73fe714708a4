//! Gateway authorizer endpoint.

use crate::auth::AuthorizationDecision;
use crate::errors::AuthorizerError;
use crate::routes::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Token-authorizer event sent by the API gateway.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    /// Event type, `TOKEN` for header-token authorizers.
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,

    /// Raw `Authorization` header value - redacted in Debug output.
    #[serde(default)]
    pub authorization_token: Option<String>,

    /// ARN of the method being invoked.
    #[serde(default)]
    pub method_arn: Option<String>,
}

impl fmt::Debug for AuthorizeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizeRequest")
            .field("event_type", &self.event_type)
            .field(
                "authorization_token",
                &self.authorization_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("method_arn", &self.method_arn)
            .finish()
    }
}

/// Handler for POST /v1/authorize
///
/// Always answers a parsable request with 200 and a decision; only a body
/// that is not a valid event is an error.
#[instrument(skip_all, name = "authz.http.authorize")]
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthorizeRequest>, JsonRejection>,
) -> Result<Json<AuthorizationDecision>, AuthorizerError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(target: "authz.http", error = %rejection, "Invalid authorize request body");
        AuthorizerError::BadRequest("Invalid request body".to_string())
    })?;

    tracing::debug!(
        target: "authz.http",
        method_arn = request.method_arn.as_deref().unwrap_or("<none>"),
        "Authorize request received"
    );

    let decision = state
        .authorizer
        .authorize(request.authorization_token.as_deref())
        .await;

    Ok(Json(decision))
}
