//! Authorizer error types.
//!
//! Two layers of errors live here:
//!
//! - [`AuthzError`] is the verification pipeline's taxonomy. It never reaches
//!   a client: the decision builder collapses every variant into a Deny.
//! - [`AuthorizerError`] is the HTTP layer's error. It maps to a status code
//!   via the `IntoResponse` impl.
//!
//! Messages returned to clients are intentionally generic to avoid leaking
//! verification internals. Actual causes are logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::jwt::JwtValidationError;
use serde::Serialize;
use thiserror::Error;

/// Generic message shared by every verification failure.
pub const GENERIC_AUTH_FAILURE: &str = "The access token is invalid or expired";

/// Verification pipeline error.
///
/// Every variant displays the same message; use [`AuthzError::reason`] for a
/// bounded label suitable for logs and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// Authorization header absent or empty.
    #[error("The access token is invalid or expired")]
    MissingCredential,

    /// Authorization header does not use the bearer scheme.
    #[error("The access token is invalid or expired")]
    MalformedCredential,

    /// Token structure could not be decoded.
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// No cached signing key matches the token's `kid`.
    #[error("The access token is invalid or expired")]
    UnknownSigningKey,

    /// Signature, algorithm, or temporal claim check failed.
    #[error("The access token is invalid or expired")]
    InvalidToken,

    /// The key-discovery endpoint could not be fetched or parsed.
    #[error("The access token is invalid or expired")]
    KeySetUnavailable,
}

impl AuthzError {
    /// Bounded snake_case label for logs and the `reason` metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthzError::MissingCredential => "missing_credential",
            AuthzError::MalformedCredential => "malformed_credential",
            AuthzError::MalformedToken => "malformed_token",
            AuthzError::UnknownSigningKey => "unknown_signing_key",
            AuthzError::InvalidToken => "invalid_token",
            AuthzError::KeySetUnavailable => "key_set_unavailable",
        }
    }
}

/// Structural inspection failures are all malformed tokens from the
/// pipeline's point of view.
impl From<JwtValidationError> for AuthzError {
    fn from(_: JwtValidationError) -> Self {
        AuthzError::MalformedToken
    }
}

/// HTTP layer error.
///
/// The authorize endpoint answers every well-formed request with a decision,
/// so the only HTTP-level failure is a request the gateway sent badly.
/// Maps to appropriate HTTP status codes:
/// - BadRequest: 400 Bad Request
#[derive(Debug, Error)]
pub enum AuthorizerError {
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AuthorizerError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            AuthorizerError::BadRequest(_) => 400,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthorizerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthorizerError::BadRequest(reason) => {
                tracing::debug!(target: "authz.http", reason = %reason, "Rejected malformed request");
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    const ALL_AUTHZ_ERRORS: [AuthzError; 6] = [
        AuthzError::MissingCredential,
        AuthzError::MalformedCredential,
        AuthzError::MalformedToken,
        AuthzError::UnknownSigningKey,
        AuthzError::InvalidToken,
        AuthzError::KeySetUnavailable,
    ];

    #[test]
    fn test_authz_errors_share_generic_message() {
        for err in ALL_AUTHZ_ERRORS {
            assert_eq!(err.to_string(), GENERIC_AUTH_FAILURE);
        }
    }

    #[test]
    fn test_authz_error_reasons_are_distinct() {
        let mut reasons: Vec<&str> = ALL_AUTHZ_ERRORS.iter().map(AuthzError::reason).collect();
        reasons.sort_unstable();
        reasons.dedup();
        assert_eq!(reasons.len(), ALL_AUTHZ_ERRORS.len());
    }

    #[test]
    fn test_jwt_validation_error_maps_to_malformed_token() {
        for err in [
            JwtValidationError::TokenTooLarge,
            JwtValidationError::MalformedToken,
            JwtValidationError::MissingKid,
        ] {
            assert_eq!(AuthzError::from(err), AuthzError::MalformedToken);
        }
    }

    #[test]
    fn test_display_bad_request() {
        let error = AuthorizerError::BadRequest("invalid input".to_string());
        assert_eq!(format!("{}", error), "Bad request: invalid input");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthorizerError::BadRequest("test".to_string()).status_code(),
            400
        );
    }

    #[tokio::test]
    async fn test_into_response_bad_request() {
        let response = AuthorizerError::BadRequest("Invalid request body".to_string())
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "BAD_REQUEST");
        assert_eq!(body_json["error"]["message"], "Invalid request body");
    }
}
