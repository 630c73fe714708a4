//! Bearer credential extraction.
//!
//! Parses the raw `Authorization` header value handed over by the gateway.
//! No token structure is checked here; that is the verifier's job.

use crate::errors::AuthzError;

/// Scheme prefix, compared ASCII-case-insensitively.
const BEARER_PREFIX: &str = "bearer ";

/// Extract the bearer token from a raw `Authorization` header value.
///
/// Returns the exact substring after `"bearer "` (any casing).
///
/// # Errors
///
/// - `MissingCredential` - header absent or empty
/// - `MalformedCredential` - header does not start with the bearer scheme
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthzError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => {
            tracing::debug!(target: "authz.credential", "Missing Authorization header");
            return Err(AuthzError::MissingCredential);
        }
    };

    let has_prefix = header
        .get(..BEARER_PREFIX.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(BEARER_PREFIX));
    if !has_prefix {
        tracing::debug!(target: "authz.credential", "Invalid Authorization header format");
        return Err(AuthzError::MalformedCredential);
    }

    Ok(header.get(BEARER_PREFIX.len()..).unwrap_or_default())
}
