//! Unverified token inspection shared across Todo Gate services.
//!
//! This module provides the pre-verification half of bearer-token handling:
//! - Size limits for DoS prevention
//! - Clock skew constants for temporal claim validation
//! - Structural decoding of the header, with a shape check of the payload
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing returned here is trusted: the header is only used to pick a key
//!   and an algorithm to REJECT, never one to accept
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::inspect_token;
//!
//! let unverified = inspect_token(token)?;
//! let key = key_cache.get_key(&unverified.header.kid).await?;
//! // ... verify the signature with `key` before using any claim
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Tokens larger than this are rejected BEFORE any base64 decoding or
/// signature work. Identity-provider RS256 tokens are typically under 2KB.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default clock skew tolerance applied to `exp` and `nbf` (1 minute).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Maximum allowed clock skew tolerance (10 minutes).
///
/// Configuration above this value is rejected at startup.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting an unverified token.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (segments, base64, JSON, or missing `alg`).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Types
// =============================================================================

/// Header fields needed to select a verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Declared signing algorithm (e.g. `RS256`). Untrusted.
    pub alg: String,

    /// Key ID used to look up the signing key.
    pub kid: String,
}

/// A structurally decoded token whose signature has NOT been checked.
///
/// Claims are only read after verification.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
    /// Decoded header.
    pub header: TokenHeader,
}

// =============================================================================
// Functions
// =============================================================================

/// Structurally decode a token's header without verifying it.
///
/// The payload must also be a base64url JSON object, but its contents are
/// not returned.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Not three segments, bad base64url, header or payload
///   not a JSON object, or `alg` absent
/// - `MissingKid` - Header has no non-empty string `kid`
pub fn inspect_token(token: &str) -> Result<UnverifiedToken, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // header.payload.signature
    let mut parts = token.split('.');
    let (Some(header_part), Some(payload_part), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid segment count");
        return Err(JwtValidationError::MalformedToken);
    };

    let header = decode_segment(header_part)?;
    decode_segment(payload_part)?;

    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "common.jwt", "Token rejected: header missing alg");
            JwtValidationError::MalformedToken
        })?;

    // Empty kid is rejected rather than looked up
    let kid = header
        .get("kid")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    Ok(UnverifiedToken {
        header: TokenHeader { alg, kid },
    })
}

fn decode_segment(segment: &str) -> Result<Map<String, Value>, JwtValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode token segment base64");
        JwtValidationError::MalformedToken
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::debug!(target: "common.jwt", "Token segment is not a JSON object");
            Err(JwtValidationError::MalformedToken)
        }
        Err(e) => {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse token segment JSON");
            Err(JwtValidationError::MalformedToken)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
