//! Access token verification.
//!
//! Verifies identity-provider tokens against keys from the [`KeySetCache`].
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted; the header's `alg` is checked before any key
//!   lookup so `none` and HMAC tokens never reach the cache
//! - `exp` is required and checked with clock skew tolerance; `nbf` is
//!   checked when present
//! - Issuer and audience are not validated
//! - Generic error messages prevent information leakage

use crate::auth::claims::TokenClaims;
use crate::auth::decision::DENIED_PRINCIPAL;
use crate::auth::jwks::KeySetCache;
use crate::errors::AuthzError;
use common::jwt::inspect_token;
use jsonwebtoken::{decode, Algorithm, Validation};
use std::sync::Arc;
use tracing::instrument;

/// The only accepted signing algorithm.
const ACCEPTED_ALGORITHM: &str = "RS256";

/// Verifies bearer tokens and returns their claims.
pub struct TokenVerifier {
    /// Shared signing-key cache.
    key_cache: Arc<KeySetCache>,

    /// Clock skew tolerance in seconds for `exp` and `nbf`.
    leeway_seconds: u64,
}

impl TokenVerifier {
    /// Create a new verifier.
    ///
    /// # Arguments
    ///
    /// * `key_cache` - Cache of the provider's signing keys
    /// * `leeway_seconds` - Clock skew tolerance for temporal claims
    pub fn new(key_cache: Arc<KeySetCache>, leeway_seconds: u64) -> Self {
        Self {
            key_cache,
            leeway_seconds,
        }
    }

    /// The signing-key cache this verifier reads from.
    pub fn key_cache(&self) -> &Arc<KeySetCache> {
        &self.key_cache
    }

    /// Verify a token and return its claims.
    ///
    /// # Security Checks
    ///
    /// 1. Size and structure check, `kid` extraction
    /// 2. Header `alg` must be RS256
    /// 3. Signing key lookup (populates the cache on first use)
    /// 4. RS256 signature verification
    /// 5. `exp` (required) and `nbf` (if present) with leeway
    /// 6. `sub` must be non-empty and distinct from [`DENIED_PRINCIPAL`]
    ///
    /// # Errors
    ///
    /// - `MalformedToken` - Size, structure, or missing `kid`
    /// - `InvalidToken` - Wrong algorithm, bad signature, expired, not yet
    ///   valid, missing required claims, or an unusable subject
    /// - `UnknownSigningKey` / `KeySetUnavailable` - From the key cache
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<TokenClaims, AuthzError> {
        let unverified = inspect_token(token).map_err(|e| {
            tracing::debug!(target: "authz.jwt", error = ?e, "Token inspection failed");
            AuthzError::from(e)
        })?;

        if unverified.header.alg != ACCEPTED_ALGORITHM {
            tracing::debug!(
                target: "authz.jwt",
                alg = %unverified.header.alg,
                "Token rejected: algorithm not accepted"
            );
            return Err(AuthzError::InvalidToken);
        }

        let key = self.key_cache.get_key(&unverified.header.kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<TokenClaims>(token, key.decoding_key(), &validation).map_err(|e| {
                tracing::debug!(target: "authz.jwt", error = %e, "Token verification failed");
                AuthzError::InvalidToken
            })?;

        let subject = token_data.claims.sub.trim();
        if subject.is_empty() || subject == DENIED_PRINCIPAL {
            tracing::debug!(target: "authz.jwt", "Token rejected: unusable subject");
            return Err(AuthzError::InvalidToken);
        }

        tracing::debug!(target: "authz.jwt", kid = %key.kid(), "Token verified successfully");
        Ok(token_data.claims)
    }
}
