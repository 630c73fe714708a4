//! Single entry point from raw header value to decision.

use crate::auth::claims::TokenClaims;
use crate::auth::credential::extract_bearer_token;
use crate::auth::decision::{build_decision, AuthorizationDecision};
use crate::auth::jwks::KeySetCache;
use crate::auth::jwt::TokenVerifier;
use crate::config::Config;
use crate::errors::AuthzError;
use crate::observability::metrics;
use std::sync::Arc;
use tracing::instrument;

/// Turns an `Authorization` header value into an Allow or Deny decision.
///
/// Holds the process-wide key-set cache. Clone the `Arc` around it, not the
/// authorizer, so every request shares one cache.
pub struct Authorizer {
    verifier: TokenVerifier,
}

impl Authorizer {
    pub fn new(key_cache: Arc<KeySetCache>, leeway_seconds: u64) -> Self {
        Self {
            verifier: TokenVerifier::new(key_cache, leeway_seconds),
        }
    }

    /// Build an authorizer with a cold HTTP-backed cache from configuration.
    pub fn from_config(config: &Config) -> Self {
        let key_cache = Arc::new(KeySetCache::new(
            config.jwks_url.clone(),
            config.jwks_fetch_timeout,
        ));
        Self::new(key_cache, config.jwt_clock_skew_seconds)
    }

    /// Shared key-set cache.
    pub fn key_cache(&self) -> &Arc<KeySetCache> {
        self.verifier.key_cache()
    }

    /// Decide on a raw `Authorization` header value.
    ///
    /// Never fails: every error is logged and collapsed into a Deny.
    #[instrument(skip_all, name = "authz.authorize")]
    pub async fn authorize(&self, authorization: Option<&str>) -> AuthorizationDecision {
        let outcome = self.verify(authorization).await;
        let decision = build_decision(&outcome);
        let effect = decision.effect();

        match &outcome {
            Ok(_) => {
                tracing::info!(target: "authz.decision", effect = effect.as_str(), "Request authorized");
                metrics::record_decision(effect.as_str(), "verified");
            }
            Err(e) => {
                tracing::info!(
                    target: "authz.decision",
                    effect = effect.as_str(),
                    reason = e.reason(),
                    "Request denied"
                );
                metrics::record_decision(effect.as_str(), e.reason());
            }
        }

        decision
    }

    async fn verify(&self, authorization: Option<&str>) -> Result<TokenClaims, AuthzError> {
        let token = extract_bearer_token(authorization)?;
        self.verifier.verify(token).await
    }
}
