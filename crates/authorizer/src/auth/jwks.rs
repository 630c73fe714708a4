//! JWKS key-set cache for the identity provider's signing keys.
//!
//! The cache fetches the provider's key-discovery endpoint on first use and
//! serves every later lookup from memory for the rest of the process.
//!
//! # Population policy
//!
//! - Populated lazily, at most once per process (single-flight: concurrent
//!   first-use callers wait on one fetch)
//! - A failed fetch leaves the cache empty; the next request retries
//! - Never refreshed once populated. A key the provider rotates in after
//!   warm-up resolves as `UnknownSigningKey` until the process restarts
//! - Reads after population take no lock
//!
//! # Security
//!
//! - Only records with `use = "sig"`, `kty = "RSA"`, a `kid`, and either a
//!   certificate or modulus/exponent are cached
//! - HTTPS should be used in production (enforced by deployment config)

use crate::auth::signing_key::SigningKey;
use crate::errors::AuthzError;
use crate::observability::metrics;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::instrument;

/// JSON Web Key from the discovery endpoint.
///
/// Every field is optional so one odd record cannot fail the whole set;
/// filtering happens in [`SigningKey::from_jwk`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Jwk {
    /// Key type (must be "RSA").
    #[serde(default)]
    pub kty: Option<String>,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Key use (must be "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Algorithm hint. Not trusted; verification pins RS256 itself.
    #[serde(default)]
    pub alg: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// X.509 certificate chain (standard base64 DER).
    #[serde(default)]
    pub x5c: Option<Vec<String>>,
}

/// JWKS response body. A missing `keys` member is an empty set.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    #[serde(default)]
    pub keys: Vec<serde_json::Value>,
}

impl JwksResponse {
    /// Decode individual records, skipping any that do not fit [`Jwk`].
    pub fn into_jwks(self) -> Vec<Jwk> {
        self.keys
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Jwk>(value) {
                Ok(jwk) => Some(jwk),
                Err(e) => {
                    tracing::debug!(target: "authz.jwks", error = %e, "Skipping undecodable JWKS record");
                    None
                }
            })
            .collect()
    }
}

/// Source of the provider's key records.
///
/// Injectable so tests can substitute a static, counting, or failing source.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Fetch the full list of key records.
    async fn fetch(&self) -> Result<Vec<Jwk>, AuthzError>;
}

/// Fetches key records over HTTP from the configured discovery endpoint.
pub struct HttpKeySetFetcher {
    jwks_url: String,
    http_client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Create a fetcher for `jwks_url` with the given request timeout.
    pub fn new(jwks_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "authz.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
        }
    }

    /// URL of the discovery endpoint.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    #[instrument(skip_all)]
    async fn fetch(&self) -> Result<Vec<Jwk>, AuthzError> {
        tracing::debug!(target: "authz.jwks", url = %self.jwks_url, "Fetching JWKS from identity provider");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "authz.jwks", error = %e, "Failed to fetch JWKS");
                AuthzError::KeySetUnavailable
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "authz.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthzError::KeySetUnavailable);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "authz.jwks", error = %e, "Failed to parse JWKS response");
            AuthzError::KeySetUnavailable
        })?;

        Ok(jwks.into_jwks())
    }
}

/// Process-wide cache of signing keys, keyed by `kid`.
///
/// Share one instance (behind an `Arc`) across all requests in a process.
pub struct KeySetCache {
    fetcher: Option<Arc<dyn KeySetFetcher>>,
    keys: OnceCell<HashMap<String, SigningKey>>,
}

impl KeySetCache {
    /// Create a cold cache backed by the HTTP discovery endpoint.
    pub fn new(jwks_url: String, fetch_timeout: Duration) -> Self {
        Self::with_fetcher(Arc::new(HttpKeySetFetcher::new(jwks_url, fetch_timeout)))
    }

    /// Create a cold cache backed by any fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self {
            fetcher: Some(fetcher),
            keys: OnceCell::new(),
        }
    }

    /// Create a warm cache that never fetches.
    ///
    /// Duplicate `kid`s keep the first key.
    pub fn prepopulated(keys: impl IntoIterator<Item = SigningKey>) -> Self {
        Self {
            fetcher: None,
            keys: OnceCell::new_with(Some(index_keys(keys))),
        }
    }

    /// Whether the key set has been fetched in this process.
    pub fn is_populated(&self) -> bool {
        self.keys.initialized()
    }

    /// Number of cached keys (zero while cold).
    pub fn key_count(&self) -> usize {
        self.keys.get().map_or(0, HashMap::len)
    }

    /// Get the signing key for `kid`, populating the cache first if cold.
    ///
    /// # Errors
    ///
    /// - `KeySetUnavailable` if the cache is cold and the fetch fails
    /// - `UnknownSigningKey` if no cached key matches `kid`
    #[instrument(skip_all, fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<&SigningKey, AuthzError> {
        let keys = self.keys.get_or_try_init(|| self.populate()).await?;

        match keys.get(kid) {
            Some(key) => {
                tracing::debug!(target: "authz.jwks", kid = %kid, "JWKS cache hit");
                Ok(key)
            }
            None => {
                tracing::warn!(target: "authz.jwks", kid = %kid, "Key not found in JWKS cache");
                Err(AuthzError::UnknownSigningKey)
            }
        }
    }

    async fn populate(&self) -> Result<HashMap<String, SigningKey>, AuthzError> {
        let fetcher = self.fetcher.as_ref().ok_or_else(|| {
            tracing::error!(target: "authz.jwks", "Cold key-set cache has no fetcher");
            AuthzError::KeySetUnavailable
        })?;

        let start = Instant::now();
        let records = match fetcher.fetch().await {
            Ok(records) => records,
            Err(e) => {
                metrics::record_jwks_fetch("error", start.elapsed());
                return Err(e);
            }
        };

        let record_count = records.len();
        let usable = records
            .iter()
            .filter_map(|jwk| match SigningKey::from_jwk(jwk) {
                Ok(key) => Some(key),
                Err(rejection) => {
                    tracing::debug!(
                        target: "authz.jwks",
                        kid = jwk.kid.as_deref().unwrap_or("<none>"),
                        reason = rejection.as_str(),
                        "Excluding JWKS record"
                    );
                    None
                }
            });
        let keys = index_keys(usable);

        metrics::record_jwks_fetch("success", start.elapsed());
        metrics::set_cached_signing_keys(keys.len());

        if keys.is_empty() {
            tracing::warn!(
                target: "authz.jwks",
                record_count,
                "JWKS contained no usable signing keys"
            );
        } else {
            tracing::info!(
                target: "authz.jwks",
                key_count = keys.len(),
                record_count,
                "JWKS cache populated"
            );
        }

        Ok(keys)
    }
}

fn index_keys(keys: impl IntoIterator<Item = SigningKey>) -> HashMap<String, SigningKey> {
    let mut map = HashMap::new();
    for key in keys {
        map.entry(key.kid().to_string()).or_insert(key);
    }
    map
}
