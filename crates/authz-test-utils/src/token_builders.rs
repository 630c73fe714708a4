//! Builder for signed test tokens
//!
//! Produces RS256 tokens the way the identity provider would, with knobs
//! for the claims and header fields the authorizer checks.

use crate::crypto_fixtures::TestKeypair;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{Map, Value};

enum KidChoice {
    FromKeypair,
    Explicit(String),
    Omitted,
}

/// Builder for RS256-signed test tokens
///
/// Defaults: subject `test-subject`, issued now, expiring in one hour,
/// `kid` taken from the signing key pair.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .subject("auth0|alice")
///     .expires_in_seconds(-60)
///     .sign(&primary_keypair());
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
    kid: KidChoice,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::from("test-subject"));
        claims.insert("iat".to_string(), Value::from(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            Value::from((now + Duration::seconds(3600)).timestamp()),
        );

        Self {
            claims,
            kid: KidChoice::FromKeypair,
        }
    }

    /// Set the subject
    pub fn subject(self, subject: &str) -> Self {
        self.claim("sub", subject)
    }

    /// Set the issuer
    pub fn issuer(self, issuer: &str) -> Self {
        self.claim("iss", issuer)
    }

    /// Set expiration relative to now (negative for already expired)
    pub fn expires_in_seconds(self, seconds: i64) -> Self {
        let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.claim("exp", exp)
    }

    /// Set not-before relative to now
    pub fn not_before_in_seconds(self, seconds: i64) -> Self {
        let nbf = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.claim("nbf", nbf)
    }

    /// Drop the `exp` claim
    pub fn without_expiry(mut self) -> Self {
        self.claims.remove("exp");
        self
    }

    /// Set an arbitrary claim
    pub fn claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    /// Override the header `kid`
    pub fn kid(mut self, kid: &str) -> Self {
        self.kid = KidChoice::Explicit(kid.to_string());
        self
    }

    /// Omit the header `kid`
    pub fn without_kid(mut self) -> Self {
        self.kid = KidChoice::Omitted;
        self
    }

    /// Claims as a JSON object
    pub fn build_claims(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// Sign with RS256 using `keypair`
    pub fn sign(self, keypair: &TestKeypair) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = match self.kid {
            KidChoice::FromKeypair => Some(keypair.kid.to_string()),
            KidChoice::Explicit(kid) => Some(kid),
            KidChoice::Omitted => None,
        };

        encode(&header, &self.claims, &keypair.encoding_key()).expect("Failed to sign test token")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_fixtures::{primary_keypair, PRIMARY_KID};

    #[test]
    fn test_builder_defaults() {
        let claims = TestTokenBuilder::new().build_claims();

        assert_eq!(claims["sub"], "test-subject");
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());
        assert!(claims.get("iss").is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let claims = TestTokenBuilder::new()
            .subject("auth0|alice")
            .issuer("https://idp.example.com/")
            .without_expiry()
            .claim("aud", "todo-api")
            .build_claims();

        assert_eq!(claims["sub"], "auth0|alice");
        assert_eq!(claims["iss"], "https://idp.example.com/");
        assert_eq!(claims["aud"], "todo-api");
        assert!(claims.get("exp").is_none());
    }

    #[test]
    fn test_signed_token_header_carries_kid() {
        let token = TestTokenBuilder::new().sign(&primary_keypair());
        let header = jsonwebtoken::decode_header(&token).unwrap();

        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some(PRIMARY_KID));
    }

    #[test]
    fn test_signed_token_kid_overrides() {
        let token = TestTokenBuilder::new()
            .kid("other")
            .sign(&primary_keypair());
        assert_eq!(
            jsonwebtoken::decode_header(&token).unwrap().kid.as_deref(),
            Some("other")
        );

        let token = TestTokenBuilder::new()
            .without_kid()
            .sign(&primary_keypair());
        assert!(jsonwebtoken::decode_header(&token).unwrap().kid.is_none());
    }
}
