//! Claims of a verified access token.
//!
//! The `sub` field is redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Claims carried by a token that passed signature and temporal checks.
///
/// Only `sub` and `exp` are required. Claims the authorizer does not
/// interpret are kept in `extra`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (the identity provider's user id) - redacted in Debug output.
    pub sub: String,

    /// Issuer. Carried through to the decision context, never validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Remaining claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("sub", &"[REDACTED]")
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("extra_claims", &self.extra.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims = TokenClaims {
            sub: "auth0|secret-user-id".to_string(),
            iss: Some("https://idp.example.com/".to_string()),
            exp: 1_234_567_890,
            iat: Some(1_234_567_800),
            nbf: None,
            extra: Map::new(),
        };

        let debug_str = format!("{:?}", claims);

        assert!(
            !debug_str.contains("secret-user-id"),
            "Debug output should not contain actual sub value"
        );
        assert!(debug_str.contains("[REDACTED]"));
        assert!(debug_str.contains("https://idp.example.com/"));
    }

    #[test]
    fn test_claims_deserialize_minimal() {
        let claims: TokenClaims =
            serde_json::from_str(r#"{"sub": "user-1", "exp": 1234567890}"#).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp, 1_234_567_890);
        assert!(claims.iss.is_none());
        assert!(claims.iat.is_none());
        assert!(claims.nbf.is_none());
        assert!(claims.extra.is_empty());
    }

    #[test]
    fn test_claims_keep_unknown_claims() {
        let claims: TokenClaims = serde_json::from_str(
            r#"{"sub": "user-1", "exp": 1, "aud": "todo-api", "scope": "read:todos"}"#,
        )
        .unwrap();

        assert_eq!(claims.extra.get("aud"), Some(&Value::from("todo-api")));
        assert_eq!(claims.extra.get("scope"), Some(&Value::from("read:todos")));
    }

    #[test]
    fn test_claims_require_sub_and_exp() {
        assert!(serde_json::from_str::<TokenClaims>(r#"{"exp": 1}"#).is_err());
        assert!(serde_json::from_str::<TokenClaims>(r#"{"sub": "user-1"}"#).is_err());
    }
}
