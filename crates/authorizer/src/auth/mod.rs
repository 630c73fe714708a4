//! Bearer-token authorization for the API gateway.
//!
//! The pipeline runs in one direction:
//!
//! ```text
//! credential::extract_bearer_token -> jwt::TokenVerifier (jwks::KeySetCache) -> decision::build_decision
//! ```
//!
//! # Components
//!
//! - `credential` - Bearer token extraction from the Authorization header
//! - `signing_key` - Immutable verification keys built from JWKS records
//! - `jwks` - Process-wide, populate-once cache of the provider's signing keys
//! - `jwt` - Signature and temporal claim verification (RS256 only)
//! - `claims` - Claims structure for validated tokens
//! - `decision` - Allow/Deny policy construction
//! - `authorizer` - The single entry point tying the pipeline together

pub mod authorizer;
pub mod claims;
pub mod credential;
pub mod decision;
pub mod jwks;
pub mod jwt;
pub mod signing_key;

pub use authorizer::Authorizer;
pub use claims::TokenClaims;
pub use decision::{AuthorizationDecision, Effect, DENIED_PRINCIPAL};
pub use jwks::{HttpKeySetFetcher, Jwk, KeySetCache, KeySetFetcher};
pub use jwt::TokenVerifier;
pub use signing_key::SigningKey;
