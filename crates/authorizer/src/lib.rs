//! Bearer-token authorizer for the todo API gateway.
//!
//! Turns the `Authorization` header of an incoming API request into an
//! Allow or Deny policy for the gateway. Tokens are RS256 JWTs issued by an
//! external identity provider whose signing keys are fetched once from its
//! key-discovery (JWKS) endpoint.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/authorize.rs -> auth::Authorizer
//!                                              |-> credential (header parsing)
//!                                              |-> jwt::TokenVerifier -> jwks::KeySetCache
//!                                              '-> decision (Allow/Deny policy)
//! ```
//!
//! # Modules
//!
//! - `auth` - Verification pipeline and decisions
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
