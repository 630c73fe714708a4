//! # Authorizer Test Utilities
//!
//! Shared test utilities for the bearer-token authorizer.
//!
//! This crate provides:
//! - Fixed RSA-2048 key pairs and a self-signed certificate
//! - Token builder (`TestTokenBuilder`) signing RS256 tokens
//! - A mocked key-discovery endpoint (`MockJwksServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use authz_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let jwks = MockJwksServer::start().await;
//!     jwks.mount_keys(&[primary_keypair().jwk_json()]).await;
//!
//!     let token = TestTokenBuilder::new()
//!         .subject("auth0|alice")
//!         .sign(&primary_keypair());
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use token_builders::*;
