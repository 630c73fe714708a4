//! Common utilities and types shared across Todo Gate components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for unverified token inspection (size limits, header decoding)
pub mod jwt;
