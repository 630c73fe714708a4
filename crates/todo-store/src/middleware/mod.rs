//! HTTP middleware for the todo API.

pub mod principal;

pub use principal::{require_principal, Principal};
