//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for bearer tokens and signing
//! material across Todo Gate. `SecretString` implements `Debug` with
//! redaction, so a struct deriving `Debug` that holds one is safe to log.
//! Secrets are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct AttachmentSigner {
//!     bucket: String,
//!     signing_key: SecretString,
//! }
//!
//! let signer = AttachmentSigner {
//!     bucket: "todo-attachments".to_string(),
//!     signing_key: SecretString::from("k3y"),
//! };
//!
//! assert!(!format!("{signer:?}").contains("k3y"));
//! assert_eq!(signer.signing_key.expose_secret(), "k3y");
//! ```
//!
//! Use `SecretString` for:
//! - Presigned-URL signing keys
//! - Bearer tokens held beyond a single function call
//! - Database URLs carrying credentials

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
