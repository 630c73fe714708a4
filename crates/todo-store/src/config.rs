//! Storage configuration.
//!
//! Loaded once from environment variables. Secrets are held as
//! `SecretString` and redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default presigned URL lifetime in seconds.
pub const DEFAULT_URL_EXPIRATION_SECONDS: u64 = 300;

/// Attachment object storage settings.
#[derive(Clone)]
pub struct AttachmentsConfig {
    /// Object storage endpoint, without trailing slash.
    pub base_url: String,

    /// Bucket holding attachments.
    pub bucket: String,

    /// HMAC key for presigned URLs.
    pub signing_key: SecretString,

    /// Lifetime of upload (PUT) URLs.
    pub upload_url_expiration: Duration,

    /// Lifetime of download (GET) URLs.
    pub download_url_expiration: Duration,
}

impl fmt::Debug for AttachmentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentsConfig")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("signing_key", &"[REDACTED]")
            .field("upload_url_expiration", &self.upload_url_expiration)
            .field("download_url_expiration", &self.download_url_expiration)
            .finish()
    }
}

/// Item and attachment storage configuration.
#[derive(Clone)]
pub struct StoreConfig {
    /// Postgres connection URL (may carry credentials).
    pub database_url: SecretString,

    /// Attachment storage settings.
    pub attachments: AttachmentsConfig,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &"[REDACTED]")
            .field("attachments", &self.attachments)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid URL expiration configuration: {0}")]
    InvalidUrlExpiration(String),
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &str| -> Result<String, ConfigError> {
            vars.get(name)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        let database_url = SecretString::from(required("DATABASE_URL")?);
        let base_url = required("ATTACHMENTS_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let bucket = required("ATTACHMENTS_BUCKET")?;
        let signing_key = SecretString::from(required("ATTACHMENTS_SIGNING_KEY")?);

        let upload_url_expiration = parse_expiration(vars, "ATTACHMENT_UPLOAD_URL_EXPIRATION")?;
        let download_url_expiration =
            parse_expiration(vars, "ATTACHMENT_DOWNLOAD_URL_EXPIRATION")?;

        Ok(StoreConfig {
            database_url,
            attachments: AttachmentsConfig {
                base_url,
                bucket,
                signing_key,
                upload_url_expiration,
                download_url_expiration,
            },
        })
    }
}

fn parse_expiration(vars: &HashMap<String, String>, name: &str) -> Result<Duration, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(Duration::from_secs(DEFAULT_URL_EXPIRATION_SECONDS));
    };

    let value: u64 = value_str.parse().map_err(|e| {
        ConfigError::InvalidUrlExpiration(format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidUrlExpiration(format!(
            "{} must be greater than 0",
            name
        )));
    }

    Ok(Duration::from_secs(value))
}
