//! Attachment object storage.
//!
//! Attachments are addressed by object id and reached through presigned
//! URLs: `{base}/{bucket}/{object_id}?method=PUT|GET&expires=<unix>&signature=<hex>`.
//! The signature is HMAC-SHA256 over
//! `"{METHOD}\n{bucket}\n{object_id}\n{expires}"` with the configured key.

use crate::config::AttachmentsConfig;
use crate::errors::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use common::secret::ExposeSecret;
use ring::hmac;
use std::time::Duration;
use tracing::instrument;

/// Timeout for the existence check.
const EXISTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Object storage backend for attachments.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether an object is stored under `object_id`.
    async fn exists(&self, object_id: &str) -> bool;

    /// Presigned URL for uploading `object_id`.
    fn upload_url(&self, object_id: &str) -> String;

    /// Presigned URL for downloading `object_id`.
    fn download_url(&self, object_id: &str) -> String;
}

/// HTTP method a presigned URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Put,
    Get,
}

impl PresignMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresignMethod::Put => "PUT",
            PresignMethod::Get => "GET",
        }
    }
}

/// Object store backed by an HTTP endpoint that accepts HMAC-presigned URLs.
#[derive(Clone)]
pub struct PresignedObjectStore {
    base_url: String,
    bucket: String,
    signing_key: hmac::Key,
    upload_url_expiration: Duration,
    download_url_expiration: Duration,
    client: reqwest::Client,
}

impl PresignedObjectStore {
    pub fn new(config: &AttachmentsConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(EXISTS_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Storage(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            bucket: config.bucket.clone(),
            signing_key: hmac::Key::new(
                hmac::HMAC_SHA256,
                config.signing_key.expose_secret().as_bytes(),
            ),
            upload_url_expiration: config.upload_url_expiration,
            download_url_expiration: config.download_url_expiration,
            client,
        })
    }

    /// Presigned URL for `method` on `object_id`, valid until `expires`
    /// (unix seconds).
    pub fn presign_at(&self, method: PresignMethod, object_id: &str, expires: i64) -> String {
        let signature = hex::encode(self.sign(method, object_id, expires).as_ref());
        format!(
            "{}/{}/{}?method={}&expires={}&signature={}",
            self.base_url,
            self.bucket,
            object_id,
            method.as_str(),
            expires,
            signature
        )
    }

    /// Check a presented hex signature.
    ///
    /// Comparison is constant time. Expired or undecodable signatures fail.
    #[must_use]
    pub fn verify_url_signature(
        &self,
        method: PresignMethod,
        object_id: &str,
        expires: i64,
        signature: &str,
    ) -> bool {
        if expires < Utc::now().timestamp() {
            return false;
        }

        let Ok(provided) = hex::decode(signature) else {
            return false;
        };

        let message = self.string_to_sign(method, object_id, expires);
        hmac::verify(&self.signing_key, message.as_bytes(), &provided).is_ok()
    }

    fn presign(&self, method: PresignMethod, object_id: &str, lifetime: Duration) -> String {
        let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        let expires = Utc::now().timestamp().saturating_add(lifetime);
        self.presign_at(method, object_id, expires)
    }

    fn sign(&self, method: PresignMethod, object_id: &str, expires: i64) -> hmac::Tag {
        let message = self.string_to_sign(method, object_id, expires);
        hmac::sign(&self.signing_key, message.as_bytes())
    }

    fn string_to_sign(&self, method: PresignMethod, object_id: &str, expires: i64) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            method.as_str(),
            self.bucket,
            object_id,
            expires
        )
    }
}

#[async_trait]
impl ObjectStore for PresignedObjectStore {
    #[instrument(skip_all, name = "store.attachments.exists")]
    async fn exists(&self, object_id: &str) -> bool {
        let url = self.presign(PresignMethod::Get, object_id, self.download_url_expiration);

        match self.client.head(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(
                    target: "store.attachments",
                    object_id = %object_id,
                    status = response.status().as_u16(),
                    "Attachment not found"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    target: "store.attachments",
                    object_id = %object_id,
                    error = %e,
                    "Attachment existence check failed"
                );
                false
            }
        }
    }

    fn upload_url(&self, object_id: &str) -> String {
        self.presign(PresignMethod::Put, object_id, self.upload_url_expiration)
    }

    fn download_url(&self, object_id: &str) -> String {
        self.presign(PresignMethod::Get, object_id, self.download_url_expiration)
    }
}
