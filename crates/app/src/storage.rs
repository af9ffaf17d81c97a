//! Object storage for artisan uploads.

use async_trait::async_trait;
use jiff::SignedDuration;
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Lifetime of signed download links.
pub const SIGNED_URL_TTL: SignedDuration = SignedDuration::from_hours(1);

/// Connection settings for an HTTP object store.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Base URL, e.g. `"https://project.supabase.co"`.
    pub url: String,

    /// Service credential sent as a bearer token.
    pub service_key: String,

    /// Bucket holding every upload.
    pub bucket: String,
}

/// Object store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The request could not be sent or the body not read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("storage responded with {status}: {body}")]
    UnexpectedResponse {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// Blob storage for photos and documents.
#[automock]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`. Existing objects are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store is unreachable or refuses the object.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<(), StorageError>;

    /// Remove objects. Missing objects are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store is unreachable or refuses the call.
    async fn remove(&self, paths: &[String]) -> Result<(), StorageError>;

    /// Time-limited download link for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot sign the link.
    async fn signed_url(&self, path: &str, ttl: SignedDuration) -> Result<String, StorageError>;
}

/// Object store speaking the Supabase storage REST dialect.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    config: ObjectStoreConfig,
    http: Client,
}

impl HttpObjectStore {
    /// Store for the configured bucket.
    #[must_use]
    pub fn new(config: ObjectStoreConfig) -> Self {
        let url = config.url.trim_end_matches('/').to_string();

        Self {
            config: ObjectStoreConfig { url, ..config },
            http: Client::new(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{path}",
            self.config.url, self.config.bucket
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Err(StorageError::UnexpectedResponse { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .http
            .post(self.object_url(path))
            .bearer_auth(&self.config.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }

        let response = self
            .http
            .delete(format!(
                "{}/storage/v1/object/{}",
                self.config.url, self.config.bucket
            ))
            .bearer_auth(&self.config.service_key)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;

        Self::check(response).await?;

        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: SignedDuration) -> Result<String, StorageError> {
        let response = self
            .http
            .post(format!(
                "{}/storage/v1/object/sign/{}/{path}",
                self.config.url, self.config.bucket
            ))
            .bearer_auth(&self.config.service_key)
            .json(&json!({ "expiresIn": ttl.as_secs() }))
            .send()
            .await?;

        let parsed: SignedUrlResponse = Self::check(response).await?.json().await?;

        Ok(format!("{}/storage/v1{}", self.config.url, parsed.signed_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_urls_are_bucket_scoped() {
        let store = HttpObjectStore::new(ObjectStoreConfig {
            url: "https://storage.example.com/".to_string(),
            service_key: "service".to_string(),
            bucket: "artisan-uploads".to_string(),
        });

        assert_eq!(
            store.object_url("t/a/documents/kbis_1.pdf"),
            "https://storage.example.com/storage/v1/object/artisan-uploads/t/a/documents/kbis_1.pdf"
        );
    }
}
