//! Supabase storage adapter
//!
//! Uploads finished takes into a storage bucket and derives the public
//! URL the posted comment will reference.

use async_trait::async_trait;

use crate::application::ports::{ObjectStore, StoreError};
use crate::domain::audio::AudioMimeType;

/// Object store backed by a Supabase storage bucket
pub struct SupabaseStorage {
    base_url: String,
    bucket: String,
    api_key: String,
    access_token: String,
    client: reqwest::Client,
}

impl SupabaseStorage {
    /// Create a new storage adapter
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key: api_key.into(),
            access_token: access_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the upload endpoint for a key
    fn upload_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    /// Build the public retrieval URL for a key
    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: AudioMimeType,
    ) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.upload_url(key))
            .bearer_auth(&self.access_token)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type.as_str())
            .body(bytes)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(StoreError::RateLimited);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(key))
    }
}
