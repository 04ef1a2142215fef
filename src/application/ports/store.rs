//! Object store port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioMimeType;

/// Object store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    RequestFailed(String),

    #[error("Not authorized to store objects")]
    Unauthorized,

    #[error("Rate limited by the store")]
    RateLimited,

    #[error("Store rejected the object (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Port for the remote object store that persists audio comments.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under a key with a content type.
    ///
    /// # Returns
    /// The publicly retrievable URL of the stored object.
    async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: AudioMimeType,
    ) -> Result<String, StoreError>;
}
