//! Comment gateway port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::comment::{Comment, NewComment};

/// Comment gateway errors
#[derive(Debug, Clone, Error)]
pub enum CommentError {
    #[error("Comment request failed: {0}")]
    RequestFailed(String),

    #[error("Not authorized to post comments")]
    Unauthorized,

    #[error("Comment gateway rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to parse comment response: {0}")]
    ParseError(String),
}

/// Port for the external comment list collaborator.
#[async_trait]
pub trait CommentGateway: Send + Sync {
    /// Post a new comment and return the persisted record
    async fn post(&self, comment: &NewComment) -> Result<Comment, CommentError>;

    /// List the comments attached to a post, oldest first
    async fn list(&self, post_id: &str) -> Result<Vec<Comment>, CommentError>;
}
