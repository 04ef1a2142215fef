//! Supabase comment gateway adapter
//!
//! Posts and lists feedback comments through the backend's REST surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{CommentError, CommentGateway};
use crate::domain::comment::{Comment, CommentBody, NewComment};

/// Row shape accepted by the comments table on insert
#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    post_id: &'a str,
    author: &'a str,
    comment_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_reference: Option<String>,
}

impl<'a> InsertRow<'a> {
    fn from_new(comment: &'a NewComment) -> Self {
        let (content, audio_url) = match &comment.body {
            CommentBody::Text(text) => (Some(text.as_str()), None),
            CommentBody::Audio { url } => (None, Some(url.as_str())),
        };
        Self {
            post_id: &comment.post_id,
            author: &comment.author,
            comment_type: comment.body.kind(),
            content,
            audio_url,
            timestamp_reference: comment.timestamp_reference.map(|ts| ts.to_string()),
        }
    }
}

/// Row shape returned by the comments table
#[derive(Debug, Deserialize)]
struct CommentRow {
    id: String,
    post_id: String,
    author: String,
    comment_type: String,
    content: Option<String>,
    audio_url: Option<String>,
    timestamp_reference: Option<String>,
    likes: Option<u32>,
    created_at: Option<String>,
}

impl CommentRow {
    fn into_domain(self) -> Result<Comment, CommentError> {
        let body = match self.comment_type.as_str() {
            "audio" => CommentBody::Audio {
                url: self.audio_url.ok_or_else(|| {
                    CommentError::ParseError("audio comment without audio_url".into())
                })?,
            },
            _ => CommentBody::Text(self.content.unwrap_or_default()),
        };

        // Stored references predate validation; unparseable ones are dropped
        let timestamp_reference = self
            .timestamp_reference
            .as_deref()
            .and_then(|s| s.parse().ok());

        Ok(Comment {
            id: self.id,
            post_id: self.post_id,
            author: self.author,
            body,
            timestamp_reference,
            likes: self.likes.unwrap_or(0),
            created_at: self.created_at,
        })
    }
}

/// Comment gateway backed by the backend's REST surface
pub struct SupabaseComments {
    base_url: String,
    api_key: String,
    access_token: String,
    client: reqwest::Client,
}

impl SupabaseComments {
    /// Create a new comment gateway
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: access_token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn comments_url(&self) -> String {
        format!("{}/rest/v1/comments", self.base_url)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CommentError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CommentError::Unauthorized);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CommentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CommentGateway for SupabaseComments {
    async fn post(&self, comment: &NewComment) -> Result<Comment, CommentError> {
        let response = self
            .client
            .post(self.comments_url())
            .bearer_auth(&self.access_token)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .json(&[InsertRow::from_new(comment)])
            .send()
            .await
            .map_err(|e| CommentError::RequestFailed(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let rows: Vec<CommentRow> = response
            .json()
            .await
            .map_err(|e| CommentError::ParseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| CommentError::ParseError("insert returned no rows".into()))?
            .into_domain()
    }

    async fn list(&self, post_id: &str) -> Result<Vec<Comment>, CommentError> {
        let response = self
            .client
            .get(self.comments_url())
            .bearer_auth(&self.access_token)
            .header("apikey", &self.api_key)
            .query(&[
                ("post_id", format!("eq.{}", post_id)),
                ("select", "*".to_string()),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| CommentError::RequestFailed(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let rows: Vec<CommentRow> = response
            .json()
            .await
            .map_err(|e| CommentError::ParseError(e.to_string()))?;

        rows.into_iter().map(CommentRow::into_domain).collect()
    }
}
