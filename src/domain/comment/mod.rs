//! Feedback comment entities

pub mod timestamp;

pub use timestamp::TimestampRef;

/// The payload of a feedback comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentBody {
    /// Written feedback
    Text(String),
    /// A link to a persisted audio recording
    Audio { url: String },
}

impl CommentBody {
    /// Gateway discriminator for the body variant
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Audio { .. } => "audio",
        }
    }
}

/// A comment as returned by the comment list collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub body: CommentBody,
    pub timestamp_reference: Option<TimestampRef>,
    pub likes: u32,
    pub created_at: Option<String>,
}

/// A comment about to be posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: String,
    pub author: String,
    pub body: CommentBody,
    pub timestamp_reference: Option<TimestampRef>,
}
