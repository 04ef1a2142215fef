//! Identity port interface

use async_trait::async_trait;
use thiserror::Error;

/// Identity errors
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Not signed in. Set ENCORE_ACCESS_TOKEN or configure via 'encore config set access_token <token>'")]
    NotSignedIn,

    #[error("Identity request failed: {0}")]
    RequestFailed(String),

    #[error("Session rejected: {0}")]
    Rejected(String),
}

/// The signed-in user, used to namespace stored artifacts and attribute
/// comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
}

impl UserProfile {
    /// Display handle: the local part of the email, or "Anonymous"
    pub fn handle(&self) -> String {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("Anonymous")
            .to_string()
    }
}

/// Port for the session/identity collaborator.
#[async_trait]
pub trait Identity: Send + Sync {
    /// Resolve the current signed-in user
    async fn current_user(&self) -> Result<UserProfile, IdentityError>;
}
