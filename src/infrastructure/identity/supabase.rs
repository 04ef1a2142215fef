//! Supabase session identity adapter

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{Identity, IdentityError, UserProfile};

/// Row shape returned by the auth user endpoint
#[derive(Debug, Deserialize)]
struct UserRow {
    id: String,
    email: Option<String>,
}

/// Identity provider backed by the backend's auth session endpoint
pub struct SupabaseIdentity {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl SupabaseIdentity {
    /// Create a new identity adapter; `access_token` is absent when the
    /// user has not signed in.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }
}

#[async_trait]
impl Identity for SupabaseIdentity {
    async fn current_user(&self) -> Result<UserProfile, IdentityError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(IdentityError::NotSignedIn)?;

        let response = self
            .client
            .get(self.user_url())
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(IdentityError::Rejected(
                "access token was not accepted".into(),
            ));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IdentityError::RequestFailed(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let user: UserRow = response
            .json()
            .await
            .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

        Ok(UserProfile {
            id: user.id,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_token_fails_without_a_request() {
        let identity = SupabaseIdentity::new("https://abc.supabase.co", "key", None);
        let err = identity.current_user().await.unwrap_err();
        assert!(matches!(err, IdentityError::NotSignedIn));
    }

    #[test]
    fn user_url_targets_the_auth_route() {
        let identity = SupabaseIdentity::new("https://abc.supabase.co/", "key", None);
        assert_eq!(identity.user_url(), "https://abc.supabase.co/auth/v1/user");
    }
}
