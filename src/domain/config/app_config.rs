//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::DEFAULT_MAX_TAKE_SECS;

/// Default storage bucket for audio comments
pub const DEFAULT_BUCKET: &str = "audio-comments";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the backend service
    pub backend_url: Option<String>,
    /// Publishable API key sent with every backend request
    pub api_key: Option<String>,
    /// Signed-in user's access token
    pub access_token: Option<String>,
    /// Storage bucket that holds uploaded audio comments
    pub bucket: Option<String>,
    /// Ceiling on a single recording take, in seconds
    pub max_take_secs: Option<u64>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            backend_url: None,
            api_key: None,
            access_token: None,
            bucket: Some(DEFAULT_BUCKET.to_string()),
            max_take_secs: Some(DEFAULT_MAX_TAKE_SECS),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            backend_url: other.backend_url.or(self.backend_url),
            api_key: other.api_key.or(self.api_key),
            access_token: other.access_token.or(self.access_token),
            bucket: other.bucket.or(self.bucket),
            max_take_secs: other.max_take_secs.or(self.max_take_secs),
        }
    }

    /// Get the bucket, or the default bucket if not set
    pub fn bucket_or_default(&self) -> &str {
        self.bucket.as_deref().unwrap_or(DEFAULT_BUCKET)
    }

    /// Get the take ceiling, or the default if not set or zero
    pub fn max_take_secs_or_default(&self) -> u64 {
        match self.max_take_secs {
            Some(secs) if secs > 0 => secs,
            _ => DEFAULT_MAX_TAKE_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert!(config.backend_url.is_none());
        assert!(config.api_key.is_none());
        assert!(config.access_token.is_none());
        assert_eq!(config.bucket, Some("audio-comments".to_string()));
        assert_eq!(config.max_take_secs, Some(300));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.backend_url.is_none());
        assert!(config.api_key.is_none());
        assert!(config.bucket.is_none());
        assert!(config.max_take_secs.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            backend_url: Some("https://base.example.com".to_string()),
            api_key: Some("base_key".to_string()),
            bucket: Some("audio-comments".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            api_key: Some("other_key".to_string()),
            bucket: None, // Should not override
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.api_key, Some("other_key".to_string()));
        assert_eq!(
            merged.backend_url,
            Some("https://base.example.com".to_string())
        );
        assert_eq!(merged.bucket, Some("audio-comments".to_string()));
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            access_token: Some("token".to_string()),
            max_take_secs: Some(120),
            ..Default::default()
        };

        let merged = base.merge(AppConfig::empty());

        assert_eq!(merged.access_token, Some("token".to_string()));
        assert_eq!(merged.max_take_secs, Some(120));
    }

    #[test]
    fn bucket_or_default() {
        let config = AppConfig {
            bucket: Some("custom".to_string()),
            ..Default::default()
        };
        assert_eq!(config.bucket_or_default(), "custom");
        assert_eq!(AppConfig::empty().bucket_or_default(), "audio-comments");
    }

    #[test]
    fn max_take_secs_or_default_ignores_zero() {
        let config = AppConfig {
            max_take_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.max_take_secs_or_default(), 300);

        let config = AppConfig {
            max_take_secs: Some(60),
            ..Default::default()
        };
        assert_eq!(config.max_take_secs_or_default(), 60);
    }
}
