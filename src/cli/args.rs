//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// Encore - audio feedback for shared music performances
#[derive(Parser, Debug)]
#[command(name = "encore")]
#[command(version)]
#[command(about = "Record, preview, and post audio feedback on shared music performances")]
#[command(long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config file)
    #[arg(long, value_name = "URL", env = "ENCORE_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Backend publishable API key (overrides config file)
    #[arg(
        long,
        value_name = "KEY",
        env = "ENCORE_API_KEY",
        hide_env_values = true,
        global = true
    )]
    pub api_key: Option<String>,

    /// Access token of the signed-in user (overrides config file)
    #[arg(
        long,
        value_name = "TOKEN",
        env = "ENCORE_ACCESS_TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub access_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record audio feedback on a post, preview it, and post it as a comment
    Comment {
        /// The post to comment on
        post_id: String,

        /// Moment in the performance the feedback refers to (e.g., 1:24)
        #[arg(long, value_name = "M:SS")]
        at: Option<String>,

        /// Post written feedback instead of recording audio
        #[arg(long, value_name = "TEXT")]
        text: Option<String>,
    },
    /// List the feedback comments on a post
    Comments {
        /// The post whose comments to list
        post_id: String,
    },
    /// Play a posted audio comment
    Play {
        /// URL of the audio comment
        url: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "backend_url",
    "api_key",
    "access_token",
    "bucket",
    "max_take_secs",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
