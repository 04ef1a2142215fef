//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => {
            presenter.output(&store.path().display().to_string());
            Ok(())
        }
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key_error(key));
    }

    let mut config = store.load().await?;

    match key {
        "backend_url" => config.backend_url = Some(value.to_string()),
        "api_key" => config.api_key = Some(value.to_string()),
        "access_token" => config.access_token = Some(value.to_string()),
        "bucket" => config.bucket = Some(value.to_string()),
        "max_take_secs" => {
            let secs: u64 = value.parse().map_err(|_| ConfigError::ValidationError {
                key: key.to_string(),
                message: "Value must be a number of seconds".to_string(),
            })?;
            if secs == 0 {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be greater than zero".to_string(),
                });
            }
            config.max_take_secs = Some(secs);
        }
        _ => unreachable!(), // Already validated
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key_error(key));
    }

    let config = store.load().await?;
    match config_value(&config, key) {
        Some(value) => presenter.output(&value),
        None => presenter.output("(not set)"),
    }
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key).unwrap_or_else(|| "(not set)".to_string());
        presenter.output(&format!("{} = {}", key, value));
    }
    Ok(())
}

fn config_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "backend_url" => config.backend_url.clone(),
        "api_key" => config.api_key.clone(),
        "access_token" => config.access_token.clone(),
        "bucket" => config.bucket.clone(),
        "max_take_secs" => config.max_take_secs.map(|secs| secs.to_string()),
        _ => None,
    }
}

fn unknown_key_error(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}
