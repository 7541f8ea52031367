//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::SurfaceKind;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::logging::{parse_level_str, VALID_LOG_LEVELS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

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
        ConfigAction::Path => handle_path(store, presenter),
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
    check_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    presenter.output(&display_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(
            key,
            &display_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()),
        );
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "workspaces" => {
            let roots: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if roots.is_empty() {
                return Err(invalid("At least one path is required".to_string()));
            }
            config.workspaces = Some(roots);
        }
        "surface" => {
            let kind: SurfaceKind = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.surface = Some(kind.to_string());
        }
        "integration" => {
            let enabled = parse_bool(value)
                .map_err(|_| invalid("Value must be 'true' or 'false'".to_string()))?;
            config.integration = Some(enabled);
        }
        "html_dir" => {
            if value.trim().is_empty() {
                return Err(invalid("Path must not be empty".to_string()));
            }
            config.html_dir = Some(value.to_string());
        }
        "log_level" => {
            if parse_level_str(value).is_none() {
                return Err(invalid(format!(
                    "Invalid value '{}'. Valid options: {}",
                    value,
                    VALID_LOG_LEVELS.join(", ")
                )));
            }
            config.log_level = Some(value.trim().to_lowercase());
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "workspaces" => config.workspaces.as_ref().map(|w| w.join(", ")),
        "surface" => config.surface.clone(),
        "integration" => config.integration.map(|b| b.to_string()),
        "html_dir" => config.html_dir.clone(),
        "log_level" => config.log_level.clone(),
        _ => None,
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
