//! Shared runners: config merging and the test animation

use std::env;
use std::process::ExitCode;

use tokio::time::sleep;

use crate::application::ports::ConfigStore;
use crate::application::PushContext;
use crate::domain::banner::DISPLAY_DURATION;
use crate::domain::config::AppConfig;
use crate::infrastructure::create_surface_factory;

use super::ipc::{create_ipc_client, DaemonRequest};
use super::logging::LOG_ENV_VAR;
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config<S: ConfigStore>(store: &S, cli_config: AppConfig) -> AppConfig {
    let file_config = store.load_or_empty().await;

    let env_config = AppConfig {
        log_level: env::var(LOG_ENV_VAR).ok().filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Play the banner once.
///
/// A running daemon shows it on its own surface. Without a daemon the banner
/// is shown locally and this waits until it has been dismissed.
pub async fn run_test(config: &AppConfig, presenter: &Presenter) -> ExitCode {
    let client = create_ipc_client();
    if client.is_daemon_running() {
        match client.send(&DaemonRequest::Test).await {
            Ok(reply) if reply.ok => {
                presenter.success("Banner shown by daemon");
                return ExitCode::from(EXIT_SUCCESS);
            }
            Ok(reply) => {
                presenter.error(reply.message.as_deref().unwrap_or("daemon refused test"));
                return ExitCode::from(EXIT_ERROR);
            }
            Err(e) => {
                presenter.warn(&format!("Daemon unreachable ({}), showing locally", e));
            }
        }
    }

    let factory = create_surface_factory(config.surface_or_default(), config.html_dir_or_default());
    let context = PushContext::new(factory);

    if let Err(e) = context.test_animation().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.success("YOU PUSHED");

    sleep(DISPLAY_DURATION).await;
    context.shutdown().await;
    ExitCode::from(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;

    #[tokio::test]
    async fn file_overrides_defaults_and_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        store
            .save(&AppConfig {
                surface: Some("html".into()),
                integration: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let cli = AppConfig {
            surface: Some("terminal".into()),
            ..Default::default()
        };
        let merged = load_merged_config(&store, cli).await;

        assert_eq!(merged.surface.as_deref(), Some("terminal"));
        assert_eq!(merged.integration, Some(false));
        assert!(merged.log_level.is_some());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        let merged = load_merged_config(&store, AppConfig::empty()).await;

        assert_eq!(merged.surface.as_deref(), Some("overlay"));
        assert_eq!(merged.integration, Some(true));
    }
}
