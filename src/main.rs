//! you-pushed CLI entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use you_pushed::cli::{
    app::{load_merged_config, run_test, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    daemon_app::run_daemon,
    daemon_cmd::handle_daemon_command,
    emit_cmd::handle_emit_command,
    logging::{init_logging, parse_level_str},
    presenter::Presenter,
    wrap_cmd::{handle_wrap_command, WrapError},
    DaemonOptions,
};
use you_pushed::domain::config::AppConfig;
use you_pushed::domain::error::ConfigError;
use you_pushed::domain::SurfaceKind;
use you_pushed::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut presenter = Presenter::new();
    let store = XdgConfigStore::new();

    // Build CLI config from args
    let cli_config = AppConfig {
        workspaces: (!cli.workspaces.is_empty()).then(|| {
            cli.workspaces
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect()
        }),
        surface: cli.surface.map(|s| SurfaceKind::from(s).to_string()),
        integration: if cli.no_integration { Some(false) } else { None },
        html_dir: None,
        log_level: cli.log_level.clone(),
    };

    // Merge config
    let config = load_merged_config(&store, cli_config).await;

    let level = match parse_level_str(config.log_level_or_default()) {
        Some(level) => level,
        None if cli.log_level.is_some() => {
            presenter.error(&format!(
                "Invalid log level: {}",
                config.log_level_or_default()
            ));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => {
            presenter.warn(&format!(
                "Ignoring invalid log level '{}'",
                config.log_level_or_default()
            ));
            tracing::Level::INFO
        }
    };
    init_logging(level);

    match cli.command {
        Some(Commands::Config { action }) => {
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e @ ConfigError::ValidationError { .. }) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Some(Commands::Daemon { action }) => {
            if let Err(e) = handle_daemon_command(action, &presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::Emit { action }) => {
            if let Err(e) = handle_emit_command(action, &presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Some(Commands::Wrap { id, dir, args }) => {
            match handle_wrap_command(&id, dir, &args, &mut presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e @ WrapError::UnknownCommand(_)) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Some(Commands::Test) => run_test(&config, &presenter).await,
        None if cli.daemon => {
            let options = DaemonOptions {
                workspaces: config
                    .workspaces_or_default()
                    .into_iter()
                    .map(absolute)
                    .collect(),
                surface: config.surface_or_default(),
                integration: config.integration_or_default(),
                html_dir: config.html_dir_or_default(),
            };
            run_daemon(options).await
        }
        None => {
            let _ = Cli::command().print_help();
            ExitCode::from(EXIT_USAGE_ERROR)
        }
    }
}

/// Resolve a workspace root against the current directory
fn absolute(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|dir| dir.join(&path))
            .unwrap_or(path)
    })
}
