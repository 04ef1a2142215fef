//! Encore CLI entry point

use std::process::ExitCode;

use clap::Parser;

use encore::cli::{
    handle_config_command, load_merged_config, resolve_backend, run_comment, run_comments,
    run_play, Cli, Commands, Presenter, EXIT_ERROR, EXIT_USAGE_ERROR,
};
use encore::domain::config::AppConfig;
use encore::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    let overrides = AppConfig {
        backend_url: cli.backend_url.clone(),
        api_key: cli.api_key.clone(),
        access_token: cli.access_token.clone(),
        ..Default::default()
    };

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        Commands::Play { url } => run_play(url).await,
        Commands::Comment { post_id, at, text } => {
            let config = load_merged_config(overrides).await;
            match resolve_backend(&config) {
                Ok(backend) => run_comment(backend, post_id, at, text).await,
                Err(message) => {
                    presenter.error(&message);
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
            }
        }
        Commands::Comments { post_id } => {
            let config = load_merged_config(overrides).await;
            match resolve_backend(&config) {
                Ok(backend) => run_comments(backend, post_id).await,
                Err(message) => {
                    presenter.error(&message);
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
            }
        }
    }
}
