use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use canvas_todo::cache::ChecklistCache;
use canvas_todo::client::Client;
use canvas_todo::config::Config;
use canvas_todo::provider::{self, Provider};

/// The environment variable that holds the Canvas API token
const TOKEN_VARIABLE: &str = "CANVAS_TOKEN";

/// Mirrors Canvas assignments into checklist notes
#[derive(Parser, Debug)]
#[command(name = "canvas-todo", version, about)]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "canvas-todo.json")]
    config: PathBuf,

    /// Run a single cycle then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        },
    };

    let token = match std::env::var(TOKEN_VARIABLE) {
        Ok(token) => token,
        Err(err) => {
            log::error!("Unable to get the API token from ${}: {}", TOKEN_VARIABLE, err);
            return ExitCode::FAILURE;
        },
    };

    let client = match Client::new(config.api_url.as_str(), token) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Unable to create a client: {}", err);
            return ExitCode::FAILURE;
        },
    };

    let cache = match ChecklistCache::from_file_or_new(&config.cache_file) {
        Ok(cache) => cache.with_pinned_notes(config.pin_notes),
        Err(err) => {
            log::error!("Invalid cache file {:?}: {}. Fix or remove it before starting again", config.cache_file, err);
            return ExitCode::FAILURE;
        },
    };

    let mut provider = Provider::new(client, cache, config.courses.clone())
        .with_horizon_days(config.due_date_horizon_days)
        .with_console_print(config.console_print);

    if cli.once {
        return match provider.sync().await {
            true => ExitCode::SUCCESS,
            false => {
                log::warn!("Sync did not complete, see the previous log lines for more info. You can safely start a new sync.");
                ExitCode::FAILURE
            },
        };
    }

    let (cancel_sender, cancel_receiver) = provider::cancellation_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Interrupted, stopping after the current cycle"),
            Err(err) => log::error!("Unable to listen for Ctrl-C: {}. Stopping", err),
        }
        let _ = cancel_sender.send(true);
    });

    provider.run_until_cancelled(config.update_interval(), cancel_receiver).await;
    ExitCode::SUCCESS
}
