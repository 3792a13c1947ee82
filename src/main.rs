//! Reel CLI entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use reel::cli::{
    app::{load_merged_config, run_capture, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{CaptureOptions, Cli, Commands, EncoderArg},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use reel::domain::config::AppConfig;
use reel::domain::recording::Duration;
use reel::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        limit: cli.limit.clone(),
        encoder: cli.encoder.map(|e| e.as_str().to_string()),
        output_dir: None, // --output names a file, not a directory
        flush_every: cli.flush_every.clone(),
        cue: if cli.cue { Some(true) } else { None },
    };

    // Merge config
    let config = load_merged_config(cli_config).await;

    // Parse limit
    let limit = match config.limit.as_ref() {
        Some(s) => match s.parse::<Duration>() {
            Ok(d) => d,
            Err(e) => {
                presenter.error(&format!("Invalid limit: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => Duration::default_limit(),
    };

    // Parse flush interval
    let flush_every = match config.flush_every.as_ref() {
        Some(s) => match s.parse::<Duration>() {
            Ok(d) => Some(d),
            Err(e) => {
                presenter.error(&format!("Invalid flush interval: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => None,
    };

    let encoder = match EncoderArg::from_name(config.encoder_or_default()) {
        Some(encoder) => encoder,
        None => {
            presenter.error(&format!(
                "Invalid encoder: {} (valid: wav, flac)",
                config.encoder_or_default()
            ));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    // --output names the file directly; the configured output_dir only
    // supplies a directory for the default file name.
    let output = cli.output.or_else(|| {
        config.output_dir.as_ref().map(|dir| {
            PathBuf::from(dir).join(format!("take.{}", encoder.mime_type().extension()))
        })
    });

    let options = CaptureOptions {
        output,
        limit,
        encoder,
        flush_every,
        cue: config.cue_or_default(),
    };

    run_capture(options).await
}
