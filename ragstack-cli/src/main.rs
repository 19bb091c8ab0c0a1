use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use ragstack_orchestrations::cancel::CancelFlag;
use ragstack_orchestrations::TeardownOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;
mod output;
mod prompt;

use cli::{Args, Command};
use commands::CommandOutcome;
use config::Config;
use prompt::StdinPrompt;

const DEFAULT_LOG_FILTER: &str = "info,ragstack_orchestrations=info,ragstack_cli=info,kube=warn";

/// Initialize tracing with two outputs:
/// 1. stderr, so stdout stays clean for the summary
/// 2. ~/.ragstack/ragstack.log, kept across runs
///
/// The returned guard flushes the file writer when dropped.
fn initialize_tracing() -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let log_dir = PathBuf::from(home).join(".ragstack");
    std::fs::create_dir_all(&log_dir).ok();

    // No file logging if the directory is not writable
    let (file_layer, guard) = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("ragstack.log")
        .build(&log_dir)
    {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

/// First Ctrl-C lets the in-flight component finish; the second one exits
fn install_interrupt_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!(
            "Interrupt received, finishing the current component (Ctrl-C again to abort)"
        );
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Aborted.");
            std::process::exit(130);
        }
    });
}

async fn run(args: Args, cancel: CancelFlag) -> Result<CommandOutcome> {
    let config = Config::load()?.with_overrides(&args.global);
    let format = args.global.output;

    match args.command {
        Command::Deploy {
            only,
            include_optional,
        } => {
            let selection = cli::deploy_selection(only, include_optional);
            commands::deploy::run_deploy(&config, selection, format, cancel).await
        }
        Command::Teardown {
            only,
            all,
            delete_storage,
            yes,
        } => {
            let selection = cli::teardown_selection(only, all);
            let options = TeardownOptions {
                delete_storage,
                assume_yes: yes,
            };
            commands::teardown::run_teardown(
                &config,
                selection,
                options,
                format,
                &StdinPrompt,
                cancel,
            )
            .await
        }
        Command::Status { only } => {
            let selection = cli::status_selection(only);
            commands::status::run_status(&config, selection, format, cancel).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    let _guard = initialize_tracing();

    let cancel = CancelFlag::new();
    install_interrupt_handler(cancel.clone());

    match run(args, cancel).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(commands::exit_code_for(&e))
        }
    }
}
