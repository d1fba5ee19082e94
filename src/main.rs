mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use feeconf::EngineConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv(); // load .env if present

    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let engine = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid engine configuration");
            std::process::exit(2);
        }
    };

    let options = commands::RunOptions::resolve(cli.store, cli.json);
    info!(store = %options.store_path.display(), "feectl starting");

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let mut stdout = std::io::stdout();
    tokio::select! {
        result = commands::run(cli.command, &options, engine, &mut stdout) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "command failed");
                std::process::exit(e.exit_code());
            }
        }
        _ = cancel.cancelled() => {
            tracing::warn!("interrupted; store left unchanged");
            std::process::exit(130);
        }
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("received SIGTERM, shutting down");
                    cancel_clone.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "failed to register SIGTERM handler"),
            }
        });
    }

    cancel
}
