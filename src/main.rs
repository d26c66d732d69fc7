use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use premchat::cli::commands::{
    handle_arxiv, handle_collections, handle_config, handle_pdf, handle_sql, handle_status,
    handle_summarize,
};
use premchat::cli::{Cli, Commands};
use premchat::models::{Config, OutputFormat};

/// Log to stderr; `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "premchat=debug" } else { "premchat=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let resolved = Config::load().unwrap_or_default();
    let format = cli.format.unwrap_or(resolved.config.output.format);
    let verbose = cli.verbose;

    tokio::select! {
        result = run_command(cli.command, format, verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

async fn run_command(command: Commands, format: OutputFormat, verbose: bool) -> Result<()> {
    match command {
        Commands::Arxiv(args) => {
            handle_arxiv(args, format, verbose).await?;
        }
        Commands::Collections => {
            handle_collections(format, verbose).await?;
        }
        Commands::Pdf(cmd) => {
            handle_pdf(cmd, format, verbose).await?;
        }
        Commands::Sql(cmd) => {
            handle_sql(cmd, format, verbose).await?;
        }
        Commands::Summarize(args) => {
            handle_summarize(args, format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, format, verbose).await?;
        }
        Commands::Status => {
            handle_status(format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
