use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use paper_librarian::cli::commands::{
    ConfigCommand, handle_config, handle_index, handle_list, handle_scan, handle_show,
    handle_status,
};
use paper_librarian::cli::output::get_formatter;
use paper_librarian::cli::{Cli, Commands};
use paper_librarian::models::{Config, OutputFormat};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // errors are rendered in the requested format, even when the config is unreadable
    let format = cli.format.unwrap_or_else(|| {
        cli.load_config()
            .map(|config| config.output.default_format)
            .unwrap_or_default()
    });

    tokio::select! {
        result = run_command(cli, format) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprint!("{}", get_formatter(format).format_error(&format!("{e:#}")));
                ExitCode::FAILURE
            }
        },
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, stopping...");
            ExitCode::from(130)
        }
    }
}

async fn run_command(cli: Cli, format: OutputFormat) -> Result<()> {
    let config = match cli.load_config() {
        Ok(config) => config,
        // init must be able to replace a missing or broken file
        Err(e) if matches!(cli.command, Commands::Config(ConfigCommand::Init { .. })) => {
            debug!(error = %e, "ignoring unreadable config for init");
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };
    let verbose = cli.verbose;

    match cli.command {
        Commands::Scan(args) => {
            handle_scan(args, config, format, verbose).await?;
        }
        Commands::Show(args) => {
            handle_show(args, config, format).await?;
        }
        Commands::List => {
            handle_list(config, format).await?;
        }
        Commands::Status => {
            handle_status(config, format).await?;
        }
        Commands::Index(args) => {
            handle_index(args, config, format).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, config, cli.config, format).await?;
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
