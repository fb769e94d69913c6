use anyhow::Result;
use tracing::debug;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{OllamaClient, PaperStore};

pub async fn handle_status(config: Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let status = collect_status(&config).await;

    print!("{}", formatter.format_status(&status));

    if !status.ollama_running {
        eprintln!();
        eprintln!("Hint: model server not reachable. Start it with: ollama serve");
    } else if !status.model_available {
        eprintln!();
        eprintln!(
            "Hint: model '{}' is not pulled. Fetch it with: ollama pull {}",
            config.ollama.model, config.ollama.model
        );
    }
    if !status.database_ok {
        eprintln!();
        eprintln!(
            "Hint: no catalog at {}. Create it with: librarian scan",
            status.database_path
        );
    }

    Ok(())
}

/// Check the model server and the catalog without creating anything.
async fn collect_status(config: &Config) -> StatusInfo {
    let (ollama_running, model_available) = match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check().await {
            Ok(health) => (true, health.model_available),
            Err(e) => {
                debug!(error = %e, "model server health check failed");
                (false, false)
            }
        },
        Err(e) => {
            debug!(error = %e, "could not build model server client");
            (false, false)
        }
    };

    let (database_ok, record_count) = match PaperStore::open_existing(&config.database.path) {
        Ok(store) => match store.count() {
            Ok(count) => (true, count),
            Err(_) => (false, 0),
        },
        Err(e) => {
            debug!(error = %e, "could not open catalog");
            (false, 0)
        }
    };

    StatusInfo {
        ollama_url: config.ollama.url.clone(),
        ollama_running,
        model: config.ollama.model.clone(),
        model_available,
        database_path: config.database.path.display().to_string(),
        database_ok,
        record_count,
        directory: config.library.directory.display().to_string(),
    }
}
