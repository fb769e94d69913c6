use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::PaperStore;
use crate::utils::file::{absolute_path, path_key};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Path of the PDF to look up
    pub path: PathBuf,
}

pub async fn handle_show(args: ShowArgs, config: Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let store = open_store(&config)?;

    let key = lookup_key(&args.path);
    match store.get(&key)? {
        Some(record) => print!("{}", formatter.format_record(&record)),
        None => anyhow::bail!("no record for {}", key),
    }
    Ok(())
}

pub async fn handle_list(config: Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let store = open_store(&config)?;
    let records = store.list()?;
    print!("{}", formatter.format_records(&records));
    Ok(())
}

fn open_store(config: &Config) -> Result<PaperStore> {
    PaperStore::open_existing(&config.database.path).with_context(|| {
        format!(
            "failed to open catalog at {}",
            config.database.path.display()
        )
    })
}

/// Records are keyed by absolute path; fall back to the literal path for
/// files that have since been moved or deleted.
fn lookup_key(path: &Path) -> String {
    absolute_path(path)
        .map(|p| path_key(&p))
        .unwrap_or_else(|_| path_key(path))
}
