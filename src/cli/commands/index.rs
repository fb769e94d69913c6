//! Index command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use crate::cli::output::get_formatter;
use crate::error::StorageError;
use crate::models::{Config, OutputFormat};
use crate::services::{IndexGenerator, IndexOptions, PaperStore};
use crate::sources::PdfLocator;

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Library directory to write index pages into
    #[arg(long, short = 'r')]
    pub root: Option<PathBuf>,

    /// URL the library directory is served under
    #[arg(long, short = 'u')]
    pub url: String,

    /// Path prefix in the catalog that corresponds to the library directory
    #[arg(long)]
    pub original_prefix: Option<String>,

    /// Template file replacing the built-in page
    #[arg(long, short = 't')]
    pub template: Option<PathBuf>,
}

pub async fn handle_index(args: IndexArgs, config: Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let root = args.root.unwrap_or_else(|| config.library.directory.clone());
    let locator = PdfLocator::new(&root, &config.library.exclude_patterns)?;

    let records = match PaperStore::open_existing(&config.database.path) {
        Ok(store) => store.list()?,
        Err(StorageError::NotFound(path)) => {
            warn!(path = %path.display(), "no catalog; pages will list files without metadata");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let template = match args.template {
        Some(path) => Some(
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read template {}", path.display()))?,
        ),
        None => None,
    };

    let generator = IndexGenerator::new(IndexOptions {
        server_url: args.url,
        original_prefix: args.original_prefix,
        template,
    })?;
    let summary = generator.generate(&locator, &records)?;

    print!(
        "{}",
        formatter.format_message(&format!(
            "Wrote {} index pages listing {} PDF files ({} with metadata)",
            summary.pages, summary.pdf_files, summary.described
        ))
    );
    Ok(())
}
