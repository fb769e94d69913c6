//! Scan command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{Librarian, RunSummary};
use crate::sources::PdfLocator;
use crate::utils::file::{absolute_path, get_relative_path, is_pdf_file, path_key};

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Specific PDF files to process instead of walking the library
    pub paths: Vec<PathBuf>,

    /// Library directory to walk
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Model server URL
    #[arg(long)]
    pub url: Option<String>,

    /// Model name
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Extra attempts on transient model server failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Re-process files that already have a record
    #[arg(long)]
    pub force: bool,

    /// Show what would be processed without contacting the model
    #[arg(long)]
    pub dry_run: bool,
}

impl ScanArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(ref dir) = self.dir {
            config.library.directory = dir.clone();
        }
        if let Some(ref url) = self.url {
            config.ollama.url = url.clone();
        }
        if let Some(ref model) = self.model {
            config.ollama.model = model.clone();
        }
        if let Some(timeout) = self.timeout {
            config.ollama.timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.ollama.max_retries = retries;
        }
        if self.force {
            config.library.skip_existing = false;
        }
    }
}

pub async fn handle_scan(
    args: ScanArgs,
    mut config: Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    args.apply(&mut config);
    let formatter = get_formatter(format);

    let (root, files) = if args.paths.is_empty() {
        let locator = PdfLocator::new(
            &config.library.directory,
            &config.library.exclude_patterns,
        )
        .context("cannot scan library")?;
        let files: Vec<PathBuf> = locator.iter().collect();
        (Some(locator.root().to_path_buf()), files)
    } else {
        (None, explicit_files(&args.paths))
    };

    if args.dry_run {
        print!(
            "{}",
            formatter.format_message(&format!("Dry run: would process {} files", files.len()))
        );
        for file in &files {
            let shown = root
                .as_deref()
                .and_then(|root| get_relative_path(root, file))
                .unwrap_or_else(|| path_key(file));
            println!("  {}", shown);
        }
        return Ok(());
    }

    if files.is_empty() {
        info!("no PDF files found");
        print!("{}", formatter.format_summary(&RunSummary::default()));
        return Ok(());
    }

    let librarian = Librarian::from_config(&config).context("failed to set up scan")?;

    let progress = progress_bar(files.len() as u64, verbose);
    let summary = librarian.run(files, &progress).await;
    progress.finish_and_clear();

    print!("{}", formatter.format_summary(&summary));
    Ok(())
}

/// Resolve explicitly named files; anything missing or not a PDF is skipped.
fn explicit_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| {
            if !is_pdf_file(path) {
                warn!(path = %path.display(), "skipping: not a PDF");
                return None;
            }
            match absolute_path(path) {
                Ok(resolved) => Some(resolved),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping: cannot resolve path");
                    None
                }
            }
        })
        .collect()
}

/// A bar on an interactive stderr; hidden otherwise so log lines stay clean.
fn progress_bar(len: u64, verbose: bool) -> ProgressBar {
    if verbose || !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> ScanArgs {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            scan: ScanArgs,
        }

        let argv = std::iter::once("scan").chain(extra.iter().copied());
        Wrapper::parse_from(argv).scan
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        args(&[
            "--dir", "/srv/papers", "--url", "http://gpu:11434", "--model", "mistral",
            "--timeout", "60", "--retries", "2", "--force",
        ])
        .apply(&mut config);

        assert_eq!(config.library.directory, PathBuf::from("/srv/papers"));
        assert_eq!(config.ollama.url, "http://gpu:11434");
        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.timeout_secs, 60);
        assert_eq!(config.ollama.max_retries, 2);
        assert!(!config.library.skip_existing);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        args(&[]).apply(&mut config);
        assert!(config.library.skip_existing);
        assert_eq!(config.ollama.model, Config::default().ollama.model);
    }

    #[test]
    fn test_explicit_files_filters_missing_and_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("a.pdf");
        let txt = dir.path().join("notes.txt");
        std::fs::write(&pdf, b"%PDF").unwrap();
        std::fs::write(&txt, b"hi").unwrap();

        let files = explicit_files(&[pdf.clone(), txt, dir.path().join("gone.pdf")]);
        assert_eq!(files, vec![pdf.canonicalize().unwrap()]);
    }

    #[tokio::test]
    async fn test_empty_library_reports_zero_summary() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("papers");
        std::fs::create_dir_all(&library).unwrap();
        let mut config = Config::default();
        config.library.directory = library;
        config.database.path = dir.path().join("catalog.db");

        let result = handle_scan(args(&[]), config.clone(), OutputFormat::Json, false).await;
        assert!(result.is_ok());
        // Nothing to record, so the catalog is left alone.
        assert!(!config.database.path.exists());
    }

    #[tokio::test]
    async fn test_missing_library_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.library.directory = dir.path().join("missing");
        config.database.path = dir.path().join("catalog.db");

        let result = handle_scan(args(&[]), config, OutputFormat::Text, false).await;
        assert!(result.is_err());
    }
}
