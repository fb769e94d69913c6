//! The batch pipeline: locate, extract, infer, record.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::models::{Config, PaperRecord, ParsedReply};
use crate::services::extractor::extract_first_page;
use crate::services::inference::{MetadataInference, OllamaClient};
use crate::services::repository::PaperStore;
use crate::utils::file::path_key;
use crate::utils::text::has_meaningful_content;

/// Knobs for a run, taken from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct LibrarianOptions {
    /// Leave files that already have a record untouched.
    pub skip_existing: bool,
}

impl LibrarianOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            skip_existing: config.library.skip_existing,
        }
    }
}

impl Default for LibrarianOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Recorded(PaperRecord),
    AlreadyRecorded,
    /// The document could not be read or has no text to work with.
    Skipped(String),
    /// The model replied, but not in a shape we understand.
    NeedsReview(String),
    Failed(String),
}

/// Tally of a run, printed when the scan finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: u64,
    pub recorded: u64,
    pub already_recorded: u64,
    pub skipped: u64,
    pub needs_review: u64,
    pub failed: u64,
    pub duration_ms: u64,
}

impl RunSummary {
    fn tally(&mut self, outcome: &FileOutcome) {
        self.discovered += 1;
        match outcome {
            FileOutcome::Recorded(_) => self.recorded += 1,
            FileOutcome::AlreadyRecorded => self.already_recorded += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::NeedsReview(_) => self.needs_review += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Drives PDFs through extraction, inference and storage, one at a time.
pub struct Librarian {
    inference: Box<dyn MetadataInference>,
    store: PaperStore,
    options: LibrarianOptions,
}

impl Librarian {
    pub fn new(
        inference: Box<dyn MetadataInference>,
        store: PaperStore,
        options: LibrarianOptions,
    ) -> Self {
        Self {
            inference,
            store,
            options,
        }
    }

    /// Open the catalog and build an Ollama-backed librarian from `config`.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        config.validate()?;
        let inference = OllamaClient::new(&config.ollama)?;
        let store = PaperStore::open(&config.database.path)?;
        Ok(Self::new(
            Box::new(inference),
            store,
            LibrarianOptions::from_config(config),
        ))
    }

    pub fn store(&self) -> &PaperStore {
        &self.store
    }

    /// Process every path in order. Per-file failures are logged and counted,
    /// never propagated.
    pub async fn run<I>(&self, paths: I, progress: &ProgressBar) -> RunSummary
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        info!(
            model = %self.inference.model(),
            skip_existing = self.options.skip_existing,
            "starting scan"
        );

        for path in paths {
            progress.set_message(path_key(&path));
            let outcome = self.process_file(&path).await;
            summary.tally(&outcome);
            progress.inc(1);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            discovered = summary.discovered,
            recorded = summary.recorded,
            already_recorded = summary.already_recorded,
            skipped = summary.skipped,
            needs_review = summary.needs_review,
            failed = summary.failed,
            "scan finished"
        );
        summary
    }

    /// Run one file through the pipeline.
    pub async fn process_file(&self, path: &Path) -> FileOutcome {
        let key = path_key(path);

        if self.options.skip_existing {
            match self.store.exists(&key) {
                Ok(true) => {
                    debug!(path = %key, "already recorded");
                    return FileOutcome::AlreadyRecorded;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(path = %key, error = %e, "failed to query catalog");
                    return FileOutcome::Failed(e.to_string());
                }
            }
        }

        let text = match extract_first_page(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %key, error = %e, "skipping file");
                return FileOutcome::Skipped(e.to_string());
            }
        };

        if !has_meaningful_content(&text) {
            warn!(path = %key, "skipping file: no text layer on first page");
            return FileOutcome::Skipped("no text layer on first page".to_string());
        }

        let metadata = match self.inference.infer(&text).await {
            Ok(ParsedReply::Parsed(metadata)) => metadata,
            Ok(ParsedReply::Unparsed { raw }) => {
                warn!(path = %key, reply = %raw, "model reply not understood; needs review");
                return FileOutcome::NeedsReview(raw);
            }
            Err(e) => {
                warn!(path = %key, error = %e, "inference failed");
                return FileOutcome::Failed(e.to_string());
            }
        };

        let record = PaperRecord::new(key, metadata);
        if let Err(e) = self.store.upsert(&record) {
            error!(path = %record.path, error = %e, "failed to record paper");
            return FileOutcome::Failed(e.to_string());
        }

        info!(
            path = %record.path,
            title = %record.title,
            authors = %record.authors_column(),
            "recorded"
        );
        FileOutcome::Recorded(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::error::InferenceError;
    use crate::models::PaperMetadata;
    use crate::services::extractor::fixtures;
    use crate::services::reply::parse_reply;
    use crate::sources::PdfLocator;

    /// Answers with a canned reply and remembers what it was asked.
    struct FakeModel {
        reply: Result<String, ()>,
        calls: AtomicU32,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn unavailable() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MetadataInference for FakeModel {
        async fn infer(&self, first_page: &str) -> Result<ParsedReply, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(first_page.to_string());
            match &self.reply {
                Ok(reply) => Ok(parse_reply(reply)),
                Err(()) => Err(InferenceError::ServiceUnavailable(
                    "connection refused".to_string(),
                )),
            }
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    #[async_trait]
    impl MetadataInference for Arc<FakeModel> {
        async fn infer(&self, first_page: &str) -> Result<ParsedReply, InferenceError> {
            self.as_ref().infer(first_page).await
        }

        fn model(&self) -> &str {
            self.as_ref().model()
        }
    }

    fn librarian(model: Arc<FakeModel>, skip_existing: bool) -> Librarian {
        Librarian::new(
            Box::new(model),
            PaperStore::open_in_memory().unwrap(),
            LibrarianOptions { skip_existing },
        )
    }

    async fn run_over(librarian: &Librarian, root: &Path) -> RunSummary {
        let locator = PdfLocator::new(root, &[]).unwrap();
        librarian.run(locator.iter(), &ProgressBar::hidden()).await
    }

    #[tokio::test]
    async fn test_valid_and_corrupt_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let papers = dir.path().join("papers");
        fixtures::write_pdf(&papers.join("a.pdf"), &["Title of A", "by Alice"]);
        std::fs::create_dir_all(papers.join("sub")).unwrap();
        std::fs::write(papers.join("sub/b.pdf"), b"garbage, not a PDF").unwrap();

        let model = Arc::new(FakeModel::replying("Title: Title of A\nAuthors: Alice"));
        let librarian = librarian(model.clone(), true);
        let summary = run_over(&librarian, dir.path()).await;

        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);

        let a = papers.join("a.pdf").canonicalize().unwrap();
        let b = papers.join("sub/b.pdf").canonicalize().unwrap();
        let store = librarian.store();
        assert_eq!(store.count().unwrap(), 1);
        let record = store.get(&path_key(&a)).unwrap().unwrap();
        assert_eq!(record.title, "Title of A");
        assert_eq!(record.authors, vec!["Alice"]);
        assert!(store.get(&path_key(&b)).unwrap().is_none());

        // Only the readable file reached the model, and with its first-page text.
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert!(model.prompts.lock().unwrap()[0].contains("Title of A"));
    }

    #[tokio::test]
    async fn test_skip_existing_avoids_second_inference() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_pdf(&dir.path().join("a.pdf"), &["Some Long Paper Title"]);

        let model = Arc::new(FakeModel::replying("Title: T\nAuthors: X"));
        let librarian = librarian(model.clone(), true);

        let first = run_over(&librarian, dir.path()).await;
        let second = run_over(&librarian, dir.path()).await;

        assert_eq!(first.recorded, 1);
        assert_eq!(second.recorded, 0);
        assert_eq!(second.already_recorded, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(librarian.store().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reprocessing_overwrites_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_pdf(&dir.path().join("a.pdf"), &["Some Long Paper Title"]);

        let model = Arc::new(FakeModel::replying("Title: T\nAuthors: X, Y"));
        let librarian = librarian(model.clone(), false);

        run_over(&librarian, dir.path()).await;
        let second = run_over(&librarian, dir.path()).await;

        assert_eq!(second.recorded, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        let records = librarian.store().list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].authors, vec!["X", "Y"]);
    }

    #[tokio::test]
    async fn test_service_failure_is_per_file() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_pdf(&dir.path().join("a.pdf"), &["Some Long Paper Title"]);
        fixtures::write_pdf(&dir.path().join("b.pdf"), &["Another Long Paper Title"]);

        let model = Arc::new(FakeModel::unavailable());
        let librarian = librarian(model.clone(), true);
        let summary = run_over(&librarian, dir.path()).await;

        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(librarian.store().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unparsed_reply_needs_review_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_pdf(&dir.path().join("a.pdf"), &["Some Long Paper Title"]);

        let model = Arc::new(FakeModel::replying("I cannot help with that."));
        let librarian = librarian(model, true);
        let summary = run_over(&librarian, dir.path()).await;

        assert_eq!(summary.needs_review, 1);
        assert_eq!(librarian.store().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_page_is_skipped_without_inference() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_pdf(&dir.path().join("scan.pdf"), &[]);

        let model = Arc::new(FakeModel::replying("Title: T"));
        let librarian = librarian(model.clone(), true);
        let summary = run_over(&librarian, dir.path()).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_page_pdf_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_empty_pdf(&dir.path().join("empty.pdf"));
        fixtures::write_pdf(&dir.path().join("z.pdf"), &["Some Long Paper Title"]);

        let model = Arc::new(FakeModel::replying("Title: Z"));
        let librarian = librarian(model, true);
        let summary = run_over(&librarian, dir.path()).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.recorded, 1);
        let records = librarian.store().list().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].path.ends_with("z.pdf"));
    }

    #[tokio::test]
    async fn test_process_file_returns_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        fixtures::write_pdf(&path, &["Deep Learning for X"]);

        let model = Arc::new(FakeModel::replying(
            "Title: Deep Learning for X\nAuthors: A. Smith, B. Jones",
        ));
        let librarian = librarian(model, true);
        let outcome = librarian.process_file(&path).await;

        let expected = PaperRecord::new(
            path_key(&path),
            PaperMetadata::new(
                "Deep Learning for X",
                vec!["A. Smith".to_string(), "B. Jones".to_string()],
            ),
        );
        assert_eq!(outcome, FileOutcome::Recorded(expected));
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.library.skip_existing = false;
        assert!(!LibrarianOptions::from_config(&config).skip_existing);
    }
}
