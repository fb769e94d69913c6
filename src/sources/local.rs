//! Local file system PDF locator.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::LocateError;
use crate::utils::file::{absolute_path, get_relative_path, is_hidden, is_pdf_file};

/// Finds PDF files under a root directory.
///
/// Each call to [`PdfLocator::iter`] starts a fresh walk, so a locator can be
/// reused to rescan the same tree.
#[derive(Debug)]
pub struct PdfLocator {
    /// Canonical root path to scan
    root: PathBuf,

    /// Glob patterns to exclude
    exclude_patterns: Vec<glob::Pattern>,
}

impl PdfLocator {
    /// Create a locator rooted at `root`, which must be an existing directory.
    pub fn new(root: &Path, exclude_patterns: &[String]) -> Result<Self, LocateError> {
        if !root.is_dir() {
            return Err(LocateError::DirectoryNotFound(root.to_path_buf()));
        }
        let root =
            absolute_path(root).map_err(|_| LocateError::DirectoryNotFound(root.to_path_buf()))?;

        let exclude_patterns = exclude_patterns
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| LocateError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root,
            exclude_patterns,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree, yielding absolute paths of PDF files.
    ///
    /// Unreadable entries are logged and skipped. Symlinks are not followed.
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_pdf_file(entry.path()))
            .filter(move |entry| !self.is_excluded(entry.path()))
            .map(walkdir::DirEntry::into_path)
    }

    /// Lazily walk the tree, yielding the root and every directory below it
    /// in file name order. Hidden directories and everything under them are
    /// left out.
    pub fn directories(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .map(walkdir::DirEntry::into_path)
    }

    /// Patterns match against the path relative to the root, so a root that
    /// itself lives under a hidden directory is not excluded wholesale.
    fn is_excluded(&self, path: &Path) -> bool {
        let Some(relative) = get_relative_path(&self.root, path) else {
            return false;
        };
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..Default::default()
        };
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_with(&relative, options))
    }
}
