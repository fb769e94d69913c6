//! File utilities for locating and keying documents.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Check if a path names a PDF, ignoring extension case.
pub fn is_pdf_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Dot-prefixed names are hidden.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Resolve a path to an absolute, symlink-free form.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    path.canonicalize()
}

/// The string a document is keyed by in the catalog.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Get the relative path from a base directory.
pub fn get_relative_path(base: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(base)
        .ok()
        .map(|p| p.to_string_lossy().to_string())
}
