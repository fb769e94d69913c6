//! First-page text extraction.

use std::path::Path;

use lopdf::Document;

use crate::error::ExtractError;
use crate::utils::text::collapse_blank_lines;

/// Extract the plain text of the first page of the PDF at `path`.
///
/// A page without a text layer (a scan with no OCR) yields an empty string.
/// Anything that is not a loadable PDF with at least one page is an
/// [`ExtractError::UnreadableDocument`].
pub fn extract_first_page(path: &Path) -> Result<String, ExtractError> {
    let doc = Document::load(path)
        .map_err(|e| ExtractError::UnreadableDocument(format!("failed to load PDF: {e}")))?;

    let first_page = doc
        .get_pages()
        .into_keys()
        .next()
        .ok_or_else(|| ExtractError::UnreadableDocument("document has no pages".to_string()))?;

    let text = doc.extract_text(&[first_page]).map_err(|e| {
        ExtractError::UnreadableDocument(format!("failed to extract page {first_page}: {e}"))
    })?;

    Ok(collapse_blank_lines(&text))
}
