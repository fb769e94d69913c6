//! Paper records and the metadata inferred for them.

use serde::{Deserialize, Serialize};

/// Separator used when authors are flattened into one column.
///
/// The round trip through the column is lossy: reading splits on every
/// comma, so a name stored as `"Smith, John"` comes back as two entries,
/// `"Smith"` and `"John"`. The column format is shared with other tools
/// reading `pdf_info`, so it is kept as is.
pub const AUTHOR_SEPARATOR: &str = ", ";

/// Title and authors recovered from a paper's first page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: Vec<String>,
}

impl PaperMetadata {
    /// Build metadata, trimming fields and dropping blank author entries.
    pub fn new(title: impl Into<String>, authors: impl IntoIterator<Item = String>) -> Self {
        Self {
            title: title.into().trim().to_string(),
            authors: authors
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

/// What the model's reply turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply {
    Parsed(PaperMetadata),
    /// None of the known reply shapes matched; the raw reply is kept for review.
    Unparsed { raw: String },
}

/// One row of the `pdf_info` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Absolute path of the PDF; the primary key.
    pub path: String,
    pub title: String,
    pub authors: Vec<String>,
}

impl PaperRecord {
    pub fn new(path: impl Into<String>, metadata: PaperMetadata) -> Self {
        Self {
            path: path.into(),
            title: metadata.title,
            authors: metadata.authors,
        }
    }

    /// The authors as stored in the `authors` column.
    pub fn authors_column(&self) -> String {
        join_authors(&self.authors)
    }
}

pub fn join_authors(authors: &[String]) -> String {
    authors.join(AUTHOR_SEPARATOR)
}

/// Split an `authors` column back into names.
pub fn split_authors(column: &str) -> Vec<String> {
    column
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}
