mod extractor;
mod index_pages;
mod inference;
mod librarian;
mod reply;
mod repository;

pub use extractor::extract_first_page;
pub use index_pages::{
    DEFAULT_TEMPLATE, DirectoryPage, INDEX_FILE_NAME, IndexGenerator, IndexOptions, IndexSummary,
    Link, PdfEntry,
};
pub use inference::{MetadataInference, OllamaClient, PROMPT_TEMPLATE, ServerHealth, build_prompt};
pub use librarian::{FileOutcome, Librarian, LibrarianOptions, RunSummary};
pub use reply::{parse_reply, split_author_list};
pub use repository::PaperStore;
