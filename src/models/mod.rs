mod config;
mod format;
mod paper;

pub use config::{
    Config, DEFAULT_DATABASE, DEFAULT_DIRECTORY, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL,
    DatabaseConfig, LibraryConfig, OllamaConfig, OutputConfig,
};
pub use format::OutputFormat;
pub use paper::{
    AUTHOR_SEPARATOR, PaperMetadata, PaperRecord, ParsedReply, join_authors, split_authors,
};
