//! Error types for the paper librarian.

use std::path::PathBuf;

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors raised while locating PDFs on disk.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised while pulling text out of a document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unreadable document: {0}")]
    UnreadableDocument(String),
}

/// Errors related to the model server.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model server unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("model server returned status {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("invalid model server response: {0}")]
    InvalidResponse(String),

    #[error("model request timed out after {0}s")]
    Timeout(u64),
}

impl Retryable for InferenceError {
    fn is_retryable(&self) -> bool {
        match self {
            InferenceError::ServiceUnavailable(_) | InferenceError::Timeout(_) => true,
            // Ollama answers 503 while a model is still loading
            InferenceError::ServerError { status, .. } => {
                matches!(status, 429 | 502 | 503 | 504)
            }
            InferenceError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to the paper catalog database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("catalog not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while writing HTML index pages.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("locate error: {0}")]
    Locate(#[from] LocateError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),
}
