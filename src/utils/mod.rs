//! Utility modules.

pub mod file;
pub mod retry;
pub mod text;

pub use file::{absolute_path, get_relative_path, is_hidden, is_pdf_file, path_key};
pub use retry::{RetryPolicy, Retryable, with_retry};
pub use text::{collapse_blank_lines, has_meaningful_content};
