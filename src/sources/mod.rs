//! Where documents come from.

mod local;

pub use local::PdfLocator;
