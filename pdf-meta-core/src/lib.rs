//! # pdf-meta
//!
//! Structural metadata extraction for PDF files, without rendering or content
//! stream interpretation.
//!
//! ## Features
//!
//! - **Version and page count**: header signature and a whole-file page scan
//! - **Cross-reference chain**: every classic xref table and trailer of an
//!   incrementally updated file, most recent first
//! - **Catalog and Info**: `/Type`, `/Pages`, `/Metadata`, `/Lang`, title,
//!   author, producer and dates
//! - **XMP**: Dublin Core title, creator, description, date, publishers,
//!   languages and ISBN, with FlateDecode support
//! - **Partial results**: damaged catalog, Info or XMP objects are reported as
//!   diagnostics while the rest of the document is still extracted
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_meta::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Document::open("book.pdf")?;
//! println!("{} by {}", document.title(), document.author());
//! println!("PDF {} with {} pages", document.version(), document.page_count());
//! # Ok(())
//! # }
//! ```
//!
//! ### Inspecting diagnostics
//!
//! ```rust,no_run
//! use pdf_meta::{ExtractOptions, Extractor, TracingSink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = TracingSink;
//! let extraction = Extractor::new()
//!     .with_options(ExtractOptions::lenient())
//!     .with_sink(&sink)
//!     .extract_path("damaged.pdf")?;
//!
//! for diagnostic in &extraction.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod dates;
pub mod diagnostics;
pub mod document;
pub mod options;
pub mod parser;

pub use diagnostics::{Diagnostic, DiagnosticSink, NoopSink, Severity, Stage, TracingSink};
pub use document::{Document, Extraction, Extractor};
pub use options::ExtractOptions;
pub use parser::{
    InfoObject, Metadata, ObjectRef, ParseError, ParseResult, RdfMetadata, RootObject, Trailer,
    XrefChain, XrefEntry, XrefTable,
};

/// Current version of pdf-meta
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extract the metadata of the PDF at `path` with default options.
///
/// Non-fatal problems are dropped; use [`Extractor`] to inspect them.
pub fn extract_metadata<P: AsRef<std::path::Path>>(path: P) -> ParseResult<Document> {
    Document::open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_extract_metadata_missing_file() {
        let result = extract_metadata("/definitely/not/here.pdf");
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
