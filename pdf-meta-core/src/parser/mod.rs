//! PDF Structure Parser
//!
//! Low-level readers for the classic (table based) file structure described in
//! ISO 32000-1 Section 7.5: header, cross-reference sections, trailers and the
//! handful of indirect objects needed for document metadata.

pub mod chain;
pub mod filters;
pub mod header;
pub mod objects;
pub mod page_count;
pub mod reader;
pub mod scanner;
pub mod trailer;
pub mod xmp;
pub mod xref;

#[doc(hidden)]
pub mod test_helpers;

pub use self::chain::XrefChain;
pub use self::header::PdfHeader;
pub use self::objects::{InfoObject, ObjectRef, RootObject};
pub use self::reader::SourceReader;
pub use self::trailer::Trailer;
pub use self::xmp::{Metadata, RdfMetadata};
pub use self::xref::{Subsection, XrefEntry, XrefTable};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is not a PDF")]
    NotAPdf,

    #[error("Cannot read startxref offset")]
    CannotReadXrefOffset,

    #[error("Cannot parse xref section at offset {offset}: {reason}")]
    XrefSectionNotParsable { offset: u64, reason: String },

    #[error("Cannot parse trailer after offset {offset}")]
    TrailerNotParsable { offset: u64 },

    #[error("Xref chain revisits offset {offset}")]
    CorruptXrefChain { offset: u64 },

    #[error("Object {0} not found")]
    ObjectNotFound(u32),

    #[error("Object {object} at offset {offset} is not parsable")]
    ObjectNotParsable { object: u32, offset: u64 },

    #[error("Cannot find root object")]
    CannotFindRootObject,

    #[error("Cannot find info object")]
    CannotFindInfoObject,

    #[error("Cannot find stream content")]
    CannotFindStreamContent,

    #[error("Unsupported stream content: {0}")]
    UnsupportedStreamContent(String),

    #[error("Stream decode error: {0}")]
    StreamDecodeError(String),
}

impl ParseError {
    pub(crate) fn xref(offset: u64, reason: impl Into<String>) -> Self {
        ParseError::XrefSectionNotParsable {
            offset,
            reason: reason.into(),
        }
    }
}
