//! PDF Header Parser
//!
//! Detects the version signature according to ISO 32000-1 Section 7.5.2

use super::scanner::BytePattern;
use super::{ParseError, ParseResult};

/// Number of leading bytes searched for the version signature
pub const SIGNATURE_WINDOW: usize = 1024;

lazy_static::lazy_static! {
    static ref SIGNATURE: BytePattern = BytePattern::new(r"[%\t]PDF-");
    static ref VERSION: BytePattern = BytePattern::new(r"[%\t]PDF-(\d+\.\d+)");
}

/// PDF Header information
#[derive(Debug, Clone, PartialEq)]
pub struct PdfHeader {
    /// Version string such as "1.4"; empty when the signature carries none
    pub version: String,
    /// Byte offset of the signature
    pub offset: usize,
    pub has_binary_marker: bool,
}

impl PdfHeader {
    /// Detect the header in the leading bytes of a file
    pub fn detect(leading: &[u8]) -> ParseResult<Self> {
        let window = &leading[..leading.len().min(SIGNATURE_WINDOW)];
        let signature = SIGNATURE.first(window).ok_or(ParseError::NotAPdf)?;

        let version = VERSION
            .first(&window[signature.start..])
            .filter(|m| m.start == 0)
            .and_then(|m| m.group_str(&window[signature.start..], 1))
            .unwrap_or_default();

        Ok(PdfHeader {
            version,
            offset: signature.start,
            has_binary_marker: Self::check_binary_marker(&window[signature.start..]),
        })
    }

    /// Whether the line after the header is a comment with at least four
    /// binary bytes, as recommended for PDF 1.2+
    fn check_binary_marker(from_header: &[u8]) -> bool {
        let Some(eol) = from_header.iter().position(|&b| b == b'\n' || b == b'\r') else {
            return false;
        };
        let rest = &from_header[eol..];
        let start = rest
            .iter()
            .position(|&b| b != b'\n' && b != b'\r')
            .unwrap_or(rest.len());
        let line = &rest[start..];
        let line_end = line
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .unwrap_or(line.len());
        let line = &line[..line_end];

        line.first() == Some(&b'%') && line.iter().skip(1).filter(|&&b| b >= 128).count() >= 4
    }
}
