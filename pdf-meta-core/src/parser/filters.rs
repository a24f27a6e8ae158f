//! PDF Stream Filters
//!
//! Extracts stream payloads and decodes them according to ISO 32000-1
//! Section 7.4. Only FlateDecode is decompressed.

use super::scanner::{self, BytePattern};
use super::{ParseError, ParseResult};

#[cfg(feature = "compression")]
use flate2::read::ZlibDecoder;
#[cfg(feature = "compression")]
use std::io::Read;

lazy_static::lazy_static! {
    static ref FILTER_NAME: BytePattern = BytePattern::new(r"/Filter\s*/(\w+)");
    static ref FILTER_ARRAY: BytePattern = BytePattern::new(r"/Filter\s*\[([^\]]*)\]");
    static ref NAME: BytePattern = BytePattern::new(r"/(\w+)");
    static ref DIRECT_LENGTH: BytePattern = BytePattern::new(r"/Length\s+(\d+)(\s+\d+\s+R)?");
}

/// Stream filters known by name
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Flate decode (zlib/deflate compression)
    FlateDecode,

    /// DCT decode (JPEG), passed through undecoded
    DCTDecode,

    /// Any other filter
    Other(String),
}

impl Filter {
    /// Parse filter from name
    pub fn from_name(name: &str) -> Self {
        match name {
            "FlateDecode" | "Fl" => Filter::FlateDecode,
            "DCTDecode" | "DCT" => Filter::DCTDecode,
            other => Filter::Other(other.to_string()),
        }
    }

    /// Filters named by a stream dictionary, in application order
    pub fn from_dict(dict: &[u8]) -> Vec<Self> {
        if let Some(array) = FILTER_ARRAY
            .first(dict)
            .and_then(|m| m.group_bytes(dict, 1))
        {
            return NAME
                .find_all(array)
                .iter()
                .filter_map(|m| m.group_str(array, 1))
                .map(|name| Filter::from_name(&name))
                .collect();
        }
        FILTER_NAME
            .first(dict)
            .and_then(|m| m.group_str(dict, 1))
            .map(|name| vec![Filter::from_name(&name)])
            .unwrap_or_default()
    }
}

/// Split an object block into its dictionary part and its stream payload.
///
/// The payload starts after the `stream` keyword and one line break, and
/// ends at `endstream` or after a direct `/Length`, whichever is shorter.
pub fn stream_payload(block: &[u8]) -> ParseResult<(&[u8], &[u8])> {
    let keyword = stream_keyword(block).ok_or(ParseError::CannotFindStreamContent)?;
    let dict = &block[..keyword];

    let mut start = keyword + b"stream".len();
    if block.get(start) == Some(&b'\r') {
        start += 1;
    }
    if block.get(start) == Some(&b'\n') {
        start += 1;
    }
    let end = scanner::find_literal_from(block, b"endstream", start)
        .ok_or(ParseError::CannotFindStreamContent)?;

    let mut payload = &block[start..end];
    if let Some(length) = direct_length(dict) {
        if length <= payload.len() {
            payload = &payload[..length];
        }
    }
    Ok((dict, payload))
}

/// Declared `/Length`, or `None` if absent or given as a reference
pub fn direct_length(dict: &[u8]) -> Option<usize> {
    let m = DIRECT_LENGTH.first(dict)?;
    if m.group(2).is_some() {
        return None;
    }
    m.group_str(dict, 1)?.parse().ok()
}

/// Decode a stream payload according to the filters of its dictionary
pub fn decode_stream(dict: &[u8], payload: &[u8]) -> ParseResult<Vec<u8>> {
    let mut result = payload.to_vec();
    for filter in Filter::from_dict(dict) {
        result = apply_filter(&result, filter)?;
    }
    Ok(result)
}

/// Apply a single filter to data
fn apply_filter(data: &[u8], filter: Filter) -> ParseResult<Vec<u8>> {
    match filter {
        Filter::FlateDecode => decode_flate(data),
        Filter::DCTDecode => Ok(data.to_vec()),
        Filter::Other(name) => Err(ParseError::UnsupportedStreamContent(name)),
    }
}

/// First `stream` keyword that is not the tail of `endstream`
fn stream_keyword(block: &[u8]) -> Option<usize> {
    scanner::find_all_literal(block, b"stream")
        .into_iter()
        .find(|&at| !block[..at].ends_with(b"end"))
}

/// Decode FlateDecode (zlib/deflate) compressed data
#[cfg(feature = "compression")]
fn decode_flate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| ParseError::StreamDecodeError(format!("Flate decode error: {e}")))?;
    Ok(result)
}

#[cfg(not(feature = "compression"))]
fn decode_flate(_data: &[u8]) -> ParseResult<Vec<u8>> {
    Err(ParseError::StreamDecodeError(
        "FlateDecode requires 'compression' feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_name() {
        assert_eq!(Filter::from_name("FlateDecode"), Filter::FlateDecode);
        assert_eq!(Filter::from_name("Fl"), Filter::FlateDecode);
        assert_eq!(Filter::from_name("DCTDecode"), Filter::DCTDecode);
        assert_eq!(
            Filter::from_name("LZWDecode"),
            Filter::Other("LZWDecode".to_string())
        );
    }

    #[test]
    fn test_filter_from_dict() {
        assert_eq!(
            Filter::from_dict(b"/Length 10 /Filter /FlateDecode"),
            vec![Filter::FlateDecode]
        );
        assert_eq!(
            Filter::from_dict(b"/Filter [/ASCII85Decode /FlateDecode]"),
            vec![
                Filter::Other("ASCII85Decode".to_string()),
                Filter::FlateDecode
            ]
        );
        assert!(Filter::from_dict(b"/Type /Metadata /Subtype /XML").is_empty());
    }

    #[test]
    fn test_stream_payload_trims_one_line_break() {
        let block = b"7 0 obj\n<< /Length 5 >>\nstream\r\nhello\r\nendstream\nendobj";
        let (dict, payload) = stream_payload(block).unwrap();
        assert_eq!(payload, b"hello");
        assert!(dict.ends_with(b">>\n"));
    }

    #[test]
    fn test_stream_payload_without_length() {
        let block = b"<< >>\nstream\n\nline\nendstream";
        let (_, payload) = stream_payload(block).unwrap();
        assert_eq!(payload, b"\nline\n");
    }

    #[test]
    fn test_stream_payload_indirect_length_is_ignored() {
        let block = b"<< /Length 9 0 R >>\nstream\nabc\nendstream";
        let (dict, payload) = stream_payload(block).unwrap();
        assert_eq!(payload, b"abc\n");
        assert_eq!(direct_length(dict), None);
    }

    #[test]
    fn test_stream_payload_overlong_length_is_ignored() {
        let block = b"<< /Length 400 >>\nstream\nabc\nendstream";
        let (_, payload) = stream_payload(block).unwrap();
        assert_eq!(payload, b"abc\n");
    }

    #[test]
    fn test_stream_payload_missing_markers() {
        assert!(matches!(
            stream_payload(b"1 0 obj << /Type /Catalog >> endobj"),
            Err(ParseError::CannotFindStreamContent)
        ));
        assert!(matches!(
            stream_payload(b"<< >> stream\nno end"),
            Err(ParseError::CannotFindStreamContent)
        ));
        assert!(matches!(
            stream_payload(b"<< >> endstream"),
            Err(ParseError::CannotFindStreamContent)
        ));
    }

    #[test]
    fn test_decode_stream_no_filter() {
        assert_eq!(decode_stream(b"/Length 3", b"abc").unwrap(), b"abc");
    }

    #[test]
    fn test_decode_stream_dct_passthrough() {
        let jpeg = [0xFFu8, 0xD8, 0xFF, 0xE0];
        assert_eq!(decode_stream(b"/Filter /DCTDecode", &jpeg).unwrap(), jpeg);
    }

    #[test]
    fn test_decode_stream_unsupported_filter() {
        match decode_stream(b"/Filter /LZWDecode", b"data") {
            Err(ParseError::UnsupportedStreamContent(name)) => assert_eq!(name, "LZWDecode"),
            other => panic!("Expected unsupported filter, got {other:?}"),
        }
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_decode() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original = b"<x:xmpmeta>compressed</x:xmpmeta>";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = decode_stream(b"/Filter /FlateDecode", &compressed).unwrap();
        assert_eq!(decoded, original);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_decode_corrupt_payload() {
        assert!(matches!(
            decode_stream(b"/Filter /FlateDecode", b"definitely not zlib"),
            Err(ParseError::StreamDecodeError(_))
        ));
    }

    #[cfg(not(feature = "compression"))]
    #[test]
    fn test_flate_decode_not_supported() {
        assert!(matches!(
            decode_stream(b"/Filter /FlateDecode", b"data"),
            Err(ParseError::StreamDecodeError(_))
        ));
    }
}
