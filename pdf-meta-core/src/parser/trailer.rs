//! PDF Trailer Parser
//!
//! Locates and parses the trailer dictionary of a classic xref section
//! according to ISO 32000-1 Section 7.5.5

use super::objects::ObjectRef;
use super::reader::SourceReader;
use super::scanner::{self, BytePattern};
use super::{ParseError, ParseResult};
use std::io::{Read, Seek};

lazy_static::lazy_static! {
    static ref SIZE: BytePattern = BytePattern::new(r"/Size\s*(\d+)");
    static ref ROOT: BytePattern = BytePattern::new(r"/Root\s*(\d+\s+\d+\s+\S)");
    static ref INFO: BytePattern = BytePattern::new(r"/Info\s*(\d+\s+\d+\s+\S)");
    static ref PREV: BytePattern = BytePattern::new(r"/Prev\s*(\d+)");
    static ref ID: BytePattern = BytePattern::new(r"/ID\s*(\[[^\]]*\])");
}

/// PDF Trailer information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Trailer {
    /// File identifier array exactly as written
    pub id_raw: String,
    /// Document catalog reference
    pub root: ObjectRef,
    /// Document information dictionary reference
    pub info: ObjectRef,
    pub size: String,
    /// Byte offset of the previous xref section, 0 for the oldest revision
    pub prev: i64,
}

impl Trailer {
    /// Parse the trailer dictionary body. Missing or malformed keys are left
    /// at their defaults.
    pub fn parse(dict: &[u8]) -> Self {
        let capture = |pattern: &BytePattern| {
            pattern
                .first(dict)
                .and_then(|m| m.group_bytes(dict, 1))
        };

        Trailer {
            id_raw: capture(&ID)
                .map(|id| String::from_utf8_lossy(id).into_owned())
                .unwrap_or_default(),
            root: capture(&ROOT)
                .and_then(ObjectRef::parse)
                .unwrap_or_default(),
            info: capture(&INFO)
                .and_then(ObjectRef::parse)
                .unwrap_or_default(),
            size: capture(&SIZE)
                .map(|size| String::from_utf8_lossy(size).into_owned())
                .unwrap_or_default(),
            prev: capture(&PREV)
                .and_then(|prev| std::str::from_utf8(prev).ok())
                .and_then(|prev| prev.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Check if this trailer links to an older revision
    pub fn has_previous(&self) -> bool {
        self.prev > 0
    }
}

/// A trailer found in the file together with its position
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedTrailer {
    /// Absolute offset of the `trailer` keyword
    pub offset: u64,
    pub trailer: Trailer,
}

/// Find the first trailer at or after `from` and parse it.
///
/// The search window starts at `block` bytes and doubles until the complete
/// dictionary has been read or the source is exhausted.
pub fn locate<R: Read + Seek>(
    source: &mut SourceReader<R>,
    from: u64,
    block: usize,
) -> ParseResult<LocatedTrailer> {
    let mut window = block.max(1);

    loop {
        let data = source.read_at(from, window)?;
        if let Some((keyword, body)) = find_trailer(&data) {
            return Ok(LocatedTrailer {
                offset: from + keyword as u64,
                trailer: Trailer::parse(&data[body.0..body.1]),
            });
        }
        if data.len() < window {
            return Err(ParseError::TrailerNotParsable { offset: from });
        }
        window = window.saturating_mul(2);
    }
}

/// Position of the `trailer` keyword and the bounds of its dictionary body
fn find_trailer(data: &[u8]) -> Option<(usize, (usize, usize))> {
    let keyword = scanner::find_literal(data, b"trailer")?;
    let open = scanner::find_literal_from(data, b"<<", keyword + b"trailer".len())?;
    let close = matching_close(data, open + 2)?;
    Some((keyword, (open + 2, close)))
}

/// Offset of the `>>` closing a dictionary whose body starts at `from`
fn matching_close(data: &[u8], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = from;

    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) == Some(&b'<') => {
                depth += 1;
                i += 2;
            }
            b'>' if data.get(i + 1) == Some(&b'>') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 2;
            }
            b'<' => {
                // Hex string, as used by /ID
                let end = data[i..].iter().position(|&b| b == b'>')?;
                i += end + 1;
            }
            b'(' => {
                i = skip_literal_string(data, i)?;
            }
            _ => i += 1,
        }
    }
    None
}

/// Offset just past the literal string opening at `start`
fn skip_literal_string(data: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
