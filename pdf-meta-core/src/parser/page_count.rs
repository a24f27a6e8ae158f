//! Heuristic page counter
//!
//! Counts `/Type /Page` dictionary entries over the whole file instead of
//! walking the page tree. Occurrences inside comments or uncompressed
//! streams are counted too, and pages inside compressed object streams are
//! missed.

use super::reader::SourceReader;
use super::scanner::BytePattern;
use super::ParseResult;
use std::io::{Read, Seek};

/// Bytes of the previous chunk kept in front of the next one. Longer than
/// the longest possible match plus its lookahead byte.
const CARRY: usize = 16;

lazy_static::lazy_static! {
    static ref PAGE_TYPE: BytePattern = BytePattern::new(r"/Type\s?/Page");
}

/// Count page objects by scanning the source in chunks of `chunk` bytes
pub fn count_pages<R: Read + Seek>(source: &mut SourceReader<R>, chunk: usize) -> ParseResult<u64> {
    let chunk = chunk.max(1);
    let mut carry: Vec<u8> = Vec::new();
    let mut position = 0u64;
    let mut count = 0u64;

    loop {
        let data = source.read_at(position, chunk)?;
        if data.is_empty() {
            break;
        }
        position += data.len() as u64;
        let at_eof = position >= source.len();

        let mut window = std::mem::take(&mut carry);
        let carry_len = window.len();
        window.extend_from_slice(&data);

        count += count_in_window(&window, carry_len, at_eof);
        carry = window[window.len().saturating_sub(CARRY)..].to_vec();
    }

    Ok(count)
}

/// Count page objects in an in-memory buffer
pub fn count_pages_in(bytes: &[u8]) -> u64 {
    count_in_window(bytes, 0, true)
}

/// Count matches decided by the new part of `window`.
///
/// A match is decided by the byte after it. Matches whose lookahead byte
/// lies in the carried prefix were counted with the previous chunk, and a
/// match at the end of a non-final window waits for the next one.
fn count_in_window(window: &[u8], carry_len: usize, at_eof: bool) -> u64 {
    PAGE_TYPE
        .find_all(window)
        .iter()
        .filter(|m| m.end >= carry_len)
        .filter(|m| match window.get(m.end) {
            Some(&next) => next != b's',
            None => at_eof,
        })
        .count() as u64
}
