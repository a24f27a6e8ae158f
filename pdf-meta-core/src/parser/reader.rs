//! Random-access reader over a PDF source
//!
//! All structural lookups go through byte offsets, so the source is read with
//! explicit seeks rather than sequentially. Each read fetches exactly the
//! requested range from the underlying reader.

use super::scanner::{self, BytePattern};
use super::{ParseError, ParseResult};
use std::io::{Read, Seek, SeekFrom};

/// Minimum number of bytes inspected for the `<num> <gen> obj` header
const OBJECT_HEADER_WINDOW: usize = 32;

lazy_static::lazy_static! {
    static ref OBJECT_HEADER: BytePattern = BytePattern::new(r"(\d+)\s+(\d+)\s+obj");
}

/// Byte source with random access
pub struct SourceReader<R: Read + Seek> {
    reader: R,
    len: u64,
    /// Current position of `reader`, so sequential reads skip the seek
    position: u64,
}

impl<R: Read + Seek> SourceReader<R> {
    /// Wrap a reader and determine its length
    pub fn new(mut reader: R) -> ParseResult<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader,
            len,
            position: 0,
        })
    }

    /// Total length of the source in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read up to `len` bytes at `offset`. Returns fewer bytes (possibly none)
    /// when the read runs past the end of the source.
    pub fn read_at(&mut self, offset: u64, len: usize) -> ParseResult<Vec<u8>> {
        if offset >= self.len {
            return Ok(Vec::new());
        }
        let available = (self.len - offset).min(len as u64) as usize;
        let mut buffer = vec![0u8; available];
        let at = std::mem::replace(&mut self.position, u64::MAX);
        // Left at u64::MAX on failure, which forces a seek next time
        if offset != at {
            self.reader.seek(SeekFrom::Start(offset))?;
        }
        self.reader.read_exact(&mut buffer)?;
        self.position = offset + available as u64;
        Ok(buffer)
    }

    /// Read the last `window` bytes of the source
    pub fn read_tail(&mut self, window: usize) -> ParseResult<Vec<u8>> {
        let start = self.len.saturating_sub(window as u64);
        self.read_at(start, window)
    }

    /// Read blocks of `block` bytes starting at `offset` until `marker` has
    /// been read or the source is exhausted. Returns the bytes read and the
    /// position just past the first `marker`.
    ///
    /// Each block is searched together with the last `marker.len() - 1`
    /// bytes before it, so a marker split across two blocks is still
    /// recognised and no byte is searched twice.
    pub fn read_forward_until(
        &mut self,
        offset: u64,
        block: usize,
        marker: &[u8],
    ) -> ParseResult<(Vec<u8>, Option<usize>)> {
        let block = block.max(1);
        let overlap = marker.len().saturating_sub(1);
        let mut data = Vec::new();
        let mut position = offset;

        loop {
            let chunk = self.read_at(position, block)?;
            if chunk.is_empty() {
                return Ok((data, None));
            }
            position += chunk.len() as u64;
            let from = data.len().saturating_sub(overlap);
            data.extend_from_slice(&chunk);

            if let Some(at) = scanner::find_literal_from(&data, marker, from) {
                return Ok((data, Some(at + marker.len())));
            }
        }
    }

    /// Read the indirect object `object_number` stored at `offset`, up to and
    /// including its `endobj` keyword.
    pub fn read_object(
        &mut self,
        offset: u64,
        object_number: u32,
        block: usize,
    ) -> ParseResult<Vec<u8>> {
        let block = block.max(1);
        let first = self.read_at(offset, block.max(OBJECT_HEADER_WINDOW))?;

        // A stale xref offset rarely lands on an object header
        let header_seen = scanner::find_literal(&first, b"obj").is_some();
        if !header_seen {
            return Err(ParseError::ObjectNotParsable {
                object: object_number,
                offset,
            });
        }
        if let Some(header) = OBJECT_HEADER.first(&first) {
            let declared = header
                .group_str(&first, 1)
                .and_then(|n| n.parse::<u32>().ok());
            if declared != Some(object_number) {
                return Err(ParseError::ObjectNotParsable {
                    object: object_number,
                    offset,
                });
            }
        }

        let (data, end) = self.read_forward_until(offset, block, b"endobj")?;

        match end {
            Some(end) => Ok(data[..end].to_vec()),
            None => Err(ParseError::ObjectNotFound(object_number)),
        }
    }
}
