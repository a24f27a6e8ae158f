//! Cross-reference chain
//!
//! An incrementally updated file carries one xref section and trailer per
//! revision. Each trailer points at the previous section through `/Prev`, so
//! the full chain is recovered by walking backwards from `startxref`.

use super::reader::SourceReader;
use super::scanner::BytePattern;
use super::trailer::{self, Trailer};
use super::xref::{self, XrefTable};
use super::{ObjectRef, ParseError, ParseResult};
use crate::diagnostics::{DiagnosticLog, Stage};
use crate::options::ExtractOptions;
use std::collections::HashSet;
use std::io::{Read, Seek};

lazy_static::lazy_static! {
    static ref STARTXREF: BytePattern =
        BytePattern::new(r"startxref[ \t]*(?:\r\n|\r|\n)(\d+)[ \t]*(?:\r\n|\r|\n)%%EOF");
}

/// Read the offset of the most recent xref section from the end of the file
pub fn read_startxref<R: Read + Seek>(
    source: &mut SourceReader<R>,
    tail_window: usize,
) -> ParseResult<u64> {
    let tail = source.read_tail(tail_window)?;
    let offset = STARTXREF
        .last(&tail)
        .and_then(|m| m.group_str(&tail, 1))
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or(ParseError::CannotReadXrefOffset)?;

    if offset == 0 || offset >= source.len() {
        return Err(ParseError::CannotReadXrefOffset);
    }
    Ok(offset)
}

/// Xref tables and trailers of every readable revision, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct XrefChain {
    pub tables: Vec<XrefTable>,
    pub trailers: Vec<Trailer>,
}

impl XrefChain {
    /// Walk the chain starting at the section at `start`.
    ///
    /// The first section must parse. A later link that fails ends the walk
    /// with a diagnostic, unless `options.strict` is set. Revisiting an
    /// offset is always fatal.
    pub(crate) fn walk<R: Read + Seek>(
        source: &mut SourceReader<R>,
        start: u64,
        options: &ExtractOptions,
        log: &mut DiagnosticLog<'_>,
    ) -> ParseResult<Self> {
        let mut chain = XrefChain::default();
        let mut visited = HashSet::new();
        let mut offset = start;

        loop {
            if !visited.insert(offset) {
                return Err(ParseError::CorruptXrefChain { offset });
            }

            let (table, trailer) = match Self::read_revision(source, offset, options) {
                Ok(revision) => revision,
                Err(e) if chain.tables.is_empty() || options.strict => return Err(e),
                Err(e) => {
                    log.error(
                        Stage::XrefChain,
                        format!("xref chain truncated at offset {offset}: {e}"),
                    );
                    break;
                }
            };

            for subsection in table.incomplete_subsections() {
                let message = format!(
                    "subsection {} declares {} entries but has {}",
                    subsection.first_id,
                    subsection.count,
                    subsection.elements.len()
                );
                if options.strict {
                    return Err(ParseError::xref(offset, message));
                }
                log.warn(Stage::XrefChain, format!("xref at offset {offset}: {message}"));
            }

            let prev = trailer.prev;
            chain.tables.push(table);
            chain.trailers.push(trailer);

            if prev <= 0 {
                break;
            }
            offset = prev as u64;
        }

        Ok(chain)
    }

    fn read_revision<R: Read + Seek>(
        source: &mut SourceReader<R>,
        offset: u64,
        options: &ExtractOptions,
    ) -> ParseResult<(XrefTable, Trailer)> {
        let located = trailer::locate(source, offset, options.block_size())?;
        let table = xref::read_section(source, offset, located.offset)?;
        Ok((table, located.trailer))
    }

    /// Offset of an object according to the most recent table that has an
    /// in-use entry for it
    pub fn offset_of(&self, object: u32) -> Option<u64> {
        self.tables.iter().find_map(|table| table.offset_of(object))
    }

    /// Catalog reference of the most recent trailer that names one
    pub fn root_ref(&self) -> Option<&ObjectRef> {
        self.trailers
            .iter()
            .map(|trailer| &trailer.root)
            .find(|root| root.is_set())
    }

    /// Information dictionary reference of the most recent trailer that names one
    pub fn info_ref(&self) -> Option<&ObjectRef> {
        self.trailers
            .iter()
            .map(|trailer| &trailer.info)
            .find(|info| info.is_set())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
