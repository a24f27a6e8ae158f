//! PDF Cross-Reference Table Parser
//!
//! Parses classic xref tables according to ISO 32000-1 Section 7.5.4

use super::reader::SourceReader;
use super::scanner::{self, BytePattern};
use super::{ParseError, ParseResult};
use std::collections::BTreeMap;
use std::io::{Read, Seek};

lazy_static::lazy_static! {
    static ref SUBSECTION_HEADER: BytePattern = BytePattern::new(r"^(\d+)\s+(\d+)\s*$");
    static ref ENTRY: BytePattern = BytePattern::new(r"^(\d+)\s+(\d+)\s+([nf])");
}

/// Cross-reference entry
///
/// The table layout stores the byte offset of an in-use object in the first
/// column; it is kept in `object_number` and exposed through [`offset`](Self::offset).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct XrefEntry {
    /// Object number this entry describes
    pub id: u32,
    pub object_number: u64,
    pub generation: u32,
    /// `n` for in-use entries, `f` for free ones
    pub keyword: String,
}

impl XrefEntry {
    /// Byte offset of the object in the file
    pub fn offset(&self) -> u64 {
        self.object_number
    }

    pub fn is_in_use(&self) -> bool {
        self.keyword == "n"
    }
}

/// One `<first> <count>` block of a table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Subsection {
    pub first_id: u32,
    /// Declared number of entries
    pub count: u32,
    pub elements: BTreeMap<u32, XrefEntry>,
}

impl Subsection {
    /// Whether the parsed entries match the declared count
    pub fn is_complete(&self) -> bool {
        self.elements.len() == self.count as usize
    }
}

/// Cross-reference table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct XrefTable {
    /// Offset of the `xref` keyword this table was read from
    pub section_start: u64,
    pub objects: BTreeMap<u32, XrefEntry>,
    pub subsections: BTreeMap<u32, Subsection>,
}

impl XrefTable {
    /// Parse the lines of one xref section.
    ///
    /// A leading `xref` line is required; parsing stops at `trailer`.
    pub fn parse_lines(lines: &[&[u8]], section_start: u64) -> ParseResult<Self> {
        let mut table = XrefTable {
            section_start,
            ..Default::default()
        };
        let mut seen_keyword = false;
        let mut current: Option<u32> = None;
        let mut index: u32 = 0;

        for raw in lines {
            let line = raw.trim_ascii();
            if line.is_empty() {
                continue;
            }
            if !seen_keyword {
                if line != b"xref" {
                    return Err(ParseError::xref(section_start, "missing xref keyword"));
                }
                seen_keyword = true;
                continue;
            }
            if line.starts_with(b"trailer") {
                break;
            }

            if let Some(header) = SUBSECTION_HEADER.first(line) {
                let first_id = parse_number::<u32>(line, &header, 1)
                    .ok_or_else(|| ParseError::xref(section_start, "subsection start out of range"))?;
                let count = parse_number::<u32>(line, &header, 2)
                    .ok_or_else(|| ParseError::xref(section_start, "subsection count out of range"))?;
                table.subsections.insert(
                    first_id,
                    Subsection {
                        first_id,
                        count,
                        elements: BTreeMap::new(),
                    },
                );
                current = Some(first_id);
                index = 0;
                continue;
            }

            if let Some(entry) = ENTRY.first(line) {
                let first_id = current.ok_or_else(|| {
                    ParseError::xref(section_start, "entry before any subsection header")
                })?;
                let id = first_id
                    .checked_add(index)
                    .ok_or_else(|| ParseError::xref(section_start, "object number overflow"))?;
                let entry = XrefEntry {
                    id,
                    object_number: parse_number(line, &entry, 1)
                        .ok_or_else(|| ParseError::xref(section_start, "entry offset out of range"))?,
                    generation: parse_number(line, &entry, 2).ok_or_else(|| {
                        ParseError::xref(section_start, "entry generation out of range")
                    })?,
                    keyword: entry.group_str(line, 3).unwrap_or_default(),
                };
                index += 1;

                if let Some(subsection) = table.subsections.get_mut(&first_id) {
                    subsection.elements.insert(id, entry.clone());
                }
                table.objects.insert(id, entry);
                continue;
            }

            return Err(ParseError::xref(
                section_start,
                format!("unexpected token {:?}", String::from_utf8_lossy(line)),
            ));
        }

        if !seen_keyword {
            return Err(ParseError::xref(section_start, "missing xref keyword"));
        }
        Ok(table)
    }

    /// Subsections whose parsed entry count differs from the declared count
    pub fn incomplete_subsections(&self) -> Vec<&Subsection> {
        self.subsections
            .values()
            .filter(|subsection| !subsection.is_complete())
            .collect()
    }

    /// Offset of an in-use object
    pub fn offset_of(&self, object: u32) -> Option<u64> {
        self.objects
            .get(&object)
            .filter(|entry| entry.is_in_use())
            .map(XrefEntry::offset)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Read and parse the xref section occupying `[offset, end)`
pub fn read_section<R: Read + Seek>(
    source: &mut SourceReader<R>,
    offset: u64,
    end: u64,
) -> ParseResult<XrefTable> {
    if end <= offset {
        return Err(ParseError::xref(offset, "empty section"));
    }
    let data = source.read_at(offset, (end - offset) as usize)?;
    let lines = scanner::split_lines(&data);
    XrefTable::parse_lines(&lines, offset)
}

fn parse_number<T: std::str::FromStr>(
    line: &[u8],
    m: &scanner::PatternMatch,
    group: usize,
) -> Option<T> {
    m.group_str(line, group)?.parse().ok()
}
