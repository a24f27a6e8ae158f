//! Catalog and document information objects
//!
//! These parsers do not build a general object tree. Each known dictionary key
//! is matched on its own, so a malformed or missing entry never hides the
//! others.

use super::scanner::{self, BytePattern};

lazy_static::lazy_static! {
    static ref REFERENCE: BytePattern = BytePattern::new(r"(\d+)\s+(\d+)\s+(\S)");

    static ref ROOT_TYPE: BytePattern = BytePattern::new(r"/Type\s?/(\w+)");
    static ref ROOT_PAGES: BytePattern = BytePattern::new(r"/Pages\s?(\d+\s+\d+\s+\w)");
    static ref ROOT_METADATA: BytePattern = BytePattern::new(r"/Metadata\s?(\d+\s+\d+\s+\w)");
    static ref ROOT_PAGE_LABELS: BytePattern =
        BytePattern::new(r"/(?:PagesLabel|PageLabels)\s?(\d+\s+\d+\s+\w)");
    static ref ROOT_LANG: BytePattern = BytePattern::new(r"/Lang\s?\(([^)]*)\)");

    static ref INFO_TITLE: BytePattern = BytePattern::new(r"/Title\s?\(([^)]*)");
    static ref INFO_AUTHOR: BytePattern = BytePattern::new(r"/Author\s?\(([^)]*)");
    static ref INFO_CREATOR: BytePattern = BytePattern::new(r"/Creator\s?\(([^)]*)");
    static ref INFO_PRODUCER: BytePattern = BytePattern::new(r"/Producer\s?\(([^)]*)");
    static ref INFO_CREATION_DATE: BytePattern = BytePattern::new(r"/CreationDate\s?\(([^)]*)");
    static ref INFO_MOD_DATE: BytePattern = BytePattern::new(r"/ModDate\s?\(([^)]*)");
}

/// Indirect object reference such as `12 0 R`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectRef {
    pub object_number: u32,
    pub generation: u32,
    /// Raw trailing token, normally `R`
    pub keyword: String,
}

impl ObjectRef {
    pub fn new(object_number: u32, generation: u32, keyword: impl Into<String>) -> Self {
        Self {
            object_number,
            generation,
            keyword: keyword.into(),
        }
    }

    /// Parse the first `<object> <generation> <keyword>` triplet in `text`.
    ///
    /// The keyword is a single non-whitespace byte: `12 0 Rx` yields `R`.
    pub fn parse(text: &[u8]) -> Option<Self> {
        let m = REFERENCE.first(text)?;
        Some(Self {
            object_number: m.group_str(text, 1)?.parse().ok()?,
            generation: m.group_str(text, 2)?.parse().ok()?,
            keyword: m.group_str(text, 3)?,
        })
    }

    /// A reference with object number 0 points nowhere
    pub fn is_set(&self) -> bool {
        self.object_number != 0
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.object_number, self.generation, self.keyword)
    }
}

/// Text between the first `<<` and the last `>>` of an object block,
/// with one leading line break removed
pub fn dictionary_body(block: &[u8]) -> Option<&[u8]> {
    let start = scanner::find_literal(block, b"<<")? + 2;
    let end = scanner::rfind_literal(block, b">>")?;
    if end < start {
        return None;
    }
    let mut start = start;
    if block[start] == b'\r' || block[start] == b'\n' {
        start += 1;
    }
    block.get(start..end.max(start))
}

/// Document catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RootObject {
    pub r#type: String,
    pub pages: Option<ObjectRef>,
    pub metadata: Option<ObjectRef>,
    pub page_labels: Option<ObjectRef>,
    pub lang: String,
}

impl RootObject {
    /// Extract the known catalog keys from a dictionary body
    pub fn parse(dict: &[u8]) -> Self {
        let reference = |pattern: &BytePattern| {
            pattern
                .first(dict)
                .and_then(|m| m.group_bytes(dict, 1).and_then(ObjectRef::parse))
        };

        RootObject {
            r#type: first_group(&ROOT_TYPE, dict).trim().to_string(),
            pages: reference(&ROOT_PAGES),
            metadata: reference(&ROOT_METADATA),
            page_labels: reference(&ROOT_PAGE_LABELS),
            lang: first_group(&ROOT_LANG, dict).trim().to_string(),
        }
    }
}

/// Document information dictionary
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InfoObject {
    pub title: String,
    pub author: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub mod_date: String,
}

impl InfoObject {
    /// Extract literal-string entries from a dictionary body. Escape sequences
    /// are kept as written.
    pub fn parse(dict: &[u8]) -> Self {
        InfoObject {
            title: first_group(&INFO_TITLE, dict),
            author: first_group(&INFO_AUTHOR, dict),
            creator: first_group(&INFO_CREATOR, dict),
            producer: first_group(&INFO_PRODUCER, dict),
            creation_date: first_group(&INFO_CREATION_DATE, dict),
            mod_date: first_group(&INFO_MOD_DATE, dict),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == InfoObject::default()
    }
}

fn first_group(pattern: &BytePattern, haystack: &[u8]) -> String {
    pattern
        .first(haystack)
        .and_then(|m| m.group_str(haystack, 1))
        .unwrap_or_default()
}
