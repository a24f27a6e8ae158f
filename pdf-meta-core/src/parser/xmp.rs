//! XMP metadata stream
//!
//! The catalog's `/Metadata` entry points at a stream holding an XMP packet.
//! Only the Dublin Core and ISBN properties used for cataloguing are read,
//! by pattern rather than with a full RDF model.

use super::filters;
use super::objects::dictionary_body;
use super::scanner::BytePattern;
use super::ParseResult;

lazy_static::lazy_static! {
    static ref TYPE: BytePattern = BytePattern::new(r"/Type\s?/(\w+)");
    static ref SUBTYPE: BytePattern = BytePattern::new(r"/Subtype\s?/(\w+)");
    static ref DECODED_LENGTH: BytePattern = BytePattern::new(r"/DL\s+(\d+)");

    static ref DC_TITLE: BytePattern = element("dc:title");
    static ref DC_DESCRIPTION: BytePattern = element("dc:description");
    static ref DC_CREATOR: BytePattern = element("dc:creator");
    static ref DC_DATE: BytePattern = element("dc:date");
    static ref DC_PUBLISHER: BytePattern = element("dc:publisher");
    static ref DC_LANGUAGE: BytePattern = element("dc:language");
    static ref PRISM_ISBN: BytePattern = element("prism:isbn");
    static ref PDFX_ISBN: BytePattern = element("pdfx:isbn");
    static ref PRISM_ISBN_ATTR: BytePattern = BytePattern::new(r#"prism:isbn\s*=\s*"([^"]*)""#);
    static ref PDFX_ISBN_ATTR: BytePattern = BytePattern::new(r#"pdfx:isbn\s*=\s*"([^"]*)""#);

    static ref LIST_ITEM: BytePattern = BytePattern::new(r"(?s)<rdf:li(?:\s[^>]*)?>(.*?)</rdf:li>");
}

fn element(name: &str) -> BytePattern {
    BytePattern::new(&format!(r"(?s)<{name}(?:\s[^>]*)?>(.*?)</{name}>"))
}

/// Metadata stream object
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Metadata {
    pub r#type: String,
    pub subtype: String,
    /// Declared `/Length`; 0 when absent or indirect
    pub length: u64,
    /// Declared decoded length (`/DL`)
    pub dl: u64,
    /// Decoded stream content
    #[cfg_attr(feature = "serde", serde(skip))]
    pub raw_stream_data: Vec<u8>,
    pub rdf: Option<RdfMetadata>,
}

impl Metadata {
    /// Parse a complete metadata stream object, from `obj` through `endobj`
    pub fn parse(block: &[u8]) -> ParseResult<Self> {
        let (dict, payload) = filters::stream_payload(block)?;
        let dict = dictionary_body(dict).unwrap_or(dict);

        let capture = |pattern: &BytePattern| {
            pattern
                .first(dict)
                .and_then(|m| m.group_str(dict, 1))
                .unwrap_or_default()
        };

        let decoded = filters::decode_stream(dict, payload)?;
        let rdf = RdfMetadata::parse(&decoded);

        Ok(Metadata {
            r#type: capture(&TYPE),
            subtype: capture(&SUBTYPE),
            length: filters::direct_length(dict).unwrap_or(0) as u64,
            dl: capture(&DECODED_LENGTH).parse().unwrap_or(0),
            raw_stream_data: decoded,
            rdf: (!rdf.is_empty()).then_some(rdf),
        })
    }

    /// Decoded packet as text
    pub fn packet(&self) -> String {
        String::from_utf8_lossy(&self.raw_stream_data).into_owned()
    }
}

/// Dublin Core properties of an XMP packet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RdfMetadata {
    pub title: String,
    pub description: String,
    pub creator: String,
    pub date: String,
    pub isbn: String,
    pub publishers: Vec<String>,
    pub languages: Vec<String>,
}

impl RdfMetadata {
    pub fn parse(packet: &[u8]) -> Self {
        RdfMetadata {
            title: single_value(&DC_TITLE, packet),
            description: single_value(&DC_DESCRIPTION, packet),
            creator: single_value(&DC_CREATOR, packet),
            date: single_value(&DC_DATE, packet),
            isbn: isbn(packet),
            publishers: collection(&DC_PUBLISHER, packet),
            languages: collection(&DC_LANGUAGE, packet),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RdfMetadata::default()
    }
}

/// First `rdf:li` of the element, or its text if it has no child elements
fn single_value(pattern: &BytePattern, packet: &[u8]) -> String {
    let Some(inner) = pattern.first(packet).and_then(|m| m.group_bytes(packet, 1)) else {
        return String::new();
    };
    if let Some(item) = LIST_ITEM.first(inner).and_then(|m| m.group_bytes(inner, 1)) {
        return text(item);
    }
    if inner.contains(&b'<') {
        return String::new();
    }
    text(inner)
}

/// Every `rdf:li` of the element in document order
fn collection(pattern: &BytePattern, packet: &[u8]) -> Vec<String> {
    let Some(inner) = pattern.first(packet).and_then(|m| m.group_bytes(packet, 1)) else {
        return Vec::new();
    };
    let items: Vec<String> = LIST_ITEM
        .find_all(inner)
        .iter()
        .filter_map(|m| m.group_bytes(inner, 1))
        .map(text)
        .collect();

    if items.is_empty() && !inner.contains(&b'<') {
        let value = text(inner);
        if !value.is_empty() {
            return vec![value];
        }
    }
    items
}

fn isbn(packet: &[u8]) -> String {
    [&*PRISM_ISBN, &*PRISM_ISBN_ATTR, &*PDFX_ISBN, &*PDFX_ISBN_ATTR]
        .into_iter()
        .map(|pattern| single_value(pattern, packet))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn text(bytes: &[u8]) -> String {
    let raw = String::from_utf8_lossy(bytes);
    let raw = raw.trim();
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
