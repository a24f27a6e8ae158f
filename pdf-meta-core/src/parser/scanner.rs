//! Byte-pattern scanner
//!
//! Every higher layer locates keywords, dictionary keys and numeric fields
//! through these helpers. Matching runs directly on the raw file bytes, so a
//! capture offset is always a file-relative byte position.

use regex::bytes::{Regex, RegexBuilder};
use std::ops::Range;

/// A single match of a [`BytePattern`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Start of the whole match
    pub start: usize,
    /// End (exclusive) of the whole match
    pub end: usize,
    /// Capture groups, index 0 excluded. `None` for groups that did not take part.
    pub groups: Vec<Option<Range<usize>>>,
}

impl PatternMatch {
    /// Range of capture group `index` (1-based, like regex groups)
    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i))
            .cloned()
            .flatten()
    }

    /// Bytes of capture group `index` within `haystack`
    pub fn group_bytes<'h>(&self, haystack: &'h [u8], index: usize) -> Option<&'h [u8]> {
        self.group(index).and_then(|range| haystack.get(range))
    }

    /// Capture group `index` as lossy UTF-8 text
    pub fn group_str(&self, haystack: &[u8], index: usize) -> Option<String> {
        self.group_bytes(haystack, index)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// A structured byte signature: literal bytes mixed with byte classes,
/// digit runs and optional separators.
///
/// Patterns are compiled with Unicode disabled, so `.` and negated classes
/// match any byte value and `\d`, `\s`, `\w` are ASCII classes.
#[derive(Debug, Clone)]
pub struct BytePattern {
    regex: Regex,
}

impl BytePattern {
    /// Compile a pattern. Panics on an invalid expression, so only use it
    /// with patterns known at compile time.
    pub fn new(pattern: &str) -> Self {
        Self {
            regex: RegexBuilder::new(pattern)
                .unicode(false)
                .build()
                .unwrap_or_else(|e| panic!("invalid pattern {pattern}: {e}")),
        }
    }

    /// All non-overlapping matches in order of appearance
    pub fn find_all(&self, haystack: &[u8]) -> Vec<PatternMatch> {
        self.regex
            .captures_iter(haystack)
            .map(|caps| Self::to_match(&caps))
            .collect()
    }

    /// First match, if any
    pub fn first(&self, haystack: &[u8]) -> Option<PatternMatch> {
        self.regex.captures(haystack).map(|caps| Self::to_match(&caps))
    }

    /// Last non-overlapping match, if any
    pub fn last(&self, haystack: &[u8]) -> Option<PatternMatch> {
        self.regex
            .captures_iter(haystack)
            .last()
            .map(|caps| Self::to_match(&caps))
    }

    /// Whether the pattern matches anywhere in `haystack`
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.regex.is_match(haystack)
    }

    fn to_match(caps: &regex::bytes::Captures<'_>) -> PatternMatch {
        // Group 0 always participates
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        PatternMatch {
            start: whole.start,
            end: whole.end,
            groups: caps.iter().skip(1).map(|g| g.map(|m| m.range())).collect(),
        }
    }
}

/// Position of the first occurrence of `needle`
pub fn find_literal(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    find_literal_from(haystack, needle, 0)
}

/// Position of the first occurrence of `needle` at or after `from`
pub fn find_literal_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Position of the last occurrence of `needle`
pub fn rfind_literal(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}

/// Positions of all non-overlapping occurrences of `needle`
pub fn find_all_literal(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(pos) = find_literal_from(haystack, needle, from) {
        positions.push(pos);
        from = pos + needle.len();
    }
    positions
}

/// Split a byte block into lines on CRLF, CR or LF
pub fn split_lines(block: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < block.len() {
        match block[i] {
            b'\r' => {
                lines.push(&block[start..i]);
                if block.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < block.len() {
        lines.push(&block[start..]);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_search() {
        let data = b"1 0 obj\n<< >>\nendobj\n2 0 obj";
        assert_eq!(find_literal(data, b"obj"), Some(4));
        assert_eq!(find_literal_from(data, b"obj", 5), Some(17));
        assert_eq!(rfind_literal(data, b"obj"), Some(25));
        assert_eq!(find_all_literal(data, b"obj"), vec![4, 17, 25]);
        assert_eq!(find_literal(data, b"stream"), None);
        assert_eq!(find_literal(data, b""), None);
        assert_eq!(find_literal_from(data, b"obj", 1000), None);
    }

    #[test]
    fn test_literal_search_non_overlapping() {
        assert_eq!(find_all_literal(b"aaaa", b"aa"), vec![0, 2]);
    }

    #[test]
    fn test_pattern_on_binary_content() {
        // Bytes that are not valid UTF-8 around the signature
        let data = b"\xff\xfe/Size 42\x80\x81/Prev 7\xc3";
        let pattern = BytePattern::new(r"/(Size|Prev)\s?(\d+)");
        let matches = pattern.find_all(data);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].start, 2);
        assert_eq!(matches[0].group_bytes(data, 1), Some(&b"Size"[..]));
        assert_eq!(matches[0].group_bytes(data, 2), Some(&b"42"[..]));
        assert_eq!(matches[1].group_str(data, 2).as_deref(), Some("7"));
    }

    #[test]
    fn test_pattern_optional_group() {
        let pattern = BytePattern::new(r"/Type( )?/(\w+)");
        let m = pattern.first(b"/Type/Catalog").unwrap();
        assert_eq!(m.group(1), None);
        assert_eq!(m.group(2), Some(6..13));
        assert_eq!(m.group(0), None);
        assert_eq!(m.group(9), None);
    }

    #[test]
    fn test_pattern_first_and_last() {
        let pattern = BytePattern::new(r"startxref\s+(\d+)");
        let data = b"startxref\n10\n%%EOF\nstartxref\n99\n%%EOF";
        assert_eq!(pattern.first(data).unwrap().group_str(data, 1).unwrap(), "10");
        assert_eq!(pattern.last(data).unwrap().group_str(data, 1).unwrap(), "99");
        assert!(pattern.is_match(data));
        assert!(pattern.last(b"nothing").is_none());
    }

    #[test]
    fn test_split_lines_mixed_endings() {
        let lines = split_lines(b"xref\r\n0 1\r0000000000 65535 f\ntrailer");
        assert_eq!(
            lines,
            vec![
                &b"xref"[..],
                &b"0 1"[..],
                &b"0000000000 65535 f"[..],
                &b"trailer"[..]
            ]
        );
        assert_eq!(split_lines(b"a\n\nb\n"), vec![&b"a"[..], &b""[..], &b"b"[..]]);
        assert!(split_lines(b"").is_empty());
    }
}
