//! Integration tests for metadata extraction

use pdf_meta::parser::test_helpers::{
    create_minimal_pdf, create_sample_pdf, create_sample_pdf_with_line_ending, PdfFixture,
    SAMPLE_XMP,
};
use pdf_meta::{Document, Extraction, Extractor, ParseError, Severity, Stage};
use std::io::Cursor;

fn extract(bytes: Vec<u8>) -> Extraction {
    Extractor::new()
        .extract_reader(Cursor::new(bytes))
        .expect("fixture should parse")
}

#[test]
fn test_rejects_non_pdf() {
    let result = Document::from_reader(Cursor::new(b"GIF89a not a pdf at all".to_vec()));
    assert!(matches!(result, Err(ParseError::NotAPdf)));

    let mut late_signature = vec![b'x'; 2000];
    late_signature.extend_from_slice(&create_minimal_pdf());
    let result = Document::from_reader(Cursor::new(late_signature));
    assert!(matches!(result, Err(ParseError::NotAPdf)));
}

#[test]
fn test_missing_startxref_is_fatal() {
    let mut bytes = create_minimal_pdf();
    let cut = bytes
        .windows(b"startxref".len())
        .rposition(|window| window == b"startxref")
        .unwrap();
    bytes.truncate(cut);
    let result = Document::from_reader(Cursor::new(bytes));
    assert!(matches!(result, Err(ParseError::CannotReadXrefOffset)));
}

#[test]
fn test_single_revision_chain() {
    let document = extract(create_minimal_pdf()).document;

    assert_eq!(document.version(), "1.4");
    assert_eq!(document.xref_chain().len(), 1);
    assert_eq!(document.trailer_chain().len(), 1);
    assert_eq!(document.trailer_chain()[0].prev, 0);
    assert_eq!(document.trailer_chain()[0].size, "3");
    assert_eq!(document.root().r#type, "Catalog");
    assert_eq!(
        document.root().pages.as_ref().map(|pages| pages.object_number),
        Some(2)
    );
}

#[test]
fn test_incremental_updates_most_recent_first() {
    let mut pdf = PdfFixture::new("1.4");
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    pdf.object(3, "<< /Title (First Draft) >>");
    pdf.xref(&[1, 2, 3], "/Root 1 0 R /Info 3 0 R");
    pdf.object(4, "<< /Title (Second Draft) >>");
    pdf.xref(&[4], "/Root 1 0 R /Info 4 0 R");
    pdf.object(5, "<< /Title (Final) /Author (Editor) >>");
    pdf.xref(&[5], "/Root 1 0 R /Info 5 0 R");

    let extraction = extract(pdf.finish());
    let document = &extraction.document;

    assert!(extraction.diagnostics.is_empty());
    assert_eq!(document.trailer_chain().len(), 3);
    assert_eq!(document.xref_chain().len(), 3);
    assert_eq!(document.trailer_chain()[2].prev, 0);
    for pair in document.trailer_chain().windows(2) {
        assert!(pair[0].has_previous());
    }
    let starts: Vec<u64> = document
        .xref_chain()
        .iter()
        .map(|table| table.section_start)
        .collect();
    assert!(starts.windows(2).all(|pair| pair[0] > pair[1]));

    assert_eq!(document.title(), "Final");
    assert_eq!(document.author(), "Editor");
}

#[test]
fn test_info_title_wins_over_xmp() {
    let document = extract(create_sample_pdf()).document;
    assert_eq!(document.title(), "Sample Book");
    assert_eq!(
        document.metadata().and_then(|m| m.rdf.as_ref()).map(|rdf| rdf.title.as_str()),
        Some("XMP Title")
    );
}

#[test]
fn test_xmp_collections() {
    let document = extract(create_sample_pdf()).document;
    assert_eq!(document.languages(), ["en", "es"]);
    assert_eq!(document.publishers(), ["Acme Press", "Second House"]);
    assert_eq!(document.isbn(), "978-3-16-148410-0");
}

#[test]
fn test_page_count_ignores_pages_node() {
    let document = extract(create_sample_pdf()).document;
    assert_eq!(document.page_count(), 3);
}

#[test]
fn test_line_endings_are_equivalent() {
    let reference = extract(create_sample_pdf()).document;

    for eol in ["\r\n", "\r"] {
        let extraction = extract(create_sample_pdf_with_line_ending(eol));
        let document = &extraction.document;

        assert!(extraction.diagnostics.is_empty(), "{eol:?}: {:?}", extraction.diagnostics);
        assert_eq!(document.version(), reference.version());
        assert_eq!(document.page_count(), reference.page_count());
        assert_eq!(document.root(), reference.root());
        assert_eq!(document.info(), reference.info());
        assert_eq!(document.title(), reference.title());
        assert_eq!(document.languages(), reference.languages());
        assert_eq!(
            document.xref_chain()[0].objects.len(),
            reference.xref_chain()[0].objects.len()
        );
    }
}

#[test]
fn test_unsupported_filter_skips_metadata_only() {
    let mut pdf = PdfFixture::new("1.5");
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R /Metadata 4 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    pdf.object(3, "<< /Title (Compressed Elsewhere) >>");
    pdf.stream_object(
        4,
        "/Type /Metadata /Subtype /XML /Filter /LZWDecode",
        b"\x80\x0b\x60\x50\x22\x0c\x0c\x85\x01",
    );
    pdf.xref(&[1, 2, 3, 4], "/Root 1 0 R /Info 3 0 R");

    let extraction = extract(pdf.finish());
    let document = &extraction.document;

    assert!(document.metadata().is_none());
    assert_eq!(document.root().r#type, "Catalog");
    assert_eq!(document.title(), "Compressed Elsewhere");

    assert_eq!(extraction.diagnostics.len(), 1);
    assert_eq!(extraction.diagnostics[0].stage, Stage::Metadata);
    assert_eq!(extraction.diagnostics[0].severity, Severity::Warning);
    assert!(extraction.diagnostics[0].message.contains("LZWDecode"));
}

#[cfg(feature = "compression")]
#[test]
fn test_flate_compressed_xmp() {
    let mut pdf = PdfFixture::new("1.6");
    pdf.object(1, "<< /Type /Catalog /Metadata 2 0 R >>");
    let xmp = SAMPLE_XMP.as_bytes();
    pdf.flate_stream_object(
        2,
        &format!("/Type /Metadata /Subtype /XML /DL {}", xmp.len()),
        xmp,
    );
    pdf.xref(&[1, 2], "/Root 1 0 R");

    let extraction = extract(pdf.finish());
    let metadata = extraction.document.metadata().expect("metadata stream");

    assert_eq!(metadata.raw_stream_data, xmp);
    assert_eq!(metadata.dl, xmp.len() as u64);
    assert!(metadata.length > 0);
    assert_eq!(extraction.document.title(), "XMP Title");
    assert_eq!(extraction.document.author(), "XMP Author");
    assert_eq!(extraction.document.year(), Some(2019));
}

#[test]
fn test_parsing_is_deterministic() {
    let bytes = create_sample_pdf();
    let first = extract(bytes.clone());
    let second = extract(bytes);
    assert_eq!(first, second);
}

#[test]
fn test_stale_object_offset_is_reported() {
    let mut pdf = PdfFixture::new("1.4");
    pdf.object(1, "<< /Type /Catalog >>");
    let info_at = pdf.object(3, "<< /Title (Unreachable) >>") as usize;
    pdf.xref(&[1, 3], "/Root 1 0 R /Info 3 0 R");
    let mut bytes = pdf.finish();
    // Renumber the object so the xref entry no longer matches
    bytes[info_at] = b'9';

    let extraction = extract(bytes);
    assert_eq!(extraction.document.title(), "");
    assert_eq!(extraction.document.root().r#type, "Catalog");
    assert!(extraction.has_errors());
    let info_error = extraction
        .diagnostics
        .iter()
        .find(|d| d.stage == Stage::Info)
        .expect("info diagnostic");
    assert!(info_error.message.contains("not parsable"));
}

#[test]
fn test_free_entry_is_not_resolved() {
    let mut pdf = PdfFixture::new("1.4");
    pdf.object(1, "<< /Type /Catalog >>");
    pdf.xref(&[1], "/Root 1 0 R /Info 0 0 R");

    let extraction = extract(pdf.finish());
    // Object 0 is never a valid reference
    assert_eq!(extraction.diagnostics.len(), 1);
    assert_eq!(extraction.diagnostics[0].stage, Stage::Info);
    assert_eq!(extraction.diagnostics[0].severity, Severity::Warning);
}
