//! Helpers for creating test PDFs with correct offsets

use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

/// XMP packet with every Dublin Core field the extractor reads
pub const SAMPLE_XMP: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:prism="http://prismstandard.org/namespaces/basic/2.0/">
   <dc:title><rdf:Alt><rdf:li xml:lang="x-default">XMP Title</rdf:li></rdf:Alt></dc:title>
   <dc:creator><rdf:Seq><rdf:li>XMP Author</rdf:li></rdf:Seq></dc:creator>
   <dc:description><rdf:Alt><rdf:li xml:lang="x-default">A book about samples</rdf:li></rdf:Alt></dc:description>
   <dc:date><rdf:Seq><rdf:li>2019-05-04</rdf:li></rdf:Seq></dc:date>
   <dc:publisher><rdf:Bag><rdf:li>Acme Press</rdf:li><rdf:li>Second House</rdf:li></rdf:Bag></dc:publisher>
   <dc:language><rdf:Bag><rdf:li>en</rdf:li><rdf:li>es</rdf:li></rdf:Bag></dc:language>
   <prism:isbn>978-3-16-148410-0</prism:isbn>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

/// In-memory source that counts the bytes handed out by `read`
#[derive(Debug)]
pub struct CountingReader {
    inner: Cursor<Vec<u8>>,
    read: Rc<Cell<u64>>,
}

impl CountingReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(bytes),
            read: Rc::new(Cell::new(0)),
        }
    }

    /// Shared counter that stays readable after the reader is moved
    pub fn counter(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.read)
    }
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read.set(self.read.get() + n as u64);
        Ok(n)
    }
}

impl Seek for CountingReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Incremental PDF writer that keeps track of object and xref offsets
#[derive(Debug, Clone)]
pub struct PdfFixture {
    data: Vec<u8>,
    eol: &'static str,
    offsets: BTreeMap<u32, u64>,
    max_object: u32,
    last_xref: Option<u64>,
}

impl PdfFixture {
    /// Start a file with the given version and a binary marker line
    pub fn new(version: &str) -> Self {
        Self::with_line_ending(version, "\n")
    }

    /// Same as [`new`](Self::new) with every line ended by `eol`
    pub fn with_line_ending(version: &str, eol: &'static str) -> Self {
        let mut fixture = Self {
            data: Vec::new(),
            eol,
            offsets: BTreeMap::new(),
            max_object: 0,
            last_xref: None,
        };
        fixture.line(format!("%PDF-{version}").as_bytes());
        fixture.line(b"%\xE2\xE3\xCF\xD3");
        fixture
    }

    /// Current end of the file
    pub fn position(&self) -> u64 {
        self.data.len() as u64
    }

    /// Offset of the latest copy of an object
    pub fn offset_of(&self, object: u32) -> Option<u64> {
        self.offsets.get(&object).copied()
    }

    /// Append raw bytes
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Append `<num> 0 obj <body> endobj` and return its offset
    pub fn object(&mut self, number: u32, body: &str) -> u64 {
        let offset = self.begin_object(number);
        self.line(body.as_bytes());
        self.line(b"endobj");
        offset
    }

    /// Append a stream object. `/Length` is added to `dict_entries`.
    pub fn stream_object(&mut self, number: u32, dict_entries: &str, payload: &[u8]) -> u64 {
        let offset = self.begin_object(number);
        self.line(format!("<< /Length {} {dict_entries} >>", payload.len()).as_bytes());
        self.line(b"stream");
        self.raw(payload);
        self.line(b"");
        self.line(b"endstream");
        self.line(b"endobj");
        offset
    }

    /// Append a FlateDecode stream object holding `content`
    #[cfg(feature = "compression")]
    pub fn flate_stream_object(&mut self, number: u32, dict_entries: &str, content: &[u8]) -> u64 {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(content)
            .expect("writing to a Vec cannot fail");
        let compressed = encoder.finish().expect("writing to a Vec cannot fail");
        self.stream_object(
            number,
            &format!("/Filter /FlateDecode {dict_entries}"),
            &compressed,
        )
    }

    /// Append an xref section for `objects` plus its trailer, linked to the
    /// previous section if there is one
    pub fn xref(&mut self, objects: &[u32], trailer_entries: &str) -> u64 {
        let prev = self.last_xref;
        self.xref_with_prev(objects, trailer_entries, prev)
    }

    /// Append an xref section with an explicit `/Prev` value
    pub fn xref_with_prev(
        &mut self,
        objects: &[u32],
        trailer_entries: &str,
        prev: Option<u64>,
    ) -> u64 {
        let start = self.position();
        let eol = self.eol;

        let mut ids: Vec<u32> = objects.to_vec();
        if self.last_xref.is_none() {
            ids.push(0);
        }
        ids.sort_unstable();
        ids.dedup();

        self.line(b"xref");
        for run in contiguous_runs(&ids) {
            self.line(format!("{} {}", run[0], run.len()).as_bytes());
            for id in run {
                let entry = match (id, self.offsets.get(&id)) {
                    (0, _) => format!("0000000000 65535 f {eol}"),
                    (_, Some(offset)) => format!("{offset:010} 00000 n {eol}"),
                    (_, None) => panic!("object {id} was never written"),
                };
                self.raw(entry.as_bytes());
            }
        }

        let prev = prev.map(|p| format!(" /Prev {p}")).unwrap_or_default();
        self.line(b"trailer");
        self.line(
            format!(
                "<< /Size {}{prev} {trailer_entries} >>",
                self.max_object + 1
            )
            .as_bytes(),
        );
        self.line(b"startxref");
        self.line(start.to_string().as_bytes());
        self.line(b"%%EOF");

        self.last_xref = Some(start);
        start
    }

    pub fn finish(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn begin_object(&mut self, number: u32) -> u64 {
        let offset = self.position();
        self.offsets.insert(number, offset);
        self.max_object = self.max_object.max(number);
        self.line(format!("{number} 0 obj").as_bytes());
        offset
    }

    fn line(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.data.extend_from_slice(self.eol.as_bytes());
    }
}

fn contiguous_runs(ids: &[u32]) -> Vec<Vec<u32>> {
    let mut runs: Vec<Vec<u32>> = Vec::new();
    for &id in ids {
        match runs.last_mut() {
            Some(run) if run.last().map(|last| last + 1) == Some(id) => run.push(id),
            _ => runs.push(vec![id]),
        }
    }
    runs
}

/// Creates a minimal valid PDF with correct xref offsets
pub fn create_minimal_pdf() -> Vec<u8> {
    let mut pdf = PdfFixture::new("1.4");
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    pdf.xref(&[1, 2], "/Root 1 0 R");
    pdf.finish()
}

/// Creates a three page PDF with an info dictionary and a plain XMP stream
pub fn create_sample_pdf() -> Vec<u8> {
    sample_fixture("\n").finish()
}

/// [`create_sample_pdf`] with a different line ending
pub fn create_sample_pdf_with_line_ending(eol: &'static str) -> Vec<u8> {
    sample_fixture(eol).finish()
}

fn sample_fixture(eol: &'static str) -> PdfFixture {
    let mut pdf = PdfFixture::with_line_ending("1.6", eol);
    pdf.object(
        1,
        "<< /Type /Catalog /Pages 2 0 R /Metadata 7 0 R /Lang (en-GB) >>",
    );
    pdf.object(2, "<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 >>");
    for page in 3..=5 {
        pdf.object(page, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");
    }
    pdf.object(
        6,
        "<< /Title (Sample Book) /Author (Jane Roe) /Creator (Writer) /Producer (Fixture Producer) /CreationDate (D:20200101120000Z) /ModDate (D:20210305093000Z) >>",
    );
    pdf.stream_object(7, "/Type /Metadata /Subtype /XML", SAMPLE_XMP.as_bytes());
    pdf.xref(
        &[1, 2, 3, 4, 5, 6, 7],
        "/Root 1 0 R /Info 6 0 R /ID [<0123456789ABCDEF> <0123456789ABCDEF>]",
    );
    pdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner;

    #[test]
    fn test_minimal_pdf_structure() {
        let pdf = create_minimal_pdf();
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(scanner::find_literal(&pdf, b"0 3\n0000000000 65535 f \n").is_some());
        assert!(scanner::find_literal(&pdf, b"/Size 3 /Root 1 0 R").is_some());
    }

    #[test]
    fn test_object_offsets_are_exact() {
        let mut pdf = PdfFixture::new("1.7");
        let offset = pdf.object(4, "<< >>");
        let data = pdf.finish();
        assert!(data[offset as usize..].starts_with(b"4 0 obj\n"));
        assert_eq!(pdf.offset_of(4), Some(offset));
    }

    #[test]
    fn test_subsections_follow_gaps() {
        let mut pdf = PdfFixture::new("1.4");
        pdf.object(1, "<< >>");
        pdf.object(2, "<< >>");
        pdf.object(5, "<< >>");
        pdf.xref(&[1, 2, 5], "");
        let data = pdf.finish();
        assert!(scanner::find_literal(&data, b"xref\n0 3\n").is_some());
        assert!(scanner::find_literal(&data, b"\n5 1\n").is_some());
    }

    #[test]
    fn test_second_section_links_back() {
        let mut pdf = PdfFixture::new("1.4");
        pdf.object(1, "<< >>");
        let first = pdf.xref(&[1], "/Root 1 0 R");
        pdf.object(2, "<< >>");
        pdf.xref(&[2], "/Root 1 0 R");
        let data = pdf.finish();
        let expected = format!("/Prev {first} ");
        assert!(scanner::find_literal(&data, expected.as_bytes()).is_some());
        assert!(scanner::find_literal(&data, b"xref\n2 1\n").is_some());
    }

    #[test]
    fn test_crlf_fixture() {
        let data = create_sample_pdf_with_line_ending("\r\n");
        assert!(data.starts_with(b"%PDF-1.6\r\n"));
        assert!(scanner::find_literal(&data, b"\n%%EOF").is_some());
        assert!(scanner::find_literal(&data, b"stream\r\n<?xpacket").is_some());
    }
}
