//! Document metadata facade
//!
//! [`Extractor`] runs the parse stages in order (header, page count,
//! `startxref`, xref chain, catalog, info dictionary, XMP) and assembles a
//! [`Document`]. Failures in the last three stages are recorded as
//! diagnostics and leave the corresponding part empty.

use crate::dates;
use crate::diagnostics::{Diagnostic, DiagnosticLog, DiagnosticSink, NoopSink, Severity, Stage};
use crate::options::ExtractOptions;
use crate::parser::header::SIGNATURE_WINDOW;
use crate::parser::objects::dictionary_body;
use crate::parser::{
    chain, page_count, InfoObject, Metadata, ObjectRef, ParseError, ParseResult, PdfHeader,
    RdfMetadata, RootObject, SourceReader, Trailer, XrefChain, XrefTable,
};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// Structural metadata of one PDF file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    version: String,
    page_count: u64,
    chain: XrefChain,
    root: RootObject,
    info: InfoObject,
    metadata: Option<Metadata>,
}

impl Document {
    /// Parse the file at `path` with default options
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Extractor::new()
            .extract_path(path)
            .map(|extraction| extraction.document)
    }

    /// Parse any seekable source with default options
    pub fn from_reader<R: Read + Seek>(reader: R) -> ParseResult<Self> {
        Extractor::new()
            .extract_reader(reader)
            .map(|extraction| extraction.document)
    }

    /// Header version, such as "1.4"
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of `/Type /Page` entries in the file
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Xref tables, most recent first
    pub fn xref_chain(&self) -> &[XrefTable] {
        &self.chain.tables
    }

    /// Trailers, most recent first
    pub fn trailer_chain(&self) -> &[Trailer] {
        &self.chain.trailers
    }

    pub fn chain(&self) -> &XrefChain {
        &self.chain
    }

    pub fn root(&self) -> &RootObject {
        &self.root
    }

    pub fn info(&self) -> &InfoObject {
        &self.info
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    fn rdf(&self) -> Option<&RdfMetadata> {
        self.metadata.as_ref().and_then(|metadata| metadata.rdf.as_ref())
    }

    fn rdf_field(&self, field: impl Fn(&RdfMetadata) -> &str) -> &str {
        self.rdf().map(field).unwrap_or("")
    }

    /// Info title, or the XMP `dc:title` when the Info entry is empty
    pub fn title(&self) -> &str {
        if !self.info.title.is_empty() {
            return &self.info.title;
        }
        self.rdf_field(|rdf| rdf.title.as_str())
    }

    /// Info author, or the XMP `dc:creator` when the Info entry is empty
    pub fn author(&self) -> &str {
        if !self.info.author.is_empty() {
            return &self.info.author;
        }
        self.rdf_field(|rdf| rdf.creator.as_str())
    }

    pub fn creator(&self) -> &str {
        &self.info.creator
    }

    pub fn producer(&self) -> &str {
        &self.info.producer
    }

    pub fn creation_date(&self) -> &str {
        &self.info.creation_date
    }

    pub fn mod_date(&self) -> &str {
        &self.info.mod_date
    }

    pub fn isbn(&self) -> &str {
        self.rdf_field(|rdf| rdf.isbn.as_str())
    }

    pub fn description(&self) -> &str {
        self.rdf_field(|rdf| rdf.description.as_str())
    }

    /// XMP `dc:date` as written
    pub fn date(&self) -> &str {
        self.rdf_field(|rdf| rdf.date.as_str())
    }

    pub fn publishers(&self) -> &[String] {
        self.rdf().map(|rdf| rdf.publishers.as_slice()).unwrap_or(&[])
    }

    pub fn languages(&self) -> &[String] {
        self.rdf().map(|rdf| rdf.languages.as_slice()).unwrap_or(&[])
    }

    /// Languages joined with commas
    pub fn language(&self) -> String {
        self.languages().join(",")
    }

    /// Publishers joined with commas
    pub fn publisher_info(&self) -> String {
        self.publishers().join(",")
    }

    /// Publication year from the XMP date, else from the Info creation date
    pub fn year(&self) -> Option<i32> {
        dates::year_of(self.date()).or_else(|| dates::year_of(self.creation_date()))
    }
}

/// A parsed document together with the non-fatal problems met on the way
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extraction {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Whether any part of the document could not be read
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }
}

static NOOP_SINK: NoopSink = NoopSink;

/// Configured metadata extractor
#[derive(Clone)]
pub struct Extractor<'s> {
    options: ExtractOptions,
    sink: &'s dyn DiagnosticSink,
}

impl Default for Extractor<'static> {
    fn default() -> Self {
        Self {
            options: ExtractOptions::default(),
            sink: &NOOP_SINK,
        }
    }
}

impl std::fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Extractor<'static> {
    /// Lenient extractor that discards diagnostics
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'s> Extractor<'s> {
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Forward diagnostics to `sink` as they occur
    pub fn with_sink<'t>(self, sink: &'t dyn DiagnosticSink) -> Extractor<'t> {
        Extractor {
            options: self.options,
            sink,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Parse the file at `path`. The file is closed before returning.
    pub fn extract_path<P: AsRef<Path>>(&self, path: P) -> ParseResult<Extraction> {
        let file = File::open(path)?;
        self.extract_reader(file)
    }

    /// Parse any seekable source
    pub fn extract_reader<R: Read + Seek>(&self, reader: R) -> ParseResult<Extraction> {
        let mut source = SourceReader::new(reader)?;
        let mut log = DiagnosticLog::new(self.sink);
        let options = &self.options;

        let leading = source.read_at(0, SIGNATURE_WINDOW)?;
        let header = PdfHeader::detect(&leading)?;
        if header.version.is_empty() {
            log.warn(Stage::Header, "PDF signature carries no version number");
        }
        tracing::debug!(version = %header.version, offset = header.offset, "found pdf header");

        let page_count = page_count::count_pages(&mut source, options.page_scan_chunk())?;

        let start = chain::read_startxref(&mut source, options.tail_window())?;
        let chain = XrefChain::walk(&mut source, start, options, &mut log)?;
        tracing::debug!(
            start,
            revisions = chain.len(),
            pages = page_count,
            "read xref chain"
        );

        let root = match chain.root_ref() {
            Some(reference) => self
                .read_dictionary(&mut source, &chain, reference, Stage::Root, &mut log)
                .map(|dict| RootObject::parse(&dict))
                .unwrap_or_default(),
            None => {
                log.warn(Stage::Root, ParseError::CannotFindRootObject.to_string());
                RootObject::default()
            }
        };

        let info = match chain.info_ref() {
            Some(reference) => self
                .read_dictionary(&mut source, &chain, reference, Stage::Info, &mut log)
                .map(|dict| InfoObject::parse(&dict))
                .unwrap_or_default(),
            None => {
                log.warn(Stage::Info, ParseError::CannotFindInfoObject.to_string());
                InfoObject::default()
            }
        };

        let metadata = match root.metadata.as_ref().filter(|reference| reference.is_set()) {
            Some(reference) => self.read_metadata(&mut source, &chain, reference, &mut log),
            None => None,
        };

        Ok(Extraction {
            document: Document {
                version: header.version,
                page_count,
                chain,
                root,
                info,
                metadata,
            },
            diagnostics: log.into_entries(),
        })
    }

    fn read_object<R: Read + Seek>(
        &self,
        source: &mut SourceReader<R>,
        chain: &XrefChain,
        reference: &ObjectRef,
    ) -> ParseResult<Vec<u8>> {
        let number = reference.object_number;
        let offset = chain
            .offset_of(number)
            .ok_or(ParseError::ObjectNotFound(number))?;
        source.read_object(offset, number, self.options.block_size())
    }

    /// Read an object and return its dictionary body, logging any failure
    fn read_dictionary<R: Read + Seek>(
        &self,
        source: &mut SourceReader<R>,
        chain: &XrefChain,
        reference: &ObjectRef,
        stage: Stage,
        log: &mut DiagnosticLog<'_>,
    ) -> Option<Vec<u8>> {
        let block = match self.read_object(source, chain, reference) {
            Ok(block) => block,
            Err(e) => {
                log.error(stage, format!("cannot read object {reference}: {e}"));
                return None;
            }
        };
        match dictionary_body(&block) {
            Some(dict) => Some(dict.to_vec()),
            None => {
                log.error(stage, format!("object {reference} holds no dictionary"));
                None
            }
        }
    }

    fn read_metadata<R: Read + Seek>(
        &self,
        source: &mut SourceReader<R>,
        chain: &XrefChain,
        reference: &ObjectRef,
        log: &mut DiagnosticLog<'_>,
    ) -> Option<Metadata> {
        let parsed = self
            .read_object(source, chain, reference)
            .and_then(|block| Metadata::parse(&block));

        match parsed {
            Ok(metadata) => Some(metadata),
            Err(e @ ParseError::UnsupportedStreamContent(_)) => {
                log.warn(Stage::Metadata, format!("skipping metadata {reference}: {e}"));
                None
            }
            Err(e) => {
                log.error(Stage::Metadata, format!("cannot read metadata {reference}: {e}"));
                None
            }
        }
    }
}
