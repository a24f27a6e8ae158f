//! Extraction options

/// Default block size for object and xref reads
pub const DEFAULT_BLOCK_SIZE: usize = 100;
/// Default size of the tail window searched for `startxref`
pub const DEFAULT_TAIL_WINDOW: usize = 1024;
/// Default chunk size of the page-count scan
pub const DEFAULT_PAGE_SCAN_CHUNK: usize = 300;

/// Options controlling how a document is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Bytes read per step by the object reader and the trailer locator
    pub block_size: usize,
    /// Bytes read from the end of the file when looking for `startxref`
    pub tail_window: usize,
    /// Bytes read per step by the page counter
    pub page_scan_chunk: usize,
    /// Treat broken chain links and incomplete xref subsections as fatal
    pub strict: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::lenient()
    }
}

impl ExtractOptions {
    /// Best effort: keep whatever part of the chain could be read
    pub fn lenient() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            tail_window: DEFAULT_TAIL_WINDOW,
            page_scan_chunk: DEFAULT_PAGE_SCAN_CHUNK,
            strict: false,
        }
    }

    /// Fail on any structural inconsistency in the xref chain
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::lenient()
        }
    }

    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn with_tail_window(mut self, size: usize) -> Self {
        self.tail_window = size;
        self
    }

    pub fn with_page_scan_chunk(mut self, size: usize) -> Self {
        self.page_scan_chunk = size;
        self
    }

    // Zero sizes would never make progress
    pub(crate) fn block_size(&self) -> usize {
        self.block_size.max(1)
    }

    pub(crate) fn tail_window(&self) -> usize {
        self.tail_window.max(1)
    }

    pub(crate) fn page_scan_chunk(&self) -> usize {
        self.page_scan_chunk.max(1)
    }
}
