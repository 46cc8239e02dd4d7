//! PDF page access backed by `lopdf`.

use std::fmt;
use std::path::Path;

use lopdf::Document;
use tracing::debug;

use crate::error::Result;
use crate::extract::PageSource;

/// A loaded PDF whose pages can be extracted one at a time.
pub struct PdfDocument {
    doc: Document,
    /// Page numbers in document order, as lopdf numbers them (1-based).
    pages: Vec<u32>,
}

impl PdfDocument {
    /// Load a PDF from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_document(Document::load(path)?))
    }

    /// Load a PDF from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::from_document(Document::load_mem(data)?))
    }

    fn from_document(doc: Document) -> Self {
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!(pages = pages.len(), "Opened PDF");
        Self { doc, pages }
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let page = self
            .pages
            .get(index)
            .copied()
            .ok_or(lopdf::Error::PageNumberNotFound(index as u32 + 1))?;
        Ok(self.doc.extract_text(&[page])?)
    }
}

impl fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfDocument")
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}
