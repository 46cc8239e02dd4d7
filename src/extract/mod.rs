//! Chapter extraction: turns an opened document into an ordered chapter list.
//!
//! EPUBs are segmented by their table of contents when they have one
//! ([`walk_toc`]), otherwise one chapter per content document
//! ([`segment_items`]). PDFs get one chapter per non-blank page
//! ([`segment_pages`]).
//!
//! Only a container that cannot be opened is an error. Everything that goes
//! wrong below that level (an unreadable item, bytes that do not decode, a
//! page whose text cannot be extracted) is recorded as a [`Warning`] and the
//! extraction carries on with what it has.

mod fallback;
mod pdf;
mod toc;

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use tracing::{debug, info};

pub use self::fallback::segment_items;
pub use self::pdf::{PageSource, segment_pages};
pub use self::toc::{looks_like_filename, walk_toc};

use crate::epub::EpubDocument;
use crate::error::Result;
use crate::model::{Chapter, FileKind};
use crate::pdf::PdfDocument;

/// A problem that was recovered from during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A content item's bytes did not decode cleanly; replacement characters were used.
    ItemDecode { name: String },
    /// A content item could not be read from the container and was skipped.
    ItemRetrieval { name: String, reason: String },
    /// A TOC entry points at something that is not a content item.
    UnresolvedHref { href: String },
    /// Text extraction failed for one PDF page (1-based), which was skipped.
    PageExtraction { page: usize, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ItemDecode { name } => {
                write!(f, "{name}: malformed bytes replaced while decoding")
            }
            Warning::ItemRetrieval { name, reason } => write!(f, "{name}: skipped ({reason})"),
            Warning::UnresolvedHref { href } => write!(f, "{href}: no matching content item"),
            Warning::PageExtraction { page, reason } => {
                write!(f, "page {page}: skipped ({reason})")
            }
        }
    }
}

/// Chapters in reading order, plus everything that was recovered from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub chapters: Vec<Chapter>,
    pub warnings: Vec<Warning>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing readable was found ("no content" for the caller).
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn into_chapters(self) -> Vec<Chapter> {
        self.chapters
    }

    pub(crate) fn push(&mut self, title: String, content: String) {
        self.chapters.push(Chapter { title, content });
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Extract chapters from a file, choosing the format by its extension.
///
/// # Example
///
/// ```no_run
/// let extraction = epitome::extract_file("book.epub")?;
/// for chapter in &extraction.chapters {
///     println!("{}: {} chars", chapter.title, chapter.content.len());
/// }
/// # Ok::<(), epitome::Error>(())
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    let kind = FileKind::from_path(&path)?;
    extract_path(path, kind)
}

/// Extract chapters from a file whose format the caller already knows.
pub fn extract_path<P: AsRef<Path>>(path: P, kind: FileKind) -> Result<Extraction> {
    let path = path.as_ref();
    info!(path = %path.display(), ?kind, "Extracting chapters");
    let extraction = match kind {
        FileKind::Epub => extract_epub(&EpubDocument::open(path)?),
        FileKind::Pdf => extract_pdf(&PdfDocument::open(path)?),
    };
    log_summary(&extraction);
    Ok(extraction)
}

/// Extract chapters from an in-memory upload.
pub fn extract_bytes(data: &[u8], kind: FileKind) -> Result<Extraction> {
    let extraction = match kind {
        FileKind::Epub => extract_epub(&EpubDocument::from_reader(Cursor::new(data))?),
        FileKind::Pdf => extract_pdf(&PdfDocument::from_bytes(data)?),
    };
    log_summary(&extraction);
    Ok(extraction)
}

/// Segment an opened EPUB: by TOC when it has one, else one chapter per document.
pub fn extract_epub(doc: &EpubDocument) -> Extraction {
    let mut extraction = Extraction::new();
    extraction.warnings.extend_from_slice(doc.warnings());

    if doc.toc().is_empty() {
        debug!("No table of contents, segmenting by content item");
        segment_items(doc.content_index(), &mut extraction);
    } else {
        walk_toc(doc.toc(), doc.content_index(), &mut extraction);
    }
    extraction
}

/// Segment a paged document into one chapter per non-blank page.
pub fn extract_pdf<S: PageSource + ?Sized>(source: &S) -> Extraction {
    let mut extraction = Extraction::new();
    segment_pages(source, &mut extraction);
    extraction
}

fn log_summary(extraction: &Extraction) {
    info!(
        chapters = extraction.chapters.len(),
        warnings = extraction.warnings.len(),
        "Finished extraction"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentIndex, TocEntry};

    fn index(items: &[(&str, &str)]) -> ContentIndex {
        let mut index = ContentIndex::new();
        for (name, html) in items {
            index.insert(*name, html.as_bytes().to_vec(), "application/xhtml+xml");
        }
        index
    }

    #[test]
    fn test_extract_epub_uses_toc_when_present() {
        let content = index(&[
            ("a.xhtml", "<p>A</p>"),
            ("b.xhtml", "<h1>Chapter Two</h1><p>B</p>"),
            ("c.xhtml", "<p>C</p>"),
        ]);
        let toc = vec![
            TocEntry::new("Intro", "a.xhtml"),
            TocEntry::new("a.xhtml", "b.xhtml").with_child(TocEntry::new("Sub", "c.xhtml")),
        ];
        let doc = EpubDocument::from_parts(toc, content);

        let titles: Vec<_> = extract_epub(&doc)
            .chapters
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Intro", "Chapter Two", "Sub"]);
    }

    #[test]
    fn test_extract_epub_falls_back_without_toc() {
        let content = index(&[
            ("ch1.xhtml", "<html><body><p>plain text</p></body></html>"),
            ("ch2.xhtml", "<html><head><title>Two</title></head><body/></html>"),
        ]);
        let doc = EpubDocument::from_parts(Vec::new(), content);

        let extraction = extract_epub(&doc);
        let titles: Vec<_> = extraction.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["ch1.xhtml", "Two"]);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_extract_epub_is_idempotent() {
        let content = index(&[("a.xhtml", "<h1>A</h1>"), ("b.xhtml", "<title>B</title>")]);
        let toc = vec![TocEntry::untitled("a.xhtml"), TocEntry::new("", "b.xhtml")];
        let doc = EpubDocument::from_parts(toc, content);

        assert_eq!(extract_epub(&doc), extract_epub(&doc));
    }

    #[test]
    fn test_extract_bytes_rejects_garbage() {
        let err = extract_bytes(b"definitely not a zip", FileKind::Epub).unwrap_err();
        assert!(err.is_document_parse());

        let err = extract_bytes(b"%PDF-nonsense", FileKind::Pdf).unwrap_err();
        assert!(err.is_document_parse());
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::PageExtraction {
            page: 3,
            reason: "bad font".into(),
        };
        assert_eq!(warning.to_string(), "page 3: skipped (bad font)");
    }
}
