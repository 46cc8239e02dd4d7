//! # epitome
//!
//! Split EPUB and PDF books into titled chapters, ready to be summarized.
//!
//! ## Features
//!
//! - EPUB 2 and 3: chapters follow the NCX or nav document table of contents,
//!   falling back to one chapter per content document
//! - Titles that are really filenames are replaced by the document's own
//!   `<h1>` or `<title>`
//! - PDF: one chapter per page that has text
//! - Per-item problems are reported as [`Warning`]s instead of failing the book
//! - Optional chapter summarization (`summarize` feature)
//!
//! ## Quick Start
//!
//! ```no_run
//! use epitome::extract_file;
//!
//! let extraction = extract_file("book.epub")?;
//! for (i, chapter) in extraction.chapters.iter().enumerate() {
//!     println!("{}. {}", i + 1, chapter.title);
//! }
//! for warning in &extraction.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok::<(), epitome::Error>(())
//! ```
//!
//! ## Bring your own container
//!
//! The segmenters only need a TOC and a content index, or a [`PageSource`]:
//!
//! ```
//! use epitome::{extract_epub, ContentIndex, EpubDocument, TocEntry};
//!
//! let mut content = ContentIndex::new();
//! content.insert("ch1.xhtml", b"<h1>Opening</h1><p>...</p>".to_vec(), "application/xhtml+xml");
//!
//! let doc = EpubDocument::from_parts(vec![TocEntry::untitled("ch1.xhtml")], content);
//! let extraction = extract_epub(&doc);
//! assert_eq!(extraction.chapters[0].title, "Opening");
//! ```

pub mod epub;
pub mod error;
pub mod extract;
pub mod model;
pub mod pdf;
#[cfg(feature = "summarize")]
pub mod summary;
pub mod title;
pub mod util;

pub use epub::EpubDocument;
pub use error::{Error, Result};
pub use extract::{
    Extraction, PageSource, Warning, extract_bytes, extract_epub, extract_file, extract_path,
    extract_pdf,
};
pub use model::{Chapter, ContentIndex, ContentItem, FileKind, TocEntry};
pub use pdf::PdfDocument;
pub use title::{resolve_title, resolve_title_bytes};
pub use util::decode_text;
