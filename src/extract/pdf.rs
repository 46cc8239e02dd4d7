use tracing::{trace, warn};

use super::{Extraction, Warning};
use crate::error::Result;

/// A document made of independently extractable pages.
///
/// Implemented by [`PdfDocument`](crate::PdfDocument); tests and other
/// backends can supply their own.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Plain text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String>;
}

/// One chapter per page with text, titled `Page N` (1-based).
///
/// Pages whose text is blank are skipped, so numbering can have gaps.
/// A page that fails to extract is skipped with a warning.
pub fn segment_pages<S: PageSource + ?Sized>(source: &S, out: &mut Extraction) {
    for index in 0..source.page_count() {
        let page = index + 1;
        match source.page_text(index) {
            Ok(text) if text.trim().is_empty() => trace!(page, "Skipping blank page"),
            Ok(text) => out.push(format!("Page {page}"), text),
            Err(err) => {
                warn!(page, error = %err, "Could not extract page text");
                out.warn(Warning::PageExtraction {
                    page,
                    reason: err.to_string(),
                });
            }
        }
    }
}
