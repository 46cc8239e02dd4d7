//! Error types for epitome operations.

use thiserror::Error;

/// Errors that can occur while extracting or summarizing chapters.
///
/// Per-item and per-page problems never show up here: they are recovered
/// and reported as [`Warning`](crate::Warning)s. Only a container that cannot
/// be opened at all aborts an extraction.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("Invalid PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No content provided")]
    EmptyContent,

    #[error("Error generating summary: {0}")]
    Summary(String),
}

impl Error {
    /// True when the document container itself could not be opened or parsed.
    pub fn is_document_parse(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Zip(_) | Error::Xml(_) | Error::InvalidEpub(_) | Error::Pdf(_)
        )
    }
}

#[cfg(feature = "summarize")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Summary(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
