use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use super::parser::{ManifestItem, parse_container_xml, parse_nav, parse_ncx, parse_opf};
use crate::error::{Error, Result};
use crate::extract::Warning;
use crate::model::{ContentIndex, TocEntry};
use crate::util::decode_document;

type TocParser = fn(&str) -> Result<Vec<TocEntry>>;

/// An opened EPUB: its table of contents and content documents.
///
/// Everything is read eagerly when the archive is opened, so extraction
/// itself does no I/O. Documents that could not be read from the archive
/// are left out of the index and recorded as warnings.
#[derive(Debug, Clone, Default)]
pub struct EpubDocument {
    toc: Vec<TocEntry>,
    content: ContentIndex,
    warnings: Vec<Warning>,
}

impl EpubDocument {
    /// Open an EPUB file from disk.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use epitome::EpubDocument;
    ///
    /// let doc = EpubDocument::open("path/to/book.epub")?;
    /// println!("TOC entries: {}", doc.toc().len());
    /// # Ok::<(), epitome::Error>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        // 1. Find the OPF file path from container.xml
        let container = read_archive_text(&mut archive, "META-INF/container.xml")?;
        let opf_path = parse_container_xml(&container)?;
        let opf_dir = parent_dir(&opf_path);

        // 2. Parse the OPF file
        let opf = parse_opf(&read_archive_text(&mut archive, &opf_path)?)?;

        // 3. Load content documents in manifest order
        let mut content = ContentIndex::new();
        let mut warnings = Vec::new();
        for item in opf.manifest.iter().filter(|item| item.is_document()) {
            match load_item(&mut archive, &opf_dir, item) {
                Ok(data) => content.insert(item.href.clone(), data, item.media_type.clone()),
                Err(err) => {
                    warn!(item = %item.href, error = %err, "Skipping unreadable content item");
                    warnings.push(Warning::ItemRetrieval {
                        name: item.href.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        // 4. Table of contents: NCX first, then the EPUB 3 nav document
        let mut toc = Vec::new();
        for (href, parse) in [
            (opf.ncx_href.as_deref(), parse_ncx as TocParser),
            (opf.nav_href.as_deref(), parse_nav as TocParser),
        ] {
            let Some(href) = href else { continue };
            match read_toc(&mut archive, &opf_dir, href, parse) {
                Ok(entries) if !entries.is_empty() => {
                    toc = entries;
                    break;
                }
                Ok(_) => debug!(toc = href, "Navigation document has no entries"),
                Err(err) => warn!(toc = href, error = %err, "Ignoring unreadable navigation document"),
            }
        }

        debug!(
            documents = content.len(),
            toc_entries = toc.len(),
            "Opened EPUB"
        );

        Ok(Self {
            toc,
            content,
            warnings,
        })
    }

    /// Assemble a document from an already-built TOC and content index.
    pub fn from_parts(toc: Vec<TocEntry>, content: ContentIndex) -> Self {
        Self {
            toc,
            content,
            warnings: Vec::new(),
        }
    }

    /// Root TOC entries; empty when the book has no usable navigation.
    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// Content documents keyed by their OPF-relative href.
    pub fn content_index(&self) -> &ContentIndex {
        &self.content
    }

    /// Problems recovered from while opening the archive.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

fn load_item<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf_dir: &str,
    item: &ManifestItem,
) -> Result<Vec<u8>> {
    let full_path = resolve_path(opf_dir, &item.href);
    read_archive_file_bytes(archive, &full_path)
}

/// Read and parse a TOC document, re-expressing its hrefs relative to the OPF.
fn read_toc<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf_dir: &str,
    href: &str,
    parse: TocParser,
) -> Result<Vec<TocEntry>> {
    let toc_path = resolve_path(opf_dir, href);
    let bytes = read_archive_file_bytes(archive, &toc_path)?;
    let decoded = decode_document(&toc_path, &bytes);
    let mut entries = parse(&decoded.text)?;

    let toc_dir = parent_dir(&toc_path);
    if toc_dir != opf_dir {
        rebase_hrefs(&mut entries, &toc_dir, opf_dir);
    }
    Ok(entries)
}

fn rebase_hrefs(entries: &mut [TocEntry], from_dir: &str, to_dir: &str) {
    let mut stack: Vec<&mut TocEntry> = entries.iter_mut().collect();
    while let Some(entry) = stack.pop() {
        let (path, fragment) = match entry.href.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (entry.href.as_str(), None),
        };
        if !path.is_empty() {
            let full = resolve_path(from_dir, path);
            let mut rebased = relative_to(to_dir, &full);
            if let Some(fragment) = fragment {
                rebased.push('#');
                rebased.push_str(fragment);
            }
            entry.href = rebased;
        }
        stack.extend(entry.children.iter_mut());
    }
}

fn read_archive_text<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let bytes = read_archive_file_bytes(archive, path)?;
    Ok(decode_document(path, &bytes).text.into_owned())
}

fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    // Try direct lookup first
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    // Fallback: try percent-decoded path (handles malformed EPUBs)
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::InvalidEpub(format!("Invalid UTF-8 in path: {}", path)))?;

    let mut file = archive.by_name(&decoded)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Directory part of an archive path, without trailing slash.
fn parent_dir(path: &str) -> String {
    path.rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

/// Join `href` onto `base` and normalize `.` and `..` segments.
fn resolve_path(base: &str, href: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Express an archive path relative to `dir`.
fn relative_to(dir: &str, path: &str) -> String {
    let dir_parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let common = dir_parts
        .iter()
        .zip(&path_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; dir_parts.len() - common];
    parts.extend(&path_parts[common..]);
    parts.join("/")
}
