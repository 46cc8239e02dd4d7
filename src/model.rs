use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// A titled block of extracted text, the unit handed to a summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "summarize", derive(serde::Serialize))]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A table of contents entry (hierarchical)
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TocEntry {
    /// Label from the navigation document, if it had one.
    pub title: Option<String>,
    pub href: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            href: href.into(),
            children: Vec::new(),
        }
    }

    /// An entry whose navigation label was missing.
    pub fn untitled(href: impl Into<String>) -> Self {
        Self {
            title: None,
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TocEntry) -> Self {
        self.children.push(child);
        self
    }

    /// Number of entries in this subtree, this one included.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(entry) = stack.pop() {
            count += 1;
            stack.extend(entry.children.iter());
        }
        count
    }
}

// Navigation files are untrusted, so nesting depth is unbounded. The derived
// drop would recurse once per level.
impl Drop for TocEntry {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut entry) = pending.pop() {
            pending.append(&mut entry.children);
        }
    }
}

/// An addressable unit of document content (one XHTML file in an EPUB).
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Content items keyed by name, iterated in insertion (document) order.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    items: Vec<ContentItem>,
    by_name: HashMap<String, usize>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item. A second item with the same name replaces the first in place.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>, media_type: impl Into<String>) {
        let item = ContentItem {
            name: name.into(),
            media_type: media_type.into(),
            data,
        };
        match self.by_name.get(&item.name) {
            Some(&pos) => self.items[pos] = item,
            None => {
                self.by_name.insert(item.name.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Look up an item by href. Falls back to the percent-decoded href.
    pub fn get(&self, href: &str) -> Option<&ContentItem> {
        if let Some(&pos) = self.by_name.get(href) {
            return Some(&self.items[pos]);
        }
        let decoded = percent_encoding::percent_decode_str(href).decode_utf8().ok()?;
        self.by_name.get(decoded.as_ref()).map(|&pos| &self.items[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Epub,
    Pdf,
}

impl FileKind {
    /// Match a bare extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("epub") {
            Some(FileKind::Epub)
        } else if ext.eq_ignore_ascii_case("pdf") {
            Some(FileKind::Pdf)
        } else {
            None
        }
    }

    /// Derive the kind from a filename or path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_case_insensitive() {
        assert_eq!(FileKind::from_path("book.EPUB").unwrap(), FileKind::Epub);
        assert_eq!(FileKind::from_path("dir/Report.Pdf").unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_extension("epub"), Some(FileKind::Epub));
    }

    #[test]
    fn test_file_kind_rejects_others() {
        assert!(matches!(
            FileKind::from_path("notes.txt"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(FileKind::from_path("no_extension").is_err());
        assert!(FileKind::from_path("archive.epub.zip").is_err());
    }

    #[test]
    fn test_content_index_preserves_order() {
        let mut index = ContentIndex::new();
        index.insert("b.xhtml", b"B".to_vec(), "application/xhtml+xml");
        index.insert("a.xhtml", b"A".to_vec(), "application/xhtml+xml");
        index.insert("c.xhtml", b"C".to_vec(), "application/xhtml+xml");

        let names: Vec<_> = index.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["b.xhtml", "a.xhtml", "c.xhtml"]);
    }

    #[test]
    fn test_content_index_replace_keeps_position() {
        let mut index = ContentIndex::new();
        index.insert("a.xhtml", b"old".to_vec(), "text/html");
        index.insert("b.xhtml", b"B".to_vec(), "text/html");
        index.insert("a.xhtml", b"new".to_vec(), "text/html");

        assert_eq!(index.len(), 2);
        assert_eq!(index.iter().next().unwrap().data, b"new");
    }

    #[test]
    fn test_content_index_percent_decoded_lookup() {
        let mut index = ContentIndex::new();
        index.insert("text/chapter one.xhtml", Vec::new(), "application/xhtml+xml");

        assert!(index.get("text/chapter%20one.xhtml").is_some());
        assert!(index.get("text/chapter two.xhtml").is_none());
        assert!(index.get("text/chapter one.xhtml#sec1").is_none());
    }

    #[test]
    fn test_deep_toc_drops_without_overflow() {
        let mut entry = TocEntry::untitled("leaf.xhtml");
        for _ in 0..200_000 {
            entry = TocEntry::untitled("a.xhtml").with_child(entry);
        }
        assert_eq!(entry.subtree_len(), 200_001);
        drop(entry);
    }

    #[test]
    fn test_toc_entry_len_counts_subtree() {
        let entry = TocEntry::new("Part I", "p1.xhtml")
            .with_child(TocEntry::new("One", "c1.xhtml"))
            .with_child(
                TocEntry::untitled("c2.xhtml").with_child(TocEntry::new("Deep", "c3.xhtml")),
            );
        assert_eq!(entry.subtree_len(), 4);
    }
}
