use tracing::{trace, warn};

use super::{Extraction, Warning};
use crate::model::{ContentIndex, TocEntry};
use crate::title::resolve_title;
use crate::util::decode_document;

/// Extensions that mark a TOC label as a filename rather than a real title.
const FILENAME_SUFFIXES: [&str; 3] = [".xhtml", ".html", ".htm"];

/// True when a TOC label is missing in all but name: blank, or just a document filename.
pub fn looks_like_filename(title: &str) -> bool {
    let title = title.trim();
    if title.is_empty() {
        return true;
    }
    let lower = title.to_ascii_lowercase();
    FILENAME_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Flatten a TOC into chapters, in pre-order (each entry before its children).
///
/// Every entry yields exactly one chapter, including entries that only group
/// children. An explicit stack keeps deeply nested (or hostile) TOCs off the
/// call stack.
pub fn walk_toc(entries: &[TocEntry], content: &ContentIndex, out: &mut Extraction) {
    let mut stack: Vec<(&TocEntry, usize)> = entries.iter().rev().map(|e| (e, 0)).collect();

    while let Some((entry, depth)) = stack.pop() {
        let text = match content.get(&entry.href) {
            Some(item) => {
                let decoded = decode_document(&item.name, &item.data);
                if decoded.had_errors {
                    out.warn(Warning::ItemDecode {
                        name: item.name.clone(),
                    });
                }
                decoded.text.into_owned()
            }
            None => {
                warn!(href = %entry.href, "TOC entry has no matching content item");
                out.warn(Warning::UnresolvedHref {
                    href: entry.href.clone(),
                });
                String::new()
            }
        };

        // The TOC label wins over anything in the content, unless it is no label at all.
        let title = match entry.title.as_deref() {
            Some(title) if !looks_like_filename(title) => title.to_string(),
            _ => resolve_title(&text, &entry.href),
        };

        trace!(depth, title = %title, href = %entry.href, "TOC chapter");
        out.push(title, text);

        stack.extend(entry.children.iter().rev().map(|c| (c, depth + 1)));
    }
}
