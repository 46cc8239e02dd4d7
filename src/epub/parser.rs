//! EPUB parsing utilities (container.xml, OPF, NCX, EPUB 3 nav)

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::model::TocEntry;

/// Parsed OPF package data.
#[derive(Debug, Default)]
pub struct OpfData {
    /// Manifest items in document order.
    pub manifest: Vec<ManifestItem>,
    pub ncx_href: Option<String>,
    pub nav_href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    fn has_property(&self, name: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == name))
    }

    /// The EPUB 3 navigation document.
    pub fn is_nav(&self) -> bool {
        self.has_property("nav")
    }

    /// An (X)HTML content document, excluding the nav document.
    pub fn is_document(&self) -> bool {
        matches!(
            self.media_type.as_str(),
            "application/xhtml+xml" | "text/html"
        ) && !self.is_nav()
    }
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Err(Error::InvalidEpub(
        "No rootfile found in container.xml".into(),
    ))
}

/// Parse the OPF package document: manifest order plus TOC document locations.
pub fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut manifest: Vec<ManifestItem> = Vec::new();
    let mut toc_id: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"item" => {
                        let id = attribute(&e, b"id")?.unwrap_or_default();
                        if id.is_empty() {
                            continue;
                        }
                        manifest.push(ManifestItem {
                            id,
                            href: attribute(&e, b"href")?.unwrap_or_default(),
                            media_type: attribute(&e, b"media-type")?.unwrap_or_default(),
                            properties: attribute(&e, b"properties")?,
                        });
                    }
                    b"spine" => toc_id = attribute(&e, b"toc")?,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    // EPUB 2 names the NCX on the spine; some files only give it the right media type.
    let ncx_href = toc_id
        .and_then(|id| manifest.iter().find(|item| item.id == id))
        .or_else(|| {
            manifest
                .iter()
                .find(|item| item.media_type == "application/x-dtbncx+xml")
        })
        .map(|item| item.href.clone());

    let nav_href = manifest
        .iter()
        .find(|item| item.is_nav())
        .map(|item| item.href.clone());

    Ok(OpfData {
        manifest,
        ncx_href,
        nav_href,
    })
}

/// Parse NCX table of contents.
///
/// A navPoint without a `content` target is dropped; its children move up
/// to its parent so no reachable entry is lost.
pub fn parse_ncx(content: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);
    // Labels are trimmed once complete; trimming per event would eat the
    // spaces around entity references.
    reader.config_mut().trim_text(false);

    let mut stack: Vec<NodeState> = vec![NodeState::default()];
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => stack.push(NodeState::default()),
                b"text" => in_text = true,
                b"content" => set_src(&mut stack, &e)?,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"content" {
                    set_src(&mut stack, &e)?;
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    state.push_label(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    match resolve_entity(&entity) {
                        Some(resolved) => state.push_label(&resolved),
                        None => state.push_label(&format!("&{entity};")),
                    }
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navPoint" if stack.len() > 1 => {
                    if let Some(state) = stack.pop()
                        && let Some(parent) = stack.last_mut()
                    {
                        state.close_into(parent);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(collapse(stack))
}

/// Parse the `<nav epub:type="toc">` list of an EPUB 3 navigation document.
pub fn parse_nav(content: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<NodeState> = vec![NodeState::default()];
    // Depth of <nav> elements, and the depth at which the toc nav opened.
    let mut nav_depth = 0usize;
    let mut toc_nav_depth: Option<usize> = None;
    // Nesting inside the current <li>'s label (<a> or <span>).
    let mut label_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"nav" => {
                        nav_depth += 1;
                        if toc_nav_depth.is_none() && is_toc_nav(&e)? {
                            toc_nav_depth = Some(nav_depth);
                        }
                    }
                    b"li" if toc_nav_depth.is_some() => stack.push(NodeState::default()),
                    b"a" | b"span" if toc_nav_depth.is_some() && stack.len() > 1 => {
                        if label_depth > 0 {
                            label_depth += 1;
                        } else if let Some(state) = stack.last_mut()
                            && !state.label_done
                        {
                            if let Some(href) = attribute(&e, b"href")? {
                                state.src = Some(href);
                            }
                            label_depth = 1;
                        }
                    }
                    _ => {
                        if label_depth > 0 {
                            label_depth += 1;
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if label_depth > 0 && let Some(state) = stack.last_mut() {
                    state.push_label(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if label_depth > 0 && let Some(state) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    match resolve_entity(&entity) {
                        Some(resolved) => state.push_label(&resolved),
                        None => state.push_label(&format!("&{entity};")),
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if label_depth > 0 {
                    label_depth -= 1;
                    if label_depth == 0
                        && let Some(state) = stack.last_mut()
                    {
                        state.label_done = true;
                    }
                    continue;
                }
                match local {
                    b"li" if toc_nav_depth.is_some() && stack.len() > 1 => {
                        if let Some(state) = stack.pop()
                            && let Some(parent) = stack.last_mut()
                        {
                            state.close_into(parent);
                        }
                    }
                    b"nav" => {
                        if toc_nav_depth == Some(nav_depth) {
                            break;
                        }
                        nav_depth = nav_depth.saturating_sub(1);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(collapse(stack))
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// An open navPoint / li while its subtree is being read.
#[derive(Default)]
struct NodeState {
    children: Vec<TocEntry>,
    label: String,
    label_done: bool,
    src: Option<String>,
}

impl NodeState {
    fn push_label(&mut self, text: &str) {
        self.label.push_str(text);
    }

    fn close_into(self, parent: &mut NodeState) {
        match self.src {
            Some(src) => {
                let label = self.label.trim();
                let mut entry = if label.is_empty() {
                    TocEntry::untitled(src)
                } else {
                    TocEntry::new(label, src)
                };
                entry.children = self.children;
                parent.children.push(entry);
            }
            None => parent.children.extend(self.children),
        }
    }
}

/// Close anything left open by a truncated document and return the roots.
fn collapse(mut stack: Vec<NodeState>) -> Vec<TocEntry> {
    while stack.len() > 1 {
        if let Some(state) = stack.pop()
            && let Some(parent) = stack.last_mut()
        {
            state.close_into(parent);
        }
    }
    stack.pop().map(|s| s.children).unwrap_or_default()
}

fn set_src(stack: &mut [NodeState], e: &BytesStart<'_>) -> Result<()> {
    if let Some(src) = attribute(e, b"src")?
        && let Some(state) = stack.last_mut()
    {
        state.src = Some(src);
    }
    Ok(())
}

fn is_toc_nav(e: &BytesStart<'_>) -> Result<bool> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == b"type" {
            let value = String::from_utf8(attr.value.to_vec())
                .map_err(|err| Error::InvalidEpub(err.to_string()))?;
            return Ok(value.split_ascii_whitespace().any(|t| t == "toc"));
        }
    }
    Ok(false)
}

/// Value of an attribute by (unprefixed) name.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = String::from_utf8(attr.value.to_vec())
                .map_err(|err| Error::InvalidEpub(err.to_string()))?;
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Named HTML entities that turn up in hand-written NCX and nav labels.
fn html_entity(name: &str) -> Option<char> {
    let c = match name {
        "nbsp" => '\u{a0}',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "shy" => '\u{ad}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201a}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bdquo" => '\u{201e}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "lsaquo" => '\u{2039}',
        "rsaquo" => '\u{203a}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "middot" => '\u{b7}',
        "dagger" => '\u{2020}',
        "Dagger" => '\u{2021}',
        "sect" => '\u{a7}',
        "para" => '\u{b6}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "deg" => '\u{b0}',
        "times" => '\u{d7}',
        "divide" => '\u{f7}',
        "iexcl" => '\u{a1}',
        "iquest" => '\u{bf}',
        "agrave" => '\u{e0}',
        "aacute" => '\u{e1}',
        "acirc" => '\u{e2}',
        "auml" => '\u{e4}',
        "ccedil" => '\u{e7}',
        "egrave" => '\u{e8}',
        "eacute" => '\u{e9}',
        "ecirc" => '\u{ea}',
        "euml" => '\u{eb}',
        "iacute" => '\u{ed}',
        "iuml" => '\u{ef}',
        "ntilde" => '\u{f1}',
        "oacute" => '\u{f3}',
        "ocirc" => '\u{f4}',
        "ouml" => '\u{f6}',
        "uacute" => '\u{fa}',
        "uuml" => '\u{fc}',
        "szlig" => '\u{df}',
        "Eacute" => '\u{c9}',
        "Auml" => '\u{c4}',
        "Ouml" => '\u{d6}',
        "Uuml" => '\u{dc}',
        _ => return None,
    };
    Some(c)
}

/// Resolve XML and common HTML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }
    if let Some(c) = html_entity(entity) {
        return Some(c.to_string());
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}
