//! Chapter title resolution from HTML content.
//!
//! Uses html5ever's tokenizer rather than the full tree builder: we only need
//! the text of the first `<h1>` and the first `<title>`, and the tokenizer
//! already copes with arbitrarily broken markup.

use std::cell::RefCell;

use html5ever::TokenizerResult;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use crate::util::decode_document;

/// Find the best human-readable title in an HTML fragment.
///
/// Preference order: trimmed text of the first `<h1>`, then of the first
/// `<title>`, then `default` unchanged. Elements whose text is empty or only
/// whitespace count as absent.
pub fn resolve_title(html: &str, default: &str) -> String {
    let headings = scan_headings(html);
    headings
        .h1
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headings
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or(default)
        .to_string()
}

/// Like [`resolve_title`], for an undecoded content item.
///
/// Bytes are decoded as the item's XML declaration says (UTF-8 otherwise),
/// with malformed sequences replaced.
pub fn resolve_title_bytes(html: &[u8], default: &str) -> String {
    let decoded = decode_document(default, html);
    resolve_title(&decoded.text, default)
}

/// Raw (untrimmed) text of the first `<h1>` and `<title>` elements.
#[derive(Debug, Default)]
struct Headings {
    h1: Option<String>,
    title: Option<String>,
}

fn scan_headings(html: &str) -> Headings {
    let sink = HeadingSink::default();
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());

    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    while let TokenizerResult::Script(_) = tokenizer.feed(&input) {}
    tokenizer.end();

    tokenizer.sink.state.into_inner().finish()
}

#[derive(Debug, Default)]
struct ScanState {
    /// Open `<h1>` elements while inside the first one.
    h1_depth: u32,
    h1_text: String,
    h1_closed: bool,
    in_title: bool,
    title_text: String,
    title_closed: bool,
}

impl ScanState {
    fn finish(self) -> Headings {
        let h1_seen = self.h1_closed || self.h1_depth > 0;
        let title_seen = self.title_closed || self.in_title;
        Headings {
            h1: h1_seen.then_some(self.h1_text),
            title: title_seen.then_some(self.title_text),
        }
    }

    fn start_tag(&mut self, tag: &Tag) -> Option<RawKind> {
        match &*tag.name {
            "h1" if !self.h1_closed => {
                if tag.self_closing {
                    if self.h1_depth == 0 {
                        self.h1_closed = true;
                    }
                } else {
                    self.h1_depth += 1;
                }
                None
            }
            "title" if !tag.self_closing => {
                if !self.title_closed {
                    self.in_title = true;
                }
                Some(RawKind::Rcdata)
            }
            "script" if !tag.self_closing => Some(RawKind::ScriptData),
            "style" if !tag.self_closing => Some(RawKind::Rawtext),
            _ => None,
        }
    }

    fn end_tag(&mut self, tag: &Tag) {
        match &*tag.name {
            "h1" if self.h1_depth > 0 => {
                self.h1_depth -= 1;
                if self.h1_depth == 0 {
                    self.h1_closed = true;
                }
            }
            "title" if self.in_title => {
                self.in_title = false;
                self.title_closed = true;
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.h1_depth > 0 {
            self.h1_text.push_str(text);
        }
        if self.in_title {
            self.title_text.push_str(text);
        }
    }
}

/// Token sink collecting heading text. The tokenizer drives it through `&self`.
#[derive(Default)]
struct HeadingSink {
    state: RefCell<ScanState>,
}

impl TokenSink for HeadingSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut state = self.state.borrow_mut();
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => {
                    if let Some(kind) = state.start_tag(&tag) {
                        return TokenSinkResult::RawData(kind);
                    }
                }
                TagKind::EndTag => state.end_tag(&tag),
            },
            Token::CharacterTokens(text) => state.text(&text),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
