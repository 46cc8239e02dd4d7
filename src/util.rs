//! Byte-level helpers: permissive text decoding and XML prolog sniffing.

use std::borrow::Cow;

use encoding_rs::Encoding;
use tracing::warn;

/// Text produced by [`decode_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText<'a> {
    pub text: Cow<'a, str>,
    /// Encoding actually used (a BOM overrides the requested one).
    pub encoding: &'static Encoding,
    /// True when malformed sequences were replaced with U+FFFD.
    pub had_errors: bool,
}

/// Decode bytes with the given encoding, never failing.
///
/// A byte order mark takes precedence over `encoding`. Malformed sequences
/// are replaced with U+FFFD and everything decodable is kept. Uses `Cow<str>`
/// to avoid allocation when the input is already valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> DecodedText<'a> {
    let (text, encoding, had_errors) = encoding.decode(bytes);
    DecodedText {
        text,
        encoding,
        had_errors,
    }
}

/// Decode a document item, honouring its `<?xml encoding="..."?>` declaration.
///
/// Falls back to UTF-8 when there is no usable declaration. Emits a warning
/// naming the item when bytes had to be replaced.
pub fn decode_document<'a>(name: &str, bytes: &'a [u8]) -> DecodedText<'a> {
    let target = extract_xml_encoding(bytes)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        // A declaration we could read as ASCII rules out UTF-16 and friends.
        .map(Encoding::output_encoding)
        .unwrap_or(encoding_rs::UTF_8);

    let decoded = decode_text(bytes, target);
    if decoded.had_errors {
        warn!(
            item = name,
            encoding = decoded.encoding.name(),
            bytes = bytes.len(),
            "Replaced malformed byte sequences while decoding"
        );
    }
    decoded
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Read the encoding label from an XML declaration, if any.
///
/// Only the first 100 bytes are inspected.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = strip_bom(&bytes[..check_len]);

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];
    let decl_end = after_xml
        .windows(2)
        .position(|w| w == b"?>")
        .unwrap_or(after_xml.len());
    let decl = &after_xml[..decl_end];

    let enc_pos = decl
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &decl[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = rest.iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}
