use tracing::trace;

use super::{Extraction, Warning};
use crate::model::ContentIndex;
use crate::title::resolve_title;
use crate::util::decode_document;

/// One chapter per content item, in document order.
///
/// Used when a book has no navigation at all. Titles come from the item's
/// own `<h1>` or `<title>`, and failing both, its name.
pub fn segment_items(content: &ContentIndex, out: &mut Extraction) {
    for item in content.iter() {
        let decoded = decode_document(&item.name, &item.data);
        if decoded.had_errors {
            out.warn(Warning::ItemDecode {
                name: item.name.clone(),
            });
        }
        let text = decoded.text.into_owned();
        let title = resolve_title(&text, &item.name);
        trace!(item = %item.name, title = %title, "Item chapter");
        out.push(title, text);
    }
}
