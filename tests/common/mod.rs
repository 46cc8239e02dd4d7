//! In-memory fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const XHTML: &str = "application/xhtml+xml";
pub const NCX: &str = "application/x-dtbncx+xml";

/// A manifest entry for [`opf`].
pub struct Item<'a> {
    pub id: &'a str,
    pub href: &'a str,
    pub media_type: &'a str,
    pub properties: Option<&'a str>,
}

pub fn item<'a>(id: &'a str, href: &'a str, media_type: &'a str) -> Item<'a> {
    Item {
        id,
        href,
        media_type,
        properties: None,
    }
}

pub fn nav_item<'a>(id: &'a str, href: &'a str) -> Item<'a> {
    Item {
        id,
        href,
        media_type: XHTML,
        properties: Some("nav"),
    }
}

/// Zip the given archive entries into an EPUB, `mimetype` first and stored.
pub fn zip_epub(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (path, data) in files {
        zip.start_file(*path, deflated).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn container_xml(opf_path: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{opf_path}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#
    )
}

/// A package document listing `items` in the manifest and spine.
pub fn opf(items: &[Item<'_>], spine_toc: Option<&str>) -> String {
    let mut manifest = String::new();
    let mut spine = String::new();
    for item in items {
        let props = item
            .properties
            .map(|p| format!(r#" properties="{p}""#))
            .unwrap_or_default();
        manifest.push_str(&format!(
            r#"    <item id="{}" href="{}" media-type="{}"{props}/>
"#,
            item.id, item.href, item.media_type
        ));
        if item.media_type == XHTML && item.properties.is_none() {
            spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", item.id));
        }
    }
    let toc_attr = spine_toc
        .map(|id| format!(r#" toc="{id}""#))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:fixture</dc:identifier>
    <dc:title>Fixture</dc:title>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine{toc_attr}>
{spine}  </spine>
</package>"#
    )
}

/// An NCX whose navMap body is given verbatim.
pub fn ncx(nav_points: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head/>
  <docTitle><text>Fixture</text></docTitle>
  <navMap>
{nav_points}
  </navMap>
</ncx>"#
    )
}

/// A navPoint with optional children, for building [`ncx`] bodies.
pub fn nav_point(id: &str, label: &str, src: &str, children: &str) -> String {
    format!(
        r#"<navPoint id="{id}"><navLabel><text>{label}</text></navLabel><content src="{src}"/>{children}</navPoint>"#
    )
}

/// An EPUB 3 navigation document whose toc `<ol>` body is given verbatim.
pub fn nav_doc(list_items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Contents</title></head>
<body>
  <nav epub:type="toc"><h2>Contents</h2><ol>{list_items}</ol></nav>
  <nav epub:type="landmarks"><ol><li><a href="cover.xhtml">Cover</a></li></ol></nav>
</body>
</html>"#
    )
}

/// A minimal XHTML document.
pub fn xhtml(head_title: Option<&str>, body: &str) -> String {
    let head = head_title
        .map(|t| format!("<title>{t}</title>"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head>{head}</head><body>{body}</body></html>"#
    )
}

/// A PDF with one page per entry; `None` pages have no content at all.
pub fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => Vec::new(),
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
