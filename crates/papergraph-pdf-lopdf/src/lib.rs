use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document, Object};

use papergraph_core::{ExtractionError, ParsedDocument, ParsedPage, PdfBackend, TextFragment};

/// Synthetic font size reported for every fragment; stands in for the body
/// size so downstream analysis sees "no strong heading signal".
pub const BODY_SIZE_PLACEHOLDER: f32 = 12.0;

// Fallback fragments carry no geometry, so a nominal Letter page suffices.
const NOMINAL_PAGE_WIDTH: f32 = 612.0;
const NOMINAL_PAGE_HEIGHT: f32 = 792.0;

/// Pure-Rust fallback extraction backend.
///
/// Produces one fragment per non-empty text line with a uniform synthetic
/// font size, no bold flag, and an empty bounding box. Used when the
/// pdfium-backed primary backend is unavailable or fails on a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn parse(&self, path: &Path) -> Result<ParsedDocument, ExtractionError> {
        let doc = Document::load(path).map_err(|e| ExtractionError::Open(e.to_string()))?;

        let page_map = doc.get_pages();
        let mut pages = Vec::with_capacity(page_map.len());

        for (index, page_number) in page_map.keys().enumerate() {
            // Pages with unsupported encodings extract as empty rather than
            // failing the whole document
            let raw_text = doc.extract_text(&[*page_number]).unwrap_or_default();
            let fragments = line_fragments(&raw_text, index);
            pages.push(ParsedPage {
                page_index: index,
                width: NOMINAL_PAGE_WIDTH,
                height: NOMINAL_PAGE_HEIGHT,
                fragments,
                raw_text,
            });
        }

        Ok(ParsedDocument {
            page_count: pages.len(),
            metadata: read_info(&doc),
            pages,
        })
    }
}

fn line_fragments(text: &str, page_index: usize) -> Vec<TextFragment> {
    text.split('\n')
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            Some(TextFragment {
                text: line.to_string(),
                font_size: BODY_SIZE_PLACEHOLDER,
                font_name: String::new(),
                is_bold: false,
                page_index,
                bbox: (0.0, 0.0, 0.0, 0.0),
            })
        })
        .collect()
}

/// Copy printable entries of the document Info dictionary.
fn read_info(doc: &Document) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    let Ok(info_ref) = doc.trailer.get(b"Info") else {
        return metadata;
    };
    let Ok(info_id) = info_ref.as_reference() else {
        return metadata;
    };
    let Ok(info) = doc.get_dictionary(info_id) else {
        return metadata;
    };

    for (key, value) in info.iter() {
        if let Object::String(bytes, _) = value {
            metadata.insert(
                String::from_utf8_lossy(key).to_string(),
                String::from_utf8_lossy(bytes).to_string(),
            );
        }
    }
    metadata
}
