use std::collections::BTreeMap;
use std::path::Path;

use pdfium_render::prelude::*;

use papergraph_core::{ExtractionError, ParsedDocument, ParsedPage, PdfBackend, TextFragment};

/// Chars on the same baseline within this tolerance stay in one fragment.
const BASELINE_Y_TOLERANCE: f32 = 2.0;
/// Font-size drift allowed within one fragment.
const SIZE_GROUP_TOLERANCE: f32 = 0.1;

/// Conventional install locations tried when the system library lookup fails.
const DEFAULT_PDFIUM_PATHS: &[&str] = &[
    "/usr/local/lib/libpdfium.so",
    "/usr/lib/libpdfium.so",
    "/usr/local/lib/libpdfium.dylib",
    "/usr/lib/libpdfium.dylib",
];

/// Pdfium-based extraction backend.
///
/// Produces span-level fragments carrying font size, font name, and a bold
/// flag derived from the font name, which the layout analyzer needs for
/// heading detection. This is the rich, primary backend; pair it with a
/// line-granularity fallback for environments without the pdfium library.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind against the system pdfium library, trying conventional install
    /// paths when the default lookup fails.
    pub fn new() -> Result<Self, ExtractionError> {
        let bindings = Pdfium::bind_to_system_library().or_else(|_| bind_default_paths())?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind against an explicit pdfium library path.
    pub fn with_library_path(path: &str) -> Result<Self, ExtractionError> {
        let bindings = Pdfium::bind_to_library(path)
            .map_err(|e| ExtractionError::Open(format!("failed to load pdfium from {path}: {e}")))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

fn bind_default_paths() -> Result<Box<dyn PdfiumLibraryBindings>, ExtractionError> {
    for path in DEFAULT_PDFIUM_PATHS {
        if let Ok(bindings) = Pdfium::bind_to_library(path) {
            return Ok(bindings);
        }
    }
    Err(ExtractionError::Open(format!(
        "pdfium library not found in system path or {DEFAULT_PDFIUM_PATHS:?}"
    )))
}

impl PdfBackend for PdfiumBackend {
    fn parse(&self, path: &Path) -> Result<ParsedDocument, ExtractionError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ExtractionError::Open(e.to_string()))?;

        let metadata = read_metadata(&document);
        let mut pages = Vec::new();

        for (index, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| ExtractionError::Extraction(e.to_string()))?;
            let raw_text = text.all();
            let height = page.height().value;
            let width = page.width().value;

            let chars = collect_chars(&text);
            let fragments = group_chars(&chars, index, height);

            pages.push(ParsedPage {
                page_index: index,
                width,
                height,
                fragments,
                raw_text,
            });
        }

        Ok(ParsedDocument {
            page_count: pages.len(),
            metadata,
            pages,
        })
    }
}

fn read_metadata(document: &PdfDocument<'_>) -> BTreeMap<String, String> {
    let tags = [
        ("title", PdfDocumentMetadataTagType::Title),
        ("author", PdfDocumentMetadataTagType::Author),
        ("subject", PdfDocumentMetadataTagType::Subject),
        ("keywords", PdfDocumentMetadataTagType::Keywords),
        ("creator", PdfDocumentMetadataTagType::Creator),
        ("producer", PdfDocumentMetadataTagType::Producer),
    ];

    let mut metadata = BTreeMap::new();
    for (name, tag) in tags {
        if let Some(entry) = document.metadata().get(tag) {
            let value = entry.value().to_string();
            if !value.is_empty() {
                metadata.insert(name.to_string(), value);
            }
        }
    }
    metadata
}

/// One character with position and font info, in PDF (bottom-up) coordinates.
#[derive(Debug, Clone)]
struct RawChar {
    ch: char,
    x0: f32,
    x1: f32,
    top: f32,
    bottom: f32,
    font_size: f32,
    font_name: String,
}

fn collect_chars(text: &PdfPageText<'_>) -> Vec<RawChar> {
    let mut chars = Vec::new();
    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else { continue };
        let Ok(bounds) = ch.loose_bounds() else { continue };
        chars.push(RawChar {
            ch: c,
            x0: bounds.left.value,
            x1: bounds.right.value,
            top: bounds.top.value,
            bottom: bounds.bottom.value,
            font_size: ch.unscaled_font_size().value,
            font_name: ch.font_name(),
        });
    }
    chars
}

/// Group consecutive chars sharing baseline, size, and font into fragments.
///
/// Bounding boxes are converted to top-down page coordinates so that larger
/// y means further down the page.
fn group_chars(chars: &[RawChar], page_index: usize, page_height: f32) -> Vec<TextFragment> {
    struct Builder {
        text: String,
        x0: f32,
        x1: f32,
        top: f32,
        bottom: f32,
        font_size: f32,
        font_name: String,
    }

    impl Builder {
        fn start(c: &RawChar) -> Self {
            Self {
                text: c.ch.to_string(),
                x0: c.x0,
                x1: c.x1,
                top: c.top,
                bottom: c.bottom,
                font_size: c.font_size,
                font_name: c.font_name.clone(),
            }
        }

        fn push(&mut self, c: &RawChar) {
            self.text.push(c.ch);
            self.x0 = self.x0.min(c.x0);
            self.x1 = self.x1.max(c.x1);
            self.top = self.top.max(c.top);
            self.bottom = self.bottom.min(c.bottom);
        }

        fn finish(self, page_index: usize, page_height: f32) -> Option<TextFragment> {
            let text = self.text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            let is_bold = self.font_name.contains("Bold") || self.font_name.contains("bold");
            Some(TextFragment {
                text,
                font_size: self.font_size,
                font_name: self.font_name,
                is_bold,
                page_index,
                bbox: (
                    self.x0,
                    page_height - self.top,
                    self.x1,
                    page_height - self.bottom,
                ),
            })
        }
    }

    let mut fragments = Vec::new();
    let mut current: Option<Builder> = None;

    for c in chars {
        if c.ch == '\n' || c.ch == '\r' {
            if let Some(builder) = current.take() {
                fragments.extend(builder.finish(page_index, page_height));
            }
            continue;
        }

        match current.as_mut() {
            Some(builder)
                if (c.bottom - builder.bottom).abs() <= BASELINE_Y_TOLERANCE
                    && (c.font_size - builder.font_size).abs() <= SIZE_GROUP_TOLERANCE
                    && c.font_name == builder.font_name =>
            {
                builder.push(c);
            }
            _ => {
                if let Some(builder) = current.take() {
                    fragments.extend(builder.finish(page_index, page_height));
                }
                current = Some(Builder::start(c));
            }
        }
    }
    if let Some(builder) = current.take() {
        fragments.extend(builder.finish(page_index, page_height));
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(ch: char, x: f32, baseline: f32, size: f32, font: &str) -> RawChar {
        RawChar {
            ch,
            x0: x,
            x1: x + 5.0,
            top: baseline + size,
            bottom: baseline,
            font_size: size,
            font_name: font.to_string(),
        }
    }

    #[test]
    fn groups_same_style_chars_into_one_fragment() {
        let chars: Vec<RawChar> = "Title"
            .chars()
            .enumerate()
            .map(|(i, c)| raw(c, 50.0 + 5.0 * i as f32, 700.0, 18.0, "Helvetica-Bold"))
            .collect();
        let fragments = group_chars(&chars, 0, 792.0);
        assert_eq!(fragments.len(), 1);
        let f = &fragments[0];
        assert_eq!(f.text, "Title");
        assert_eq!(f.font_size, 18.0);
        assert!(f.is_bold);
        assert_eq!(f.page_index, 0);
    }

    #[test]
    fn font_change_starts_a_new_fragment() {
        let mut chars = vec![raw('A', 50.0, 700.0, 12.0, "Times")];
        chars.push(raw('B', 55.0, 700.0, 12.0, "Times-Bold"));
        let fragments = group_chars(&chars, 0, 792.0);
        assert_eq!(fragments.len(), 2);
        assert!(!fragments[0].is_bold);
        assert!(fragments[1].is_bold);
    }

    #[test]
    fn baseline_jump_starts_a_new_fragment() {
        let chars = vec![
            raw('A', 50.0, 700.0, 12.0, "Times"),
            raw('B', 55.0, 680.0, 12.0, "Times"),
        ];
        assert_eq!(group_chars(&chars, 0, 792.0).len(), 2);
    }

    #[test]
    fn newline_flushes_and_whitespace_fragments_drop() {
        let chars = vec![
            raw('A', 50.0, 700.0, 12.0, "Times"),
            raw('\n', 55.0, 700.0, 12.0, "Times"),
            raw(' ', 50.0, 680.0, 12.0, "Times"),
        ];
        let fragments = group_chars(&chars, 0, 792.0);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "A");
    }

    #[test]
    fn bbox_is_top_down() {
        let chars = vec![raw('A', 50.0, 700.0, 12.0, "Times")];
        let fragments = group_chars(&chars, 0, 792.0);
        let (x0, y0, x1, y1) = fragments[0].bbox;
        assert_eq!(x0, 50.0);
        assert_eq!(x1, 55.0);
        // top of the glyph is nearer the top of the page
        assert!(y0 < y1);
        assert_eq!(y0, 792.0 - 712.0);
        assert_eq!(y1, 792.0 - 700.0);
    }
}
