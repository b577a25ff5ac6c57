use std::collections::BTreeMap;

/// A positioned run of text with whatever font metadata the extraction
/// backend could provide. Produced once per extraction call, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub page_index: usize,
    /// `(x0, y0, x1, y1)` in top-down page coordinates. Backends without
    /// geometry report all zeroes.
    pub bbox: (f32, f32, f32, f32),
}

/// One page of an extracted document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedPage {
    pub page_index: usize,
    pub width: f32,
    pub height: f32,
    pub fragments: Vec<TextFragment>,
    /// The backend's native full-page text, used by raw-text fallbacks and
    /// caption search.
    pub raw_text: String,
}

/// An extracted document: the intermediate between the backend and layout
/// analysis. Created once per parse, read-only afterward, and discarded once
/// sections are derived.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDocument {
    pub page_count: usize,
    pub metadata: BTreeMap<String, String>,
    pub pages: Vec<ParsedPage>,
}

impl ParsedDocument {
    /// Full document text: pages' raw text joined with newlines.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
