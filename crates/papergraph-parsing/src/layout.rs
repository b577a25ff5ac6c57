use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use papergraph_core::{
    Language, ParsedDocument, Section, SectionType, TextFragment, detect_language,
};

use crate::classify::{classify_section, is_numbered_heading, numbered_heading_rest};

/// Calibration defaults for documents with no usable font histogram.
const DEFAULT_BODY_SIZE: f32 = 12.0;
const DEFAULT_HEADING_SIZE: f32 = 14.0;

/// Fragments merge into one line when their y origins differ by less than this.
const LINE_MERGE_Y_TOLERANCE: f32 = 3.0;
const LINE_MERGE_SIZE_TOLERANCE: f32 = 0.5;

/// Title fragments must sit within this of the page's maximum font size.
const TITLE_SIZE_TOLERANCE: f32 = 1.0;
const TITLE_FRAGMENT_CAP: usize = 5;

/// A recovered abstract shorter than this is considered noise.
const MIN_ABSTRACT_CHARS: usize = 50;

/// In-progress section before `order` assignment.
#[derive(Debug, Clone)]
struct SectionDraft {
    section_type: SectionType,
    heading: String,
    content: String,
    page_start: usize,
    page_end: usize,
}

impl SectionDraft {
    fn new(section_type: SectionType, heading: &str, page: usize) -> Self {
        Self {
            section_type,
            heading: heading.to_string(),
            content: String::new(),
            page_start: page,
            page_end: page,
        }
    }

    fn into_section(self, order: usize) -> Section {
        Section {
            section_type: self.section_type,
            heading: self.heading,
            content: self.content,
            page_start: self.page_start,
            page_end: self.page_end,
            order,
        }
    }
}

/// A line assembled from adjacent same-style fragments.
#[derive(Debug, Clone)]
struct MergedFragment {
    text: String,
    font_size: f32,
    is_bold: bool,
    page_index: usize,
    y0: f32,
}

/// Analyze document layout and extract an ordered section sequence plus the
/// detected language.
///
/// Heading detection runs four independent signals over merged lines (font
/// size, numbering, bold known-name, all-caps known-name). When font signals
/// are too weak, a raw-text scan takes over; when everything fails, the whole
/// document becomes a single catch-all section, so any document with at
/// least one page yields at least one section.
pub fn analyze_layout(doc: &ParsedDocument) -> (Vec<Section>, Language) {
    if doc.pages.is_empty() {
        return (Vec::new(), Language::En);
    }

    let (body_size, heading_size) = find_heading_font_size(doc);
    let full_text = doc.full_text();
    let language = detect_language(&full_text);

    let mut sections: Vec<SectionDraft> = Vec::new();

    // First pass: title is the largest font on the first page.
    let first_page = &doc.pages[0];
    let max_font = first_page
        .fragments
        .iter()
        .map(|f| f.font_size)
        .fold(body_size, f32::max);
    if max_font > heading_size {
        let title_text = first_page
            .fragments
            .iter()
            .filter(|f| (f.font_size - max_font).abs() < TITLE_SIZE_TOLERANCE)
            .take(TITLE_FRAGMENT_CAP)
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let title_text = title_text.trim().to_string();
        let mut draft = SectionDraft::new(SectionType::Title, &title_text, 0);
        draft.content = title_text;
        sections.push(draft);
    }

    // Second pass: merge fragments per page, then walk them in reading order.
    let mut merged: Vec<MergedFragment> = Vec::new();
    for page in &doc.pages {
        merged.extend(merge_adjacent_fragments(&page.fragments));
    }

    let mut current: Option<SectionDraft> = None;
    for frag in &merged {
        let text = frag.text.trim();
        if text.is_empty() {
            continue;
        }
        let char_len = text.chars().count();

        let mut is_heading = false;
        let mut section_type = SectionType::Other;

        // Signal 1: font size (larger or bold at heading size)
        if frag.font_size >= heading_size
            && char_len < 200
            && (frag.is_bold || frag.font_size > body_size + 0.5)
        {
            is_heading = true;
            section_type = classify_section(text);
        }

        // Signal 2: numbered heading pattern, even at body font size
        if !is_heading && is_numbered_heading(text) {
            let candidate = classify_section(text);
            if candidate != SectionType::Other {
                is_heading = true;
                section_type = candidate;
            }
        }

        // Signal 3: bold text at body size matching a known section name
        if !is_heading && frag.is_bold && char_len < 100 {
            let candidate = classify_section(text);
            if candidate != SectionType::Other {
                is_heading = true;
                section_type = candidate;
            }
        }

        // Signal 4: ALL-CAPS text matching a known section name
        if !is_heading && is_all_caps(text) && char_len < 100 {
            let candidate = classify_section(text);
            if candidate != SectionType::Other {
                is_heading = true;
                section_type = candidate;
            }
        }

        if is_heading && section_type != SectionType::Other {
            close_section(&mut current, &mut sections);
            current = Some(SectionDraft::new(section_type, text, frag.page_index));
        } else if is_heading
            && section_type == SectionType::Other
            && frag.font_size > heading_size
        {
            // Untyped subsection marker: keep inside the open section
            match current.as_mut() {
                Some(cur) => {
                    cur.content.push_str(&format!("\n### {text}\n"));
                    cur.page_end = frag.page_index;
                }
                None => {
                    current = Some(SectionDraft::new(SectionType::Other, text, frag.page_index));
                }
            }
        } else if let Some(cur) = current.as_mut() {
            cur.content.push_str(text);
            cur.content.push(' ');
            cur.page_end = frag.page_index;
        }
    }
    close_section(&mut current, &mut sections);

    // Too few named sections: escalate to the raw-text scan.
    let named = sections
        .iter()
        .filter(|s| !matches!(s.section_type, SectionType::Title | SectionType::Other))
        .count();
    if named < 2 {
        let text_sections = sections_from_raw_text(&full_text);
        if text_sections.len() > named {
            let mut kept: Vec<SectionDraft> = sections
                .into_iter()
                .filter(|s| s.section_type == SectionType::Title)
                .collect();
            kept.extend(text_sections);
            sections = kept;
        }
    }

    // Recover a missing abstract straight from the document text.
    if !sections.iter().any(|s| s.section_type == SectionType::Abstract) {
        if let Some(abstract_text) = capture_abstract(&full_text) {
            if abstract_text.chars().count() > MIN_ABSTRACT_CHARS {
                let insert_pos = usize::from(
                    sections
                        .first()
                        .is_some_and(|s| s.section_type == SectionType::Title),
                );
                let mut draft = SectionDraft::new(SectionType::Abstract, "Abstract", 0);
                draft.content = abstract_text;
                sections.insert(insert_pos, draft);
            }
        }
    }

    // Last resort: one catch-all section over the whole document.
    if sections.len() <= 1 {
        let mut draft = SectionDraft::new(SectionType::Other, "Full Text", 0);
        draft.content = full_text.clone();
        draft.page_end = doc.page_count.saturating_sub(1);
        sections.push(draft);
    }

    let sections = sections
        .into_iter()
        .enumerate()
        .map(|(order, draft)| draft.into_section(order))
        .collect();
    (sections, language)
}

fn close_section(current: &mut Option<SectionDraft>, sections: &mut Vec<SectionDraft>) {
    if let Some(draft) = current.take() {
        if !draft.content.trim().is_empty() {
            sections.push(draft);
        }
    }
}

fn decipoints(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

/// Determine body and heading font sizes from a character-weighted histogram
/// of rounded fragment sizes. The mode is the body; the heading is the
/// smallest size in `(body, body + 6]`, else `body + 1.5`.
fn find_heading_font_size(doc: &ParsedDocument) -> (f32, f32) {
    let mut histogram: HashMap<i32, usize> = HashMap::new();
    for page in &doc.pages {
        for frag in &page.fragments {
            if frag.text.trim().chars().count() > 3 {
                *histogram.entry(decipoints(frag.font_size)).or_default() +=
                    frag.text.chars().count();
            }
        }
    }

    if histogram.is_empty() {
        return (DEFAULT_BODY_SIZE, DEFAULT_HEADING_SIZE);
    }

    let mut entries: Vec<(i32, usize)> = histogram.into_iter().collect();
    entries.sort_by_key(|(size, _)| *size);

    // Body text is the most common size; ties break toward the smaller size.
    let mut body_key = entries[0].0;
    let mut best = 0usize;
    for &(size, weight) in &entries {
        if weight > best {
            best = weight;
            body_key = size;
        }
    }

    let heading_key = entries
        .iter()
        .map(|(size, _)| *size)
        .filter(|&size| size > body_key && size <= body_key + 60)
        .min();

    let body = body_key as f32 / 10.0;
    let heading = heading_key.map_or(body + 1.5, |k| k as f32 / 10.0);
    (body, heading)
}

/// Merge adjacent fragments on the same line with the same font properties.
/// This absorbs kerned/split spans into contiguous heading or body lines.
fn merge_adjacent_fragments(fragments: &[TextFragment]) -> Vec<MergedFragment> {
    let mut merged: Vec<MergedFragment> = Vec::new();
    for frag in fragments {
        match merged.last_mut() {
            Some(prev)
                if (frag.bbox.1 - prev.y0).abs() < LINE_MERGE_Y_TOLERANCE
                    && (frag.font_size - prev.font_size).abs() < LINE_MERGE_SIZE_TOLERANCE
                    && frag.is_bold == prev.is_bold
                    && frag.page_index == prev.page_index =>
            {
                prev.text.push(' ');
                prev.text.push_str(&frag.text);
            }
            _ => merged.push(MergedFragment {
                text: frag.text.clone(),
                font_size: frag.font_size,
                is_bold: frag.is_bold,
                page_index: frag.page_index,
                y0: frag.bbox.1,
            }),
        }
    }
    merged
}

fn is_all_caps(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Fallback: recover sections by scanning raw document text for heading lines.
fn sections_from_raw_text(full_text: &str) -> Vec<SectionDraft> {
    let mut sections: Vec<SectionDraft> = Vec::new();
    let mut current: Option<SectionDraft> = None;

    for line in full_text.split('\n') {
        let stripped = line.trim();
        if stripped.is_empty() {
            if let Some(cur) = current.as_mut() {
                cur.content.push('\n');
            }
            continue;
        }

        let mut section_type = classify_section(stripped);
        if section_type == SectionType::Other {
            if let Some(rest) = numbered_heading_rest(stripped) {
                section_type = classify_section(rest);
            }
        }

        let is_heading = section_type != SectionType::Other && stripped.chars().count() < 100;
        if is_heading {
            close_section(&mut current, &mut sections);
            current = Some(SectionDraft::new(section_type, stripped, 0));
        } else if let Some(cur) = current.as_mut() {
            cur.content.push_str(stripped);
            cur.content.push(' ');
        }
    }
    close_section(&mut current, &mut sections);
    sections
}

static ABSTRACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)(?:abstract|摘\s*要)[:\s—\-]*(.+?)\n\s*(?:[\d.]+\s*)?(?:introduction|引言|keywords|关键词|1\s)",
    )
    .unwrap()
});

fn capture_abstract(full_text: &str) -> Option<String> {
    ABSTRACT_RE
        .captures(full_text)
        .map(|caps| caps.get(1).unwrap().as_str().trim().to_string())
}
